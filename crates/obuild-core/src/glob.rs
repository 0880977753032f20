//! `*` glob expansion over directory listings.
//!
//! Patterns use POSIX-style `/` separators; `*` matches within one path
//! segment and never crosses `/`. A pattern that matches nothing is emitted
//! verbatim, so unexpanded patterns surface in command lines instead of
//! silently vanishing.

use std::path::Path;

/// One piece of a path segment: a literal run of bytes, or a `*` wildcard.
#[derive(Debug, PartialEq, Eq)]
enum Part<'a> {
    Literal(&'a [u8]),
    Star,
}

/// Chop a path segment into alternating literal/star parts.
///
/// Consecutive stars collapse into one, so the matcher never sees two in a
/// row.
fn segment_parts(segment: &str) -> Vec<Part<'_>> {
    let bytes = segment.as_bytes();
    let mut parts = Vec::new();
    let mut start = 0;
    for (i, &b) in bytes.iter().enumerate() {
        if b == b'*' {
            if start < i {
                parts.push(Part::Literal(&bytes[start..i]));
            }
            if !matches!(parts.last(), Some(Part::Star)) {
                parts.push(Part::Star);
            }
            start = i + 1;
        }
    }
    if start < bytes.len() {
        parts.push(Part::Literal(&bytes[start..]));
    }
    parts
}

/// Match a filename against segment parts, left to right.
///
/// A star skips forward until the following literal lines up; a trailing
/// star swallows the rest of the name.
fn name_matches(mut name: &[u8], parts: &[Part<'_>]) -> bool {
    let mut i = 0;
    while i < parts.len() {
        if matches!(parts[i], Part::Star) {
            i += 1;
            if i == parts.len() {
                return true;
            }
            let Part::Literal(lit) = parts[i] else {
                unreachable!("consecutive stars are collapsed")
            };
            while name.len() > lit.len() && !name.starts_with(lit) {
                name = &name[1..];
            }
        }
        let Part::Literal(lit) = parts[i] else {
            unreachable!("consecutive stars are collapsed")
        };
        if name.len() < lit.len() || !name.starts_with(lit) {
            return false;
        }
        name = &name[lit.len()..];
        i += 1;
    }
    name.is_empty()
}

/// Join a scanned directory and an entry name the way matches are emitted:
/// entries in `.` keep the bare name, relative directories gain a `./`
/// prefix.
fn compose(dir: &str, name: &str) -> String {
    if dir == "." {
        name.to_string()
    } else if dir.starts_with("./") || dir.starts_with('/') {
        format!("{dir}/{name}")
    } else {
        format!("./{dir}/{name}")
    }
}

fn is_regular_file(path: &str) -> bool {
    std::fs::metadata(Path::new(path)).map(|m| m.is_file()).unwrap_or(false)
}

/// Scan `dir` for entries matching `parts`; compose any `remainder` path
/// components onto each match, recursing when they still contain stars.
///
/// Returns whether anything was emitted. Hidden entries (and thereby `.` and
/// `..`) are skipped.
fn expand_dir(out: &mut Vec<String>, dir: &str, parts: &[Part<'_>], remainder: Option<&str>) -> bool {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return false;
    };
    let mut appended = false;
    for entry in entries.flatten() {
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if name.starts_with('.') {
            continue;
        }
        if !name_matches(name.as_bytes(), parts) {
            continue;
        }
        let base = compose(dir, name);
        match remainder {
            Some(rem) => {
                let full = format!("{base}{rem}");
                if rem[1..].contains('*') {
                    if expand_one(out, &full, true) {
                        appended = true;
                    }
                } else if is_regular_file(&full) {
                    out.push(full);
                    appended = true;
                }
            }
            None => {
                out.push(base);
                appended = true;
            }
        }
    }
    appended
}

/// Expand a single pattern into `out`.
///
/// On a miss the pattern itself is emitted unless `no_emit_on_miss` is set
/// (recursive composed expansions always set it). Returns whether any real
/// match was emitted.
fn expand_one(out: &mut Vec<String>, pattern: &str, no_emit_on_miss: bool) -> bool {
    let Some(star) = pattern.find('*') else {
        if !no_emit_on_miss {
            out.push(pattern.to_string());
        }
        return false;
    };
    let prestar = &pattern[..star];
    let (dir, seg_start) = match prestar.rfind('/') {
        Some(slash) => (&pattern[..slash], slash + 1),
        None => (".", 0),
    };
    let rest = &pattern[star + 1..];
    let (seg_end, remainder) = match rest.find('/') {
        Some(n) => (star + 1 + n, Some(&rest[n..])),
        None => (pattern.len(), None),
    };
    let parts = segment_parts(&pattern[seg_start..seg_end]);
    let matched = expand_dir(out, dir, &parts, remainder);
    if !matched && !no_emit_on_miss {
        out.push(pattern.to_string());
    }
    matched
}

/// Expand a sequence of patterns, space-joining the results.
#[must_use]
pub fn expand_globs<'a, I>(patterns: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let mut out = Vec::new();
    for pattern in patterns {
        expand_one(&mut out, pattern, false);
    }
    out.join(" ")
}

/// Expand a whitespace-separated pattern list, as the `glob` primitive sees
/// it.
#[must_use]
pub fn expand_glob_list(list: &str) -> String {
    expand_globs(list.split_whitespace())
}
