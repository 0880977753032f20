//! `%`-pattern matching for rule targets and dependency expansion.

/// Match a concrete target name against a `%`-pattern, returning the stem.
///
/// The pattern is split at its `%` into a prefix and a suffix; the name
/// matches when it is strictly longer than prefix + suffix and carries both
/// at its ends. The stem is whatever sits in between and is never empty. A
/// pattern without `%` never matches here; literal equality is the
/// resolver's business.
#[must_use]
pub fn match_stem<'a>(expanded: &'a str, pattern: &str) -> Option<&'a str> {
    let at = pattern.find('%')?;
    let prefix = &pattern[..at];
    let suffix = &pattern[at + 1..];
    if expanded.len() <= prefix.len() + suffix.len() {
        return None;
    }
    expanded
        .strip_prefix(prefix)?
        .strip_suffix(suffix)
        .filter(|stem| !stem.is_empty())
}

/// Substitute the first `%` in a dependency string with the stem.
///
/// Substitution happens at expansion time, not at registration time, so one
/// pattern rule serves every target it matches.
#[must_use]
pub fn expand_stem(dep: &str, stem: &str) -> String {
    match dep.split_once('%') {
        Some((pre, post)) => format!("{pre}{stem}{post}"),
        None => dep.to_string(),
    }
}
