//! Small path-name helpers exposed to build scripts.

/// Replace a trailing extension on one element.
///
/// `old` and `new` may be written with or without the leading dot. An
/// element whose extension does not match `old` passes through unchanged.
#[must_use]
pub fn replace_ext(element: &str, old: &str, new: &str) -> String {
    let old = old.strip_prefix('.').unwrap_or(old);
    let new = new.strip_prefix('.').unwrap_or(new);
    match element.rsplit_once('.') {
        Some((stem, ext)) if ext == old => format!("{stem}.{new}"),
        _ => element.to_string(),
    }
}

/// Apply [`replace_ext`] to every whitespace-separated element of a list.
#[must_use]
pub fn replace_ext_list(list: &str, old: &str, new: &str) -> String {
    list.split_whitespace()
        .map(|element| replace_ext(element, old, new))
        .collect::<Vec<_>>()
        .join(" ")
}
