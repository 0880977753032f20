//! Timestamp-based staleness detection.

use std::path::Path;
use std::time::SystemTime;

/// Modification time of a path, counting only regular files.
///
/// Directories, FIFOs, and dangling symlinks all report `None` and are
/// treated the same as a missing file.
fn mtime(path: &str) -> Option<SystemTime> {
    let meta = std::fs::metadata(Path::new(path)).ok()?;
    if !meta.is_file() {
        return None;
    }
    meta.modified().ok()
}

/// Whether a path currently exists as a regular file.
pub(crate) fn file_exists(path: &str) -> bool {
    std::fs::metadata(Path::new(path))
        .map(|meta| meta.is_file())
        .unwrap_or(false)
}

/// Decide whether a target's body must run.
///
/// True when the target is missing, any dependency is missing (an upstream
/// rule is expected to materialise it, not an error), or any dependency is
/// strictly newer than the target. Equal mtimes are up to date.
#[must_use]
pub fn needs_run(target: &str, deps: &[String]) -> bool {
    let Some(target_ts) = mtime(target) else {
        return true;
    };
    deps.iter().any(|dep| match mtime(dep) {
        None => true,
        Some(dep_ts) => target_ts < dep_ts,
    })
}
