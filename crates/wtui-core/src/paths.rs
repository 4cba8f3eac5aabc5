//! Path helpers shared by the pane and transcript matchers.

use std::path::PathBuf;

/// Get the user's home directory.
pub fn home_dir() -> Option<PathBuf> {
    std::env::var("HOME").ok().map(PathBuf::from)
}

/// Normalize a path for comparison (strip trailing slash).
///
/// tmux reports `pane_current_path` without a trailing slash while user
/// input and git output may carry one; the root `/` is left alone.
pub fn normalize_path_for_compare(path: &str) -> &str {
    if path.len() > 1 {
        path.strip_suffix('/').unwrap_or(path)
    } else {
        path
    }
}

/// Whether two directory paths refer to the same location textually.
pub fn same_dir(a: &str, b: &str) -> bool {
    normalize_path_for_compare(a) == normalize_path_for_compare(b)
}

/// Last path segment, used as the display name of a working tree.
pub fn last_segment(path: &str) -> &str {
    let trimmed = normalize_path_for_compare(path);
    trimmed.rsplit('/').find(|s| !s.is_empty()).unwrap_or(trimmed)
}
