// src/watch/path_utils.rs

//! Utility functions for path handling in the watcher.

use std::path::{Path, PathBuf};

/// Convert a path into a string relative to `root`, with forward slashes.
///
/// - First we try a direct `strip_prefix(root)`.
/// - If that fails (e.g. due to symlinks or different absolute prefixes),
///   we canonicalize both paths and try again.
/// - Only if both attempts fail do we give up.
///
/// Deleted files cannot be canonicalized, so the fast path matters for
/// `Deleted` events.
pub fn relative_str(root: &Path, path: &Path) -> Option<String> {
    if let Ok(rel) = path.strip_prefix(root) {
        let s = rel.to_string_lossy().replace('\\', "/");
        return Some(s);
    }

    // macOS reports /private/var/... for paths under /var/...
    if let (Ok(root_canon), Ok(path_canon)) = (root.canonicalize(), path.canonicalize()) {
        if let Ok(rel) = path_canon.strip_prefix(&root_canon) {
            let s = rel.to_string_lossy().replace('\\', "/");
            return Some(s);
        }
    }

    None
}

/// Resolve `path` against `base` unless it is already absolute.
pub fn resolve_against(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

/// Shorten `path` for display: relative to `root` when possible.
pub fn display_path(root: &Path, path: &Path) -> String {
    match relative_str(root, path) {
        Some(rel) if !rel.is_empty() => rel,
        _ => path.to_string_lossy().into_owned(),
    }
}
