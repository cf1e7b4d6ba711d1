// src/watch/path_utils.rs

//! Utility functions for path handling in the watchers.

use std::path::Path;

/// Normalize a change path the way every matcher expects to see it:
/// a leading `./` is stripped and directories carry a trailing `/`.
pub fn normalize(path: &str, dir: bool) -> String {
    let mut path = path.strip_prefix("./").unwrap_or(path).to_string();

    if dir && !path.ends_with('/') {
        path.push('/');
    }

    path
}

/// Convert a path into a string relative to `root`, with forward slashes.
///
/// - First we try a direct `strip_prefix(root)`.
/// - If that fails (e.g. due to symlinks or different absolute prefixes),
///   we canonicalize both paths and try again.
///
/// Returns `None` if the path cannot be reasonably related to `root`.
pub fn relative_str(root: &Path, path: &Path) -> Option<String> {
    if let Ok(rel) = path.strip_prefix(root) {
        let s = rel.to_string_lossy().replace('\\', "/");
        return Some(s);
    }

    // macOS reports events under /private/var/... for /var/... roots.
    if let (Ok(root_canon), Ok(path_canon)) = (root.canonicalize(), path.canonicalize()) {
        if let Ok(rel) = path_canon.strip_prefix(&root_canon) {
            let s = rel.to_string_lossy().replace('\\', "/");
            return Some(s);
        }
    }

    None
}

/// Forward-slashed form of `path`, relative to the current directory when
/// it is an absolute path below it. Other paths are returned as given.
pub fn relative_to_cwd(path: &Path) -> String {
    if path.is_absolute()
        && let Ok(cwd) = std::env::current_dir()
        && let Some(rel) = relative_str(&cwd, path)
    {
        return if rel.is_empty() { ".".to_string() } else { rel };
    }

    path.to_string_lossy().replace('\\', "/")
}
