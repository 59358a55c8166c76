//! Path handling utilities.
//!
//! Logical paths (the `/js/src/app.js` form used throughout the bundle
//! declarations) always use `/` separators and are rooted at the webroot.
//! `fs_path` is the single place where they touch the real filesystem.

use std::path::{Path, PathBuf};

/// Normalize a file system path to absolute form.
///
/// Tries `canonicalize()` first (resolves symlinks, `.`, `..`).
/// Falls back to:
/// - Return as-is if already absolute
/// - Join with current directory if relative
#[inline]
pub fn normalize_path(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir().map_or_else(|_| path.to_path_buf(), |cwd| cwd.join(path))
        }
    })
}

/// Resolve a logical path (leading `/`, webroot-relative) to a filesystem path.
///
/// `PathBuf::join` would discard the webroot when handed an absolute path,
/// so the leading separator is stripped first.
#[inline]
pub fn fs_path(webroot: &Path, logical: &str) -> PathBuf {
    webroot.join(logical.trim_start_matches('/'))
}

/// Force a logical directory to start and end with `/`.
pub fn enclose_slashes(dir: &str) -> String {
    let mut out = String::with_capacity(dir.len() + 2);
    if !dir.starts_with('/') {
        out.push('/');
    }
    out.push_str(dir);
    if !out.ends_with('/') {
        out.push('/');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path_absolute() {
        let path = Path::new("/absolute/path/file.txt");
        let normalized = normalize_path(path);
        assert!(normalized.is_absolute());
    }

    #[test]
    fn test_normalize_path_relative() {
        let path = Path::new("relative/path/file.txt");
        let normalized = normalize_path(path);
        assert!(normalized.is_absolute());
    }

    #[test]
    fn test_fs_path_strips_leading_slash() {
        let webroot = Path::new("/var/www");
        assert_eq!(
            fs_path(webroot, "/js/src/app.js"),
            PathBuf::from("/var/www/js/src/app.js")
        );
    }

    #[test]
    fn test_fs_path_relative_logical() {
        let webroot = Path::new("/var/www");
        assert_eq!(
            fs_path(webroot, "js/src/app.js"),
            PathBuf::from("/var/www/js/src/app.js")
        );
    }

    #[test]
    fn test_enclose_slashes() {
        assert_eq!(enclose_slashes("js/src"), "/js/src/");
        assert_eq!(enclose_slashes("/js/src"), "/js/src/");
        assert_eq!(enclose_slashes("js/src/"), "/js/src/");
        assert_eq!(enclose_slashes("/js/src/"), "/js/src/");
    }
}
