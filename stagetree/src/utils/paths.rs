//! Path helpers.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Expands a leading `~` to the current user's home directory.
///
/// Paths without a leading `~`, or when no home directory can be
/// determined, are returned unchanged.
#[must_use]
pub fn expand_path(raw: &str) -> PathBuf {
    let rest = if raw == "~" {
        Some("")
    } else {
        raw.strip_prefix("~/")
    };

    match (rest, dirs::home_dir()) {
        (Some(rest), Some(home)) if rest.is_empty() => home,
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(raw),
    }
}

/// Returns the lock sentinel path for `path`: the same path with `.lock` appended.
#[must_use]
pub fn sentinel_path(path: &Path) -> PathBuf {
    let mut raw: OsString = path.as_os_str().to_owned();
    raw.push(".lock");
    PathBuf::from(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_path_without_tilde() {
        assert_eq!(expand_path("/var/tmp/board.txt"), PathBuf::from("/var/tmp/board.txt"));
        assert_eq!(expand_path("relative/board.txt"), PathBuf::from("relative/board.txt"));
    }

    #[test]
    fn test_expand_path_with_tilde() {
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_path("~/board.txt"), home.join("board.txt"));
            assert_eq!(expand_path("~"), home);
        }
    }

    #[test]
    fn test_tilde_inside_path_is_kept() {
        assert_eq!(expand_path("/data/~/x"), PathBuf::from("/data/~/x"));
    }

    #[test]
    fn test_sentinel_path_appends_suffix() {
        assert_eq!(
            sentinel_path(Path::new("/tmp/summary.txt")),
            PathBuf::from("/tmp/summary.txt.lock")
        );
    }
}
