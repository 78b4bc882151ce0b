//! The `compiling_error.txt` file.
//!
//! Its presence next to a source file asserts that the last build in that
//! directory failed; its content is that build's stderr, unmodified. Other
//! tools poll for it, so it is written atomically and removed after every
//! successful build.

use std::path::{Path, PathBuf};

use crate::util::errors::BuildError;
use crate::util::fs;

/// File name of the sentinel artifact.
pub const SENTINEL_FILE_NAME: &str = "compiling_error.txt";

/// Where the sentinel lives for sources in `dir`.
pub fn sentinel_path(dir: &Path) -> PathBuf {
    dir.join(SENTINEL_FILE_NAME)
}

/// Record a failed build's stderr.
pub fn write_sentinel(dir: &Path, stderr: &str) -> Result<PathBuf, BuildError> {
    let path = sentinel_path(dir);
    fs::write_atomic(&path, stderr.as_bytes()).map_err(|source| BuildError::Io {
        path: path.clone(),
        source,
    })?;
    tracing::debug!("wrote {}", path.display());
    Ok(path)
}

/// Remove the sentinel after a successful build. Returns whether one existed.
pub fn clear_sentinel(dir: &Path) -> Result<bool, BuildError> {
    let path = sentinel_path(dir);
    let removed = fs::remove_file_if_exists(&path)
        .map_err(|source| BuildError::Io { path: path.clone(), source })?;
    if removed {
        tracing::debug!("removed {}", path.display());
    }
    Ok(removed)
}

/// Read the sentinel; empty when the last build succeeded.
pub fn read_sentinel(dir: &Path) -> Result<String, BuildError> {
    let path = sentinel_path(dir);
    fs::read_to_string_or_empty(&path).map_err(|source| BuildError::Io { path, source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_round_trip_is_exact() {
        let tmp = TempDir::new().unwrap();
        let text = "main.c:10:5: error: expected ';'\n   10 |   x = 1\n\t\u{00e9}\r\n";
        let path = write_sentinel(tmp.path(), text).unwrap();
        assert_eq!(path, tmp.path().join(SENTINEL_FILE_NAME));
        assert_eq!(read_sentinel(tmp.path()).unwrap(), text);
        assert_eq!(std::fs::read(&path).unwrap(), text.as_bytes());
    }

    #[test]
    fn test_cleared_reads_empty() {
        let tmp = TempDir::new().unwrap();
        write_sentinel(tmp.path(), "boom").unwrap();
        assert!(clear_sentinel(tmp.path()).unwrap());
        assert!(!sentinel_path(tmp.path()).exists());
        assert_eq!(read_sentinel(tmp.path()).unwrap(), "");
        assert!(!clear_sentinel(tmp.path()).unwrap());
    }
}
