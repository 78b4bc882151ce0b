//! Command implementations

pub mod build;
pub mod completions;
pub mod config;
pub mod errors;
pub mod terminals;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Make `path` absolute against the current directory.
pub fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().context("failed to read the current directory")?;
    Ok(cwd.join(path))
}

/// Directory holding `file`, for project config lookup.
pub fn parent_dir(file: &Path) -> PathBuf {
    file.parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}
