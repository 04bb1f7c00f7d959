//! Filesystem utilities.

use std::fs;
use std::path::{Path, PathBuf};

use crate::core::error::{Result, ToolchainError};

/// Remove a directory and all its contents, if it exists.
pub fn remove_dir_all_if_exists(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_dir_all(path)
            .map_err(|e| ToolchainError::fs("failed to remove directory", path, e))?;
    }
    Ok(())
}

/// Ensure a directory exists, creating it if necessary.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)
            .map_err(|e| ToolchainError::fs("failed to create directory", path, e))?;
    }
    Ok(())
}

/// Render a path with forward slashes, whatever the host convention.
pub fn to_posix_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Make `path` absolute against the current directory, without touching the disk.
pub fn absolute(path: &Path) -> Result<PathBuf> {
    std::path::absolute(path).map_err(|e| ToolchainError::fs("failed to resolve", path, e))
}

/// Non-hidden subdirectories of `dir`, sorted by name.
///
/// Hidden entries (`.lock`, extraction staging dirs) are bookkeeping, not content.
pub fn visible_subdirs(dir: &Path) -> Result<Vec<String>> {
    let mut names = Vec::new();
    if !dir.exists() {
        return Ok(names);
    }

    for entry in fs::read_dir(dir).map_err(|e| ToolchainError::fs("failed to read directory", dir, e))? {
        let entry = entry.map_err(|e| ToolchainError::fs("failed to read directory", dir, e))?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') {
            continue;
        }
        let is_dir = entry
            .file_type()
            .map_err(|e| ToolchainError::fs("failed to stat", entry.path(), e))?
            .is_dir();
        if is_dir {
            names.push(name);
        }
    }

    names.sort();
    Ok(names)
}
