//! Backing storage for the text files that make up toolchain state.
//!
//! Both the configuration file and the generated toolchain file are small
//! text files rewritten in full on every change. [`StateStore`] abstracts
//! the read and read-modify-write cycles so the filesystem backing can
//! be swapped for an in-memory one in tests.

use std::collections::HashMap;
use std::fmt::Debug;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use crate::core::error::{Result, ToolchainError};
use crate::util::lock::{lock_path_for, FileLock, DEFAULT_LOCK_TIMEOUT};

/// Read-modify-write callback: receives current contents (None if absent),
/// returns the new contents.
pub type UpdateFn<'a> = dyn FnOnce(Option<String>) -> Result<String> + 'a;

/// Whole-file text storage.
pub trait StateStore: Debug + Send + Sync {
    /// Read the file at `path`. Returns `Ok(None)` if it does not exist.
    fn read(&self, path: &Path) -> Result<Option<String>>;

    /// Replace the file at `path` with whatever `f` returns.
    ///
    /// The read and the write happen as one unit with respect to other
    /// `update` calls on the same path.
    fn update(&self, path: &Path, f: Box<UpdateFn<'_>>) -> Result<()>;
}

/// Real filesystem storage with advisory locking.
#[derive(Debug, Clone)]
pub struct FsStore {
    lock_timeout: Duration,
}

impl FsStore {
    pub fn new() -> Self {
        FsStore {
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
        }
    }

    /// Set how long `update` waits for a contended lock.
    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }
}

impl Default for FsStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StateStore for FsStore {
    fn read(&self, path: &Path) -> Result<Option<String>> {
        match std::fs::read_to_string(path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ToolchainError::fs("failed to read", path, e)),
        }
    }

    fn update(&self, path: &Path, f: Box<UpdateFn<'_>>) -> Result<()> {
        let _lock = FileLock::acquire(&lock_path_for(path), self.lock_timeout)?;
        let current = self.read(path)?;
        let contents = f(current)?;
        write_atomic(path, contents.as_bytes())
    }
}

/// Write `contents` to a temporary sibling of `path`, then rename it into place.
fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent)
        .map_err(|e| ToolchainError::fs("failed to create directory", parent, e))?;

    let mut temp = tempfile::NamedTempFile::new_in(parent)
        .map_err(|e| ToolchainError::fs("failed to create temporary file in", parent, e))?;
    temp.write_all(contents)
        .and_then(|_| temp.as_file().sync_all())
        .map_err(|e| ToolchainError::fs("failed to write", temp.path().to_path_buf(), e))?;
    temp.persist(path)
        .map_err(|e| ToolchainError::fs("failed to write", path, e.error))?;
    Ok(())
}

/// In-memory storage, for tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    files: Mutex<HashMap<PathBuf, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a file with the given contents.
    pub fn insert(&self, path: impl AsRef<Path>, contents: impl Into<String>) {
        self.files_mut()
            .insert(path.as_ref().to_path_buf(), contents.into());
    }

    /// Paths of all stored files, sorted.
    pub fn paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<_> = self.files_mut().keys().cloned().collect();
        paths.sort();
        paths
    }

    fn files_mut(&self) -> std::sync::MutexGuard<'_, HashMap<PathBuf, String>> {
        // A poisoned map is still a valid map.
        self.files.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl StateStore for MemoryStore {
    fn read(&self, path: &Path) -> Result<Option<String>> {
        Ok(self.files_mut().get(path).cloned())
    }

    fn update(&self, path: &Path, f: Box<UpdateFn<'_>>) -> Result<()> {
        let mut files = self.files_mut();
        let contents = f(files.get(path).cloned())?;
        files.insert(path.to_path_buf(), contents);
        Ok(())
    }
}
