//! Advisory file locks with a bounded wait.
//!
//! Locks are taken on a dedicated lock file rather than on the data file,
//! because the data file is replaced by rename on every write.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use fs2::FileExt;

use crate::core::error::{Result, ToolchainError};

/// Default time to wait for a contended lock.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(10);

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// An exclusive lock held until dropped.
#[derive(Debug)]
pub struct FileLock {
    file: File,
    path: PathBuf,
}

impl FileLock {
    /// Acquire an exclusive lock on `path`, creating the lock file if needed.
    ///
    /// Polls until the lock is free or `timeout` has elapsed, in which case
    /// `LockTimeout` is returned.
    pub fn acquire(path: &Path, timeout: Duration) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ToolchainError::fs("failed to create directory", parent, e))?;
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map_err(|e| ToolchainError::fs("failed to open lock file", path, e))?;

        let start = Instant::now();
        loop {
            match file.try_lock_exclusive() {
                Ok(()) => {
                    tracing::debug!("acquired lock {}", path.display());
                    return Ok(FileLock {
                        file,
                        path: path.to_path_buf(),
                    });
                }
                Err(e) if e.kind() == fs2::lock_contended_error().kind() => {
                    if start.elapsed() >= timeout {
                        return Err(ToolchainError::LockTimeout {
                            path: path.to_path_buf(),
                            timeout,
                        });
                    }
                    thread::sleep(POLL_INTERVAL);
                }
                Err(e) => return Err(ToolchainError::fs("failed to lock", path, e)),
            }
        }
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        if let Err(e) = self.file.unlock() {
            tracing::warn!("failed to release lock {}: {}", self.path.display(), e);
        }
    }
}

/// Lock file path guarding `path`: a `.lock` sibling.
pub fn lock_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".lock");
    path.with_file_name(name)
}
