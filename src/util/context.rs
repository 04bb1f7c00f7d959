//! Platform paths for toolchain data, caches and configuration.
//!
//! Resolved once at startup and passed explicitly to the registry.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use directories::BaseDirs;

use crate::util::lock::DEFAULT_LOCK_TIMEOUT;

/// Name of the directory shared by all qi tools under each base dir.
const QI_DIR: &str = "qi";

/// Name of the global toolchain configuration file.
pub const CONFIG_FILE_NAME: &str = "toolchain.cfg";

/// Where toolchains, their caches and the shared configuration live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformPaths {
    /// `<data-dir>/qi`
    data_dir: PathBuf,

    /// `<cache-dir>/qi`
    cache_dir: PathBuf,

    /// `<config-dir>/qi`
    config_dir: PathBuf,

    /// How long to wait for contended file locks.
    lock_timeout: Duration,
}

impl PlatformPaths {
    /// Resolve the real per-user directories of this platform.
    ///
    /// On Linux this is `~/.local/share/qi`, `~/.cache/qi` and `~/.config/qi`;
    /// on Windows the data dir is under `%LOCALAPPDATA%`.
    pub fn from_env() -> Result<Self> {
        let dirs = BaseDirs::new().context("failed to determine the home directory")?;

        Ok(PlatformPaths {
            data_dir: dirs.data_local_dir().join(QI_DIR),
            cache_dir: dirs.cache_dir().join(QI_DIR),
            config_dir: dirs.config_dir().join(QI_DIR),
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
        })
    }

    /// Use an explicit home directory with the XDG layout, on every platform.
    pub fn from_home(home: impl AsRef<Path>) -> Self {
        let home = home.as_ref();
        PlatformPaths {
            data_dir: home.join(".local").join("share").join(QI_DIR),
            cache_dir: home.join(".cache").join(QI_DIR),
            config_dir: home.join(".config").join(QI_DIR),
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
        }
    }

    /// Resolve from an optional `--home` override.
    pub fn resolve(home: Option<&Path>) -> Result<Self> {
        match home {
            Some(home) => Ok(Self::from_home(home)),
            None => Self::from_env(),
        }
    }

    /// Set the lock wait.
    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    pub fn lock_timeout(&self) -> Duration {
        self.lock_timeout
    }

    /// Directory holding one subdirectory per toolchain.
    pub fn toolchains_dir(&self) -> PathBuf {
        self.data_dir.join("toolchains")
    }

    /// Root of the toolchain called `name`.
    pub fn toolchain_dir(&self, name: &str) -> PathBuf {
        self.toolchains_dir().join(name)
    }

    /// Where downloaded archives for toolchain `name` are kept.
    pub fn toolchain_cache_dir(&self, name: &str) -> PathBuf {
        self.cache_dir
            .join("toolchains")
            .join(name)
            .join("packages")
    }

    /// The global toolchain configuration file.
    pub fn config_path(&self) -> PathBuf {
        self.config_dir.join(CONFIG_FILE_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_paths_from_home() {
        let tmp = TempDir::new().unwrap();
        let paths = PlatformPaths::from_home(tmp.path());

        assert_eq!(
            paths.toolchain_dir("linux"),
            tmp.path().join(".local/share/qi/toolchains/linux")
        );
        assert_eq!(
            paths.toolchain_cache_dir("linux"),
            tmp.path().join(".cache/qi/toolchains/linux/packages")
        );
        assert_eq!(
            paths.config_path(),
            tmp.path().join(".config/qi/toolchain.cfg")
        );
    }

    #[test]
    fn test_resolve_prefers_override() {
        let tmp = TempDir::new().unwrap();
        let paths = PlatformPaths::resolve(Some(tmp.path())).unwrap();
        assert!(paths.toolchains_dir().starts_with(tmp.path()));
        assert_eq!(paths.lock_timeout(), DEFAULT_LOCK_TIMEOUT);

        let paths = paths.with_lock_timeout(Duration::from_secs(1));
        assert_eq!(paths.lock_timeout(), Duration::from_secs(1));
    }
}
