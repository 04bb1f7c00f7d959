//! ToolchainRegistry - maps toolchain names to their on-disk locations.

use std::path::PathBuf;
use std::sync::Arc;

use crate::core::error::{Result, ToolchainError};
use crate::core::package::validate_name;
use crate::core::toolchain::Toolchain;
use crate::util::context::PlatformPaths;
use crate::util::fs::{ensure_dir, visible_subdirs};
use crate::util::store::{FsStore, StateStore};

/// Creates, lists and loads toolchains under one set of platform paths.
#[derive(Debug, Clone)]
pub struct ToolchainRegistry {
    paths: PlatformPaths,
    store: Arc<dyn StateStore>,
}

impl ToolchainRegistry {
    pub fn new(paths: PlatformPaths, store: Arc<dyn StateStore>) -> Self {
        ToolchainRegistry { paths, store }
    }

    /// A registry backed by the real filesystem.
    pub fn from_paths(paths: PlatformPaths) -> Self {
        let store = FsStore::new().with_lock_timeout(paths.lock_timeout());
        ToolchainRegistry::new(paths, Arc::new(store))
    }

    pub fn paths(&self) -> &PlatformPaths {
        &self.paths
    }

    pub fn store(&self) -> Arc<dyn StateStore> {
        Arc::clone(&self.store)
    }

    /// Root directory of toolchain `name`.
    pub fn root(&self, name: &str) -> PathBuf {
        self.paths.toolchain_dir(name)
    }

    /// Archive cache directory of toolchain `name`.
    pub fn cache_dir(&self, name: &str) -> PathBuf {
        self.paths.toolchain_cache_dir(name)
    }

    /// Whether the root directory of `name` exists.
    pub fn exists(&self, name: &str) -> bool {
        self.root(name).is_dir()
    }

    /// Create toolchain `name` and return its root.
    ///
    /// Fails with `AlreadyExists` if the root directory is already there.
    /// The configuration file is not touched.
    pub fn create(&self, name: &str) -> Result<PathBuf> {
        validate_name("toolchain", name)?;

        let root = self.root(name);
        if root.exists() {
            return Err(ToolchainError::AlreadyExists {
                name: name.to_string(),
                path: root,
            });
        }

        ensure_dir(&root)?;
        ensure_dir(&self.cache_dir(name))?;
        tracing::info!("Toolchain initialized in: {}", root.display());
        Ok(root)
    }

    /// Load toolchain `name`, creating its root directory if needed.
    pub fn load(&self, name: &str) -> Result<Toolchain> {
        Toolchain::load(name, &self.paths, Arc::clone(&self.store))
    }

    /// Load toolchain `name`, which must already exist.
    pub fn open(&self, name: &str) -> Result<Toolchain> {
        validate_name("toolchain", name)?;
        if !self.exists(name) {
            return Err(ToolchainError::NoSuchToolchain {
                name: name.to_string(),
                path: self.root(name),
            });
        }
        self.load(name)
    }

    /// Names of all toolchains, sorted.
    pub fn list(&self) -> Result<Vec<String>> {
        visible_subdirs(&self.paths.toolchains_dir())
    }
}
