//! Toolchain - a named set of installed packages plus a CMake toolchain file.
//!
//! ## Layout
//!
//! Creating the `linux` toolchain gives
//!
//! ```text
//! ~/.local/share/qi/toolchains/linux/                  packages live here
//! ~/.local/share/qi/toolchains/linux/toolchain-linux.cmake
//! ~/.cache/qi/toolchains/linux/packages/               downloaded archives
//! ```
//!
//! and adding `foo` extracts it to `.../toolchains/linux/foo/{lib,include,cmake}`,
//! records it in `~/.config/qi/toolchain.cfg`
//!
//! ```text
//! [toolchain "linux"]
//! provide = foo
//! ```
//!
//! and appends `list(APPEND CMAKE_PREFIX_PATH ".../linux/foo")` to the
//! toolchain file.
//!
//! ## Consistency
//!
//! The configuration file is the source of truth for which packages a
//! toolchain provides. The package list held by a [`Toolchain`] is derived
//! from it once, at load time, and is not refreshed when the file changes
//! underneath. `add_package` updates the configuration and then the
//! toolchain file in two separate steps; a crash between them leaves a
//! provided package without a prefix-path entry (see `ops::doctor`).

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::builder::toolchain_file::ToolchainFileWriter;
use crate::core::error::{Result, ToolchainError};
use crate::core::package::{validate_name, Package};
use crate::sources::archive::PackageExtractor;
use crate::util::config::{modify_config, update_config, ConfigStore};
use crate::util::context::PlatformPaths;
use crate::util::fs::{absolute, ensure_dir};
use crate::util::lock::lock_path_for;
use crate::util::store::StateStore;

const TOOLCHAIN_SECTION: &str = "toolchain";
const PACKAGE_SECTION: &str = "package";
const PROVIDE_KEY: &str = "provide";
const DEPENDS_KEY: &str = "depends";

/// A toolchain loaded from disk.
#[derive(Debug)]
pub struct Toolchain {
    name: String,

    /// Root directory: one subdirectory per package plus the toolchain file.
    path: PathBuf,

    /// Archive cache directory.
    cache_path: PathBuf,

    /// `<path>/toolchain-<name>.cmake`
    toolchain_file: PathBuf,

    /// Global configuration file.
    config_path: PathBuf,

    /// Configuration snapshot taken at load time.
    config: ConfigStore,

    /// Packages derived from `config`.
    packages: Vec<Package>,

    store: Arc<dyn StateStore>,
    extractor: PackageExtractor,
}

impl Toolchain {
    /// Load the toolchain called `name`.
    ///
    /// Creates the root directory if it does not exist. Reads the global
    /// configuration and derives the package list from the toolchain's
    /// `provide` key; a toolchain without one has no packages.
    pub fn load(name: &str, paths: &PlatformPaths, store: Arc<dyn StateStore>) -> Result<Self> {
        validate_name("toolchain", name)?;

        let path = absolute(&paths.toolchain_dir(name))?;
        ensure_dir(&path)?;

        let config_path = paths.config_path();
        let config = ConfigStore::load(store.as_ref(), &config_path)?;
        let packages = derive_packages(&config, name);

        let toolchain = Toolchain {
            name: name.to_string(),
            toolchain_file: path.join(format!("toolchain-{}.cmake", name)),
            path,
            cache_path: paths.toolchain_cache_dir(name),
            config_path,
            config,
            packages,
            store,
            extractor: PackageExtractor::new(paths.lock_timeout()),
        };
        tracing::debug!("loaded toolchain:\n{}", toolchain);
        Ok(toolchain)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Root directory of the toolchain.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory for downloaded package archives.
    pub fn cache_path(&self) -> &Path {
        &self.cache_path
    }

    /// The generated CMake toolchain file.
    pub fn toolchain_file(&self) -> &Path {
        &self.toolchain_file
    }

    /// The global configuration file this toolchain was loaded from.
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Configuration snapshot taken at load time.
    pub fn config(&self) -> &ConfigStore {
        &self.config
    }

    pub fn store(&self) -> &dyn StateStore {
        self.store.as_ref()
    }

    /// Packages known to this toolchain object.
    pub fn packages(&self) -> &[Package] {
        &self.packages
    }

    /// Look up a known package.
    pub fn package(&self, name: &str) -> Option<&Package> {
        self.packages.iter().find(|p| p.name == name)
    }

    /// Installed path of `package_name`.
    ///
    /// Fails with `UnknownPackage` if the package is not in the package list
    /// of this object, even if the configuration file has since gained it.
    pub fn get(&self, package_name: &str) -> Result<PathBuf> {
        if self.package(package_name).is_none() {
            return Err(ToolchainError::UnknownPackage {
                toolchain: self.name.clone(),
                package: package_name.to_string(),
            });
        }
        Ok(self.path.join(package_name))
    }

    /// Install the archive at `archive` as package `name`.
    ///
    /// 1. extract the archive, replacing any previous `<path>/<name>`;
    /// 2. add `name` to the `provide` list if missing;
    /// 3. append a prefix-path entry to the toolchain file;
    /// 4. add the package to the in-memory list.
    ///
    /// Nothing is recorded if extraction fails. Step 3 always appends, so
    /// re-adding a package leaves a repeated entry in the toolchain file.
    pub fn add_package(&mut self, name: &str, archive: &Path) -> Result<PathBuf> {
        validate_name("package", name)?;
        self.check_not_reserved(name)?;
        tracing::info!("Adding package {} to {}", name, self.name);

        let dest = self.extractor.install(&self.path, name, archive)?;
        self.update_provides(name)?;
        ToolchainFileWriter::new(self.store.as_ref()).append_entry(&self.toolchain_file, &dest)?;

        if self.package(name).is_none() {
            self.packages.push(Package::new(name));
        }
        Ok(dest)
    }

    /// Record the dependencies of `package` in the configuration file.
    ///
    /// Like every configuration write, this does not change the package
    /// list of this object.
    pub fn set_depends(&self, package: &str, depends: &[String]) -> Result<()> {
        validate_name("package", package)?;
        for dep in depends {
            validate_name("package", dep)?;
        }
        update_config(
            self.store.as_ref(),
            &self.config_path,
            PACKAGE_SECTION,
            package,
            DEPENDS_KEY,
            &depends.join(" "),
        )
    }

    /// Package directories share the root with the toolchain file and its
    /// lock file.
    fn check_not_reserved(&self, package_name: &str) -> Result<()> {
        let reserved = [
            self.toolchain_file.clone(),
            lock_path_for(&self.toolchain_file),
        ];
        let clashes = reserved
            .iter()
            .filter_map(|p| p.file_name())
            .any(|f| f == package_name);
        if clashes {
            return Err(ToolchainError::InvalidName {
                kind: "package",
                name: package_name.to_string(),
                reason: "name is reserved for the toolchain file",
            });
        }
        Ok(())
    }

    fn update_provides(&self, package_name: &str) -> Result<()> {
        modify_config(
            self.store.as_ref(),
            &self.config_path,
            TOOLCHAIN_SECTION,
            &self.name,
            PROVIDE_KEY,
            |current| {
                let mut provided: Vec<&str> = current.unwrap_or("").split_whitespace().collect();
                tracing::debug!(
                    "[{}] toolchain: new package {} providing {}",
                    self.name,
                    package_name,
                    provided.join(",")
                );
                if provided.contains(&package_name) {
                    return None;
                }
                provided.push(package_name);
                Some(provided.join(" "))
            },
        )
    }
}

/// Build the package list of toolchain `name` from configuration.
fn derive_packages(config: &ConfigStore, name: &str) -> Vec<Package> {
    config
        .get_list(TOOLCHAIN_SECTION, name, PROVIDE_KEY)
        .into_iter()
        .map(|package| {
            let depends = config.get_list(PACKAGE_SECTION, &package, DEPENDS_KEY);
            Package::new(package).with_depends(depends)
        })
        .collect()
}

impl fmt::Display for Toolchain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Toolchain:")?;
        writeln!(f, "  name: {}", self.name)?;
        write!(f, "  packages:")?;
        for package in &self.packages {
            write!(f, "\n    {}", package)?;
        }
        Ok(())
    }
}
