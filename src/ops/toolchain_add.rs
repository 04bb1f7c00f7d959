//! Implementation of `qitoolchain add`.

use std::path::PathBuf;

use crate::core::error::Result;
use crate::core::registry::ToolchainRegistry;

/// Options for adding a package to a toolchain.
#[derive(Debug, Clone)]
pub struct AddOptions {
    /// Toolchain name
    pub toolchain: String,

    /// Package name, also the directory name under the toolchain root
    pub package: String,

    /// Path to the package archive
    pub archive: PathBuf,

    /// Dependencies to record for the package, if any
    pub depends: Vec<String>,
}

/// Result of adding a package.
#[derive(Debug, Clone)]
pub struct AddResult {
    /// Where the package was installed
    pub path: PathBuf,

    /// The generated toolchain file that now references it
    pub toolchain_file: PathBuf,

    /// Whether the toolchain already provided a package of that name
    pub replaced: bool,
}

/// Install a package archive into a toolchain.
///
/// The toolchain is loaded (and its root created) if needed. Dependencies
/// are recorded after the package itself so that a failed extraction
/// records nothing.
pub fn add_package(registry: &ToolchainRegistry, opts: &AddOptions) -> Result<AddResult> {
    let mut toolchain = registry.load(&opts.toolchain)?;
    let replaced = toolchain.package(&opts.package).is_some();

    let path = toolchain.add_package(&opts.package, &opts.archive)?;
    if !opts.depends.is_empty() {
        toolchain.set_depends(&opts.package, &opts.depends)?;
    }

    Ok(AddResult {
        path,
        toolchain_file: toolchain.toolchain_file().to_path_buf(),
        replaced,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{sample_package, write_archive, TestHome};
    use crate::util::store::MemoryStore;
    use std::sync::Arc;

    fn opts(archive: PathBuf, depends: &[&str]) -> AddOptions {
        AddOptions {
            toolchain: "linux".to_string(),
            package: "foo".to_string(),
            archive,
            depends: depends.iter().map(|d| d.to_string()).collect(),
        }
    }

    #[test]
    fn test_add_then_replace() {
        let home = TestHome::new();
        let registry = ToolchainRegistry::new(home.paths.clone(), Arc::new(MemoryStore::new()));
        let archive = write_archive(home.path(), "foo.tar.gz", &sample_package("foo", "v1"));

        let first = add_package(&registry, &opts(archive.clone(), &[])).unwrap();
        assert!(!first.replaced);
        assert!(first.path.join("include/foo.h").is_file());

        let second = add_package(&registry, &opts(archive, &[])).unwrap();
        assert!(second.replaced);
        assert_eq!(first.path, second.path);
    }

    #[test]
    fn test_add_records_depends() {
        let home = TestHome::new();
        let registry = ToolchainRegistry::new(home.paths.clone(), Arc::new(MemoryStore::new()));
        let archive = write_archive(home.path(), "foo.tar.gz", &sample_package("foo", "v1"));

        add_package(&registry, &opts(archive, &["bar", "baz"])).unwrap();

        let tc = registry.open("linux").unwrap();
        assert_eq!(tc.package("foo").unwrap().depends, vec!["bar", "baz"]);
    }

    #[test]
    fn test_failed_add_records_no_depends() {
        let home = TestHome::new();
        let store = Arc::new(MemoryStore::new());
        let registry = ToolchainRegistry::new(home.paths.clone(), store.clone());
        let archive = write_archive(home.path(), "foo.tar.gz", b"garbage");

        assert!(add_package(&registry, &opts(archive, &["bar"])).is_err());
        assert!(store.paths().is_empty());
    }
}
