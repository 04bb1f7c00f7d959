//! Package archive extraction and installation.
//!
//! An archive is unpacked into a hidden staging directory inside the
//! toolchain root, then renamed to `<root>/<package>`. The staging directory
//! is removed on every exit path, and the toolchain is untouched unless the
//! final rename succeeds.
//!
//! Supported formats, detected by content rather than file name:
//! - gzip-compressed tarballs (`.tar.gz`, `.tgz`)
//! - plain tarballs (`.tar`)
//! - zip archives

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::time::Duration;

use flate2::read::GzDecoder;
use tar::Archive;

use crate::core::error::{Result, ToolchainError};
use crate::core::package::validate_name;
use crate::util::fs::{ensure_dir, remove_dir_all_if_exists};
use crate::util::lock::FileLock;

/// Lock file guarding package directories of a toolchain.
pub const INSTALL_LOCK_NAME: &str = ".lock";

const STAGING_PREFIX: &str = ".extract-";

/// Archive container format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    TarGz,
    Tar,
    Zip,
}

impl ArchiveFormat {
    /// Detect the format from the leading bytes of an archive.
    pub fn sniff(header: &[u8]) -> Option<Self> {
        if header.starts_with(&[0x1f, 0x8b]) {
            Some(ArchiveFormat::TarGz)
        } else if header.starts_with(b"PK\x03\x04") || header.starts_with(b"PK\x05\x06") {
            Some(ArchiveFormat::Zip)
        } else if header.len() >= 262 && &header[257..262] == b"ustar" {
            Some(ArchiveFormat::Tar)
        } else {
            None
        }
    }
}

/// Installs package archives into a toolchain directory.
#[derive(Debug, Clone)]
pub struct PackageExtractor {
    lock_timeout: Duration,
}

impl PackageExtractor {
    pub fn new(lock_timeout: Duration) -> Self {
        PackageExtractor { lock_timeout }
    }

    /// Install `archive` as `<toolchain_root>/<package_name>`.
    ///
    /// Any previous installation of the same name is replaced as a whole.
    /// Returns the installed path.
    pub fn install(
        &self,
        toolchain_root: &Path,
        package_name: &str,
        archive: &Path,
    ) -> Result<PathBuf> {
        validate_name("package", package_name)?;
        ensure_dir(toolchain_root)?;

        let staging = tempfile::Builder::new()
            .prefix(STAGING_PREFIX)
            .tempdir_in(toolchain_root)
            .map_err(|e| {
                ToolchainError::fs("failed to create staging directory in", toolchain_root, e)
            })?;
        tracing::debug!(
            "extracting {} into {}",
            archive.display(),
            staging.path().display()
        );

        let unpack_root = staging.path().join("content");
        extract(archive, &unpack_root)?;
        let content = package_root(archive, &unpack_root)?;

        let dest = toolchain_root.join(package_name);
        let _lock = FileLock::acquire(
            &toolchain_root.join(INSTALL_LOCK_NAME),
            self.lock_timeout,
        )?;

        if dest.exists() {
            tracing::debug!("replacing existing {}", dest.display());
            remove_dir_all_if_exists(&dest)?;
        }
        std::fs::rename(&content, &dest)
            .map_err(|e| ToolchainError::fs("failed to move package to", &dest, e))?;

        // `staging` is dropped here and takes whatever is left with it.
        Ok(dest)
    }
}

/// Unpack `archive` into `dest`, which must not exist yet.
pub fn extract(archive: &Path, dest: &Path) -> Result<()> {
    let mut file = File::open(archive)
        .map_err(|e| ToolchainError::extraction_io(archive, "cannot open archive", e))?;

    let mut header = Vec::with_capacity(512);
    let read = Read::by_ref(&mut file).take(512).read_to_end(&mut header);
    read.and_then(|_| file.seek(SeekFrom::Start(0)))
        .map_err(|e| ToolchainError::extraction_io(archive, "cannot read archive", e))?;

    let format = ArchiveFormat::sniff(&header)
        .ok_or_else(|| ToolchainError::extraction(archive, "unrecognized archive format"))?;

    std::fs::create_dir_all(dest)
        .map_err(|e| ToolchainError::fs("failed to create directory", dest, e))?;

    match format {
        ArchiveFormat::TarGz => {
            extract_tar(archive, GzDecoder::new(BufReader::new(file)), dest)
        }
        ArchiveFormat::Tar => extract_tar(archive, BufReader::new(file), dest),
        ArchiveFormat::Zip => extract_zip(archive, file, dest),
    }
}

fn extract_tar<R: Read>(archive_path: &Path, reader: R, dest: &Path) -> Result<()> {
    let mut archive = Archive::new(reader);
    let entries = archive.entries().map_err(|e| {
        ToolchainError::extraction_io(archive_path, "failed to read tarball entries", e)
    })?;

    let mut count = 0usize;
    for entry in entries {
        let mut entry = entry.map_err(|e| {
            ToolchainError::extraction_io(archive_path, "failed to read tarball entry", e)
        })?;
        let entry_path = entry
            .path()
            .map_err(|e| ToolchainError::extraction_io(archive_path, "invalid entry path", e))?
            .into_owned();

        let entry_type = entry.header().entry_type();
        match entry_type {
            tar::EntryType::Directory
            | tar::EntryType::Regular
            | tar::EntryType::Continuous
            | tar::EntryType::Symlink
            | tar::EntryType::Link => {
                let inside = entry.unpack_in(dest).map_err(|e| {
                    ToolchainError::extraction_io(
                        archive_path,
                        format!("failed to extract {}", entry_path.display()),
                        e,
                    )
                })?;
                if !inside {
                    return Err(ToolchainError::extraction(
                        archive_path,
                        format!("entry escapes destination directory: {}", entry_path.display()),
                    ));
                }
                count += 1;
            }
            tar::EntryType::XGlobalHeader | tar::EntryType::XHeader => {}
            _ => {
                tracing::warn!(
                    "skipping unsupported entry type {:?}: {}",
                    entry_type,
                    entry_path.display()
                );
            }
        }
    }

    if count == 0 {
        return Err(ToolchainError::extraction(archive_path, "archive is empty"));
    }
    Ok(())
}

fn extract_zip(archive_path: &Path, file: File, dest: &Path) -> Result<()> {
    let mut archive = zip::ZipArchive::new(BufReader::new(file))
        .map_err(|e| ToolchainError::extraction(archive_path, e.to_string()))?;

    if archive.len() == 0 {
        return Err(ToolchainError::extraction(archive_path, "archive is empty"));
    }

    // `extract` rejects entries whose names escape `dest`.
    archive
        .extract(dest)
        .map_err(|e| ToolchainError::extraction(archive_path, e.to_string()))
}

/// The directory that becomes the package: the archive's single top-level
/// directory, or the whole extraction root when there is not exactly one.
fn package_root(archive: &Path, unpack_root: &Path) -> Result<PathBuf> {
    let mut entries = Vec::new();
    for entry in std::fs::read_dir(unpack_root)
        .map_err(|e| ToolchainError::fs("failed to read directory", unpack_root, e))?
    {
        let entry = entry.map_err(|e| ToolchainError::fs("failed to read directory", unpack_root, e))?;
        entries.push(entry);
    }

    if entries.is_empty() {
        return Err(ToolchainError::extraction(archive, "archive is empty"));
    }

    if let [single] = entries.as_slice() {
        let is_dir = single
            .file_type()
            .map_err(|e| ToolchainError::fs("failed to stat", single.path(), e))?
            .is_dir();
        if is_dir {
            return Ok(single.path());
        }
    }

    tracing::debug!(
        "{} has {} top-level entries, installing them as-is",
        archive.display(),
        entries.len()
    );
    Ok(unpack_root.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{sample_package, tar_gz, write_archive, zip};
    use tempfile::TempDir;

    fn extractor() -> PackageExtractor {
        PackageExtractor::new(Duration::from_secs(1))
    }

    fn staging_dirs(root: &Path) -> Vec<String> {
        std::fs::read_dir(root)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .filter(|n| n.starts_with(STAGING_PREFIX))
            .collect()
    }

    #[test]
    fn test_sniff_formats() {
        assert_eq!(ArchiveFormat::sniff(&tar_gz(&[("a", "b")])), Some(ArchiveFormat::TarGz));
        assert_eq!(ArchiveFormat::sniff(&zip(&[("a", "b")])), Some(ArchiveFormat::Zip));
        assert_eq!(ArchiveFormat::sniff(b"not an archive"), None);

        let mut plain = Vec::new();
        {
            let mut builder = tar::Builder::new(&mut plain);
            let mut header = tar::Header::new_ustar();
            header.set_path("a.txt").unwrap();
            header.set_size(1);
            header.set_cksum();
            builder.append(&header, std::io::Cursor::new(b"x")).unwrap();
            builder.finish().unwrap();
        }
        assert_eq!(ArchiveFormat::sniff(&plain), Some(ArchiveFormat::Tar));
    }

    #[test]
    fn test_install_renames_top_level_dir() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("linux");
        let archive = write_archive(tmp.path(), "foo-1.0.tar.gz", &sample_package("foo-1.0", "v1"));

        let dest = extractor().install(&root, "foo", &archive).unwrap();

        assert_eq!(dest, root.join("foo"));
        assert!(dest.join("lib").is_dir());
        assert!(dest.join("include").is_dir());
        assert!(dest.join("cmake").is_dir());
        assert!(!root.join("foo-1.0").exists());
        assert!(staging_dirs(&root).is_empty());
    }

    #[test]
    fn test_install_overwrites_previous() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("linux");
        let first = write_archive(
            tmp.path(),
            "a1.tar.gz",
            &tar_gz(&[("foo/old.txt", "old"), ("foo/shared.txt", "one")]),
        );
        let second = write_archive(tmp.path(), "a2.tar.gz", &tar_gz(&[("foo/shared.txt", "two")]));

        extractor().install(&root, "foo", &first).unwrap();
        let dest = extractor().install(&root, "foo", &second).unwrap();

        assert!(!dest.join("old.txt").exists());
        assert_eq!(std::fs::read_to_string(dest.join("shared.txt")).unwrap(), "two");
    }

    #[test]
    fn test_install_flat_archive() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("linux");
        let archive = write_archive(
            tmp.path(),
            "bar.tar.gz",
            &tar_gz(&[("lib/libbar.a", "x"), ("include/bar.h", "y")]),
        );

        let dest = extractor().install(&root, "bar", &archive).unwrap();
        assert!(dest.join("lib/libbar.a").is_file());
        assert!(dest.join("include/bar.h").is_file());
    }

    #[test]
    fn test_install_zip() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("win32");
        let archive = write_archive(
            tmp.path(),
            "baz.zip",
            &zip(&[("baz/", ""), ("baz/lib/baz.lib", "x"), ("baz/include/baz.h", "y")]),
        );

        let dest = extractor().install(&root, "baz", &archive).unwrap();
        assert!(dest.join("lib/baz.lib").is_file());
        assert!(dest.join("include/baz.h").is_file());
    }

    #[test]
    fn test_corrupt_archive_leaves_no_trace() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("linux");
        let archive = write_archive(tmp.path(), "foo.tar.gz", b"\x1f\x8bthis is not gzip data");

        let err = extractor().install(&root, "foo", &archive).unwrap_err();
        assert!(matches!(err, ToolchainError::Extraction { .. }));
        assert!(!root.join("foo").exists());
        assert!(staging_dirs(&root).is_empty());
    }

    #[test]
    fn test_unknown_format() {
        let tmp = TempDir::new().unwrap();
        let archive = write_archive(tmp.path(), "foo.rar", b"Rar!\x1a\x07");
        let err = extractor()
            .install(&tmp.path().join("linux"), "foo", &archive)
            .unwrap_err();
        assert!(err.to_string().contains("unrecognized archive format"));
    }

    #[test]
    fn test_missing_archive() {
        let tmp = TempDir::new().unwrap();
        let err = extractor()
            .install(&tmp.path().join("linux"), "foo", &tmp.path().join("nope.tar.gz"))
            .unwrap_err();
        assert!(matches!(err, ToolchainError::Extraction { .. }));
    }

    #[test]
    fn test_failed_reinstall_keeps_previous() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("linux");
        let good = write_archive(tmp.path(), "good.tar.gz", &sample_package("foo", "v1"));
        let bad = write_archive(tmp.path(), "bad.tar.gz", b"garbage");

        extractor().install(&root, "foo", &good).unwrap();
        assert!(extractor().install(&root, "foo", &bad).is_err());

        assert_eq!(
            std::fs::read_to_string(root.join("foo/lib/libfoo.a")).unwrap(),
            "v1"
        );
    }

    #[test]
    fn test_invalid_package_name() {
        let tmp = TempDir::new().unwrap();
        let archive = write_archive(tmp.path(), "foo.tar.gz", &sample_package("foo", "v1"));
        let err = extractor()
            .install(&tmp.path().join("linux"), "../escape", &archive)
            .unwrap_err();
        assert!(matches!(err, ToolchainError::InvalidName { .. }));
    }
}
