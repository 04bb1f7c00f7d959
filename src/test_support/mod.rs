//! Test utilities: in-memory package archives and toolchain fixtures.

use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use flate2::write::GzEncoder;
use flate2::Compression;
use tempfile::TempDir;

use crate::util::context::PlatformPaths;

/// Build a `.tar.gz` archive. Paths ending in `/` become directories.
pub fn tar_gz(entries: &[(&str, &str)]) -> Vec<u8> {
    let mut data = Vec::new();
    {
        let encoder = GzEncoder::new(&mut data, Compression::default());
        let mut builder = tar::Builder::new(encoder);

        for (path, contents) in entries {
            let mut header = tar::Header::new_gnu();
            header.set_path(path).unwrap();
            if path.ends_with('/') {
                header.set_size(0);
                header.set_mode(0o755);
                header.set_entry_type(tar::EntryType::Directory);
                header.set_cksum();
                builder.append(&header, std::io::empty()).unwrap();
            } else {
                header.set_size(contents.len() as u64);
                header.set_mode(0o644);
                header.set_cksum();
                builder
                    .append(&header, Cursor::new(contents.as_bytes()))
                    .unwrap();
            }
        }

        builder.into_inner().unwrap().finish().unwrap();
    }
    data
}

/// Build a `.zip` archive. Paths ending in `/` become directories.
pub fn zip(entries: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = zip::write::SimpleFileOptions::default();

    for (path, contents) in entries {
        if path.ends_with('/') {
            writer.add_directory(*path, options).unwrap();
        } else {
            writer.start_file(*path, options).unwrap();
            writer.write_all(contents.as_bytes()).unwrap();
        }
    }

    writer.finish().unwrap().into_inner()
}

/// A typical `-dev` style package: `<top>/{lib,include,cmake}`.
pub fn sample_package(top: &str, marker: &str) -> Vec<u8> {
    let lib = format!("{top}/lib/lib{top}.a");
    let header = format!("{top}/include/{top}.h");
    let config = format!("{top}/cmake/{top}-config.cmake");
    tar_gz(&[
        (&format!("{top}/"), ""),
        (&lib, marker),
        (&header, "#pragma once\n"),
        (&config, "set(FOUND TRUE)\n"),
    ])
}

/// Write archive bytes to `dir/file_name` and return the path.
pub fn write_archive(dir: &Path, file_name: &str, data: &[u8]) -> PathBuf {
    let path = dir.join(file_name);
    std::fs::write(&path, data).unwrap();
    path
}

/// A temporary home directory with platform paths rooted in it.
pub struct TestHome {
    pub dir: TempDir,
    pub paths: PlatformPaths,
}

impl TestHome {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let paths = PlatformPaths::from_home(dir.path());
        TestHome { dir, paths }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}
