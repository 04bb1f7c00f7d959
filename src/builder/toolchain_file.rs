//! Generated CMake toolchain file.
//!
//! One line per installed package:
//!
//! ```cmake
//! list(APPEND CMAKE_PREFIX_PATH "/home/me/.local/share/qi/toolchains/linux/foo")
//! ```
//!
//! The file is passed to CMake with `-DCMAKE_TOOLCHAIN_FILE=<file>`. It is
//! append-only: replacing a package appends another line for the same path
//! and nothing is ever pruned.
//!
//! Paths are written between double quotes, so `\`, `"` and `$` are
//! backslash-escaped. Paths that are not valid UTF-8 are refused.

use std::io;
use std::path::{Path, PathBuf};

use crate::core::error::{Result, ToolchainError};
use crate::util::fs::to_posix_path;
use crate::util::store::StateStore;

const ENTRY_PREFIX: &str = "list(APPEND CMAKE_PREFIX_PATH \"";
const ENTRY_SUFFIX: &str = "\")";

/// Writes the toolchain file through a [`StateStore`].
#[derive(Debug, Clone, Copy)]
pub struct ToolchainFileWriter<'a> {
    store: &'a dyn StateStore,
}

impl<'a> ToolchainFileWriter<'a> {
    pub fn new(store: &'a dyn StateStore) -> Self {
        ToolchainFileWriter { store }
    }

    /// Append a prefix-path entry for `package_path` to the file at `path`.
    ///
    /// Existing lines are kept as they are. Duplicates are not filtered.
    pub fn append_entry(&self, path: &Path, package_path: &Path) -> Result<()> {
        let line = prefix_path_line(package_path)?;
        tracing::debug!("{}: {}", path.display(), line);

        self.store.update(
            path,
            Box::new(move |current| {
                let mut contents = current.unwrap_or_default();
                if !contents.is_empty() && !contents.ends_with('\n') {
                    contents.push('\n');
                }
                contents.push_str(&line);
                contents.push('\n');
                Ok(contents)
            }),
        )
    }

    /// Prefix paths listed in the file at `path`, in file order.
    ///
    /// A missing file has no entries. Lines that are not prefix-path
    /// entries are ignored.
    pub fn entries(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let contents = self.store.read(path)?.unwrap_or_default();
        Ok(contents.lines().filter_map(parse_entry).collect())
    }
}

/// The CMake directive adding `package_path` to the prefix path.
pub fn prefix_path_line(package_path: &Path) -> Result<String> {
    if package_path.to_str().is_none() {
        return Err(ToolchainError::fs(
            "cannot write a prefix path entry for",
            package_path,
            io::Error::new(io::ErrorKind::InvalidData, "path is not valid UTF-8"),
        ));
    }
    let escaped = escape(&to_posix_path(package_path));
    Ok(format!("{}{}{}", ENTRY_PREFIX, escaped, ENTRY_SUFFIX))
}

fn escape(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    for c in path.chars() {
        if matches!(c, '\\' | '"' | '$') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn unescape(quoted: &str) -> String {
    let mut out = String::with_capacity(quoted.len());
    let mut chars = quoted.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => out.extend(chars.next()),
            c => out.push(c),
        }
    }
    out
}

fn parse_entry(line: &str) -> Option<PathBuf> {
    line.trim()
        .strip_prefix(ENTRY_PREFIX)
        .and_then(|rest| rest.strip_suffix(ENTRY_SUFFIX))
        .map(|quoted| PathBuf::from(unescape(quoted)))
}
