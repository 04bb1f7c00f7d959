//! Implementation of `qitoolchain info`.

use std::path::PathBuf;

use serde::Serialize;

use crate::core::package::Package;
use crate::core::toolchain::Toolchain;

/// Machine-readable description of a loaded toolchain.
#[derive(Debug, Clone, Serialize)]
pub struct ToolchainInfo {
    pub name: String,
    pub path: PathBuf,
    pub toolchain_file: PathBuf,
    pub cache_path: PathBuf,
    pub packages: Vec<Package>,
}

impl ToolchainInfo {
    pub fn from_toolchain(toolchain: &Toolchain) -> Self {
        ToolchainInfo {
            name: toolchain.name().to_string(),
            path: toolchain.path().to_path_buf(),
            toolchain_file: toolchain.toolchain_file().to_path_buf(),
            cache_path: toolchain.cache_path().to_path_buf(),
            packages: toolchain.packages().to_vec(),
        }
    }
}

/// Pretty-printed JSON for `info --json`.
pub fn to_json(info: &ToolchainInfo) -> serde_json::Result<String> {
    serde_json::to_string_pretty(info)
}
