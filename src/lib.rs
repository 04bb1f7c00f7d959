//! qitoolchain - named collections of prebuilt packages for CMake builds
//!
//! This crate provides the library behind the `qitoolchain` tool: the
//! toolchain registry, package installation from archives, the shared
//! configuration file that records which packages each toolchain provides,
//! and the generated CMake toolchain file.

pub mod builder;
pub mod core;
pub mod ops;
pub mod sources;
pub mod util;

/// Test utilities for qitoolchain unit tests.
///
/// This module is only available when compiling with `--cfg test` or
/// running tests. It builds package archives in memory and sets up
/// platform paths inside a temporary home.
#[cfg(test)]
pub mod test_support;

pub use crate::core::{
    error::{Result, ToolchainError},
    package::Package,
    registry::ToolchainRegistry,
    toolchain::Toolchain,
};

pub use util::context::PlatformPaths;
pub use util::store::{FsStore, MemoryStore, StateStore};
