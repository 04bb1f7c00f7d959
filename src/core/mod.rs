//! Core data structures for qitoolchain.
//!
//! This module contains the domain types:
//! - Packages and their dependency lists
//! - Toolchains (installed packages plus the generated toolchain file)
//! - The registry mapping toolchain names to directories
//! - The error taxonomy shared by all of the above

pub mod error;
pub mod package;
pub mod registry;
pub mod toolchain;

pub use error::{Result, ToolchainError};
pub use package::Package;
pub use registry::ToolchainRegistry;
pub use toolchain::Toolchain;
