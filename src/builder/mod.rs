//! Build-tool integration.
//!
//! Installed packages are handed to CMake through a generated toolchain file.

pub mod toolchain_file;

pub use toolchain_file::ToolchainFileWriter;
