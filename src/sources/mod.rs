//! Package sources.
//!
//! Packages arrive as prebuilt archives; this module unpacks them into a
//! toolchain.

pub mod archive;

pub use archive::{ArchiveFormat, PackageExtractor};
