//! Shared utilities

pub mod config;
pub mod context;
pub mod fs;
pub mod lock;
pub mod shell;
pub mod store;

pub use config::ConfigStore;
pub use context::PlatformPaths;
pub use shell::Shell;
pub use store::{FsStore, MemoryStore, StateStore};
