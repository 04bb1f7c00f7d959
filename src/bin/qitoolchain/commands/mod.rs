//! Command implementations

pub mod add;
pub mod completions;
pub mod create;
pub mod depends;
pub mod doctor;
pub mod info;
pub mod list;
pub mod path;
