//! High-level operations.
//!
//! This module contains the implementation of qitoolchain commands that do
//! more than call a single registry or toolchain method.

pub mod doctor;
pub mod toolchain_add;
pub mod toolchain_info;

pub use doctor::{doctor, format_report, CheckResult, DoctorReport};
pub use toolchain_add::{add_package, AddOptions, AddResult};
pub use toolchain_info::ToolchainInfo;
