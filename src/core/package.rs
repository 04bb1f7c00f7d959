//! Package - a named unit of prebuilt binaries, headers and CMake files.

use std::fmt;

use serde::Serialize;

use crate::core::error::{Result, ToolchainError};

/// A package provided by a toolchain.
///
/// Built from configuration each time a toolchain is loaded; the
/// configuration file is the durable record, not this value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Package {
    /// Package name, also its directory name under the toolchain root.
    pub name: String,

    /// Names of the packages this one depends on, in declaration order.
    /// They need not be installed.
    pub depends: Vec<String>,
}

impl Package {
    /// Create a package with no dependencies.
    pub fn new(name: impl Into<String>) -> Self {
        Package {
            name: name.into(),
            depends: Vec::new(),
        }
    }

    /// Set the dependency list.
    pub fn with_depends(mut self, depends: Vec<String>) -> Self {
        self.depends = depends;
        self
    }
}

impl fmt::Display for Package {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Package {}", self.name)?;
        if !self.depends.is_empty() {
            write!(f, " (depends on: {})", self.depends.join(" "))?;
        }
        Ok(())
    }
}

/// Check that `name` can be used as a single directory name and as a
/// quoted subsection in the configuration file.
///
/// `kind` is "package" or "toolchain" and only appears in the error.
pub fn validate_name(kind: &'static str, name: &str) -> Result<()> {
    let reason = if name.is_empty() {
        Some("name is empty")
    } else if name.starts_with('.') {
        Some("name must not start with `.`")
    } else if name.contains(['/', '\\']) {
        Some("name must not contain path separators")
    } else if name.contains(char::is_whitespace) {
        Some("name must not contain whitespace")
    } else if name.contains(char::is_control) {
        Some("name must not contain control characters")
    } else if name.contains(['"', '[', ']']) {
        Some("name must not contain `\"`, `[` or `]`")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(ToolchainError::InvalidName {
            kind,
            name: name.to_string(),
            reason,
        }),
        None => Ok(()),
    }
}
