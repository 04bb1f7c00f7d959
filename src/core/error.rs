//! Error types for toolchain operations.

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

/// Result alias used throughout the library.
pub type Result<T, E = ToolchainError> = std::result::Result<T, E>;

/// Error raised by toolchain, registry and config operations.
#[derive(Debug, Error)]
pub enum ToolchainError {
    #[error("{} already exists, please choose another toolchain name", path.display())]
    AlreadyExists { name: String, path: PathBuf },

    #[error("no such toolchain: `{name}` (expected at {})", path.display())]
    NoSuchToolchain { name: String, path: PathBuf },

    #[error("invalid {kind} name `{name}`: {reason}")]
    InvalidName {
        kind: &'static str,
        name: String,
        reason: &'static str,
    },

    #[error("no such package: `{package}` in toolchain `{toolchain}`")]
    UnknownPackage { toolchain: String, package: String },

    #[error("failed to extract {}: {message}", archive.display())]
    Extraction {
        archive: PathBuf,
        message: String,
        #[source]
        source: Option<io::Error>,
    },

    #[error("{action} {}", path.display())]
    Filesystem {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed config file {}:{line}: {message}", path.display())]
    ConfigRead {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("timed out after {}s waiting for lock on {}", timeout.as_secs_f32(), path.display())]
    LockTimeout { path: PathBuf, timeout: Duration },
}

impl ToolchainError {
    /// Wrap an I/O error with the action that failed and the path involved.
    pub fn fs(action: &'static str, path: impl AsRef<Path>, source: io::Error) -> Self {
        ToolchainError::Filesystem {
            action,
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// An extraction failure with no underlying I/O error.
    pub fn extraction(archive: impl AsRef<Path>, message: impl Into<String>) -> Self {
        ToolchainError::Extraction {
            archive: archive.as_ref().to_path_buf(),
            message: message.into(),
            source: None,
        }
    }

    /// An extraction failure caused by an I/O error while reading the archive.
    pub fn extraction_io(
        archive: impl AsRef<Path>,
        message: impl Into<String>,
        source: io::Error,
    ) -> Self {
        ToolchainError::Extraction {
            archive: archive.as_ref().to_path_buf(),
            message: message.into(),
            source: Some(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = ToolchainError::UnknownPackage {
            toolchain: "linux".to_string(),
            package: "foo".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "no such package: `foo` in toolchain `linux`"
        );

        let err = ToolchainError::ConfigRead {
            path: PathBuf::from("/tmp/toolchain.cfg"),
            line: 3,
            message: "expected `key = value`".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "malformed config file /tmp/toolchain.cfg:3: expected `key = value`"
        );
    }

    #[test]
    fn test_fs_error_keeps_source() {
        use std::error::Error as _;

        let io = io::Error::new(io::ErrorKind::PermissionDenied, "denied");
        let err = ToolchainError::fs("failed to remove", "/opt/tc/foo", io);
        assert_eq!(err.to_string(), "failed to remove /opt/tc/foo");
        assert!(err.source().is_some());
    }
}
