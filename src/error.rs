//! Registry error types.
//!
//! [`RegistryError`] is the umbrella error returned by every command. Each
//! variant says what went wrong and, where there is one, what to do next.

use std::path::PathBuf;

use registry_git::GitError;
use thiserror::Error;

use crate::github::RemoteError;
use crate::json_file::JsonFileError;
use crate::ledger::LedgerError;
use crate::model::{PortName, ValidationError};
use crate::portfile::PortfileError;

/// Unified error type for registry commands.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// A port name, repository slug or CMake option failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// `add` was asked to create a port that is already present.
    #[error("port '{port}' already exists\n  To fetch a newer upstream commit: vcpkg-registry update {port}")]
    PortExists {
        /// The existing port.
        port: PortName,
    },

    /// The port has neither a directory nor a version history.
    #[error("port '{port}' does not exist\n  To see available ports: vcpkg-registry list")]
    PortNotFound {
        /// The missing port.
        port: PortName,
    },

    /// The port's sources are not pinned to a git ref.
    #[error("port '{port}' cannot be updated: {source}")]
    NotUpdatable {
        /// The port.
        port: PortName,
        /// Why its portfile could not be interpreted.
        source: PortfileError,
    },

    /// Fetching upstream metadata failed.
    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// A version-history or baseline operation failed.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// The port directory is absent from `HEAD` right after committing it.
    #[error("ports/{port} is not part of the HEAD tree\n  Check that the commit succeeded: git log -1 --stat")]
    TreeNotCommitted {
        /// The port.
        port: PortName,
    },

    /// A git operation failed.
    #[error("git error: {0}")]
    Git(#[from] GitError),

    /// Reading or writing a manifest failed.
    #[error(transparent)]
    File(#[from] JsonFileError),

    /// A filesystem operation on the port tree failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// The path being accessed.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },
}

impl RegistryError {
    /// Wrap an I/O error with the path it concerns.
    pub fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| Self::Io { path, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn port() -> PortName {
        PortName::new("foo").unwrap()
    }

    #[test]
    fn port_exists_suggests_update() {
        let msg = RegistryError::PortExists { port: port() }.to_string();
        assert!(msg.contains("'foo' already exists"));
        assert!(msg.contains("vcpkg-registry update foo"));
    }

    #[test]
    fn port_not_found_suggests_list() {
        let msg = RegistryError::PortNotFound { port: port() }.to_string();
        assert!(msg.contains("'foo' does not exist"));
        assert!(msg.contains("vcpkg-registry list"));
    }

    #[test]
    fn not_updatable_explains_latest() {
        let msg = RegistryError::NotUpdatable {
            port: port(),
            source: PortfileError::NotFromGit,
        }
        .to_string();
        assert!(msg.contains("cannot be updated"));
        assert!(msg.contains("--latest"));
    }

    #[test]
    fn validation_is_transparent() {
        let err: RegistryError = PortName::new("Bad").unwrap_err().into();
        assert!(err.to_string().starts_with("invalid port name \"Bad\""));
    }

    #[test]
    fn io_helper_keeps_path() {
        let err = RegistryError::io("/x/y")(std::io::Error::other("boom"));
        assert_eq!(err.to_string(), "I/O error on /x/y: boom");
    }
}
