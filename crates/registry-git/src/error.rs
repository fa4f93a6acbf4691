//! Error types for git operations.
//!
//! [`GitError`] is the single error type returned by all
//! [`GitRepo`](crate::GitRepo) methods.

use std::path::PathBuf;

use thiserror::Error;

/// Errors returned by [`GitRepo`](crate::GitRepo) operations.
#[derive(Debug, Error)]
pub enum GitError {
    /// The path handed to the repository is not inside its working tree.
    #[error("path {} is outside the working tree {}", path.display(), workdir.display())]
    OutsideWorktree {
        /// The offending path.
        path: PathBuf,
        /// The working tree root.
        workdir: PathBuf,
    },

    /// The repository has no working tree (bare repository).
    #[error("repository at {} has no working tree", path.display())]
    Bare {
        /// Path the repository was opened from.
        path: PathBuf,
    },

    /// A `git` subprocess exited unsuccessfully.
    #[error("`{command}` failed{}: {stderr}", exit_code.map(|c| format!(" (exit code {c})")).unwrap_or_default())]
    Command {
        /// The command line that was run.
        command: String,
        /// Trimmed stderr output.
        stderr: String,
        /// Process exit code, if the process exited normally.
        exit_code: Option<i32>,
    },

    /// An I/O error occurred (process spawn, file system).
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// gix returned an error that does not fit the other variants.
    #[error("git backend error: {message}")]
    BackendError {
        /// Freeform error description from the backend.
        message: String,
    },
}
