//! The [`GitRepo`] trait: the boundary between the registry tool and git.
//!
//! | Group      | Methods                          | Replaces                       |
//! |------------|----------------------------------|--------------------------------|
//! | Tree query | `tree_hash`                      | `git rev-parse HEAD:<path>`    |
//! | Staging    | `stage`, `unstage_removed`       | `git add`, `git rm --cached`   |
//! | Index diff | `has_staged_changes`             | `git diff --cached --quiet`    |
//! | History    | `commit`, `amend`                | `git commit`, `--amend`        |
//!
//! Paths may be absolute (inside the working tree) or relative to the
//! working tree root.

use std::path::Path;

use crate::error::GitError;
use crate::types::{ExecutionMode, GitOid};

/// Git operations the registry tool needs.
///
/// Object-safe; callers hold `&dyn GitRepo` so tests can substitute an
/// in-memory double.
pub trait GitRepo {
    /// The execution mode this repository handle was opened with.
    fn mode(&self) -> ExecutionMode;

    /// Content-tree id of `path` as committed at `HEAD`.
    ///
    /// Returns `None` when `HEAD` is unborn or `path` is not part of the
    /// committed tree (for instance after a dry-run skipped the commit).
    fn tree_hash(&self, path: &Path) -> Result<Option<GitOid>, GitError>;

    /// Stage `paths`, including deletions beneath them.
    ///
    /// Replaces: `git add -A -- <paths>`.
    fn stage(&self, paths: &[&Path]) -> Result<(), GitError>;

    /// Drop `paths` from the index after the caller deleted them on disk.
    /// Paths that were never tracked are ignored.
    ///
    /// Replaces: `git rm -r --cached --ignore-unmatch -- <paths>`.
    fn unstage_removed(&self, paths: &[&Path]) -> Result<(), GitError>;

    /// Whether the index differs from `HEAD`.
    ///
    /// Replaces: `git diff --cached --quiet`.
    fn has_staged_changes(&self) -> Result<bool, GitError>;

    /// Create a commit from the index.
    ///
    /// In [`ExecutionMode::DryRun`] the command is logged and skipped.
    fn commit(&self, message: &str) -> Result<(), GitError>;

    /// Fold the index into the previous commit, keeping its message.
    ///
    /// In [`ExecutionMode::DryRun`] the command is logged and skipped.
    fn amend(&self) -> Result<(), GitError>;
}
