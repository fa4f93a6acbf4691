//! The gix-backed implementation of [`GitRepo`].

use std::path::{Component, Path, PathBuf};

use crate::error::GitError;
use crate::repo::GitRepo;
use crate::types::{ExecutionMode, GitOid};

/// A [`GitRepo`] implementation backed by [gix](https://github.com/GitoxideLabs/gitoxide)
/// for reads and the `git` CLI for index and commit writes.
///
/// Construct via [`GixRepo::open`].
pub struct GixRepo {
    pub(crate) repo: gix::Repository,
    pub(crate) workdir: PathBuf,
    pub(crate) mode: ExecutionMode,
}

impl GixRepo {
    /// Open the git repository at or above `path`.
    ///
    /// # Errors
    /// Returns [`GitError::BackendError`] if no repository is found and
    /// [`GitError::Bare`] if it has no working tree.
    pub fn open(path: &Path, mode: ExecutionMode) -> Result<Self, GitError> {
        let repo = gix::discover(path).map_err(|e| GitError::BackendError {
            message: format!("no git repository at or above {}: {e}", path.display()),
        })?;
        let workdir = repo
            .workdir()
            .ok_or_else(|| GitError::Bare {
                path: path.to_path_buf(),
            })?
            .canonicalize()?;
        tracing::debug!(workdir = %workdir.display(), %mode, "opened git repository");
        Ok(Self {
            repo,
            workdir,
            mode,
        })
    }

    /// Root of the working tree.
    #[must_use]
    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// Express `path` relative to the working tree root with `/` separators,
    /// the form both `HEAD:<path>` specs and git pathspecs expect.
    pub(crate) fn repo_relative(&self, path: &Path) -> Result<String, GitError> {
        let relative = if path.is_absolute() {
            path.strip_prefix(&self.workdir)
                .map_err(|_| GitError::OutsideWorktree {
                    path: path.to_path_buf(),
                    workdir: self.workdir.clone(),
                })?
                .to_path_buf()
        } else {
            path.to_path_buf()
        };

        let mut parts = Vec::new();
        for component in relative.components() {
            match component {
                Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
                Component::CurDir => {}
                _ => {
                    return Err(GitError::OutsideWorktree {
                        path: path.to_path_buf(),
                        workdir: self.workdir.clone(),
                    });
                }
            }
        }
        Ok(parts.join("/"))
    }
}

impl GitRepo for GixRepo {
    fn mode(&self) -> ExecutionMode {
        self.mode
    }

    fn tree_hash(&self, path: &Path) -> Result<Option<GitOid>, GitError> {
        crate::tree_impl::tree_hash(self, path)
    }

    fn stage(&self, paths: &[&Path]) -> Result<(), GitError> {
        crate::cli_impl::stage(self, paths)
    }

    fn unstage_removed(&self, paths: &[&Path]) -> Result<(), GitError> {
        crate::cli_impl::unstage_removed(self, paths)
    }

    fn has_staged_changes(&self) -> Result<bool, GitError> {
        crate::cli_impl::has_staged_changes(self)
    }

    fn commit(&self, message: &str) -> Result<(), GitError> {
        crate::cli_impl::commit(self, message)
    }

    fn amend(&self) -> Result<(), GitError> {
        crate::cli_impl::amend(self)
    }
}
