//! gix-backed content-tree lookups.

use std::path::Path;

use crate::error::GitError;
use crate::gix_repo::GixRepo;
use crate::types::GitOid;

/// Convert a `gix::ObjectId` (or `&gix::oid`) to a `GitOid`.
fn from_gix_oid(oid: &gix::oid) -> GitOid {
    let mut bytes = [0u8; 20];
    bytes.copy_from_slice(oid.as_bytes());
    GitOid::from_bytes(bytes)
}

/// Object id of `HEAD:<path>`.
///
/// `Ok(None)` only when HEAD is unborn or `path` is absent from HEAD's tree.
/// Failures reading refs or objects are errors.
pub fn tree_hash(repo: &GixRepo, path: &Path) -> Result<Option<GitOid>, GitError> {
    let relative = repo.repo_relative(path)?;

    let mut head = repo
        .repo
        .head()
        .map_err(|e| GitError::BackendError {
            message: format!("failed to read HEAD: {e}"),
        })?;
    if head.is_unborn() {
        tracing::debug!(path = %relative, "HEAD is unborn; no tree");
        return Ok(None);
    }
    let commit = head
        .peel_to_commit_in_place()
        .map_err(|e| GitError::BackendError {
            message: format!("failed to peel HEAD to a commit: {e}"),
        })?;
    let tree = commit
        .tree()
        .map_err(|e| GitError::BackendError {
            message: format!("failed to read HEAD's tree: {e}"),
        })?;
    let entry = tree
        .lookup_entry_by_path(&relative)
        .map_err(|e| GitError::BackendError {
            message: format!("failed to look up {relative} in HEAD: {e}"),
        })?;

    match entry {
        Some(entry) => {
            let oid = from_gix_oid(&entry.object_id());
            tracing::debug!(path = %relative, %oid, "resolved tree hash");
            Ok(Some(oid))
        }
        None => {
            tracing::debug!(path = %relative, "path not in HEAD");
            Ok(None)
        }
    }
}
