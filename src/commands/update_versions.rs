//! `update-versions`: re-record a port's tree after editing its recipe by hand.

use crate::error::RegistryError;
use crate::ledger::RefreshOutcome;
use crate::manifest::Manifest;
use crate::model::PortName;

use super::Registry;

/// Result of [`Registry::update_versions`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UpdateVersionsOutcome {
    /// The history already records the committed tree.
    AlreadyUpToDate {
        /// The manifest's version string.
        version: String,
    },
    /// The history record now points at the committed tree.
    Updated {
        /// The manifest's version string.
        version: String,
        /// The tree id that was replaced.
        previous_tree: String,
        /// The tree id now recorded.
        git_tree: String,
    },
}

impl Registry<'_> {
    /// Commit the port directory as it is on disk and point the history
    /// record for the manifest's current version at the resulting tree.
    ///
    /// # Errors
    /// [`RegistryError::PortNotFound`]; a ledger `VersionNotFound` error if
    /// the manifest names a version that was never published; filesystem
    /// and git errors otherwise.
    pub fn update_versions(&self, port: &PortName) -> Result<UpdateVersionsOutcome, RegistryError> {
        self.require_port(port)?;
        let manifest = Manifest::read(&self.layout().manifest_path(port))?;
        let version = manifest.version_string;

        let message = format!(
            "Update {port} {version} ({})",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
        );
        let port_dir = self.layout().port_dir(port);
        self.stage(&[&port_dir])?;
        let committed = self.git.has_staged_changes()?;
        if committed {
            self.git.commit(&message)?;
        } else {
            tracing::info!(port = %port, "port directory unchanged since HEAD");
        }

        let git_tree = self.committed_tree(port)?;
        let previous_tree = match self.ledger().refresh_hash(port, &version, &git_tree)? {
            RefreshOutcome::AlreadyUpToDate => {
                return Ok(UpdateVersionsOutcome::AlreadyUpToDate { version });
            }
            RefreshOutcome::Updated { previous } => previous,
        };

        self.stage(&[&self.layout().history_path(port)])?;
        if committed {
            self.git.amend()?;
        } else {
            self.git.commit(&message)?;
        }

        Ok(UpdateVersionsOutcome::Updated {
            version,
            previous_tree,
            git_tree,
        })
    }
}
