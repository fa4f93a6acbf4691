//! `update`: move a from-git port to the newest upstream commit.

use crate::error::RegistryError;
use crate::manifest::Manifest;
use crate::model::PortName;
use crate::portfile::Portfile;

use super::Registry;

/// Result of [`Registry::update`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The upstream commit is already published; nothing was written.
    AlreadyUpToDate {
        /// The port's current baseline version.
        version: String,
    },
    /// A new version was published.
    Updated {
        /// The `REF` the portfile pointed at before.
        previous_ref: String,
        /// The new version string.
        version: String,
        /// Content-tree id recorded for it.
        git_tree: String,
    },
}

impl Registry<'_> {
    /// Re-pin a port to the head of `reference` (or the configured default
    /// branch) and publish it as a new version.
    ///
    /// The port is already up to date when the upstream sha equals the
    /// portfile's `REF`, or its version string is the current baseline, or
    /// that version is anywhere in the history. No file is written then.
    ///
    /// # Errors
    /// [`RegistryError::PortNotFound`], [`RegistryError::NotUpdatable`] for
    /// download-latest ports, remote errors, and filesystem/git/ledger errors.
    pub fn update(
        &self,
        port: &PortName,
        reference: Option<&str>,
    ) -> Result<UpdateOutcome, RegistryError> {
        if !self.layout().port_exists(port) {
            return Err(RegistryError::PortNotFound { port: port.clone() });
        }
        tracing::info!(port = %port, "updating port");

        let portfile_path = self.layout().portfile_path(port);
        let mut portfile =
            Portfile::read(&portfile_path).map_err(RegistryError::io(&portfile_path))?;
        let source = portfile
            .git_source()
            .map_err(|source| RegistryError::NotUpdatable {
                port: port.clone(),
                source,
            })?;
        let history = self.ledger().history(port)?;
        let baseline = self.ledger().baseline_version(port)?;

        let commit = self.remote.latest_commit(&source.repo, reference)?;
        let version = commit.version_string();
        tracing::info!(
            url = %source.repo.clone_url(),
            sha = %commit.sha,
            summary = commit.summary(),
            "latest upstream commit"
        );

        if commit.sha == source.reference
            || baseline.as_deref() == Some(version.as_str())
            || history.contains(&version)
        {
            return Ok(UpdateOutcome::AlreadyUpToDate {
                version: baseline.unwrap_or(version),
            });
        }

        let previous_ref = portfile
            .set_ref(&commit.sha)
            .map_err(|source| RegistryError::NotUpdatable {
                port: port.clone(),
                source,
            })?;
        portfile
            .write(&portfile_path)
            .map_err(RegistryError::io(&portfile_path))?;

        let manifest_path = self.layout().manifest_path(port);
        let mut manifest = Manifest::read(&manifest_path)?;
        manifest.version_string.clone_from(&version);
        manifest.write(&manifest_path)?;

        let port_dir = self.layout().port_dir(port);
        self.stage(&[&port_dir])?;
        self.git.commit(&format!("Update {port} to {version}"))?;

        let git_tree = self.committed_tree(port)?;
        self.ledger().append(port, &version, &git_tree)?;

        let history_path = self.layout().history_path(port);
        let baseline_path = self.layout().baseline_path();
        self.stage(&[&history_path, &baseline_path])?;
        self.git.amend()?;

        Ok(UpdateOutcome::Updated {
            previous_ref,
            version,
            git_tree,
        })
    }
}
