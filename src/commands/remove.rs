//! `remove`: delete a port and its version history.

use crate::error::RegistryError;
use crate::ledger::RemoveReport;
use crate::model::PortName;

use super::Registry;

/// What [`Registry::remove`] did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RemoveOutcome {
    /// The port directory existed and was deleted.
    pub port_dir_removed: bool,
    /// Ledger cleanup.
    pub ledger: RemoveReport,
    /// A commit was created (or would have been, in a dry run).
    pub committed: bool,
}

impl Registry<'_> {
    /// Remove a port: its directory, its version history, and its baseline
    /// entry, in a single commit.
    ///
    /// # Errors
    /// [`RegistryError::PortNotFound`] if the port has neither a directory
    /// nor a history; filesystem, git and ledger errors otherwise.
    pub fn remove(&self, port: &PortName) -> Result<RemoveOutcome, RegistryError> {
        self.require_port(port)?;
        tracing::info!(port = %port, "removing port");

        let port_dir = self.layout().port_dir(port);
        let port_dir_removed = port_dir.exists();
        if port_dir_removed {
            tracing::info!(path = %port_dir.display(), "removing port directory");
            std::fs::remove_dir_all(&port_dir).map_err(RegistryError::io(&port_dir))?;
        }
        self.git.unstage_removed(&[&port_dir])?;

        let ledger = self.ledger().remove(port)?;
        let history_path = self.layout().history_path(port);
        self.git.unstage_removed(&[&history_path])?;

        let baseline_path = self.layout().baseline_path();
        if baseline_path.exists() {
            self.stage(&[&baseline_path])?;
        }

        let committed = self.git.has_staged_changes()?;
        if committed {
            self.git.commit(&format!("Removed {port}"))?;
        } else {
            tracing::info!(port = %port, "nothing staged; no commit created");
        }

        Ok(RemoveOutcome {
            port_dir_removed,
            ledger,
            committed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{FakeGit, FakeRemote};
    use crate::config::RegistryConfig;
    use crate::layout::RegistryLayout;
    use crate::manifest::Manifest;
    use tempfile::TempDir;

    fn setup_port(layout: &RegistryLayout, registry: &Registry<'_>, name: &str) -> PortName {
        let port = PortName::new(name).unwrap();
        std::fs::create_dir_all(layout.port_dir(&port)).unwrap();
        Manifest::new(name, "v1", None, &[], &[])
            .write(&layout.manifest_path(&port))
            .unwrap();
        registry.ledger().create(&port, "v1", "t1").unwrap();
        port
    }

    #[test]
    fn remove_deletes_everything_and_commits() {
        let dir = TempDir::new().unwrap();
        let layout = RegistryLayout::new(dir.path());
        let config = RegistryConfig::default();
        let git = FakeGit::default();
        let remote = FakeRemote::failing();
        let registry = Registry::new(layout.clone(), &config, &git, &remote);
        let foo = setup_port(&layout, &registry, "foo");
        let fmt = setup_port(&layout, &registry, "fmt");

        let outcome = registry.remove(&foo).unwrap();

        assert!(outcome.port_dir_removed);
        assert!(outcome.ledger.history_removed);
        assert!(!outcome.ledger.shard_pruned);
        assert!(outcome.ledger.baseline_entry_removed);
        assert!(outcome.committed);
        assert!(!layout.port_dir(&foo).exists());
        assert!(layout.port_dir(&fmt).exists());
        assert!(registry.ledger().baseline_version(&foo).unwrap().is_none());
        assert_eq!(
            registry.ledger().baseline_version(&fmt).unwrap().as_deref(),
            Some("v1")
        );

        let calls = git.calls();
        assert_eq!(calls.len(), 4);
        assert!(calls[0].starts_with("unstage ") && calls[0].ends_with("ports/foo"));
        assert!(calls[1].ends_with("f-/foo.json"));
        assert!(calls[2].ends_with("baseline.json"));
        assert_eq!(calls[3], "commit Removed foo");
        assert!(remote.requests.borrow().is_empty());
    }

    #[test]
    fn remove_history_only_port() {
        let dir = TempDir::new().unwrap();
        let layout = RegistryLayout::new(dir.path());
        let config = RegistryConfig::default();
        let git = FakeGit::default();
        let remote = FakeRemote::failing();
        let registry = Registry::new(layout.clone(), &config, &git, &remote);
        let foo = PortName::new("foo").unwrap();
        registry.ledger().create(&foo, "v1", "t1").unwrap();

        let outcome = registry.remove(&foo).unwrap();
        assert!(!outcome.port_dir_removed);
        assert!(outcome.ledger.shard_pruned);
        assert!(!layout.shard_dir(&foo).exists());
    }

    #[test]
    fn remove_unknown_port_fails_without_touching_anything() {
        let dir = TempDir::new().unwrap();
        let layout = RegistryLayout::new(dir.path());
        let config = RegistryConfig::default();
        let git = FakeGit::default();
        let remote = FakeRemote::failing();
        let registry = Registry::new(layout, &config, &git, &remote);

        let err = registry
            .remove(&PortName::new("ghost").unwrap())
            .unwrap_err();
        assert!(matches!(err, RegistryError::PortNotFound { .. }));
        assert!(git.calls().is_empty());
    }
}
