//! Command orchestration.
//!
//! Each subcommand sequences remote lookups, port-file writes, git staging
//! and commits, and ledger mutations. Every command that mutates the
//! registry follows the same two-step shape: commit the port directory,
//! read its content-tree id from `HEAD`, record it in the ledger, then fold
//! the ledger files into the same commit.

pub mod add;
pub mod list;
pub mod remove;
pub mod update;
pub mod update_versions;

use std::path::Path;

use registry_git::GitRepo;

use crate::config::RegistryConfig;
use crate::error::RegistryError;
use crate::github::MetadataSource;
use crate::layout::RegistryLayout;
use crate::ledger::Ledger;
use crate::model::PortName;

/// Everything a mutating command needs.
pub struct Registry<'a> {
    ledger: Ledger,
    config: &'a RegistryConfig,
    git: &'a dyn GitRepo,
    remote: &'a dyn MetadataSource,
}

impl<'a> Registry<'a> {
    /// Bind a registry root to its git repository and metadata source.
    pub fn new(
        layout: RegistryLayout,
        config: &'a RegistryConfig,
        git: &'a dyn GitRepo,
        remote: &'a dyn MetadataSource,
    ) -> Self {
        Self {
            ledger: Ledger::new(layout),
            config,
            git,
            remote,
        }
    }

    /// The registry's on-disk layout.
    #[must_use]
    pub const fn layout(&self) -> &RegistryLayout {
        self.ledger.layout()
    }

    /// The registry's version ledger.
    #[must_use]
    pub const fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// A port exists when it has a directory or a version history.
    fn require_port(&self, port: &PortName) -> Result<(), RegistryError> {
        if self.layout().port_exists(port) || self.ledger.has_history(port) {
            Ok(())
        } else {
            Err(RegistryError::PortNotFound { port: port.clone() })
        }
    }

    /// Content-tree id of `ports/<port>` at `HEAD`, as recorded in the ledger.
    ///
    /// A dry run never commits, so the tree is either HEAD's (possibly stale)
    /// or absent for a brand-new port; the latter is recorded as an empty
    /// string rather than failing the whole run. Both cases log a warning.
    fn committed_tree(&self, port: &PortName) -> Result<String, RegistryError> {
        let dir = self.layout().port_dir(port);
        match self.git.tree_hash(&dir)? {
            Some(oid) => {
                if self.git.mode().is_dry_run() {
                    tracing::warn!(
                        port = %port,
                        tree = %oid,
                        "nothing was committed [--dry-run]; recording HEAD's git-tree, which may be stale"
                    );
                } else {
                    tracing::info!(port = %port, tree = %oid, "git tree");
                }
                Ok(oid.to_hex())
            }
            None if self.git.mode().is_dry_run() => {
                tracing::warn!(
                    port = %port,
                    "port is not committed [--dry-run]; recording an empty git-tree"
                );
                Ok(String::new())
            }
            None => Err(RegistryError::TreeNotCommitted { port: port.clone() }),
        }
    }

    fn stage(&self, paths: &[&Path]) -> Result<(), RegistryError> {
        self.git.stage(paths)?;
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::{Arc, Mutex};

    use tempfile::TempDir;

    use super::Registry;
    use super::testing::{FakeGit, FakeRemote};
    use crate::config::RegistryConfig;
    use crate::layout::RegistryLayout;
    use crate::model::PortName;

    /// Log sink shared between the subscriber and the test.
    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Captured {
        fn text(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    /// Resolve the committed tree of `foo` with logs captured at WARN.
    fn tree_with_logs(git: &FakeGit) -> (String, String) {
        let dir = TempDir::new().unwrap();
        let layout = RegistryLayout::new(dir.path());
        let config = RegistryConfig::default();
        let remote = FakeRemote::new("abc1234", "2024-01-01T00:00:00Z");
        let port = PortName::new("foo").unwrap();
        git.set_tree(&layout.port_dir(&port), 0xab);

        let logs = Captured::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        let tree = tracing::subscriber::with_default(subscriber, || {
            Registry::new(layout, &config, git, &remote)
                .committed_tree(&port)
                .unwrap()
        });
        (tree, logs.text())
    }

    #[test]
    fn dry_run_warns_when_recording_head_tree() {
        let (tree, logs) = tree_with_logs(&FakeGit::dry_run());
        assert_eq!(tree, "ab".repeat(20));
        assert!(logs.contains("may be stale"), "{logs}");
    }

    #[test]
    fn live_tree_lookup_does_not_warn() {
        let (tree, logs) = tree_with_logs(&FakeGit::default());
        assert_eq!(tree, "ab".repeat(20));
        assert!(!logs.contains("WARN"), "{logs}");
    }
}
