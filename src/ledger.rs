//! Version & baseline ledger.
//!
//! Owns the two persisted structures that describe published port versions:
//!
//! - `versions/<c>-/<name>.json`: the port's **version history**, an
//!   append-only sequence of `{version-string, git-tree}` records, oldest
//!   first.
//! - `versions/baseline.json`: the registry-wide **baseline**, mapping each
//!   port to its current version string.
//!
//! # Invariants
//!
//! - Version strings are unique within a port's history.
//! - `baseline.default[port].baseline` always names a version string present
//!   in that port's history, or the port has no baseline entry.
//! - The ledger is the only writer of both files. Each operation is a
//!   whole-file read-modify-write and every file is replaced atomically.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::json_file::{self, JsonFileError};
use crate::layout::RegistryLayout;
use crate::model::PortName;

/// Baseline key under which this registry's entries live.
pub const DEFAULT_BASELINE: &str = "default";

// ---------------------------------------------------------------------------
// Persisted structures
// ---------------------------------------------------------------------------

/// One published version of a port.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionRecord {
    /// `"latest"` or `"<YYYY-MM-DD>-<short sha>"`.
    #[serde(rename = "version-string")]
    pub version_string: String,
    /// Content-tree id of `ports/<name>` when this version was published.
    #[serde(rename = "git-tree")]
    pub git_tree: String,
}

impl VersionRecord {
    /// Build a record.
    pub fn new(version_string: impl Into<String>, git_tree: impl Into<String>) -> Self {
        Self {
            version_string: version_string.into(),
            git_tree: git_tree.into(),
        }
    }
}

/// Contents of `versions/<c>-/<name>.json`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionHistory {
    /// Records in publication order.
    pub versions: Vec<VersionRecord>,
}

impl VersionHistory {
    /// Find the record for `version_string`.
    #[must_use]
    pub fn find(&self, version_string: &str) -> Option<&VersionRecord> {
        self.versions
            .iter()
            .find(|r| r.version_string == version_string)
    }

    /// Whether `version_string` has been published.
    #[must_use]
    pub fn contains(&self, version_string: &str) -> bool {
        self.find(version_string).is_some()
    }

    /// The most recently published record.
    #[must_use]
    pub fn latest(&self) -> Option<&VersionRecord> {
        self.versions.last()
    }
}

/// A port's entry in the baseline.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaselineEntry {
    /// The current version string.
    pub baseline: String,
    /// Metadata-only revision counter. Never incremented by this tool.
    #[serde(rename = "port-version")]
    pub port_version: u32,
}

/// Contents of `versions/baseline.json`.
///
/// Keys other than [`DEFAULT_BASELINE`] are carried through untouched.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Baseline(pub BTreeMap<String, BTreeMap<String, BaselineEntry>>);

impl Default for Baseline {
    fn default() -> Self {
        let mut sets = BTreeMap::new();
        sets.insert(DEFAULT_BASELINE.to_owned(), BTreeMap::new());
        Self(sets)
    }
}

impl Baseline {
    /// The entry for `port` in the default set.
    #[must_use]
    pub fn get(&self, port: &str) -> Option<&BaselineEntry> {
        self.0.get(DEFAULT_BASELINE)?.get(port)
    }

    /// All entries in the default set, sorted by port name.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &BaselineEntry)> {
        self.0
            .get(DEFAULT_BASELINE)
            .into_iter()
            .flat_map(|set| set.iter().map(|(k, v)| (k.as_str(), v)))
    }

    fn default_set(&mut self) -> &mut BTreeMap<String, BaselineEntry> {
        self.0.entry(DEFAULT_BASELINE.to_owned()).or_default()
    }

    fn remove(&mut self, port: &str) -> Option<BaselineEntry> {
        self.0.get_mut(DEFAULT_BASELINE)?.remove(port)
    }
}

// ---------------------------------------------------------------------------
// Errors and outcomes
// ---------------------------------------------------------------------------

/// Errors from ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// `create` was called for a port that already has a history.
    #[error("version history for '{port}' already exists at {}", path.display())]
    HistoryExists {
        /// The port.
        port: String,
        /// The existing history file.
        path: PathBuf,
    },

    /// The port has no version history.
    #[error("no version history for '{port}' (expected {})", path.display())]
    HistoryMissing {
        /// The port.
        port: String,
        /// Where the history was expected.
        path: PathBuf,
    },

    /// `append` was called with a version string that is already published.
    #[error("version '{version}' of '{port}' is already recorded")]
    DuplicateVersion {
        /// The port.
        port: String,
        /// The duplicate version string.
        version: String,
    },

    /// `refresh_hash` named a version string absent from the history.
    #[error("version '{version}' of '{port}' is not in its version history")]
    VersionNotFound {
        /// The port.
        port: String,
        /// The missing version string.
        version: String,
    },

    /// Reading or writing a ledger file failed.
    #[error(transparent)]
    File(#[from] JsonFileError),

    /// Creating or pruning a shard directory failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// The directory being touched.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },
}

/// Result of [`Ledger::refresh_hash`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The recorded tree hash already matched; nothing was written.
    AlreadyUpToDate,
    /// The record's tree hash was replaced.
    Updated {
        /// The tree hash that was overwritten.
        previous: String,
    },
}

/// What [`Ledger::remove`] actually did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RemoveReport {
    /// The history file existed and was deleted.
    pub history_removed: bool,
    /// The shard directory became empty and was deleted.
    pub shard_pruned: bool,
    /// The baseline held an entry for the port, which was deleted.
    pub baseline_entry_removed: bool,
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

/// Reader/writer for a registry's version files and baseline.
#[derive(Clone, Debug)]
pub struct Ledger {
    layout: RegistryLayout,
}

impl Ledger {
    /// Ledger over the registry described by `layout`.
    #[must_use]
    pub const fn new(layout: RegistryLayout) -> Self {
        Self { layout }
    }

    /// The layout this ledger writes into.
    #[must_use]
    pub const fn layout(&self) -> &RegistryLayout {
        &self.layout
    }

    // -- queries ------------------------------------------------------------

    /// Whether `port` has a version history file.
    #[must_use]
    pub fn has_history(&self, port: &PortName) -> bool {
        self.layout.history_path(port).exists()
    }

    /// Load `port`'s version history.
    ///
    /// # Errors
    /// [`LedgerError::HistoryMissing`] if there is none; file errors otherwise.
    pub fn history(&self, port: &PortName) -> Result<VersionHistory, LedgerError> {
        let path = self.layout.history_path(port);
        json_file::read_opt(&path)?.ok_or_else(|| LedgerError::HistoryMissing {
            port: port.to_string(),
            path,
        })
    }

    /// Load the baseline, or an empty one if the file does not exist.
    ///
    /// # Errors
    /// File errors other than "not found".
    pub fn baseline(&self) -> Result<Baseline, LedgerError> {
        Ok(json_file::read_opt(&self.layout.baseline_path())?.unwrap_or_default())
    }

    /// The baseline version string for `port`, if it has one.
    ///
    /// # Errors
    /// File errors reading the baseline.
    pub fn baseline_version(&self, port: &PortName) -> Result<Option<String>, LedgerError> {
        Ok(self
            .baseline()?
            .get(port.as_str())
            .map(|entry| entry.baseline.clone()))
    }

    // -- mutations ----------------------------------------------------------

    /// Start `port`'s history with a single record and point the baseline
    /// at it with `port-version` 0.
    ///
    /// # Errors
    /// [`LedgerError::HistoryExists`] if the port already has a history (no
    /// file is written in that case); I/O errors otherwise.
    pub fn create(
        &self,
        port: &PortName,
        version_string: &str,
        tree_hash: &str,
    ) -> Result<(), LedgerError> {
        let history_path = self.layout.history_path(port);
        if history_path.exists() {
            return Err(LedgerError::HistoryExists {
                port: port.to_string(),
                path: history_path,
            });
        }

        let mut baseline = self.baseline()?;

        let shard = self.layout.shard_dir(port);
        std::fs::create_dir_all(&shard).map_err(|source| LedgerError::Io {
            path: shard.clone(),
            source,
        })?;

        let history = VersionHistory {
            versions: vec![VersionRecord::new(version_string, tree_hash)],
        };
        tracing::info!(path = %history_path.display(), "writing version history");
        json_file::write_atomic(&history_path, &history)?;

        baseline.default_set().insert(
            port.to_string(),
            BaselineEntry {
                baseline: version_string.to_owned(),
                port_version: 0,
            },
        );
        self.write_baseline(&baseline)
    }

    /// Publish a new version: append it to the history and make it the
    /// baseline. `port-version` is left as it was.
    ///
    /// Whether the update is needed at all is for the caller to decide
    /// beforehand; this always writes.
    ///
    /// # Errors
    /// [`LedgerError::HistoryMissing`] if the port has no history,
    /// [`LedgerError::DuplicateVersion`] if `version_string` is already
    /// recorded (nothing is written in either case); I/O errors otherwise.
    pub fn append(
        &self,
        port: &PortName,
        version_string: &str,
        tree_hash: &str,
    ) -> Result<(), LedgerError> {
        let mut history = self.history(port)?;
        if history.contains(version_string) {
            return Err(LedgerError::DuplicateVersion {
                port: port.to_string(),
                version: version_string.to_owned(),
            });
        }
        let mut baseline = self.baseline()?;

        history
            .versions
            .push(VersionRecord::new(version_string, tree_hash));
        let history_path = self.layout.history_path(port);
        tracing::info!(path = %history_path.display(), "updating version history");
        json_file::write_atomic(&history_path, &history)?;

        baseline
            .default_set()
            .entry(port.to_string())
            .and_modify(|entry| version_string.clone_into(&mut entry.baseline))
            .or_insert_with(|| BaselineEntry {
                baseline: version_string.to_owned(),
                port_version: 0,
            });
        self.write_baseline(&baseline)
    }

    /// Re-point an existing record at a new tree hash, for recipe edits that
    /// do not change the version string.
    ///
    /// # Errors
    /// [`LedgerError::HistoryMissing`] if the port has no history,
    /// [`LedgerError::VersionNotFound`] if no record carries
    /// `version_string`; I/O errors otherwise.
    pub fn refresh_hash(
        &self,
        port: &PortName,
        version_string: &str,
        tree_hash: &str,
    ) -> Result<RefreshOutcome, LedgerError> {
        let mut history = self.history(port)?;
        let Some(record) = history
            .versions
            .iter_mut()
            .find(|r| r.version_string == version_string)
        else {
            return Err(LedgerError::VersionNotFound {
                port: port.to_string(),
                version: version_string.to_owned(),
            });
        };

        if record.git_tree == tree_hash {
            return Ok(RefreshOutcome::AlreadyUpToDate);
        }
        let previous = std::mem::replace(&mut record.git_tree, tree_hash.to_owned());

        let history_path = self.layout.history_path(port);
        tracing::info!(
            path = %history_path.display(),
            version = version_string,
            %previous,
            "updating git-tree"
        );
        json_file::write_atomic(&history_path, &history)?;
        Ok(RefreshOutcome::Updated { previous })
    }

    /// Delete `port`'s history (pruning its shard directory if that leaves
    /// it empty) and its baseline entry. The baseline file is only rewritten
    /// when it actually held an entry for the port.
    ///
    /// # Errors
    /// I/O errors.
    pub fn remove(&self, port: &PortName) -> Result<RemoveReport, LedgerError> {
        let mut report = RemoveReport::default();

        let history_path = self.layout.history_path(port);
        match std::fs::remove_file(&history_path) {
            Ok(()) => {
                tracing::info!(path = %history_path.display(), "removed version history");
                report.history_removed = true;
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(source) => {
                return Err(LedgerError::Io {
                    path: history_path,
                    source,
                });
            }
        }

        report.shard_pruned = prune_if_empty(&self.layout.shard_dir(port))?;

        let baseline_path = self.layout.baseline_path();
        if let Some(mut baseline) = json_file::read_opt::<Baseline>(&baseline_path)?
            && baseline.remove(port.as_str()).is_some()
        {
            self.write_baseline(&baseline)?;
            report.baseline_entry_removed = true;
        }

        Ok(report)
    }

    fn write_baseline(&self, baseline: &Baseline) -> Result<(), LedgerError> {
        let path = self.layout.baseline_path();
        let dir = self.layout.versions_dir();
        std::fs::create_dir_all(&dir).map_err(|source| LedgerError::Io { path: dir, source })?;
        tracing::info!(path = %path.display(), "writing baseline");
        json_file::write_atomic(&path, baseline)?;
        Ok(())
    }
}

/// Remove `dir` if it exists and is empty. Returns whether it was removed.
fn prune_if_empty(dir: &Path) -> Result<bool, LedgerError> {
    let io_err = |source| LedgerError::Io {
        path: dir.to_path_buf(),
        source,
    };
    let mut entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(io_err(e)),
    };
    if entries.next().is_some() {
        return Ok(false);
    }
    tracing::info!(path = %dir.display(), "removing empty shard directory");
    std::fs::remove_dir(dir).map_err(io_err)?;
    Ok(true)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
