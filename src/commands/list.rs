//! `list`: show every port with its current version.

use serde::Serialize;

use crate::error::RegistryError;
use crate::ledger::Ledger;
use crate::manifest::Manifest;
use crate::model::PortName;

/// One row of `list` output.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PortSummary {
    /// Port directory name.
    pub name: String,
    /// `version-string` from the port's manifest.
    pub version: Option<String>,
    /// The port's baseline version.
    pub baseline: Option<String>,
    /// Number of records in the port's version history.
    pub versions: usize,
}

impl PortSummary {
    /// `name (version)`.
    #[must_use]
    pub fn to_line(&self) -> String {
        format!(
            "{} ({})",
            self.name,
            self.version.as_deref().unwrap_or("no manifest")
        )
    }
}

/// Summaries of every directory under `ports/`, sorted by name. An absent
/// `ports/` directory yields an empty list.
///
/// # Errors
/// I/O errors listing `ports/`, and malformed manifests or ledger files.
pub fn list_ports(ledger: &Ledger) -> Result<Vec<PortSummary>, RegistryError> {
    let ports_dir = ledger.layout().ports_dir();
    let entries = match std::fs::read_dir(&ports_dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(RegistryError::io(&ports_dir)(e)),
    };

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(RegistryError::io(&ports_dir))?;
        if entry.path().is_dir() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    names.sort();

    let baseline = ledger.baseline()?;
    let mut summaries = Vec::with_capacity(names.len());
    for name in names {
        let manifest_path = ports_dir.join(&name).join(crate::layout::MANIFEST);
        let version = crate::json_file::read_opt::<Manifest>(&manifest_path)?
            .map(|m| m.version_string);
        let versions = match PortName::new(&name) {
            Ok(port) if ledger.has_history(&port) => ledger.history(&port)?.versions.len(),
            Ok(_) => 0,
            Err(e) => {
                tracing::warn!(dir = %name, "{e}");
                0
            }
        };
        summaries.push(PortSummary {
            baseline: baseline.get(&name).map(|entry| entry.baseline.clone()),
            name,
            version,
            versions,
        });
    }
    Ok(summaries)
}
