//! `vcpkg.json` port manifests.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::json_file::{self, JsonFileError};

/// A manifest dependency: either a bare port name or a detailed entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Dependency {
    /// `"fmt"`
    Name(String),
    /// `{"name": "vcpkg-cmake", "host": true}` plus any other fields.
    Detailed {
        /// Dependency port name.
        name: String,
        /// Whether the dependency is built for the host triplet.
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        host: bool,
        /// Fields this tool does not interpret.
        #[serde(flatten)]
        extra: BTreeMap<String, serde_json::Value>,
    },
}

impl Dependency {
    /// A host-only tool dependency.
    pub fn host(name: impl Into<String>) -> Self {
        Self::Detailed {
            name: name.into(),
            host: true,
            extra: BTreeMap::new(),
        }
    }

    /// The dependency's port name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Name(name) | Self::Detailed { name, .. } => name,
        }
    }
}

/// Contents of `ports/<name>/vcpkg.json`.
///
/// Fields the tool does not manage survive a read-modify-write in `extra`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    /// Port name.
    pub name: String,
    /// The port's version string.
    #[serde(rename = "version-string")]
    pub version_string: String,
    /// Upstream repository description (may be null).
    pub description: Option<String>,
    /// Build and host dependencies.
    #[serde(default)]
    pub dependencies: Vec<Dependency>,
    /// Other manifest fields, preserved verbatim.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl Manifest {
    /// Manifest for a new port: host dependencies first, then `dependencies`
    /// as plain names.
    pub fn new(
        name: impl Into<String>,
        version_string: impl Into<String>,
        description: Option<String>,
        host_dependencies: &[String],
        dependencies: &[String],
    ) -> Self {
        let dependencies = host_dependencies
            .iter()
            .map(|name| Dependency::host(name.clone()))
            .chain(dependencies.iter().cloned().map(Dependency::Name))
            .collect();
        Self {
            name: name.into(),
            version_string: version_string.into(),
            description,
            dependencies,
            extra: BTreeMap::new(),
        }
    }

    /// Read a manifest from disk.
    ///
    /// # Errors
    /// I/O and parse errors.
    pub fn read(path: &Path) -> Result<Self, JsonFileError> {
        json_file::read(path)
    }

    /// Write the manifest to disk.
    ///
    /// # Errors
    /// I/O and serialization errors.
    pub fn write(&self, path: &Path) -> Result<(), JsonFileError> {
        tracing::info!(path = %path.display(), "writing manifest");
        json_file::write_atomic(path, self)
    }
}
