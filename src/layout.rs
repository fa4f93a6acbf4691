//! On-disk layout of a registry.
//!
//! ```text
//! <root>/
//!   ports/<name>/portfile.cmake
//!   ports/<name>/vcpkg.json
//!   versions/baseline.json
//!   versions/<c>-/<name>.json
//!   vcpkg-registry.toml          (optional)
//! ```

use std::path::{Path, PathBuf};

use crate::model::PortName;

/// Directory holding one subdirectory per port.
pub const PORTS_DIR: &str = "ports";
/// Directory holding the baseline and the sharded version files.
pub const VERSIONS_DIR: &str = "versions";
/// Build recipe file name inside a port directory.
pub const PORTFILE: &str = "portfile.cmake";
/// Manifest file name inside a port directory.
pub const MANIFEST: &str = "vcpkg.json";
/// Baseline file name inside `versions/`.
pub const BASELINE: &str = "baseline.json";
/// Optional tool configuration at the registry root.
pub const CONFIG_FILE: &str = "vcpkg-registry.toml";

/// Path computations for a registry rooted at `root`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegistryLayout {
    root: PathBuf,
}

impl RegistryLayout {
    /// Layout for the registry at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The registry root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `ports/`
    #[must_use]
    pub fn ports_dir(&self) -> PathBuf {
        self.root.join(PORTS_DIR)
    }

    /// `ports/<name>/`
    #[must_use]
    pub fn port_dir(&self, port: &PortName) -> PathBuf {
        self.ports_dir().join(port.as_str())
    }

    /// `ports/<name>/portfile.cmake`
    #[must_use]
    pub fn portfile_path(&self, port: &PortName) -> PathBuf {
        self.port_dir(port).join(PORTFILE)
    }

    /// `ports/<name>/vcpkg.json`
    #[must_use]
    pub fn manifest_path(&self, port: &PortName) -> PathBuf {
        self.port_dir(port).join(MANIFEST)
    }

    /// `versions/`
    #[must_use]
    pub fn versions_dir(&self) -> PathBuf {
        self.root.join(VERSIONS_DIR)
    }

    /// `versions/<c>-/`
    #[must_use]
    pub fn shard_dir(&self, port: &PortName) -> PathBuf {
        self.versions_dir().join(port.shard())
    }

    /// `versions/<c>-/<name>.json`
    #[must_use]
    pub fn history_path(&self, port: &PortName) -> PathBuf {
        self.shard_dir(port).join(format!("{port}.json"))
    }

    /// `versions/baseline.json`
    #[must_use]
    pub fn baseline_path(&self) -> PathBuf {
        self.versions_dir().join(BASELINE)
    }

    /// `vcpkg-registry.toml`
    #[must_use]
    pub fn config_path(&self) -> PathBuf {
        self.root.join(CONFIG_FILE)
    }

    /// Whether the port directory exists.
    #[must_use]
    pub fn port_exists(&self, port: &PortName) -> bool {
        self.port_dir(port).exists()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_follow_registry_layout() {
        let layout = RegistryLayout::new("/reg");
        let port = PortName::new("foo-bar").unwrap();
        assert_eq!(layout.port_dir(&port), Path::new("/reg/ports/foo-bar"));
        assert_eq!(
            layout.portfile_path(&port),
            Path::new("/reg/ports/foo-bar/portfile.cmake")
        );
        assert_eq!(
            layout.manifest_path(&port),
            Path::new("/reg/ports/foo-bar/vcpkg.json")
        );
        assert_eq!(layout.shard_dir(&port), Path::new("/reg/versions/f-"));
        assert_eq!(
            layout.history_path(&port),
            Path::new("/reg/versions/f-/foo-bar.json")
        );
        assert_eq!(
            layout.baseline_path(),
            Path::new("/reg/versions/baseline.json")
        );
        assert_eq!(layout.config_path(), Path::new("/reg/vcpkg-registry.toml"));
    }

    #[test]
    fn ports_sharing_a_first_letter_share_a_shard() {
        let layout = RegistryLayout::new("r");
        let a = PortName::new("fmt").unwrap();
        let b = PortName::new("freetype").unwrap();
        assert_eq!(layout.shard_dir(&a), layout.shard_dir(&b));
        assert_ne!(layout.history_path(&a), layout.history_path(&b));
    }
}
