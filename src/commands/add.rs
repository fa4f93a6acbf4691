//! `add`: create a new port from a GitHub repository.

use crate::error::RegistryError;
use crate::manifest::Manifest;
use crate::model::{PortName, RepoSlug};
use crate::portfile::{CmakeOption, Portfile, PortfileSpec, SourceKind};

use super::Registry;

/// Version string recorded for download-latest ports.
pub const LATEST_VERSION: &str = "latest";

/// Arguments to [`Registry::add`].
#[derive(Clone, Debug)]
pub struct AddRequest {
    /// Name of the new port.
    pub port: PortName,
    /// Upstream repository.
    pub repo: RepoSlug,
    /// Download the branch tarball at build time instead of pinning a ref.
    pub latest: bool,
    /// Commit, tag or branch to use instead of the default branch head.
    pub reference: Option<String>,
    /// Extra manifest dependencies, after the configured host dependencies.
    pub dependencies: Vec<String>,
    /// CMake options for the configure step.
    pub options: Vec<CmakeOption>,
}

/// What [`Registry::add`] recorded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AddOutcome {
    /// The port's first version string.
    pub version: String,
    /// The `REF` (or tarball ref) written into the portfile.
    pub reference: String,
    /// Content-tree id recorded for the version.
    pub git_tree: String,
}

impl Registry<'_> {
    /// Add a port: write its recipe and manifest, commit them, and start its
    /// version history.
    ///
    /// Nothing is written locally until both remote lookups have succeeded.
    ///
    /// # Errors
    /// [`RegistryError::PortExists`] if the port is already present, remote
    /// errors, and filesystem/git/ledger errors.
    pub fn add(&self, request: &AddRequest) -> Result<AddOutcome, RegistryError> {
        let port = &request.port;
        if self.layout().port_exists(port) || self.ledger().has_history(port) {
            return Err(RegistryError::PortExists { port: port.clone() });
        }
        tracing::info!(port = %port, repo = %request.repo, "adding port");

        let repo_info = self.remote.repository(&request.repo)?;
        let commit = self
            .remote
            .latest_commit(&request.repo, request.reference.as_deref())?;
        tracing::info!(sha = %commit.sha, summary = commit.summary(), "resolved upstream commit");

        let (source, version) = if request.latest {
            let reference = request
                .reference
                .clone()
                .unwrap_or_else(|| self.config.github.default_ref.clone());
            (
                SourceKind::DownloadLatest { reference },
                LATEST_VERSION.to_owned(),
            )
        } else {
            let reference = request
                .reference
                .clone()
                .unwrap_or_else(|| commit.sha.clone());
            (SourceKind::FromGit { reference }, commit.version_string())
        };
        let reference = match &source {
            SourceKind::FromGit { reference } | SourceKind::DownloadLatest { reference } => {
                reference.clone()
            }
        };

        let port_dir = self.layout().port_dir(port);
        std::fs::create_dir_all(&port_dir).map_err(RegistryError::io(&port_dir))?;

        let portfile = Portfile::render(&PortfileSpec {
            port,
            repo: &request.repo,
            source,
            options: &request.options,
        });
        let portfile_path = self.layout().portfile_path(port);
        portfile
            .write(&portfile_path)
            .map_err(RegistryError::io(&portfile_path))?;

        Manifest::new(
            port.as_str(),
            version.as_str(),
            repo_info.description,
            &self.config.ports.host_dependencies,
            &request.dependencies,
        )
        .write(&self.layout().manifest_path(port))?;

        self.stage(&[&port_dir])?;
        self.git.commit(&format!("Add new port {port}"))?;

        let git_tree = self.committed_tree(port)?;
        self.ledger().create(port, &version, &git_tree)?;

        let history_path = self.layout().history_path(port);
        let baseline_path = self.layout().baseline_path();
        self.stage(&[&history_path, &baseline_path])?;
        self.git.amend()?;

        Ok(AddOutcome {
            version,
            reference,
            git_tree,
        })
    }
}
