use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use registry::commands::Registry;
use registry::commands::add::AddRequest;
use registry::commands::list::{PortSummary, list_ports};
use registry::commands::update::UpdateOutcome;
use registry::commands::update_versions::UpdateVersionsOutcome;
use registry::config::RegistryConfig;
use registry::format::OutputFormat;
use registry::github::GitHubClient;
use registry::layout::RegistryLayout;
use registry::ledger::Ledger;
use registry::model::{PortName, RepoSlug};
use registry::portfile::CmakeOption;
use registry::telemetry;
use registry_git::{ExecutionMode, GixRepo};

/// Maintain a git-backed vcpkg registry
///
/// Every port lives in ports/<name>/ (portfile.cmake + vcpkg.json). Each
/// published version is recorded in versions/<c>-/<name>.json together
/// with the git tree id of the port directory, and versions/baseline.json
/// names the current version of every port.
///
/// Mutating commands commit the port directory first, read its tree id
/// from HEAD, then amend the version files into the same commit.
///
/// QUICK START:
///
///   vcpkg-registry add fmt fmtlib/fmt
///   vcpkg-registry list
///   vcpkg-registry update fmt
///
///   # after hand-editing ports/fmt/portfile.cmake:
///   vcpkg-registry update-versions fmt
#[derive(Parser)]
#[command(name = "vcpkg-registry")]
#[command(version, about)]
#[command(propagate_version = true)]
#[command(
    after_help = "See 'vcpkg-registry <command> --help' for more information on a specific command."
)]
struct Cli {
    /// Write files and stage them, but don't create git commits
    #[arg(long, global = true)]
    dry_run: bool,

    /// Registry root directory
    #[arg(long, global = true, env = "VCPKG_REGISTRY_ROOT", default_value = ".")]
    registry: PathBuf,

    /// Configuration file [default: <registry>/vcpkg-registry.toml]
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a new port from a GitHub repository
    ///
    /// By default the port is pinned to the head commit of the default
    /// branch with vcpkg_from_git, and its version string is
    /// <commit date>-<short sha>.
    Add {
        /// Name of the new port (lowercase letters, digits, hyphens)
        port: PortName,

        /// GitHub repository as owner/repo
        repo: RepoSlug,

        /// Download the branch tarball at build time instead of pinning a
        /// commit (version string "latest"; cannot be updated later)
        #[arg(long)]
        latest: bool,

        /// Commit, tag or branch to use instead of the default branch head
        #[arg(long = "ref")]
        reference: Option<String>,

        /// Comma-separated dependencies to add to vcpkg.json
        #[arg(long, visible_alias = "deps", value_delimiter = ',')]
        dependencies: Vec<String>,

        /// Comma-separated CMake options as KEY=VALUE
        #[arg(long, value_delimiter = ',')]
        options: Vec<CmakeOption>,
    },

    /// List all ports in the registry
    List {
        /// Output format: text or json
        #[arg(long, default_value = "text")]
        format: OutputFormat,
    },

    /// Remove a port and its version history
    Remove {
        /// Port to remove
        port: PortName,
    },

    /// Pin a port to the newest upstream commit and publish it
    Update {
        /// Port to update
        port: PortName,

        /// Branch, tag or commit to follow instead of the default branch
        #[arg(long = "ref")]
        reference: Option<String>,
    },

    /// Re-record a port's git tree after editing its files by hand
    ///
    /// Commits ports/<port> as it is on disk and points the history record
    /// for the manifest's version-string at the new tree.
    #[command(name = "update-versions")]
    UpdateVersions {
        /// Port whose version record to refresh
        port: PortName,
    },
}

fn main() -> Result<()> {
    telemetry::init();
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        // Invalid port names, repositories and options are validation
        // failures (exit 1), not usage errors (exit 2).
        Err(e) if e.kind() == clap::error::ErrorKind::ValueValidation => {
            let _ = e.print();
            std::process::exit(1);
        }
        Err(e) => e.exit(),
    };

    let root = cli
        .registry
        .canonicalize()
        .with_context(|| format!("registry root {} is not accessible", cli.registry.display()))?;
    let layout = RegistryLayout::new(&root);
    let config_path = cli.config.unwrap_or_else(|| layout.config_path());
    let config = RegistryConfig::load(&config_path)?;

    if let Commands::List { format } = cli.command {
        return list(&Ledger::new(layout), format);
    }

    let mode = ExecutionMode::from_dry_run(cli.dry_run);
    if mode.is_dry_run() {
        tracing::warn!("dry run mode enabled; no git commits will be performed");
    }
    let git = GixRepo::open(&root, mode).context("opening the registry's git repository")?;
    let remote = GitHubClient::new(&config.github)?;
    let registry = Registry::new(layout, &config, &git, &remote);

    match cli.command {
        Commands::Add {
            port,
            repo,
            latest,
            reference,
            dependencies,
            options,
        } => {
            let outcome = registry.add(&AddRequest {
                dependencies: dependencies
                    .into_iter()
                    .map(|d| d.trim().to_owned())
                    .filter(|d| !d.is_empty())
                    .collect(),
                port: port.clone(),
                repo,
                latest,
                reference,
                options,
            })?;
            println!(
                "Added port '{port}' {} (ref {})",
                outcome.version, outcome.reference
            );
        }
        Commands::Remove { port } => {
            registry.remove(&port)?;
            println!("Removed port '{port}'");
        }
        Commands::Update { port, reference } => match registry.update(&port, reference.as_deref())? {
            UpdateOutcome::AlreadyUpToDate { version } => {
                println!("Port {port} is already up to date ({version}).");
            }
            UpdateOutcome::Updated { version, .. } => {
                println!("Updated port '{port}' to {version}");
            }
        },
        Commands::UpdateVersions { port } => match registry.update_versions(&port)? {
            UpdateVersionsOutcome::AlreadyUpToDate { version } => {
                println!("Port {port} is already up to date ({version}).");
            }
            UpdateVersionsOutcome::Updated {
                version, git_tree, ..
            } => {
                println!("Updated version {version} of '{port}' to git-tree {git_tree}");
            }
        },
        Commands::List { .. } => {}
    }
    Ok(())
}

fn list(ledger: &Ledger, format: OutputFormat) -> Result<()> {
    let ports = list_ports(ledger)?;
    match format {
        OutputFormat::Json => println!("{}", format.serialize(&ports)?),
        OutputFormat::Text if ports.is_empty() => println!("No ports found."),
        OutputFormat::Text => {
            for line in ports.iter().map(PortSummary::to_line) {
                println!("{line}");
            }
        }
    }
    Ok(())
}
