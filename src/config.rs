//! Registry tool configuration (`vcpkg-registry.toml`).
//!
//! Every section and field is optional. A missing file means all defaults.

use std::fmt;
use std::path::Path;

use serde::Deserialize;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level registry configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegistryConfig {
    /// GitHub API settings.
    #[serde(default)]
    pub github: GithubConfig,

    /// Defaults applied to newly added ports.
    #[serde(default)]
    pub ports: PortsConfig,
}

// ---------------------------------------------------------------------------
// GithubConfig
// ---------------------------------------------------------------------------

/// Where and how repository metadata is fetched.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GithubConfig {
    /// API base URL (default: `"https://api.github.com"`).
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Branch resolved when no `--ref` is given (default: `"main"`).
    #[serde(default = "default_ref")]
    pub default_ref: String,

    /// Environment variable holding an API token (default: `"GITHUB_TOKEN"`).
    /// Requests are unauthenticated when it is unset or empty.
    #[serde(default = "default_token_env")]
    pub token_env: String,

    /// `User-Agent` header sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            default_ref: default_ref(),
            token_env: default_token_env(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_api_url() -> String {
    "https://api.github.com".to_owned()
}

fn default_ref() -> String {
    "main".to_owned()
}

fn default_token_env() -> String {
    "GITHUB_TOKEN".to_owned()
}

fn default_user_agent() -> String {
    concat!("vcpkg-registry/", env!("CARGO_PKG_VERSION")).to_owned()
}

// ---------------------------------------------------------------------------
// PortsConfig
// ---------------------------------------------------------------------------

/// Defaults for generated port manifests.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PortsConfig {
    /// Host-tool dependencies written at the head of every new manifest.
    #[serde(default = "default_host_dependencies")]
    pub host_dependencies: Vec<String>,
}

impl Default for PortsConfig {
    fn default() -> Self {
        Self {
            host_dependencies: default_host_dependencies(),
        }
    }
}

fn default_host_dependencies() -> Vec<String> {
    vec!["vcpkg-cmake".to_owned(), "vcpkg-cmake-config".to_owned()]
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Error loading or parsing the configuration file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConfigError {
    /// The path that was being loaded (if available).
    pub path: Option<std::path::PathBuf>,
    /// Human-readable message with line-level detail when possible.
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(p) = &self.path {
            write!(f, "{}: {}", p.display(), self.message)
        } else {
            write!(f, "config error: {}", self.message)
        }
    }
}

impl std::error::Error for ConfigError {}

impl RegistryConfig {
    /// Load configuration from a TOML file.
    ///
    /// - If the file does not exist, returns all defaults (not an error).
    /// - If the file exists but contains invalid TOML or unknown fields,
    ///   returns a [`ConfigError`] with line-level detail.
    ///
    /// # Errors
    /// Returns `ConfigError` on I/O errors (other than not-found) or parse errors.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(ConfigError {
                    path: Some(path.to_owned()),
                    message: format!("could not read file: {e}"),
                });
            }
        };
        Self::parse(&contents).map_err(|mut e| {
            e.path = Some(path.to_owned());
            e
        })
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    /// Returns `ConfigError` on invalid TOML or unknown fields.
    pub fn parse(toml_str: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml_str).map_err(|e| {
            let mut message = e.message().to_owned();
            if let Some(span) = e.span() {
                let line = toml_str[..span.start]
                    .chars()
                    .filter(|&c| c == '\n')
                    .count()
                    + 1;
                message = format!("line {line}: {message}");
            }
            ConfigError {
                path: None,
                message,
            }
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
