//! Upstream repository metadata.
//!
//! [`MetadataSource`] is the seam the commands depend on; [`GitHubClient`]
//! is the production implementation over the GitHub REST API. Each call is
//! a single blocking request with no retry.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, FixedOffset};
use serde::Deserialize;
use thiserror::Error;

use crate::config::GithubConfig;
use crate::model::RepoSlug;

/// Length of the abbreviated sha in version strings.
const SHORT_SHA_LEN: usize = 7;

// ---------------------------------------------------------------------------
// Domain types
// ---------------------------------------------------------------------------

/// Repository-level metadata.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RepoInfo {
    /// The repository description, if it has one.
    pub description: Option<String>,
}

/// The head commit of a ref.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommitInfo {
    /// Full commit sha.
    pub sha: String,
    /// Committer timestamp, in the committer's own offset.
    pub date: DateTime<FixedOffset>,
    /// Full commit message.
    pub message: String,
}

impl CommitInfo {
    /// The first seven characters of the sha.
    #[must_use]
    pub fn short_sha(&self) -> &str {
        self.sha.get(..SHORT_SHA_LEN).unwrap_or(&self.sha)
    }

    /// `<YYYY-MM-DD>-<short sha>`.
    #[must_use]
    pub fn version_string(&self) -> String {
        format!("{}-{}", self.date.format("%Y-%m-%d"), self.short_sha())
    }

    /// First line of the commit message.
    #[must_use]
    pub fn summary(&self) -> &str {
        self.message.lines().next().unwrap_or_default()
    }
}

/// Errors talking to the metadata service. Every variant names the URL.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// The request could not be sent or the response not received.
    #[error("request to {url} failed: {detail}")]
    Transport {
        /// The URL requested.
        url: String,
        /// Transport error message.
        detail: String,
    },

    /// The server answered with a non-success status.
    #[error("request to {url} returned HTTP {status}: {detail}")]
    Status {
        /// The URL requested.
        url: String,
        /// HTTP status code.
        status: u16,
        /// Response body or reason phrase.
        detail: String,
    },

    /// The response body was not the expected shape.
    #[error("unexpected response from {url}: {detail}")]
    Decode {
        /// The URL requested.
        url: String,
        /// Decode error message.
        detail: String,
    },
}

/// Source of repository and commit metadata.
pub trait MetadataSource {
    /// Fetch repository-level metadata.
    ///
    /// # Errors
    /// [`RemoteError`] on any failure.
    fn repository(&self, repo: &RepoSlug) -> Result<RepoInfo, RemoteError>;

    /// Fetch the head commit of `reference`, or of the default branch when
    /// `None`.
    ///
    /// # Errors
    /// [`RemoteError`] on any failure.
    fn latest_commit(
        &self,
        repo: &RepoSlug,
        reference: Option<&str>,
    ) -> Result<CommitInfo, RemoteError>;
}

// ---------------------------------------------------------------------------
// Wire format
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct RepositoryResponse {
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CommitResponse {
    sha: String,
    commit: CommitDetail,
}

#[derive(Debug, Deserialize)]
struct CommitDetail {
    committer: Signature,
    message: String,
}

#[derive(Debug, Deserialize)]
struct Signature {
    date: String,
}

fn decode<'a, T: Deserialize<'a>>(url: &str, body: &'a str) -> Result<T, RemoteError> {
    serde_json::from_str(body).map_err(|e| RemoteError::Decode {
        url: url.to_owned(),
        detail: e.to_string(),
    })
}

/// Decode a `GET /repos/{owner}/{repo}` body.
fn parse_repository(url: &str, body: &str) -> Result<RepoInfo, RemoteError> {
    let response: RepositoryResponse = decode(url, body)?;
    Ok(RepoInfo {
        description: response.description,
    })
}

/// Decode a `GET /repos/{owner}/{repo}/commits/{ref}` body.
fn parse_commit(url: &str, body: &str) -> Result<CommitInfo, RemoteError> {
    let response: CommitResponse = decode(url, body)?;
    let date = DateTime::parse_from_rfc3339(&response.commit.committer.date).map_err(|e| {
        RemoteError::Decode {
            url: url.to_owned(),
            detail: format!(
                "invalid committer date {:?}: {e}",
                response.commit.committer.date
            ),
        }
    })?;
    Ok(CommitInfo {
        sha: response.sha,
        date,
        message: response.commit.message,
    })
}

// ---------------------------------------------------------------------------
// GitHubClient
// ---------------------------------------------------------------------------

/// [`MetadataSource`] backed by the GitHub REST API.
pub struct GitHubClient {
    http: reqwest::blocking::Client,
    api_url: String,
    default_ref: String,
    token: Option<String>,
}

impl fmt::Debug for GitHubClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GitHubClient")
            .field("api_url", &self.api_url)
            .field("default_ref", &self.default_ref)
            .field("authenticated", &self.token.is_some())
            .finish_non_exhaustive()
    }
}

impl GitHubClient {
    /// Build a client from configuration, reading the token from the
    /// configured environment variable.
    ///
    /// # Errors
    /// [`RemoteError::Transport`] if the HTTP client cannot be initialised.
    pub fn new(config: &GithubConfig) -> Result<Self, RemoteError> {
        let token = std::env::var(&config.token_env)
            .ok()
            .filter(|t| !t.trim().is_empty());
        let http = reqwest::blocking::Client::builder()
            .user_agent(config.user_agent.clone())
            .connect_timeout(Duration::from_secs(15))
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| RemoteError::Transport {
                url: config.api_url.clone(),
                detail: e.to_string(),
            })?;
        Ok(Self {
            http,
            api_url: config.api_url.trim_end_matches('/').to_owned(),
            default_ref: config.default_ref.clone(),
            token,
        })
    }

    fn get(&self, url: &str) -> Result<String, RemoteError> {
        tracing::debug!(%url, authenticated = self.token.is_some(), "GET");
        let mut request = self
            .http
            .get(url)
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28");
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().map_err(|e| RemoteError::Transport {
            url: url.to_owned(),
            detail: e.to_string(),
        })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response
                .text()
                .ok()
                .filter(|body| !body.trim().is_empty())
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("error").to_owned());
            return Err(RemoteError::Status {
                url: url.to_owned(),
                status: status.as_u16(),
                detail,
            });
        }

        response.text().map_err(|e| RemoteError::Transport {
            url: url.to_owned(),
            detail: e.to_string(),
        })
    }
}

impl MetadataSource for GitHubClient {
    fn repository(&self, repo: &RepoSlug) -> Result<RepoInfo, RemoteError> {
        let url = format!("{}/repos/{}/{}", self.api_url, repo.owner(), repo.repo());
        let body = self.get(&url)?;
        parse_repository(&url, &body)
    }

    fn latest_commit(
        &self,
        repo: &RepoSlug,
        reference: Option<&str>,
    ) -> Result<CommitInfo, RemoteError> {
        let reference = reference.unwrap_or(&self.default_ref);
        let url = format!(
            "{}/repos/{}/{}/commits/{reference}",
            self.api_url,
            repo.owner(),
            repo.repo()
        );
        let body = self.get(&url)?;
        parse_commit(&url, &body)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
