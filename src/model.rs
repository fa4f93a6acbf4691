//! Validated identifiers used across the registry.
//!
//! [`PortName`] and [`RepoSlug`] can only be built through their validating
//! constructors, so every path computed from them is well formed.

use std::fmt;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// PortName
// ---------------------------------------------------------------------------

/// A port name: lowercase alphanumeric runs separated by single hyphens
/// (`^[a-z0-9]+(-[a-z0-9]+)*$`).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PortName(String);

impl PortName {
    /// Create a new `PortName`, validating format.
    ///
    /// # Errors
    /// Returns an error if the name is empty, contains characters outside
    /// `[a-z0-9-]`, starts or ends with a hyphen, or has consecutive hyphens.
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        Self::validate(s)?;
        Ok(Self(s.to_owned()))
    }

    /// Return the port name as a string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Name of the `versions/` shard directory holding this port's history:
    /// the lowercase first character followed by a literal `-`.
    #[must_use]
    pub fn shard(&self) -> String {
        let first = self.0.chars().next().map_or('_', |c| c.to_ascii_lowercase());
        format!("{first}-")
    }

    fn validate(s: &str) -> Result<(), ValidationError> {
        let invalid = |reason: &str| ValidationError {
            kind: ErrorKind::PortName,
            value: s.to_owned(),
            reason: reason.to_owned(),
        };
        if s.is_empty() {
            return Err(invalid("port name must not be empty"));
        }
        if !s
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        {
            return Err(invalid(
                "port name must contain only lowercase letters (a-z), digits (0-9), and hyphens (-)",
            ));
        }
        if s.starts_with('-') || s.ends_with('-') {
            return Err(invalid("port name must not start or end with a hyphen"));
        }
        if s.contains("--") {
            return Err(invalid("port name must not contain consecutive hyphens"));
        }
        Ok(())
    }
}

impl fmt::Display for PortName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for PortName {
    type Err = ValidationError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for PortName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// ---------------------------------------------------------------------------
// RepoSlug
// ---------------------------------------------------------------------------

/// A GitHub repository in `owner/repo` form.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RepoSlug {
    owner: String,
    repo: String,
}

impl RepoSlug {
    /// Create a slug from its two halves.
    ///
    /// # Errors
    /// Returns an error if either half is empty or contains characters that
    /// GitHub does not allow in owner/repository names.
    pub fn new(owner: &str, repo: &str) -> Result<Self, ValidationError> {
        let value = format!("{owner}/{repo}");
        let invalid = |reason: &str| ValidationError {
            kind: ErrorKind::RepoSlug,
            value: value.clone(),
            reason: reason.to_owned(),
        };
        if owner.is_empty() || repo.is_empty() {
            return Err(invalid("expected the form 'owner/repo'"));
        }
        if !owner
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(invalid(
                "owner may contain only letters, digits, '-' and '_'",
            ));
        }
        if !repo
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
        {
            return Err(invalid(
                "repository may contain only letters, digits, '-', '_' and '.'",
            ));
        }
        Ok(Self {
            owner: owner.to_owned(),
            repo: repo.to_owned(),
        })
    }

    /// Repository owner (user or organisation).
    #[must_use]
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Repository name.
    #[must_use]
    pub fn repo(&self) -> &str {
        &self.repo
    }

    /// Clone URL used in `vcpkg_from_git` portfiles.
    #[must_use]
    pub fn clone_url(&self) -> String {
        format!("https://github.com/{}/{}.git", self.owner, self.repo)
    }
}

impl fmt::Display for RepoSlug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

impl FromStr for RepoSlug {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('/') {
            Some((owner, repo)) if !repo.contains('/') => Self::new(owner, repo),
            _ => Err(ValidationError {
                kind: ErrorKind::RepoSlug,
                value: s.to_owned(),
                reason: "expected the form 'owner/repo'".to_owned(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Validation errors
// ---------------------------------------------------------------------------

/// The kind of value that failed validation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// A [`PortName`] validation error.
    PortName,
    /// A [`RepoSlug`] validation error.
    RepoSlug,
    /// A CMake `KEY=VALUE` option validation error.
    CmakeOption,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PortName => write!(f, "port name"),
            Self::RepoSlug => write!(f, "repository"),
            Self::CmakeOption => write!(f, "CMake option"),
        }
    }
}

/// A validation error for registry identifiers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidationError {
    /// What kind of value was being validated.
    pub kind: ErrorKind,
    /// The invalid value.
    pub value: String,
    /// Human-readable explanation.
    pub reason: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {} {:?}: {}", self.kind, self.value, self.reason)
    }
}

impl std::error::Error for ValidationError {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
