//! `portfile.cmake` rendering and parsing.
//!
//! Two recipe shapes are produced:
//!
//! - **from-git**: `vcpkg_from_git` pinned to a `REF`; these ports can be
//!   moved forward with `update`.
//! - **download-latest**: `file(DOWNLOAD ...)` of a branch tarball; the
//!   version string is always `latest` and the port is never updated.

use std::fmt;
use std::ops::Range;
use std::path::Path;
use std::str::FromStr;

use thiserror::Error;

use crate::model::{ErrorKind, PortName, RepoSlug, ValidationError};

const GITHUB_PREFIX: &str = "https://github.com/";

/// Configure/install/cleanup steps shared by both recipe shapes.
/// `{options}` is replaced by the rendered `OPTIONS` clause.
const BUILD_TAIL: &str = r#"
vcpkg_cmake_configure(
    SOURCE_PATH ${SOURCE_PATH}{options}
)

vcpkg_cmake_install()

file(REMOVE_RECURSE
    "${CURRENT_PACKAGES_DIR}/debug"
    "${CURRENT_PACKAGES_DIR}/lib"
)

file(MAKE_DIRECTORY "${CURRENT_PACKAGES_DIR}/share/${PORT}")
file(INSTALL "${SOURCE_PATH}/LICENSE" DESTINATION "${CURRENT_PACKAGES_DIR}/share/${PORT}" RENAME copyright)
"#;

// ---------------------------------------------------------------------------
// CmakeOption
// ---------------------------------------------------------------------------

/// A `KEY=VALUE` cache entry passed to CMake as `-DKEY=VALUE`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CmakeOption {
    key: String,
    value: String,
}

impl CmakeOption {
    /// The option's key.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The option's value.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }
}

impl FromStr for CmakeOption {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| ValidationError {
            kind: ErrorKind::CmakeOption,
            value: s.to_owned(),
            reason: reason.to_owned(),
        };
        let Some((key, value)) = s.split_once('=') else {
            return Err(invalid("expected the form KEY=VALUE"));
        };
        if key.is_empty() {
            return Err(invalid("key must not be empty"));
        }
        if s.chars().any(char::is_whitespace) {
            return Err(invalid("options must not contain whitespace"));
        }
        Ok(Self {
            key: key.to_owned(),
            value: value.to_owned(),
        })
    }
}

impl fmt::Display for CmakeOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "-D{}={}", self.key, self.value)
    }
}

fn options_clause(options: &[CmakeOption]) -> String {
    if options.is_empty() {
        return String::new();
    }
    let rendered: Vec<String> = options.iter().map(ToString::to_string).collect();
    format!("\n    OPTIONS {}", rendered.join(" "))
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// Where a port's sources come from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SourceKind {
    /// `vcpkg_from_git` pinned to a commit, tag or branch.
    FromGit {
        /// The `REF` to check out.
        reference: String,
    },
    /// Tarball of a branch downloaded at build time.
    DownloadLatest {
        /// Branch or ref whose tarball is fetched.
        reference: String,
    },
}

/// Everything needed to render a new portfile.
#[derive(Clone, Debug)]
pub struct PortfileSpec<'a> {
    /// The port being written.
    pub port: &'a PortName,
    /// Upstream GitHub repository.
    pub repo: &'a RepoSlug,
    /// Source acquisition strategy.
    pub source: SourceKind,
    /// CMake options for `vcpkg_cmake_configure`.
    pub options: &'a [CmakeOption],
}

/// A portfile's text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Portfile {
    contents: String,
}

impl Portfile {
    /// Wrap existing portfile text.
    pub fn from_contents(contents: impl Into<String>) -> Self {
        Self {
            contents: contents.into(),
        }
    }

    /// Render a new portfile.
    #[must_use]
    pub fn render(spec: &PortfileSpec<'_>) -> Self {
        let head = match &spec.source {
            SourceKind::FromGit { reference } => format!(
                "vcpkg_from_git(\n    OUT_SOURCE_PATH SOURCE_PATH\n    URL {url}\n    REF {reference}\n)\n",
                url = spec.repo.clone_url(),
            ),
            SourceKind::DownloadLatest { reference } => {
                let archive = format!("${{DOWNLOADS}}/{}-latest.tar.gz", spec.port);
                format!(
                    "file(DOWNLOAD \"https://api.github.com/repos/{owner}/{repo}/tarball/{reference}\" {archive}\n    SHOW_PROGRESS\n)\n\nvcpkg_extract_source_archive(\n    SOURCE_PATH\n    ARCHIVE {archive}\n)\n",
                    owner = spec.repo.owner(),
                    repo = spec.repo.repo(),
                )
            }
        };
        let tail = BUILD_TAIL.replace("{options}", &options_clause(spec.options));
        Self {
            contents: head + &tail,
        }
    }

    /// Read a portfile from disk.
    ///
    /// # Errors
    /// I/O errors.
    pub fn read(path: &Path) -> std::io::Result<Self> {
        std::fs::read_to_string(path).map(Self::from_contents)
    }

    /// Write the portfile to disk.
    ///
    /// # Errors
    /// I/O errors.
    pub fn write(&self, path: &Path) -> std::io::Result<()> {
        tracing::info!(path = %path.display(), "writing portfile");
        std::fs::write(path, &self.contents)
    }

    /// The portfile text.
    #[must_use]
    pub fn contents(&self) -> &str {
        &self.contents
    }

    /// Whether this is a `vcpkg_from_git` recipe.
    #[must_use]
    pub fn is_from_git(&self) -> bool {
        self.contents.contains("vcpkg_from_git")
    }

    /// Extract the upstream repository and `REF` of a from-git recipe.
    ///
    /// # Errors
    /// [`PortfileError::NotFromGit`] for download-latest recipes, or a parse
    /// error when `URL`/`REF` are missing or unrecognised.
    pub fn git_source(&self) -> Result<GitSource, PortfileError> {
        if !self.is_from_git() {
            return Err(PortfileError::NotFromGit);
        }

        let repo = parse_github_url(find_url(&self.contents)?)?;

        let (start, reference) =
            find_ref(&self.contents).ok_or(PortfileError::MissingKeyword("REF"))?;

        Ok(GitSource {
            repo,
            reference: reference.to_owned(),
            ref_span: start..start + reference.len(),
        })
    }

    /// Replace the `REF` of a from-git recipe, leaving every other byte
    /// untouched. Returns the previous ref.
    ///
    /// # Errors
    /// As [`Portfile::git_source`].
    pub fn set_ref(&mut self, new_ref: &str) -> Result<String, PortfileError> {
        let source = self.git_source()?;
        self.contents.replace_range(source.ref_span, new_ref);
        Ok(source.reference)
    }
}

/// Upstream location of a from-git recipe.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GitSource {
    /// Upstream repository.
    pub repo: RepoSlug,
    /// The pinned `REF`.
    pub reference: String,
    ref_span: Range<usize>,
}

/// Errors from interpreting an existing portfile.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PortfileError {
    /// The recipe downloads a tarball instead of using `vcpkg_from_git`.
    #[error("portfile does not use vcpkg_from_git (ports created with --latest cannot be updated)")]
    NotFromGit,

    /// A required `vcpkg_from_git` argument is absent.
    #[error("portfile has no {0} argument")]
    MissingKeyword(&'static str),

    /// The `URL` is not a `https://github.com/<owner>/<repo>.git` URL.
    #[error("unsupported source URL {url:?}: {reason}")]
    UnsupportedUrl {
        /// The URL found in the portfile.
        url: String,
        /// Why it was rejected.
        reason: String,
    },
}

/// Arguments following each standalone `keyword` outside `#` comments,
/// with their byte offsets. An argument ends at whitespace, `)` or `#`.
fn keyword_arguments<'a>(text: &'a str, keyword: &str) -> Vec<(usize, &'a str)> {
    let mut out = Vec::new();
    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        let code = line.find('#').map_or(line, |hash| &line[..hash]);
        let mut from = 0;
        while let Some(found) = code[from..].find(keyword) {
            let at = from + found;
            from = at + keyword.len();
            let standalone_start = code[..at]
                .chars()
                .next_back()
                .is_none_or(|c| c.is_whitespace() || c == '(');
            let rest = &code[from..];
            if !standalone_start || !rest.starts_with(char::is_whitespace) {
                continue;
            }
            let trimmed = rest.trim_start();
            let arg_start = from + (rest.len() - trimmed.len());
            let arg_len = trimmed
                .find(|c: char| c.is_whitespace() || c == ')')
                .unwrap_or(trimmed.len());
            if arg_len > 0 {
                out.push((offset + arg_start, &trimmed[..arg_len]));
            }
        }
        offset += line.len();
    }
    out
}

/// The first `URL` argument pointing at GitHub. Falls back to the first
/// `URL` argument so the error names what was found.
fn find_url(text: &str) -> Result<&str, PortfileError> {
    let urls = keyword_arguments(text, "URL");
    if let Some((_, url)) = urls.iter().find(|(_, url)| url.starts_with(GITHUB_PREFIX)) {
        return Ok(url);
    }
    urls.first()
        .map(|(_, url)| *url)
        .ok_or(PortfileError::MissingKeyword("URL"))
}

/// The first `REF` argument, cut at the first byte outside `[A-Za-z0-9_-]`.
fn find_ref(text: &str) -> Option<(usize, &str)> {
    keyword_arguments(text, "REF").into_iter().find_map(|(start, arg)| {
        let len = arg
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '-'))
            .unwrap_or(arg.len());
        (len > 0).then(|| (start, &arg[..len]))
    })
}

fn parse_github_url(url: &str) -> Result<RepoSlug, PortfileError> {
    let unsupported = |reason: &str| PortfileError::UnsupportedUrl {
        url: url.to_owned(),
        reason: reason.to_owned(),
    };
    let path = url
        .strip_prefix(GITHUB_PREFIX)
        .and_then(|rest| rest.strip_suffix(".git"))
        .ok_or_else(|| unsupported("expected https://github.com/<owner>/<repo>.git"))?;
    path.parse::<RepoSlug>()
        .map_err(|e| unsupported(&e.reason))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
