//! Shared test helpers for registry integration tests.
//!
//! All tests use temp directories with a real `git` repository. Upstream
//! metadata comes from [`FakeRemote`], so no test touches the network.

#![allow(dead_code)]

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use chrono::DateTime;
use tempfile::TempDir;

use registry::github::{CommitInfo, MetadataSource, RemoteError, RepoInfo};
use registry::model::RepoSlug;

/// A fresh git repository with an identity configured.
pub fn setup_repo() -> TempDir {
    let dir = TempDir::new().expect("failed to create temp dir");
    git(dir.path(), &["init", "-q"]);
    git(dir.path(), &["config", "user.email", "registry@test.com"]);
    git(dir.path(), &["config", "user.name", "Registry Test"]);
    git(dir.path(), &["config", "commit.gpgsign", "false"]);
    dir
}

/// Canonical form of `dir`, matching what the binary resolves `--registry` to.
pub fn canonical(dir: &Path) -> PathBuf {
    dir.canonicalize().expect("failed to canonicalize temp dir")
}

/// Run git and return trimmed stdout, asserting success.
pub fn git(dir: &Path, args: &[&str]) -> String {
    let out = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .expect("failed to run git");
    assert!(
        out.status.success(),
        "git {} failed: {}",
        args.join(" "),
        String::from_utf8_lossy(&out.stderr)
    );
    String::from_utf8_lossy(&out.stdout).trim().to_owned()
}

/// `HEAD`'s sha, or `None` on an unborn branch.
pub fn head(dir: &Path) -> Option<String> {
    let out = Command::new("git")
        .args(["rev-parse", "--verify", "-q", "HEAD"])
        .current_dir(dir)
        .output()
        .expect("failed to run git");
    out.status
        .success()
        .then(|| String::from_utf8_lossy(&out.stdout).trim().to_owned())
}

pub fn commit_count(dir: &Path) -> usize {
    git(dir, &["rev-list", "--count", "HEAD"])
        .parse()
        .expect("rev-list --count output")
}

pub fn head_subject(dir: &Path) -> String {
    git(dir, &["log", "-1", "--format=%s"])
}

/// `git status --porcelain`; empty when the tree is clean.
pub fn status(dir: &Path) -> String {
    git(dir, &["status", "--porcelain"])
}

/// Tree id of `HEAD:<path>`.
pub fn head_tree(dir: &Path, path: &str) -> String {
    git(dir, &["rev-parse", &format!("HEAD:{path}")])
}

pub fn read_json(path: &Path) -> serde_json::Value {
    let text = std::fs::read_to_string(path)
        .unwrap_or_else(|e| panic!("failed to read {}: {e}", path.display()));
    serde_json::from_str(&text).expect("valid JSON")
}

/// Run the `vcpkg-registry` binary against `registry`.
pub fn registry_cli(registry: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_vcpkg-registry"))
        .arg("--registry")
        .arg(registry)
        .args(args)
        .env_remove("VCPKG_REGISTRY_ROOT")
        .env("RUST_LOG", "warn")
        .output()
        .expect("failed to run vcpkg-registry")
}

/// Upstream that always reports the same repository and head commit.
/// `set_commit` moves the head.
pub struct FakeRemote {
    commit: RefCell<CommitInfo>,
    pub requests: RefCell<Vec<String>>,
}

impl FakeRemote {
    pub fn new(sha: &str, date: &str) -> Self {
        Self {
            commit: RefCell::new(commit(sha, date)),
            requests: RefCell::new(Vec::new()),
        }
    }

    pub fn set_commit(&self, sha: &str, date: &str) {
        *self.commit.borrow_mut() = commit(sha, date);
    }
}

fn commit(sha: &str, date: &str) -> CommitInfo {
    CommitInfo {
        sha: sha.to_owned(),
        date: DateTime::parse_from_rfc3339(date).expect("valid RFC 3339 date"),
        message: "Upstream change".to_owned(),
    }
}

impl MetadataSource for FakeRemote {
    fn repository(&self, repo: &RepoSlug) -> Result<RepoInfo, RemoteError> {
        self.requests.borrow_mut().push(format!("repo {repo}"));
        Ok(RepoInfo {
            description: Some(format!("The {} library", repo.repo())),
        })
    }

    fn latest_commit(
        &self,
        repo: &RepoSlug,
        reference: Option<&str>,
    ) -> Result<CommitInfo, RemoteError> {
        self.requests
            .borrow_mut()
            .push(format!("commit {repo} {}", reference.unwrap_or("<default>")));
        Ok(self.commit.borrow().clone())
    }
}
