//! Index and commit operations via the git CLI.
//!
//! Staging and committing stay as subprocesses: they must honour the user's
//! hooks, signing config and identity exactly as `git commit` would.

use std::path::Path;
use std::process::Command;

use crate::error::GitError;
use crate::gix_repo::GixRepo;

/// Render an argument list the way a user would type it.
fn display_args(args: &[String]) -> String {
    args.iter()
        .map(|arg| {
            if arg.contains(' ') {
                format!("\"{arg}\"")
            } else {
                arg.clone()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Run `git <args>` in the working tree and return stdout.
fn git(repo: &GixRepo, args: &[String]) -> Result<String, GitError> {
    let command = format!("git {}", display_args(args));
    tracing::info!("{command}");

    let output = Command::new("git")
        .args(args)
        .current_dir(&repo.workdir)
        .output()?;

    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    } else {
        Err(GitError::Command {
            command,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
            exit_code: output.status.code(),
        })
    }
}

/// Commit-creating commands are skipped in dry-run mode.
fn git_commit(repo: &GixRepo, args: Vec<String>) -> Result<(), GitError> {
    if repo.mode.is_dry_run() {
        tracing::warn!("git {}", display_args(&args));
        tracing::warn!("git commit skipped [--dry-run]");
        return Ok(());
    }
    git(repo, &args)?;
    Ok(())
}

fn with_pathspecs(
    repo: &GixRepo,
    mut args: Vec<String>,
    paths: &[&Path],
) -> Result<Vec<String>, GitError> {
    args.push("--".to_owned());
    for path in paths {
        args.push(repo.repo_relative(path)?);
    }
    Ok(args)
}

pub fn stage(repo: &GixRepo, paths: &[&Path]) -> Result<(), GitError> {
    if paths.is_empty() {
        return Ok(());
    }
    let args = with_pathspecs(repo, vec!["add".to_owned(), "-A".to_owned()], paths)?;
    git(repo, &args)?;
    Ok(())
}

pub fn unstage_removed(repo: &GixRepo, paths: &[&Path]) -> Result<(), GitError> {
    if paths.is_empty() {
        return Ok(());
    }
    let args = with_pathspecs(
        repo,
        ["rm", "-r", "-q", "--cached", "--ignore-unmatch"]
            .map(str::to_owned)
            .to_vec(),
        paths,
    )?;
    git(repo, &args)?;
    Ok(())
}

pub fn has_staged_changes(repo: &GixRepo) -> Result<bool, GitError> {
    let args = ["diff", "--cached", "--quiet"].map(str::to_owned);
    let command = format!("git {}", display_args(&args));
    tracing::debug!("{command}");

    let output = Command::new("git")
        .args(&args)
        .current_dir(&repo.workdir)
        .output()?;

    // `--quiet` implies `--exit-code`: 1 means the index differs from HEAD.
    match output.status.code() {
        Some(0) => Ok(false),
        Some(1) => Ok(true),
        exit_code => Err(GitError::Command {
            command,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
            exit_code,
        }),
    }
}

pub fn commit(repo: &GixRepo, message: &str) -> Result<(), GitError> {
    git_commit(
        repo,
        vec!["commit".to_owned(), "-m".to_owned(), message.to_owned()],
    )
}

pub fn amend(repo: &GixRepo) -> Result<(), GitError> {
    git_commit(
        repo,
        ["commit", "--amend", "--no-edit"].map(str::to_owned).to_vec(),
    )
}
