//! # Git Operations
//!
//! This module defines [`GitOperations`], the seam between the deploy logic
//! and the `git` executable, and [`SystemGit`], the implementation that shells
//! out to the system `git`.
//!
//! Operations that reach a remote (clone, pull, push) take the
//! [`EphemeralSsh`] of the enclosing credential scope and apply it to the
//! child process. Every method reports a non-zero git exit as
//! [`Error::GitExecute`](crate::error::Error::GitExecute) so the command
//! runner can retry it.

use std::path::Path;
use std::process::Command;

use crate::error::{Error, Result};
use crate::runner;
use crate::ssh::EphemeralSsh;

/// Trait for git operations - allows mocking in tests
pub trait GitOperations: Send + Sync {
    /// Clones `url` into `target_dir`, which must be empty or absent.
    fn clone_repo(&self, url: &str, target_dir: &Path, ssh: &EphemeralSsh) -> Result<()>;

    /// Pulls the current branch of the repository at `repo_dir`.
    fn pull(&self, repo_dir: &Path, ssh: &EphemeralSsh) -> Result<()>;

    /// Checks that `repo_dir` is a usable git work tree.
    fn verify(&self, repo_dir: &Path) -> Result<()>;

    /// Returns the configured URL of `remote`, or `None` when the remote does
    /// not exist.
    fn remote_url(&self, repo_dir: &Path, remote: &str) -> Result<Option<String>>;

    /// Adds a remote named `remote` pointing at `url`.
    fn add_remote(&self, repo_dir: &Path, remote: &str, url: &str) -> Result<()>;

    /// Removes the remote named `remote`.
    fn remove_remote(&self, repo_dir: &Path, remote: &str) -> Result<()>;

    /// Pushes `branch` to `remote`, optionally with `--force`.
    fn push(
        &self,
        repo_dir: &Path,
        remote: &str,
        branch: &str,
        force: bool,
        ssh: &EphemeralSsh,
    ) -> Result<()>;

    /// Runs an arbitrary git command inside `repo_dir` and returns its output.
    fn run(&self, repo_dir: &Path, args: &[&str]) -> Result<String>;
}

/// The default implementation of `GitOperations`, which uses the system's
/// `git` command.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemGit;

impl GitOperations for SystemGit {
    fn clone_repo(&self, url: &str, target_dir: &Path, ssh: &EphemeralSsh) -> Result<()> {
        let mut command = clone_command(url, target_dir);
        ssh.configure(&mut command);
        runner::execute(&mut command).map(drop)
    }

    fn pull(&self, repo_dir: &Path, ssh: &EphemeralSsh) -> Result<()> {
        let mut command = git_in(repo_dir);
        command.arg("pull");
        ssh.configure(&mut command);
        runner::execute(&mut command).map(drop)
    }

    fn verify(&self, repo_dir: &Path) -> Result<()> {
        let mut command = git_in(repo_dir);
        command.args(["rev-parse", "--is-inside-work-tree"]);
        runner::execute(&mut command).map(drop)
    }

    fn remote_url(&self, repo_dir: &Path, remote: &str) -> Result<Option<String>> {
        let mut command = remote_url_command(repo_dir, remote);
        let line = runner::describe(&command);
        let captured = runner::capture(&mut command)?;

        // `git config --get` exits with 1 when the key is not set.
        match captured.status {
            Some(0) => {
                let url = captured.output.trim();
                Ok((!url.is_empty()).then(|| url.to_string()))
            }
            Some(1) => Ok(None),
            _ => Err(Error::GitExecute {
                command: line,
                output: captured.output,
            }),
        }
    }

    fn add_remote(&self, repo_dir: &Path, remote: &str, url: &str) -> Result<()> {
        let mut command = git_in(repo_dir);
        command.args(["remote", "add", remote, url]);
        runner::execute(&mut command).map(drop)
    }

    fn remove_remote(&self, repo_dir: &Path, remote: &str) -> Result<()> {
        let mut command = git_in(repo_dir);
        command.args(["remote", "remove", remote]);
        runner::execute(&mut command).map(drop)
    }

    fn push(
        &self,
        repo_dir: &Path,
        remote: &str,
        branch: &str,
        force: bool,
        ssh: &EphemeralSsh,
    ) -> Result<()> {
        let mut command = push_command(repo_dir, remote, branch, force);
        ssh.configure(&mut command);
        runner::execute(&mut command).map(drop)
    }

    fn run(&self, repo_dir: &Path, args: &[&str]) -> Result<String> {
        let mut command = git_in(repo_dir);
        command.args(args);
        runner::execute(&mut command)
    }
}

/// A `git` command that never prompts for credentials.
fn git() -> Command {
    let mut command = Command::new("git");
    command.env("GIT_TERMINAL_PROMPT", "0");
    command
}

fn git_in(repo_dir: &Path) -> Command {
    let mut command = git();
    command.current_dir(repo_dir);
    command
}

fn clone_command(url: &str, target_dir: &Path) -> Command {
    let mut command = git();
    // An inherited work tree or git dir would redirect the clone.
    command
        .env_remove("GIT_WORK_TREE")
        .env_remove("GIT_DIR")
        .args(["clone", url])
        .arg(target_dir);
    command
}

fn remote_url_command(repo_dir: &Path, remote: &str) -> Command {
    let mut command = git_in(repo_dir);
    command.args(["config", "--get", &format!("remote.{}.url", remote)]);
    command
}

fn push_command(repo_dir: &Path, remote: &str, branch: &str, force: bool) -> Command {
    let mut command = git_in(repo_dir);
    command.arg("push");
    if force {
        command.arg("-f");
    }
    command.args([remote, branch]);
    command
}
