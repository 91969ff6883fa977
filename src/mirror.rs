//! # Local Mirror Management
//!
//! A mirror is the local clone of the source repository that a deploy pushes
//! from. Each [`DeployTarget`] owns exactly one mirror directory, located at
//! `repo_dir / mirror_folder_name(repo_name)`. The folder name is a SHA-256
//! prefix of the identifier, so it is stable across runs and toolchains and
//! two identifiers never share a directory.
//!
//! [`MirrorManager`] decides between cloning and pulling (a `.git/config`
//! file inside the folder means "already cloned") and hands out a [`Mirror`]
//! handle for remote manipulation. All git calls go through the
//! [`CommandRunner`]; the ones that talk to a remote also run inside an
//! ephemeral SSH scope.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use log::info;
use sha2::{Digest, Sha256};

use crate::error::Result;
use crate::git::{GitOperations, SystemGit};
use crate::runner::CommandRunner;
use crate::ssh::{with_ephemeral_ssh_in, EphemeralSsh};

/// Length of the hex digest prefix used as the mirror folder name.
const FOLDER_NAME_LEN: usize = 16;

/// Everything needed to deploy one repository. Immutable for the duration of
/// a deploy.
#[derive(Clone, PartialEq, Eq)]
pub struct DeployTarget {
    /// Repository that is cloned into the mirror.
    pub source_repo_url: String,
    /// Repository the mirror is force-pushed to.
    pub destination_repo_url: String,
    /// Identifier the mirror folder is derived from.
    pub repo_name: String,
    /// Private key used for every remote operation.
    pub private_key: Vec<u8>,
    /// Root directory holding all mirrors.
    pub repo_dir: PathBuf,
}

impl fmt::Debug for DeployTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeployTarget")
            .field("source_repo_url", &self.source_repo_url)
            .field("destination_repo_url", &self.destination_repo_url)
            .field("repo_name", &self.repo_name)
            .field("private_key", &"<redacted>")
            .field("repo_dir", &self.repo_dir)
            .finish()
    }
}

/// Folder name for a repository identifier.
pub fn mirror_folder_name(repo_name: &str) -> String {
    let digest = format!("{:x}", Sha256::digest(repo_name.as_bytes()));
    digest[..FOLDER_NAME_LEN].to_string()
}

/// Mirror location for `repo_name` under `repo_dir`. Pure; touches nothing.
pub fn mirror_folder(repo_dir: &Path, repo_name: &str) -> PathBuf {
    repo_dir.join(mirror_folder_name(repo_name))
}

/// Whether `folder` holds a git clone.
pub fn has_git_marker(folder: &Path) -> bool {
    folder.join(".git").join("config").is_file()
}

/// An opened local mirror.
///
/// Remote bookkeeping and arbitrary git commands on the mirror run through
/// the same [`CommandRunner`] as the rest of the deploy. This is the handle
/// passed to deploy customization callbacks.
pub struct Mirror<'a> {
    path: PathBuf,
    git: &'a dyn GitOperations,
    runner: CommandRunner,
}

impl fmt::Debug for Mirror<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mirror").field("path", &self.path).finish()
    }
}

impl<'a> Mirror<'a> {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// URL of `remote`, `None` when it is not configured.
    pub fn remote_url(&self, remote: &str) -> Result<Option<String>> {
        self.runner
            .run(&format!("git config --get remote.{}.url", remote), || {
                self.git.remote_url(&self.path, remote)
            })
    }

    pub fn add_remote(&self, remote: &str, url: &str) -> Result<()> {
        self.runner
            .run(&format!("git remote add {} {}", remote, url), || {
                self.git.add_remote(&self.path, remote, url)
            })
    }

    pub fn remove_remote(&self, remote: &str) -> Result<()> {
        self.runner.run(&format!("git remote remove {}", remote), || {
            self.git.remove_remote(&self.path, remote)
        })
    }

    /// Runs `git <args>` inside the mirror, e.g. `["tag", "v1.2.0"]`.
    pub fn git(&self, args: &[&str]) -> Result<String> {
        self.runner
            .run(&format!("git {}", args.join(" ")), || self.git.run(&self.path, args))
    }
}

/// Clones, updates and opens the mirror of one [`DeployTarget`].
pub struct MirrorManager {
    target: DeployTarget,
    git: Box<dyn GitOperations>,
    runner: CommandRunner,
    credentials_dir: PathBuf,
}

impl fmt::Debug for MirrorManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MirrorManager")
            .field("target", &self.target)
            .field("runner", &self.runner)
            .field("credentials_dir", &self.credentials_dir)
            .finish()
    }
}

impl MirrorManager {
    /// Creates a manager backed by the system `git` and the default retry
    /// policy.
    pub fn new(target: DeployTarget) -> Self {
        Self::with_operations(target, Box::new(SystemGit), CommandRunner::default())
    }

    /// Creates a manager with a custom `GitOperations` implementation and
    /// runner.
    pub fn with_operations(
        target: DeployTarget,
        git: Box<dyn GitOperations>,
        runner: CommandRunner,
    ) -> Self {
        Self {
            target,
            git,
            runner,
            credentials_dir: std::env::temp_dir(),
        }
    }

    /// Places ephemeral SSH credentials in `dir` instead of the system temp
    /// directory.
    pub fn with_credentials_dir(mut self, dir: PathBuf) -> Self {
        self.credentials_dir = dir;
        self
    }

    pub fn target(&self) -> &DeployTarget {
        &self.target
    }

    pub fn runner(&self) -> CommandRunner {
        self.runner
    }

    pub fn git(&self) -> &dyn GitOperations {
        self.git.as_ref()
    }

    /// Returns the mirror folder, creating it and any missing parents.
    pub fn folder(&self) -> Result<PathBuf> {
        info!("setup_folder");
        let folder = mirror_folder(&self.target.repo_dir, &self.target.repo_name);
        fs::create_dir_all(&folder)?;
        Ok(folder)
    }

    /// Whether the mirror has already been cloned.
    pub fn exists_locally(&self) -> bool {
        has_git_marker(&mirror_folder(
            &self.target.repo_dir,
            &self.target.repo_name,
        ))
    }

    /// Pulls an existing mirror, or clones a fresh one.
    pub fn clone_or_pull(&self) -> Result<()> {
        info!("clone_or_pull");
        if self.exists_locally() {
            self.pull()
        } else {
            self.clone_repo()
        }
    }

    /// Brings the mirror up to date with the source repository.
    pub fn update_working_copy(&self) -> Result<()> {
        self.clone_or_pull()
    }

    /// Clones the source repository into the mirror folder.
    pub fn clone_repo(&self) -> Result<()> {
        let folder = self.folder()?;
        let url = &self.target.source_repo_url;
        info!("cloning {} to {}", url, folder.display());

        self.with_ssh(|ssh| {
            self.runner
                .run(&format!("git clone {} {}", url, folder.display()), || {
                    self.git.clone_repo(url, &folder, ssh)
                })
        })
    }

    /// Pulls into the existing mirror.
    ///
    /// Git runs with the mirror as its working directory; the working
    /// directory of this process is never changed.
    pub fn pull(&self) -> Result<()> {
        let folder = self.folder()?;
        info!("pulling from {}", folder.display());

        self.with_ssh(|ssh| {
            self.runner.run("git pull", || self.git.pull(&folder, ssh))
        })
    }

    /// Opens the mirror folder as a repository.
    pub fn open(&self) -> Result<Mirror<'_>> {
        info!("git open");
        let path = self.folder()?;
        self.runner
            .run("git rev-parse --is-inside-work-tree", || {
                self.git.verify(&path)
            })?;

        Ok(Mirror {
            path,
            git: self.git.as_ref(),
            runner: self.runner,
        })
    }

    /// Clones or pulls, then opens the mirror.
    pub fn resolve(&self) -> Result<Mirror<'_>> {
        info!("setup_repo");
        self.clone_or_pull()?;
        self.open()
    }

    /// Runs `operation` inside an ephemeral SSH scope for this target's key.
    pub fn with_ssh<T, F>(&self, operation: F) -> Result<T>
    where
        F: FnOnce(&EphemeralSsh) -> Result<T>,
    {
        with_ephemeral_ssh_in(&self.credentials_dir, &self.target.private_key, operation)
    }
}
