//! Test doubles shared by the unit tests of `mirror` and `deployer`.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::error::{Error, Result};
use crate::git::GitOperations;
use crate::ssh::EphemeralSsh;

/// One recorded call on [`MockGitOperations`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GitCall {
    Clone { url: String, target_dir: PathBuf },
    Pull { repo_dir: PathBuf },
    Verify { repo_dir: PathBuf },
    RemoteUrl { remote: String },
    AddRemote { remote: String, url: String },
    RemoveRemote { remote: String },
    Push { remote: String, branch: String, force: bool },
    Run { args: Vec<String> },
}

/// In-memory git. Clones create a `.git/config` marker on disk so mirror
/// detection works against a real temp directory; remotes live in a map.
///
/// Cloning the mock shares its state, so a test can keep one copy for
/// assertions and hand a boxed copy to the code under test.
#[derive(Debug, Clone, Default)]
pub struct MockGitOperations {
    calls: Arc<Mutex<Vec<GitCall>>>,
    remotes: Arc<Mutex<BTreeMap<String, String>>>,
    transient_failures: Arc<Mutex<HashMap<&'static str, u32>>>,
    permanent_failures: Arc<Mutex<Vec<&'static str>>>,
    credentials: Arc<Mutex<Vec<(PathBuf, bool)>>>,
}

impl MockGitOperations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_remote(self, remote: &str, url: &str) -> Self {
        self.remotes
            .lock()
            .unwrap()
            .insert(remote.to_string(), url.to_string());
        self
    }

    /// Makes the next `times` calls of `operation` fail with a transient error.
    pub fn failing(self, operation: &'static str, times: u32) -> Self {
        self.transient_failures
            .lock()
            .unwrap()
            .insert(operation, times);
        self
    }

    /// Makes every call of `operation` fail with a non-retryable error.
    pub fn broken(self, operation: &'static str) -> Self {
        self.permanent_failures.lock().unwrap().push(operation);
        self
    }

    pub fn calls(&self) -> Vec<GitCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, operation: &str) -> usize {
        self.calls()
            .iter()
            .filter(|call| call_name(call) == operation)
            .count()
    }

    pub fn remotes(&self) -> BTreeMap<String, String> {
        self.remotes.lock().unwrap().clone()
    }

    /// Key paths seen by remote operations, with whether the key file and
    /// wrapper existed at call time.
    pub fn credentials(&self) -> Vec<(PathBuf, bool)> {
        self.credentials.lock().unwrap().clone()
    }

    fn record(&self, call: GitCall) -> Result<()> {
        let operation = call_name(&call);
        self.calls.lock().unwrap().push(call);

        if self.permanent_failures.lock().unwrap().contains(&operation) {
            return Err(Error::InvalidArgument {
                message: format!("{} is broken", operation),
            });
        }

        let mut failures = self.transient_failures.lock().unwrap();
        if let Some(remaining) = failures.get_mut(operation) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(Error::GitExecute {
                    command: format!("git {}", operation),
                    output: "some git error".to_string(),
                });
            }
        }
        Ok(())
    }

    fn record_credentials(&self, ssh: &EphemeralSsh) {
        let present = ssh.key_path().exists() && ssh.wrapper_path().exists();
        self.credentials
            .lock()
            .unwrap()
            .push((ssh.key_path().to_path_buf(), present));
    }
}

fn call_name(call: &GitCall) -> &'static str {
    match call {
        GitCall::Clone { .. } => "clone",
        GitCall::Pull { .. } => "pull",
        GitCall::Verify { .. } => "verify",
        GitCall::RemoteUrl { .. } => "remote_url",
        GitCall::AddRemote { .. } => "add_remote",
        GitCall::RemoveRemote { .. } => "remove_remote",
        GitCall::Push { .. } => "push",
        GitCall::Run { .. } => "run",
    }
}

/// Creates the `.git/config` marker that makes `dir` look like a clone.
pub fn create_local_repo(dir: &Path) {
    fs::create_dir_all(dir.join(".git")).unwrap();
    fs::write(dir.join(".git").join("config"), "[core]\n").unwrap();
}

impl GitOperations for MockGitOperations {
    fn clone_repo(&self, url: &str, target_dir: &Path, ssh: &EphemeralSsh) -> Result<()> {
        self.record_credentials(ssh);
        self.record(GitCall::Clone {
            url: url.to_string(),
            target_dir: target_dir.to_path_buf(),
        })?;
        create_local_repo(target_dir);
        Ok(())
    }

    fn pull(&self, repo_dir: &Path, ssh: &EphemeralSsh) -> Result<()> {
        self.record_credentials(ssh);
        self.record(GitCall::Pull {
            repo_dir: repo_dir.to_path_buf(),
        })
    }

    fn verify(&self, repo_dir: &Path) -> Result<()> {
        self.record(GitCall::Verify {
            repo_dir: repo_dir.to_path_buf(),
        })
    }

    fn remote_url(&self, _repo_dir: &Path, remote: &str) -> Result<Option<String>> {
        self.record(GitCall::RemoteUrl {
            remote: remote.to_string(),
        })?;
        Ok(self.remotes.lock().unwrap().get(remote).cloned())
    }

    fn add_remote(&self, _repo_dir: &Path, remote: &str, url: &str) -> Result<()> {
        self.record(GitCall::AddRemote {
            remote: remote.to_string(),
            url: url.to_string(),
        })?;
        let mut remotes = self.remotes.lock().unwrap();
        if remotes.contains_key(remote) {
            return Err(Error::GitExecute {
                command: format!("git remote add {} {}", remote, url),
                output: format!("error: remote {} already exists.", remote),
            });
        }
        remotes.insert(remote.to_string(), url.to_string());
        Ok(())
    }

    fn remove_remote(&self, _repo_dir: &Path, remote: &str) -> Result<()> {
        self.record(GitCall::RemoveRemote {
            remote: remote.to_string(),
        })?;
        self.remotes.lock().unwrap().remove(remote);
        Ok(())
    }

    fn push(
        &self,
        _repo_dir: &Path,
        remote: &str,
        branch: &str,
        force: bool,
        ssh: &EphemeralSsh,
    ) -> Result<()> {
        self.record_credentials(ssh);
        self.record(GitCall::Push {
            remote: remote.to_string(),
            branch: branch.to_string(),
            force,
        })
    }

    fn run(&self, _repo_dir: &Path, args: &[&str]) -> Result<String> {
        self.record(GitCall::Run {
            args: args.iter().map(|arg| arg.to_string()).collect(),
        })?;
        Ok(String::new())
    }
}
