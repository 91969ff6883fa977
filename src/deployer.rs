//! # Push Orchestrator
//!
//! [`Deployer`] runs one deploy from start to finish:
//!
//! 1. **Mirror resolved**: the local mirror is cloned or pulled and opened.
//! 2. **Remote reconfigured**: if the target remote already has a URL it is
//!    removed, then it is added again pointing at the destination. Only the
//!    named remote is touched.
//! 3. **Customization applied** (optional): the caller's callback runs with
//!    the [`Mirror`] handle, e.g. to tag a release.
//! 4. **Pushed**: the branch is force-pushed inside an ephemeral SSH scope.
//!
//! A failure at any stage ends the deploy. Nothing but the mirror's on-disk
//! contents carries over from one deploy to the next.

use std::fmt;
use std::path::PathBuf;

use log::info;

use crate::defaults::{DEFAULT_BRANCH, DEFAULT_REMOTE};
use crate::error::{Error, Result};
use crate::mirror::{DeployTarget, Mirror, MirrorManager};

/// Progress of a single deploy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployStage {
    Start,
    MirrorResolved,
    RemoteReconfigured,
    CustomizationApplied,
    Pushed,
    Done,
}

impl fmt::Display for DeployStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DeployStage::Start => "start",
            DeployStage::MirrorResolved => "mirror resolved",
            DeployStage::RemoteReconfigured => "remote reconfigured",
            DeployStage::CustomizationApplied => "customization applied",
            DeployStage::Pushed => "pushed",
            DeployStage::Done => "done",
        };
        f.write_str(name)
    }
}

/// Acknowledgement of a finished deploy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deployment {
    /// Local mirror that was pushed.
    pub mirror: PathBuf,
    pub remote: String,
    /// URL the remote points at after the deploy.
    pub url: String,
    pub branch: String,
    /// URL the remote had before it was replaced, if it existed.
    pub replaced_url: Option<String>,
}

/// Deploys a [`DeployTarget`] by force-pushing its mirror.
#[derive(Debug)]
pub struct Deployer {
    mirrors: MirrorManager,
}

impl Deployer {
    /// Creates a deployer using the system `git`.
    pub fn new(target: DeployTarget) -> Self {
        Self::with_manager(MirrorManager::new(target))
    }

    pub fn with_manager(mirrors: MirrorManager) -> Self {
        Self { mirrors }
    }

    pub fn mirrors(&self) -> &MirrorManager {
        &self.mirrors
    }

    /// Force-pushes `master` to the `bitbucket` remote.
    pub fn push_app(&self) -> Result<Deployment> {
        self.push_app_to_remote(DEFAULT_REMOTE, DEFAULT_BRANCH)
    }

    /// Force-pushes `branch` to `remote`.
    pub fn push_app_to_remote(&self, remote: &str, branch: &str) -> Result<Deployment> {
        self.deploy(remote, branch, None::<fn(&Mirror<'_>) -> Result<()>>)
    }

    /// Force-pushes `branch` to `remote`, calling `customize` on the mirror
    /// right before the push. An error from the callback aborts the deploy.
    pub fn push_app_to_remote_with<F>(
        &self,
        remote: &str,
        branch: &str,
        customize: F,
    ) -> Result<Deployment>
    where
        F: FnOnce(&Mirror<'_>) -> Result<()>,
    {
        self.deploy(remote, branch, Some(customize))
    }

    fn deploy<F>(&self, remote: &str, branch: &str, customize: Option<F>) -> Result<Deployment>
    where
        F: FnOnce(&Mirror<'_>) -> Result<()>,
    {
        validate_name("remote", remote)?;
        validate_name("branch", branch)?;

        info!("push_app_to_remote");
        enter(DeployStage::Start);

        let mirror = self.mirrors.resolve()?;
        enter(DeployStage::MirrorResolved);

        let url = &self.mirrors.target().destination_repo_url;
        let replaced_url = mirror.remote_url(remote)?;
        if let Some(previous) = &replaced_url {
            info!("removing remote {} ({})", remote, previous);
            mirror.remove_remote(remote)?;
        }
        mirror.add_remote(remote, url)?;
        enter(DeployStage::RemoteReconfigured);

        if let Some(customize) = customize {
            customize(&mirror)?;
            enter(DeployStage::CustomizationApplied);
        }

        info!(
            "deploying {} to {} from branch {}",
            mirror.path().display(),
            url,
            branch
        );
        let runner = self.mirrors.runner();
        let git = self.mirrors.git();
        self.mirrors.with_ssh(|ssh| {
            runner.run(&format!("git push -f {} {}", remote, branch), || {
                git.push(mirror.path(), remote, branch, true, ssh)
            })
        })?;
        enter(DeployStage::Pushed);

        let deployment = Deployment {
            mirror: mirror.path().to_path_buf(),
            remote: remote.to_string(),
            url: url.clone(),
            branch: branch.to_string(),
            replaced_url,
        };
        enter(DeployStage::Done);
        Ok(deployment)
    }
}

fn enter(stage: DeployStage) {
    info!("deploy stage: {}", stage);
}

/// Rejects remote and branch names git would misread.
fn validate_name(kind: &str, name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::InvalidArgument {
            message: format!("{} name must not be empty", kind),
        });
    }
    if name.starts_with('-') || name.chars().any(char::is_whitespace) {
        return Err(Error::InvalidArgument {
            message: format!("invalid {} name: {:?}", kind, name),
        });
    }
    Ok(())
}
