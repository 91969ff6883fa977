//! # CLI Command Implementations
//!
//! This module contains the implementation for each subcommand of the
//! `mirror-deploy` command-line tool, one file per subcommand.
//!
//! Each command module contains an `Args` struct derived with `clap` and an
//! `execute` function that calls into the `mirror_deploy` library. The
//! commands that act on a repository share [`TargetArgs`], which loads the
//! configuration file and layers command-line overrides on top of it.

pub mod completions;
pub mod deploy;
pub mod info;
pub mod sync;

use anyhow::Result;
use clap::Args;
use log::debug;
use std::fmt;
use std::path::{Path, PathBuf};

use mirror_deploy::config::{self, DeployConfig};
use mirror_deploy::defaults::DEFAULT_CONFIG_FILENAME;
use mirror_deploy::suggestions;

/// Where the deploy settings come from.
#[derive(Args, Default, Clone)]
pub struct TargetArgs {
    /// Path to the configuration file.
    ///
    /// Defaults to `.mirror-deploy.yaml` in the current directory, which may
    /// be absent when every required setting is passed as a flag.
    #[arg(short, long, value_name = "FILE", env = "MIRROR_DEPLOY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Repository to mirror.
    #[arg(long, value_name = "URL")]
    pub source_repo_url: Option<String>,

    /// Repository to force-push to.
    #[arg(long, value_name = "URL")]
    pub destination_repo_url: Option<String>,

    /// Identifier of the local mirror (defaults to the source URL).
    #[arg(long, value_name = "NAME")]
    pub repo_name: Option<String>,

    /// File holding the deploy key.
    #[arg(long, value_name = "FILE")]
    pub private_key_path: Option<PathBuf>,

    /// Deploy key contents.
    #[arg(
        long,
        value_name = "KEY",
        env = "MIRROR_DEPLOY_PRIVATE_KEY",
        hide = true,
        hide_env_values = true
    )]
    pub private_key: Option<String>,

    /// Root directory of all mirrors.
    ///
    /// Defaults to the system cache directory (`~/.cache/mirror-deploy` on
    /// Linux, `~/Library/Caches/mirror-deploy` on macOS).
    #[arg(long, value_name = "DIR", env = "MIRROR_DEPLOY_REPO_DIR")]
    pub repo_dir: Option<PathBuf>,

    /// Extra attempts for failing git commands.
    #[arg(long, value_name = "N")]
    pub retries: Option<u32>,
}

impl fmt::Debug for TargetArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TargetArgs")
            .field("config", &self.config)
            .field("source_repo_url", &self.source_repo_url)
            .field("destination_repo_url", &self.destination_repo_url)
            .field("repo_name", &self.repo_name)
            .field("private_key_path", &self.private_key_path)
            .field("private_key", &self.private_key.as_ref().map(|_| "<redacted>"))
            .field("repo_dir", &self.repo_dir)
            .field("retries", &self.retries)
            .finish()
    }
}

impl TargetArgs {
    /// Settings given on the command line or through the environment.
    pub fn overrides(&self) -> DeployConfig {
        DeployConfig {
            source_repo_url: self.source_repo_url.clone(),
            destination_repo_url: self.destination_repo_url.clone(),
            repo_name: self.repo_name.clone(),
            private_key: self.private_key.clone(),
            private_key_path: self.private_key_path.clone(),
            repo_dir: self.repo_dir.clone(),
            retries: self.retries,
            ..DeployConfig::default()
        }
    }

    /// Reads the configuration file and applies the overrides.
    ///
    /// An explicitly named file must exist; the default one is optional.
    pub fn load(&self) -> Result<DeployConfig> {
        let file = match &self.config {
            Some(path) => read_config(path)?,
            None => {
                let path = Path::new(DEFAULT_CONFIG_FILENAME);
                if path.exists() {
                    read_config(path)?
                } else {
                    debug!("no {} found, using flags only", DEFAULT_CONFIG_FILENAME);
                    DeployConfig::default()
                }
            }
        };

        Ok(file.merge(self.overrides()))
    }
}

fn read_config(path: &Path) -> Result<DeployConfig> {
    if !path.exists() {
        return Err(suggestions::config_not_found(path));
    }
    debug!("loading configuration from {}", path.display());
    config::from_file(path).map_err(|e| {
        anyhow::anyhow!("Failed to load config from {}: {}", path.display(), e)
    })
}
