//! # Deploy Configuration
//!
//! This module defines [`DeployConfig`], the contents of a
//! `.mirror-deploy.yaml` file, and turns it into a [`DeployTarget`].
//!
//! ```yaml
//! source_repo_url: git@github.com:g5dev/some_repo.git
//! destination_repo_url: git@bitbucket.org:g5dev/some_repo.git
//! repo_name: some_repo          # optional, defaults to source_repo_url
//! private_key_path: ~/.ssh/deploy_key
//! repo_dir: /var/cache/mirrors  # optional
//! remote: bitbucket             # optional
//! branch: master                # optional
//! retries: 2                    # optional
//! ```
//!
//! Every field is optional in the file because any of them can also come from
//! the command line or the environment. [`DeployConfig::merge`] layers those
//! overrides on top of the file; [`DeployConfig::to_target`] checks that the
//! required settings ended up present.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::defaults::{default_repo_dir, DEFAULT_BRANCH, DEFAULT_REMOTE};
use crate::error::{Error, Result};
use crate::mirror::DeployTarget;
use crate::runner::{RetryPolicy, DEFAULT_RETRIES};

/// Settings for one deploy, as read from YAML or collected from flags.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeployConfig {
    /// Repository cloned into the local mirror.
    #[serde(default)]
    pub source_repo_url: Option<String>,
    /// Repository the mirror is force-pushed to.
    #[serde(default)]
    pub destination_repo_url: Option<String>,
    /// Identifier of the local mirror. Defaults to `source_repo_url`.
    #[serde(default)]
    pub repo_name: Option<String>,
    /// Inline private key. Takes precedence over `private_key_path`.
    #[serde(default)]
    pub private_key: Option<String>,
    /// File holding the private key.
    #[serde(default)]
    pub private_key_path: Option<PathBuf>,
    /// Root directory of all mirrors.
    #[serde(default)]
    pub repo_dir: Option<PathBuf>,
    #[serde(default)]
    pub remote: Option<String>,
    #[serde(default)]
    pub branch: Option<String>,
    /// Extra attempts for transient git failures.
    #[serde(default)]
    pub retries: Option<u32>,
}

impl fmt::Debug for DeployConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeployConfig")
            .field("source_repo_url", &self.source_repo_url)
            .field("destination_repo_url", &self.destination_repo_url)
            .field("repo_name", &self.repo_name)
            .field("private_key", &self.private_key.as_ref().map(|_| "<redacted>"))
            .field("private_key_path", &self.private_key_path)
            .field("repo_dir", &self.repo_dir)
            .field("remote", &self.remote)
            .field("branch", &self.branch)
            .field("retries", &self.retries)
            .finish()
    }
}

impl DeployConfig {
    /// Layers `overrides` on top of `self`. Every setting present in
    /// `overrides` wins.
    pub fn merge(self, overrides: DeployConfig) -> DeployConfig {
        DeployConfig {
            source_repo_url: overrides.source_repo_url.or(self.source_repo_url),
            destination_repo_url: overrides.destination_repo_url.or(self.destination_repo_url),
            repo_name: overrides.repo_name.or(self.repo_name),
            private_key: overrides.private_key.or(self.private_key),
            private_key_path: overrides.private_key_path.or(self.private_key_path),
            repo_dir: overrides.repo_dir.or(self.repo_dir),
            remote: overrides.remote.or(self.remote),
            branch: overrides.branch.or(self.branch),
            retries: overrides.retries.or(self.retries),
        }
    }

    /// Identifier the mirror folder is derived from.
    pub fn repo_identifier(&self) -> Result<String> {
        if let Some(name) = non_empty(&self.repo_name) {
            return Ok(name.to_string());
        }
        non_empty(&self.source_repo_url)
            .map(str::to_string)
            .ok_or_else(|| missing("source_repo_url", "--source-repo-url"))
    }

    /// Root directory of all mirrors, with `~/` expanded.
    pub fn repo_dir(&self) -> PathBuf {
        self.repo_dir
            .as_deref()
            .map(expand_home)
            .unwrap_or_else(default_repo_dir)
    }

    pub fn remote(&self) -> &str {
        non_empty(&self.remote).unwrap_or(DEFAULT_REMOTE)
    }

    pub fn branch(&self) -> &str {
        non_empty(&self.branch).unwrap_or(DEFAULT_BRANCH)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.retries.unwrap_or(DEFAULT_RETRIES))
    }

    /// Loads the private key, inline value first.
    pub fn private_key(&self) -> Result<Vec<u8>> {
        if let Some(key) = non_empty(&self.private_key) {
            return Ok(key.as_bytes().to_vec());
        }
        let path = self.private_key_path.as_deref().ok_or_else(|| {
            missing(
                "private_key",
                "--private-key-path, MIRROR_DEPLOY_PRIVATE_KEY or private_key_path",
            )
        })?;
        let path = expand_home(path);
        std::fs::read(&path).map_err(|e| Error::ConfigParse {
            message: format!("cannot read private key {}: {}", path.display(), e),
            hint: Some("Check private_key_path and the file's permissions".to_string()),
        })
    }

    /// Validates the settings and builds a deploy target.
    pub fn to_target(&self) -> Result<DeployTarget> {
        self.build_target(true)
    }

    /// Builds a target for operations that never push. The destination may
    /// be absent, in which case it is left empty.
    pub fn to_mirror_target(&self) -> Result<DeployTarget> {
        self.build_target(false)
    }

    fn build_target(&self, require_destination: bool) -> Result<DeployTarget> {
        let source_repo_url = non_empty(&self.source_repo_url)
            .ok_or_else(|| missing("source_repo_url", "--source-repo-url"))?
            .to_string();
        let destination_repo_url = match non_empty(&self.destination_repo_url) {
            Some(url) => url.to_string(),
            None if require_destination => {
                return Err(missing("destination_repo_url", "--destination-repo-url"))
            }
            None => String::new(),
        };

        Ok(DeployTarget {
            source_repo_url,
            destination_repo_url,
            repo_name: self.repo_identifier()?,
            private_key: self.private_key()?,
            repo_dir: self.repo_dir(),
        })
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn missing(setting: &str, flag: &str) -> Error {
    Error::MissingSetting {
        setting: setting.to_string(),
        hint: Some(format!(
            "Set `{}` in the configuration file or pass {}",
            setting, flag
        )),
    }
}

/// Expands a leading `~/` to the home directory.
pub fn expand_home(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), dirs::home_dir()) {
        (Ok(rest), Some(home)) => home.join(rest),
        _ => path.to_path_buf(),
    }
}

/// Parses a YAML string into a `DeployConfig`.
///
/// An empty document (or one holding only comments) is an empty
/// configuration.
pub fn parse(yaml_content: &str) -> Result<DeployConfig> {
    if yaml_content.trim().is_empty() {
        return Ok(DeployConfig::default());
    }

    serde_yaml::from_str::<Option<DeployConfig>>(yaml_content)
        .map(Option::unwrap_or_default)
        .map_err(|e| Error::ConfigParse {
            message: e.to_string(),
            hint: Some(
                "Known keys: source_repo_url, destination_repo_url, repo_name, private_key, \
                 private_key_path, repo_dir, remote, branch, retries"
                    .to_string(),
            ),
        })
}

/// Parse a `DeployConfig` from a YAML file path
pub fn from_file<P: AsRef<Path>>(path: P) -> Result<DeployConfig> {
    let content = std::fs::read_to_string(path).map_err(Error::Io)?;
    parse(&content)
}
