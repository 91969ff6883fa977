//! Default values for mirror-deploy configuration.
//!
//! This module provides centralized default values used across commands,
//! ensuring consistency and avoiding duplication.

use std::path::PathBuf;

/// Configuration file looked up in the current directory.
pub const DEFAULT_CONFIG_FILENAME: &str = ".mirror-deploy.yaml";

/// Remote name used for the push target.
pub const DEFAULT_REMOTE: &str = "bitbucket";

/// Branch pushed to the target.
pub const DEFAULT_BRANCH: &str = "master";

/// Returns the default root directory for mirrors.
///
/// Uses the platform-appropriate cache directory:
/// - Linux: `~/.cache/mirror-deploy` (XDG Base Directory)
/// - macOS: `~/Library/Caches/mirror-deploy`
/// - Windows: `{FOLDERID_LocalAppData}\mirror-deploy`
///
/// Falls back to `.mirror-deploy-repos` in the current directory if the
/// platform cache directory cannot be determined.
///
/// This can be overridden by the `--repo-dir` CLI flag, the
/// `MIRROR_DEPLOY_REPO_DIR` environment variable or `repo_dir` in the
/// configuration file.
pub fn default_repo_dir() -> PathBuf {
    dirs::cache_dir()
        .map(|dir| dir.join("mirror-deploy"))
        .unwrap_or_else(|| PathBuf::from(".mirror-deploy-repos"))
}
