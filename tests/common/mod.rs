//! Shared test utilities for integration and E2E tests.
//!
//! ## Usage
//!
//! Add `mod common;` to your test file, then use the helpers:
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! #[test]
//! fn test_example() {
//!     let fixture = TestFixture::new().with_config(configs::MINIMAL);
//!     fixture.command().arg("info").assert().success();
//! }
//! ```

use assert_fs::prelude::*;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    #[allow(unused_imports)]
    pub use assert_cmd::cargo::cargo_bin_cmd;
    #[allow(unused_imports)]
    pub use assert_fs::prelude::*;
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use super::configs;
    #[allow(unused_imports)]
    pub use super::git;
    pub use super::TestFixture;
}

/// Configuration YAML snippets for testing.
#[allow(dead_code)]
pub mod configs {
    /// Every required setting, with an inline key and a relative repo dir.
    pub const MINIMAL: &str = r#"
source_repo_url: git@github.com:g5dev/some_repo.git
destination_repo_url: git@bitbucket.org:g5dev/some_repo.git
repo_name: some_repo
private_key: not-a-real-key
repo_dir: repos
"#;

    /// Missing the destination.
    pub const WITHOUT_DESTINATION: &str = r#"
source_repo_url: git@github.com:g5dev/some_repo.git
private_key: not-a-real-key
"#;

    /// Uses a key the tool does not know about.
    pub const UNKNOWN_KEY: &str = "github_repo: g5dev/some_repo\n";

    /// Invalid YAML for error testing.
    pub const INVALID_YAML: &str = "invalid: yaml: content:";
}

/// Runs git in `dir` and panics with its output on failure.
#[allow(dead_code)]
pub fn git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .current_dir(dir)
        .args([
            "-c",
            "user.name=Mirror Deploy Tests",
            "-c",
            "user.email=tests@example.com",
            "-c",
            "init.defaultBranch=master",
        ])
        .args(args)
        .output()
        .expect("Failed to run git");
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// A test fixture that provides a temporary directory with optional config.
///
/// ```rust,ignore
/// let fixture = TestFixture::new().with_config(configs::MINIMAL);
/// fixture.command().arg("info").assert().success();
/// ```
pub struct TestFixture {
    temp_dir: assert_fs::TempDir,
}

impl TestFixture {
    /// Create a new test fixture with an empty temporary directory.
    pub fn new() -> Self {
        Self {
            temp_dir: assert_fs::TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Add a `.mirror-deploy.yaml` configuration file with the given content.
    pub fn with_config(self, content: &str) -> Self {
        self.temp_dir
            .child(".mirror-deploy.yaml")
            .write_str(content)
            .expect("Failed to write config file");
        self
    }

    /// Add a file with the given path and content.
    #[allow(dead_code)]
    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.temp_dir
            .child(path)
            .write_str(content)
            .expect("Failed to write file");
        self
    }

    /// Get the path to the temporary directory.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Get the path to the config file.
    #[allow(dead_code)]
    pub fn config_path(&self) -> PathBuf {
        self.temp_dir.path().join(".mirror-deploy.yaml")
    }

    /// Creates a repository with one commit on `master` and returns its path.
    #[allow(dead_code)]
    pub fn source_repo(&self, name: &str, content: &str) -> PathBuf {
        let dir = self.path().join(name);
        std::fs::create_dir_all(&dir).expect("Failed to create source repo");
        git(&dir, &["init"]);
        self.commit(&dir, "README.md", content);
        dir
    }

    /// Writes `file` in `repo` and commits it.
    #[allow(dead_code)]
    pub fn commit(&self, repo: &Path, file: &str, content: &str) {
        std::fs::write(repo.join(file), content).expect("Failed to write file");
        git(repo, &["add", file]);
        git(repo, &["commit", "-m", &format!("update {}", file)]);
    }

    /// Creates an empty bare repository and returns its path.
    #[allow(dead_code)]
    pub fn bare_repo(&self, name: &str) -> PathBuf {
        let dir = self.path().join(name);
        std::fs::create_dir_all(&dir).expect("Failed to create bare repo");
        git(&dir, &["init", "--bare"]);
        dir
    }

    /// Create a command configured to run in this fixture's directory, with
    /// the tool's environment variables cleared.
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("mirror-deploy");
        cmd.current_dir(self.path())
            .env_remove("MIRROR_DEPLOY_CONFIG")
            .env_remove("MIRROR_DEPLOY_PRIVATE_KEY")
            .env_remove("MIRROR_DEPLOY_REPO_DIR")
            .env_remove("RUST_LOG")
            .env("NO_COLOR", "1");
        cmd
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}
