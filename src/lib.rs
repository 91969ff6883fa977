//! # Mirror Deploy Library
//!
//! This library keeps a local mirror of a source git repository and
//! force-pushes it to a destination repository, authenticating every remote
//! operation with a deploy key that exists on disk only while git needs it.
//! It backs the `mirror-deploy` command-line tool.
//!
//! ## Quick Example
//!
//! ```
//! use mirror_deploy::config;
//! use mirror_deploy::mirror::mirror_folder_name;
//!
//! let settings = config::parse(
//!     r#"
//! source_repo_url: git@github.com:g5dev/some_repo.git
//! destination_repo_url: git@bitbucket.org:g5dev/some_repo.git
//! repo_name: some_repo
//! private_key: not-a-real-key
//! "#,
//! )
//! .unwrap();
//!
//! let target = settings.to_target().unwrap();
//! assert_eq!(mirror_folder_name(&target.repo_name), "82feb3f6095a2be0");
//! assert_eq!(settings.remote(), "bitbucket");
//! ```
//!
//! ## Core Concepts
//!
//! - **Credentials (`ssh`)**: A private key and an SSH wrapper script written
//!   to owner-only temp files, handed to git through `GIT_SSH` on each child
//!   process and removed when the scope ends.
//! - **Command runner (`runner`)**: Runs git invocations with a bounded number
//!   of retries for transient failures.
//! - **Git (`git`)**: The `GitOperations` trait and its `SystemGit`
//!   implementation, the single seam where the git binary is invoked.
//! - **Mirrors (`mirror`)**: Locates a mirror under the repository root by a
//!   hash of the repository name, and clones or pulls it.
//! - **Deployer (`deployer`)**: Updates the mirror, points a named remote at
//!   the destination and force-pushes a branch.
//!
//! ## Execution Flow
//!
//! 1. **Configure**: Build a [`mirror::DeployTarget`] from a
//!    `.mirror-deploy.yaml` file plus overrides.
//! 2. **Update**: Clone the source repository, or pull if a mirror exists.
//! 3. **Remote**: Replace the push remote so it points at the destination.
//! 4. **Push**: Force-push the branch with fresh credentials.

pub mod config;
pub mod defaults;
pub mod deployer;
pub mod error;
pub mod git;
pub mod mirror;
pub mod output;
pub mod runner;
pub mod ssh;
pub mod suggestions;

#[cfg(test)]
mod testing;
