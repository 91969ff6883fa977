//! # Error Handling
//!
//! This module defines the centralized error type for `mirror-deploy`. It uses
//! the `thiserror` library to create an `Error` enum covering every failure a
//! deploy can run into, with enough context (the git command, its captured
//! output, the missing setting) to explain what went wrong.
//!
//! ## Categories
//!
//! The variants fall into three groups, and [`Error::is_transient`] is the one
//! place that decides which group an error belongs to:
//!
//! - **Transient**: `GitExecute`. A git invocation exited non-zero. The
//!   command runner retries these.
//! - **Terminal**: `CommandExecution`. A git invocation kept failing after all
//!   retries were used up. Carries the last captured output.
//! - **Non-retryable**: everything else (configuration problems, invalid
//!   arguments, filesystem and YAML errors). These are returned to the caller
//!   unchanged on the first attempt.

use thiserror::Error;

/// Main error type for mirror-deploy operations
#[derive(Error, Debug)]
pub enum Error {
    /// A git command exited with a non-zero status.
    ///
    /// This is the transient category: the command runner retries it before
    /// escalating to [`Error::CommandExecution`].
    #[error("Git command failed: {command}\n{output}")]
    GitExecute { command: String, output: String },

    /// A git command still failed after every retry was used.
    #[error("Command execution failed after {attempts} attempt(s): {command}\n{output}")]
    CommandExecution {
        command: String,
        output: String,
        attempts: u32,
    },

    /// An error occurred while parsing the `.mirror-deploy.yaml` file.
    #[error("Configuration parsing error: {message}{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    ConfigParse {
        message: String,
        /// Optional hint for how to fix the configuration issue
        hint: Option<String>,
    },

    /// A setting required to build a deploy target was not provided.
    #[error("Missing required setting: {setting}{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    MissingSetting {
        setting: String,
        /// Optional hint for where the setting can be supplied
        hint: Option<String>,
    },

    /// A caller passed an argument that can never succeed, such as an empty
    /// remote name.
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A YAML parsing error, wrapped from `serde_yaml::Error`.
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl Error {
    /// Returns `true` for failures that are worth retrying.
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::GitExecute { .. })
    }

    /// The captured git output, for the variants that carry one.
    pub fn output(&self) -> Option<&str> {
        match self {
            Error::GitExecute { output, .. } | Error::CommandExecution { output, .. } => {
                Some(output)
            }
            _ => None,
        }
    }
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
