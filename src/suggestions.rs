//! # Error Suggestions
//!
//! Helpers that turn failures into messages telling the user what went wrong
//! and how to fix it.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use mirror_deploy::suggestions;
//!
//! // Instead of:
//! anyhow::bail!("Configuration file not found: {}", path.display());
//!
//! // Use:
//! return Err(suggestions::config_not_found(path));
//! ```

use std::path::Path;

use crate::error::Error;

/// Generate an error for when the configuration file is not found.
pub fn config_not_found(path: &Path) -> anyhow::Error {
    anyhow::anyhow!(
        "Configuration file not found: {path}\n\n\
         hint: Create a .mirror-deploy.yaml file in the current directory\n\
         hint: Use -c/--config to specify a different path\n\
         hint: Set MIRROR_DEPLOY_CONFIG environment variable\n\
         hint: Or pass --source-repo-url, --destination-repo-url and --private-key-path",
        path = path.display()
    )
}

/// Output fragments git prints when the remote rejected our credentials.
const AUTH_FAILURES: &[&str] = &[
    "Permission denied",
    "Could not read from remote repository",
    "Authentication failed",
];

/// Returns a hint for a library error, if one applies.
///
/// Configuration errors carry their own hint in their message and get none
/// here.
pub fn hint_for(error: &Error) -> Option<String> {
    error.output().and_then(auth_failure_hint)
}

fn auth_failure_hint(output: &str) -> Option<String> {
    AUTH_FAILURES
        .iter()
        .any(|needle| output.contains(needle))
        .then(|| {
            "The remote rejected the deploy key. Check that the private key matches a \
             deploy key with access to both repositories"
                .to_string()
        })
}

/// Wraps a library error into an `anyhow::Error`, appending a hint line
/// when one is known.
pub fn with_hint(error: Error) -> anyhow::Error {
    match hint_for(&error) {
        Some(hint) => anyhow::anyhow!("{}\n\nhint: {}", error, hint),
        None => anyhow::Error::new(error),
    }
}
