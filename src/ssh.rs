//! # Ephemeral SSH Credentials
//!
//! Git talks to SSH remotes by spawning `ssh`. To authenticate with a deploy
//! key that is not installed in `~/.ssh`, this module writes the key to a
//! temporary file and generates a small `sh` wrapper that invokes `ssh` with
//! that identity and with every interactive prompt disabled. Git is pointed at
//! the wrapper through `GIT_SSH`.
//!
//! Both files live only for the duration of one [`with_ephemeral_ssh`] call.
//! They are removed when the operation returns, when it fails, and when it
//! panics (the files are held in [`tempfile::TempPath`] guards).
//!
//! `GIT_SSH` is set on each child [`Command`] through
//! [`EphemeralSsh::configure`]; the environment of the current process is
//! never modified, so scopes running side by side cannot see each other's
//! keys.

use std::io::Write;
use std::path::Path;
use std::process::Command;

use log::{debug, warn};
use tempfile::{Builder, TempPath};

use crate::error::Result;

const KEY_PREFIX: &str = "git-ssh-wrapper-key";
const WRAPPER_PREFIX: &str = "git-ssh-wrapper";

/// Options passed to `ssh` by the wrapper script.
const SSH_OPTIONS: &[&str] = &[
    "CheckHostIP=no",
    "IdentitiesOnly=yes",
    "LogLevel=INFO",
    "StrictHostKeyChecking=no",
    "PasswordAuthentication=no",
    "UserKnownHostsFile=/dev/null",
];

/// A private key file and the `GIT_SSH` wrapper script that uses it.
///
/// Dropping the value deletes both files.
#[derive(Debug)]
pub struct EphemeralSsh {
    key: TempPath,
    wrapper: TempPath,
}

impl EphemeralSsh {
    /// Writes the key and wrapper into the system temp directory.
    pub fn create(private_key: &[u8]) -> Result<Self> {
        Self::create_in(&std::env::temp_dir(), private_key)
    }

    /// Writes the key and wrapper into `dir`.
    ///
    /// The key file is readable only by the owner (0600) and the wrapper is
    /// executable only by the owner (0700).
    pub fn create_in(dir: &Path, private_key: &[u8]) -> Result<Self> {
        let mut key_file = Builder::new().prefix(KEY_PREFIX).tempfile_in(dir)?;
        key_file.write_all(private_key)?;
        // OpenSSH refuses PEM keys without a trailing newline.
        if !private_key.ends_with(b"\n") {
            key_file.write_all(b"\n")?;
        }
        key_file.flush()?;
        set_permissions(key_file.path(), 0o600)?;
        let key = key_file.into_temp_path();

        let mut wrapper_file = Builder::new()
            .prefix(WRAPPER_PREFIX)
            .suffix(".sh")
            .tempfile_in(dir)?;
        wrapper_file.write_all(wrapper_script(&key).as_bytes())?;
        wrapper_file.flush()?;
        set_permissions(wrapper_file.path(), 0o700)?;
        // The write handle must be closed before the script can be executed,
        // otherwise exec fails with ETXTBSY.
        let wrapper = wrapper_file.into_temp_path();

        debug!(
            "created ssh identity {} with wrapper {}",
            key.display(),
            wrapper.display()
        );

        Ok(Self { key, wrapper })
    }

    /// Path of the private key file.
    pub fn key_path(&self) -> &Path {
        &self.key
    }

    /// Path of the wrapper script, suitable as a `GIT_SSH` value.
    pub fn wrapper_path(&self) -> &Path {
        &self.wrapper
    }

    /// Points a child git process at the wrapper.
    ///
    /// `GIT_SSH_COMMAND` is removed from the child because git gives it
    /// precedence over `GIT_SSH`.
    pub fn configure(&self, command: &mut Command) {
        command
            .env("GIT_SSH", self.wrapper_path())
            .env("GIT_SSH_VARIANT", "ssh")
            .env_remove("GIT_SSH_COMMAND");
    }

    /// Deletes both files, reporting the first failure.
    pub fn close(self) -> Result<()> {
        let Self { key, wrapper } = self;
        let key_result = key.close();
        let wrapper_result = wrapper.close();
        key_result?;
        wrapper_result?;
        Ok(())
    }
}

/// Runs `operation` with freshly written SSH credentials and removes them
/// afterwards, whatever the outcome.
pub fn with_ephemeral_ssh<T, F>(private_key: &[u8], operation: F) -> Result<T>
where
    F: FnOnce(&EphemeralSsh) -> Result<T>,
{
    with_ephemeral_ssh_in(&std::env::temp_dir(), private_key, operation)
}

/// Same as [`with_ephemeral_ssh`], with the credential files placed in `dir`.
pub fn with_ephemeral_ssh_in<T, F>(dir: &Path, private_key: &[u8], operation: F) -> Result<T>
where
    F: FnOnce(&EphemeralSsh) -> Result<T>,
{
    let ssh = EphemeralSsh::create_in(dir, private_key)?;
    let result = operation(&ssh);

    match (result, ssh.close()) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(cleanup)) => Err(cleanup),
        (Err(e), Ok(())) => Err(e),
        (Err(e), Err(cleanup)) => {
            warn!("failed to remove ssh credentials: {}", cleanup);
            Err(e)
        }
    }
}

fn wrapper_script(key: &Path) -> String {
    let mut script = String::from("#!/bin/sh\nunset SSH_AUTH_SOCK\nexec ssh");
    for option in SSH_OPTIONS {
        script.push_str(" -o ");
        script.push_str(option);
    }
    script.push_str(" -o ");
    script.push_str(&shell_quote(&format!("IdentityFile={}", key.display())));
    script.push_str(" \"$@\"\n");
    script
}

/// Single-quotes `value` for `sh`.
fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

#[cfg(unix)]
fn set_permissions(path: &Path, mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode))?;
    Ok(())
}

#[cfg(not(unix))]
fn set_permissions(_path: &Path, _mode: u32) -> Result<()> {
    Ok(())
}
