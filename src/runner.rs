//! # Command Runner
//!
//! Every git invocation goes through this module. [`execute`] spawns a child
//! process and captures its output; a non-zero exit becomes
//! [`Error::GitExecute`]. [`CommandRunner::run`] wraps an operation in a
//! bounded retry loop: transient failures are retried according to the
//! [`RetryPolicy`], anything else is returned untouched on the first attempt.
//!
//! The attempt counter lives in the stack frame of each `run` call, so a
//! single runner can be shared freely.

use std::process::{Command, Stdio};

use log::{debug, error, info, warn};

use crate::error::{Error, Result};

/// Number of extra attempts made after the first transient failure.
pub const DEFAULT_RETRIES: u32 = 2;

/// How many times a transient failure is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Extra attempts after the first one.
    pub retries: u32,
}

impl RetryPolicy {
    pub fn new(retries: u32) -> Self {
        Self { retries }
    }

    /// Total number of attempts, including the first.
    pub fn attempts(&self) -> u32 {
        self.retries.saturating_add(1)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_RETRIES)
    }
}

/// Runs operations under a [`RetryPolicy`].
#[derive(Debug, Clone, Copy, Default)]
pub struct CommandRunner {
    policy: RetryPolicy,
}

impl CommandRunner {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Runs `operation`, retrying transient failures.
    ///
    /// Returns the first success. When every attempt fails with a transient
    /// error, the last one is escalated to [`Error::CommandExecution`]. Any
    /// other error is returned as-is without a retry.
    pub fn run<T, F>(&self, description: &str, mut operation: F) -> Result<T>
    where
        F: FnMut() -> Result<T>,
    {
        info!("git run command: {}", description);

        let attempts = self.policy.attempts();
        let mut attempt = 1;
        loop {
            match operation() {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() => {
                    if attempt >= attempts {
                        error!(
                            "{} failed after {} attempt(s): {}",
                            description, attempt, e
                        );
                        return Err(escalate(e, attempt));
                    }
                    warn!(
                        "{} failed (attempt {} of {}), retrying: {}",
                        description, attempt, attempts, e
                    );
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

fn escalate(error: Error, attempts: u32) -> Error {
    match error {
        Error::GitExecute { command, output } => Error::CommandExecution {
            command,
            output,
            attempts,
        },
        other => other,
    }
}

/// Exit status and output of a finished child process.
///
/// `output` is all of stdout followed by all of stderr. The two streams are
/// concatenated, not interleaved in the order they were written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` when the process was killed by a signal.
    pub status: Option<i32>,
    pub output: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }
}

/// Runs `command` to completion without interpreting its exit status.
///
/// Stdin is closed so a prompting child fails instead of hanging. Failing to
/// spawn the process at all is an [`Error::Io`].
pub fn capture(command: &mut Command) -> Result<CommandOutput> {
    debug!("executing: {}", describe(command));

    let output = command.stdin(Stdio::null()).output()?;

    let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
    combined.push_str(&String::from_utf8_lossy(&output.stderr));

    Ok(CommandOutput {
        status: output.status.code(),
        output: combined,
    })
}

/// Runs `command` and returns its combined output, failing with
/// [`Error::GitExecute`] on a non-zero exit.
pub fn execute(command: &mut Command) -> Result<String> {
    let line = describe(command);
    let captured = capture(command)?;

    if captured.success() {
        info!(
            "Output from git:\n↓####### GIT ########↓\n{}↑##### END GIT ######↑",
            captured.output
        );
        Ok(captured.output)
    } else {
        Err(Error::GitExecute {
            command: line,
            output: captured.output,
        })
    }
}

/// Renders a command line for logs and error messages.
pub fn describe(command: &Command) -> String {
    std::iter::once(command.get_program())
        .chain(command.get_args())
        .map(|part| part.to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(" ")
}
