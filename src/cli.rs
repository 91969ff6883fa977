//! CLI argument parsing and command dispatch

use anyhow::Result;
use clap::{Parser, Subcommand};

use mirror_deploy::output::OutputConfig;

use crate::commands;

/// Name of the installed binary.
pub const BIN_NAME: &str = "mirror-deploy";

/// Mirror Deploy - Force-push a mirror of one git repository to another
#[derive(Parser, Debug)]
#[command(name = "mirror-deploy")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Colorize output (always, never, auto)
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    color: String,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL", default_value = "info")]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Update the mirror and force-push it to the destination repository
    Deploy(commands::deploy::DeployArgs),

    /// Clone or pull the mirror without pushing
    Sync(commands::sync::SyncArgs),

    /// Show where the mirror lives and which remote it pushes to
    Info(commands::info::InfoArgs),

    /// Generate shell completion scripts
    Completions(commands::completions::CompletionsArgs),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        init_logging(&self.log_level);
        let output = OutputConfig::from_env_and_flag(&self.color);

        match self.command {
            Commands::Deploy(args) => commands::deploy::execute(args, &output),
            Commands::Sync(args) => commands::sync::execute(args, &output),
            Commands::Info(args) => commands::info::execute(args, &output),
            Commands::Completions(args) => commands::completions::execute(args),
        }
    }
}

/// Routes `log` records to stderr. `RUST_LOG` wins over `--log-level`.
fn init_logging(level: &str) {
    let env = env_logger::Env::default().default_filter_or(level);
    // A logger may already be installed when running under tests.
    let _ = env_logger::Builder::from_env(env)
        .format_timestamp(None)
        .try_init();
}
