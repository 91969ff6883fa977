//! # Mirror Deploy CLI
//!
//! This is the binary entry point for the `mirror-deploy` command-line tool.
//!
//! It parses command-line arguments with `clap`, runs the selected command
//! and turns any error into a message on stderr with exit code 1. Usage
//! errors are reported by clap with exit code 2.
//!
//! The deploy logic lives in the `mirror_deploy` library crate; the binary is
//! a thin wrapper around it.

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli.execute()
}
