//! # Sync Command Implementation
//!
//! Brings the local mirror up to date with the source repository without
//! pushing anywhere. Clones on first use, pulls afterwards.

use anyhow::Result;
use clap::Args;

use mirror_deploy::git::SystemGit;
use mirror_deploy::mirror::MirrorManager;
use mirror_deploy::output::{detail, emoji, success, OutputConfig};
use mirror_deploy::runner::CommandRunner;
use mirror_deploy::suggestions::with_hint;

use super::TargetArgs;

/// Clone or pull the local mirror of the source repository
#[derive(Args, Debug, Default)]
pub struct SyncArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Only print errors.
    #[arg(short, long)]
    pub quiet: bool,
}

/// Execute the `sync` command.
pub fn execute(args: SyncArgs, output: &OutputConfig) -> Result<()> {
    let settings = args.target.load()?;
    let target = settings.to_mirror_target().map_err(with_hint)?;
    let runner = CommandRunner::new(settings.retry_policy());
    let manager = MirrorManager::with_operations(target, Box::new(SystemGit), runner);

    let cloned = !manager.exists_locally();
    if !args.quiet {
        let action = if cloned { "Cloning" } else { "Pulling" };
        println!(
            "{} {} {}",
            emoji(output, "🔄", "[SYNC]"),
            action,
            manager.target().source_repo_url
        );
    }

    manager.update_working_copy().map_err(with_hint)?;

    if !args.quiet {
        let folder = manager.folder().map_err(with_hint)?;
        let verb = if cloned { "Cloned" } else { "Updated" };
        println!(
            "{}",
            success(
                output,
                &format!("{} mirror {}", verb, detail(output, &folder.display().to_string()))
            )
        );
    }
    Ok(())
}
