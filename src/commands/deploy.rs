//! # Deploy Command Implementation
//!
//! This module implements the `deploy` subcommand: bring the local mirror up
//! to date with the source repository, point the push remote at the
//! destination and force-push the branch.

use anyhow::Result;
use clap::Args;

use mirror_deploy::config::DeployConfig;
use mirror_deploy::deployer::{Deployer, Deployment};
use mirror_deploy::git::SystemGit;
use mirror_deploy::mirror::MirrorManager;
use mirror_deploy::output::{detail, emoji, success, OutputConfig};
use mirror_deploy::runner::CommandRunner;
use mirror_deploy::suggestions::with_hint;

use super::TargetArgs;

/// Force-push the mirror of the source repository to the destination
#[derive(Args, Debug, Default)]
pub struct DeployArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Remote to push to (default: bitbucket).
    #[arg(long, value_name = "NAME")]
    pub remote: Option<String>,

    /// Branch to push (default: master).
    #[arg(short, long, value_name = "BRANCH")]
    pub branch: Option<String>,

    /// Only print errors.
    #[arg(short, long)]
    pub quiet: bool,
}

/// Execute the `deploy` command.
pub fn execute(args: DeployArgs, output: &OutputConfig) -> Result<()> {
    let settings = args.target.load()?.merge(DeployConfig {
        remote: args.remote.clone(),
        branch: args.branch.clone(),
        ..DeployConfig::default()
    });
    let target = settings.to_target().map_err(with_hint)?;

    if !args.quiet {
        println!(
            "{} Deploying {} to {}",
            emoji(output, "🚀", "[DEPLOY]"),
            target.source_repo_url,
            target.destination_repo_url
        );
    }

    let runner = CommandRunner::new(settings.retry_policy());
    let deployer = Deployer::with_manager(MirrorManager::with_operations(
        target,
        Box::new(SystemGit),
        runner,
    ));

    let deployment = deployer
        .push_app_to_remote(settings.remote(), settings.branch())
        .map_err(with_hint)?;

    if !args.quiet {
        for line in summary(&deployment, output) {
            println!("{}", line);
        }
    }
    Ok(())
}

fn summary(deployment: &Deployment, output: &OutputConfig) -> Vec<String> {
    let mut lines = vec![success(
        output,
        &format!(
            "Pushed {} to {} ({})",
            deployment.branch, deployment.remote, deployment.url
        ),
    )];
    if let Some(previous) = &deployment.replaced_url {
        if previous != &deployment.url {
            lines.push(format!("   replaced remote URL {}", previous));
        }
    }
    lines.push(format!(
        "   mirror: {}",
        detail(output, &deployment.mirror.display().to_string())
    ));
    lines
}
