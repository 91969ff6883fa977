//! # Info Command Implementation
//!
//! This module implements the `info` subcommand, which shows where the mirror
//! for the current configuration lives and whether it has been cloned.
//!
//! This command is read-only: it creates no folders, needs no private key
//! and never contacts a remote.

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;

use mirror_deploy::config::DeployConfig;
use mirror_deploy::git::{GitOperations, SystemGit};
use mirror_deploy::mirror::{has_git_marker, mirror_folder, mirror_folder_name};
use mirror_deploy::output::{detail, emoji, OutputConfig};
use mirror_deploy::suggestions::with_hint;

use super::TargetArgs;

/// Show where the mirror lives and which remote it pushes to
#[derive(Args, Debug, Default)]
pub struct InfoArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Remote to report on (default: bitbucket).
    #[arg(long, value_name = "NAME")]
    pub remote: Option<String>,

    /// Print machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

/// What `info` reports.
#[derive(Debug, Serialize, PartialEq, Eq)]
struct MirrorInfo {
    repo_name: String,
    folder_name: String,
    folder: PathBuf,
    cloned: bool,
    source_repo_url: Option<String>,
    destination_repo_url: Option<String>,
    remote: String,
    remote_url: Option<String>,
}

/// Execute the `info` command.
pub fn execute(args: InfoArgs, output: &OutputConfig) -> Result<()> {
    let settings = args.target.load()?.merge(DeployConfig {
        remote: args.remote.clone(),
        ..DeployConfig::default()
    });
    let info = gather(&settings, &SystemGit)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&info)?);
    } else {
        for line in display(&info, output) {
            println!("{}", line);
        }
    }
    Ok(())
}

fn gather(settings: &DeployConfig, git: &dyn GitOperations) -> Result<MirrorInfo> {
    let repo_name = settings.repo_identifier().map_err(with_hint)?;
    let folder = mirror_folder(&settings.repo_dir(), &repo_name);
    let cloned = has_git_marker(&folder);
    let remote = settings.remote().to_string();

    let remote_url = if cloned {
        git.remote_url(&folder, &remote).map_err(with_hint)?
    } else {
        None
    };

    Ok(MirrorInfo {
        folder_name: mirror_folder_name(&repo_name),
        repo_name,
        folder,
        cloned,
        source_repo_url: settings.source_repo_url.clone(),
        destination_repo_url: settings.destination_repo_url.clone(),
        remote,
        remote_url,
    })
}

fn display(info: &MirrorInfo, output: &OutputConfig) -> Vec<String> {
    let status = if info.cloned { "(cloned)" } else { "(not cloned)" };
    let mut lines = vec![
        format!("{} Mirror: {}", emoji(output, "📦", "[MIRROR]"), info.repo_name),
        format!(
            "   folder: {} {}",
            detail(output, &info.folder.display().to_string()),
            status
        ),
    ];

    if let Some(url) = &info.source_repo_url {
        lines.push(format!("   source: {}", url));
    }
    if let Some(url) = &info.destination_repo_url {
        lines.push(format!("   destination: {}", url));
    }

    let remote_url = info.remote_url.as_deref().unwrap_or("(not configured)");
    lines.push(format!("   remote {}: {}", info.remote, remote_url));
    lines
}
