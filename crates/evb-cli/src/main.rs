//! Engine Version Bump CLI
//!
//! The `version-bump` command keeps a Unity project's editor and package
//! versions current by opening, reusing and closing pull requests.
//!
//! ## Commands
//!
//! - `editor`: bump `ProjectSettings/ProjectVersion.txt` to the newest editor
//!   release in the requested streams
//! - `packages`: bump every registry package in `Packages/manifest.json`
//!
//! ## Exit codes
//!
//! 0 on success (including runs that opened pull requests), 1 on a runtime
//! failure, 2 on invalid configuration.

mod commands;
mod config;
mod outputs;

use std::process::ExitCode;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use evb_core::Reconciler;
use git_data::GitHubClient;
use release_feed::{FeedConfig, FeedError, ReleaseFeedClient, ReleaseStream};
use tracing::{error, Level};

use crate::commands::{cmd_editor, cmd_packages};
use crate::config::{ConfigError, RepoArgs};

#[derive(Parser, Debug)]
#[command(name = "version-bump")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Dependency-update pull requests for Unity projects", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(flatten)]
    repo: RepoArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Bump the editor version
    Editor {
        /// Comma-separated release streams: Stable, LTS, Beta, Alpha, Patch
        #[arg(long, default_value = "Stable")]
        release_streams: String,
    },

    /// Bump registry packages
    Packages {
        /// Consider pre-release (suffixed) package versions
        #[arg(long)]
        include_prerelease: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    evb_core::init_tracing(cli.json, level);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %format!("{err:#}"), "version-bump failed");
            eprintln!("Error: {err:#}");
            ExitCode::from(exit_status(&err))
        }
    }
}

fn exit_status(err: &anyhow::Error) -> u8 {
    if err.downcast_ref::<ConfigError>().is_some() {
        2
    } else {
        1
    }
}

fn parse_streams(text: &str) -> Result<Vec<ReleaseStream>, ConfigError> {
    let streams = ReleaseStream::parse_list(text).map_err(ConfigError::ReleaseStreams)?;
    if streams.is_empty() {
        return Err(ConfigError::ReleaseStreams(FeedError::NoReleaseStreams));
    }
    Ok(streams)
}

async fn run(cli: Cli) -> Result<()> {
    let repository = cli.repo.repository_id()?;
    let github = GitHubClient::new(cli.repo.github_config()?)
        .map_err(|e| ConfigError::Client(e.to_string()))?;
    let feed = ReleaseFeedClient::new(FeedConfig::from_env())
        .map_err(|e| ConfigError::Client(e.to_string()))?;
    let reconciler = Reconciler::new(github, cli.repo.bump_settings()?);
    let project_dir = cli.repo.project_dir();
    let output_file = cli.repo.github_output.as_deref();

    match cli.command {
        Commands::Editor { release_streams } => {
            let streams = parse_streams(&release_streams)?;
            let outputs =
                cmd_editor(&reconciler, &feed, &project_dir, &streams, &repository).await?;
            outputs.write(output_file)
        }
        Commands::Packages { include_prerelease } => {
            let run = cmd_packages(
                &reconciler,
                &feed,
                &project_dir,
                include_prerelease,
                &repository,
            )
            .await?;
            run.outputs.write(output_file)?;
            if !run.failures.is_empty() {
                let names: Vec<&str> = run.failures.iter().map(|f| f.package.as_str()).collect();
                bail!(
                    "{} package(s) could not be updated: {}",
                    names.len(),
                    names.join(", ")
                );
            }
            Ok(())
        }
    }
}
