///
/// This module implements the CLI interface for gh-bucket: command parsing, wiring of the
/// real GitHub/git/S3 clients and mapping the job outcome to a process result.
///
/// All core business logic (parsing, listing, archiving, orchestration) lives in the
/// [`gh-bucket-core`] crate. This module is strictly glue.
///
/// ## How To Use
/// - For command-line users: `gh-bucket backup [--config gh-bucket.yaml]`.
/// - For programmatic/integration use: call [`run`] with a constructed [`Cli`].
///
/// [`gh-bucket-core`]: ../../gh-bucket-core/
use crate::load_config::{load_config, CliConfig};
use crate::upload::S3Store;
use anyhow::Result;
use clap::{Parser, Subcommand};
use gh_bucket_core::archive::GitArchiver;
use gh_bucket_core::config::JobConfig;
use gh_bucket_core::job::{execute, JobOutcome};
use gh_bucket_core::list::{GithubLister, ReqwestPageFetcher};
use std::path::PathBuf;

/// CLI for gh-bucket: back up public GitHub repositories into an S3 bucket.
#[derive(Parser)]
#[clap(
    name = "gh-bucket",
    version,
    about = "Back up the public repositories of GitHub users and organisations into an S3 bucket"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run one full backup job
    Backup {
        /// Optional YAML config file; unset values are read from the environment
        #[clap(long)]
        config: Option<PathBuf>,
    },
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    tracing::info!("trace_initialised");

    match cli.command {
        Commands::Backup { config } => {
            let config = load_config(config.as_deref())?;
            tracing::info!(command = "backup", "Starting backup job");
            let outcome = backup(&config).await;
            let label = outcome.stage_label();
            match outcome.error {
                None => {
                    tracing::info!(command = "backup", "Backup complete");
                    Ok(())
                }
                Some(e) => {
                    tracing::error!(command = "backup", stage = label, error = %e, "Backup failed");
                    Err(anyhow::Error::new(e).context(label))
                }
            }
        }
    }
}

async fn backup(config: &CliConfig) -> JobOutcome {
    let job = match JobConfig::from_settings(&config.job) {
        Ok(job) => job,
        Err(e) => return JobOutcome::failure(e.into()),
    };
    // A token that cannot be sent is bad configuration, not a listing failure.
    let fetcher = match ReqwestPageFetcher::new(config.github.token.as_deref()) {
        Ok(fetcher) => fetcher,
        Err(e) => return JobOutcome::failure(e.into()),
    };
    let lister = GithubLister::new(config.api_url(), fetcher);
    let archiver = GitArchiver::new(config.scratch_dir(), config.clone_timeout());
    let store = S3Store::connect(&job.bucket_region, config.upload_timeout()).await;

    execute(&job, &lister, &archiver, &store).await
}
