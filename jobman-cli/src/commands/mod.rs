//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod job;
mod launch;
mod wait;

pub use wait::{VerdictArgs, WaitArgs};

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Subcommand;
use jobman_client::JobManagerClient;
use serde::Serialize;

use crate::config::Config;

/// Job finished but was not successful
pub const EXIT_JOB_UNSUCCESSFUL: u8 = 1;
/// Waiting stopped on a fatal error or after too many transient ones
pub const EXIT_WAIT_FAILED: u8 = 3;
/// Waiting ran out of time
pub const EXIT_TIMED_OUT: u8 = 4;
/// Interrupted by the user
pub const EXIT_INTERRUPTED: u8 = 130;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Check if a URL is valid and a job can be submitted
    Check {
        /// URL of the target service
        url: String,

        #[command(flatten)]
        target: launch::TargetArgs,

        /// Exit with code 0 even if the check fails
        #[arg(long)]
        no_fail: bool,
    },
    /// Launch a job
    Launch {
        /// URL of the target service
        url: String,

        #[command(flatten)]
        target: launch::TargetArgs,

        /// Wait for the job to finish
        #[arg(long)]
        wait: bool,

        #[command(flatten)]
        wait_args: WaitArgs,

        #[command(flatten)]
        verdict: VerdictArgs,
    },
    /// Cancel a queued or running job
    Cancel {
        /// Job ID or unambiguous prefix
        id: String,
    },
    /// Get information about a job
    Info {
        /// Job ID or unambiguous prefix
        id: String,
    },
    /// List all jobs
    List,
    /// Show the status of a job
    Status {
        /// Job ID or unambiguous prefix
        id: String,
    },
    /// Show the success of a job
    Success {
        /// Job ID or unambiguous prefix
        id: String,

        #[command(flatten)]
        verdict: VerdictArgs,
    },
    /// Wait for a job to finish
    #[command(name = "await")]
    Await {
        /// Job ID or unambiguous prefix
        id: String,

        #[command(flatten)]
        wait_args: WaitArgs,

        #[command(flatten)]
        verdict: VerdictArgs,
    },
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module.
///
/// # Returns
/// The process exit code on success
pub async fn handle_command(command: Commands, config: &Config) -> Result<ExitCode> {
    let client =
        JobManagerClient::new(config.client.clone()).context("Failed to create API client")?;

    match command {
        Commands::Check {
            url,
            target,
            no_fail,
        } => launch::check(&client, config, &url, &target, !no_fail).await,
        Commands::Launch {
            url,
            target,
            wait,
            wait_args,
            verdict,
        } => {
            let job_id = launch::launch(&client, config, &url, &target).await?;
            if wait {
                wait::await_job(&client, config, job_id, &wait_args, &verdict).await
            } else {
                Ok(ExitCode::SUCCESS)
            }
        }
        Commands::Cancel { id } => job::cancel_job(&client, config, &id).await,
        Commands::Info { id } => job::get_job_info(&client, config, &id).await,
        Commands::List => job::list_jobs(&client, config).await,
        Commands::Status { id } => job::get_job_status(&client, config, &id).await,
        Commands::Success { id, verdict } => wait::get_job_success(&client, config, &id, &verdict).await,
        Commands::Await {
            id,
            wait_args,
            verdict,
        } => {
            let job_id = job::resolve(&client, &id).await?;
            wait::await_job(&client, config, job_id, &wait_args, &verdict).await
        }
    }
}

/// Print a response as pretty JSON on stdout
fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize response")?;
    println!("{}", json);
    Ok(())
}
