//! Wait and verdict command handlers
//!
//! `await` polls a job with the client's waiter and then asks the API for the
//! job's success verdict. Each way a wait can end has its own exit code.

use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use clap::Args;
use colored::*;
use jobman_client::{ClientError, JobManagerClient};
use jobman_client::waiter::{Backoff, JobWaiter, PollAttempt, WaitConfig, WaitError};
use jobman_core::domain::finding::Severity;
use jobman_core::domain::job::JobId;
use jobman_core::dto::job::{JobSuccessQuery, JobSuccessResponse};
use tokio::time::{Instant, sleep};
use tracing::{debug, warn};

use super::job::{colorize_status, print_job_details, resolve};
use super::{EXIT_INTERRUPTED, EXIT_JOB_UNSUCCESSFUL, EXIT_TIMED_OUT, EXIT_WAIT_FAILED, print_json};
use crate::config::Config;

/// Polling options for commands that wait on a job
#[derive(Args, Debug, Clone)]
pub struct WaitArgs {
    /// Maximum time to wait for the job to finish, in seconds
    #[arg(long, default_value_t = 3600)]
    pub timeout: u64,

    /// Delay before the second status poll, in seconds
    #[arg(long, default_value_t = 1.0)]
    pub poll_interval: f64,

    /// Factor applied to the delay after each poll
    #[arg(long, default_value_t = 2.0)]
    pub backoff_multiplier: f64,

    /// Longest delay between two polls, in seconds
    #[arg(long, default_value_t = 15.0)]
    pub max_backoff: f64,

    /// Consecutive transient failures tolerated before giving up
    #[arg(long, default_value_t = 5)]
    pub max_retries: u32,
}

impl WaitArgs {
    pub fn to_config(&self) -> Result<WaitConfig> {
        let secs = |value: f64, flag: &str| {
            Duration::try_from_secs_f64(value)
                .map_err(|_| anyhow!("--{} must be a non-negative number of seconds", flag))
        };

        let config = WaitConfig::default()
            .with_max_wait(Duration::from_secs(self.timeout))
            .with_poll_interval(secs(self.poll_interval, "poll-interval")?)
            .with_backoff_multiplier(self.backoff_multiplier)
            .with_max_backoff(secs(self.max_backoff, "max-backoff")?)
            .with_max_transient_retries(self.max_retries);

        config.validate()?;
        Ok(config)
    }
}

/// Options deciding whether a finished job counts as a success
#[derive(Args, Debug, Clone)]
pub struct VerdictArgs {
    /// Minimum severity level that should fail
    #[arg(long, default_value_t = Severity::Medium)]
    pub severity: Severity,

    /// Exit with code 0 even if the job was unsuccessful
    #[arg(long)]
    pub no_fail: bool,
}

impl VerdictArgs {
    fn query(&self) -> JobSuccessQuery {
        JobSuccessQuery {
            severity: self.severity,
            fail: !self.no_fail,
        }
    }
}

/// Show the success verdict of a job
pub async fn get_job_success(
    client: &JobManagerClient,
    config: &Config,
    id: &str,
    verdict: &VerdictArgs,
) -> Result<ExitCode> {
    let job_id = resolve(client, id).await?;
    let response = fetch_verdict(client, &job_id, verdict).await?;

    report_verdict(config, &job_id, verdict, &response)
}

/// Wait for a job to finish, then report its success verdict
pub async fn await_job(
    client: &JobManagerClient,
    config: &Config,
    job_id: JobId,
    wait_args: &WaitArgs,
    verdict: &VerdictArgs,
) -> Result<ExitCode> {
    let wait_config = wait_args.to_config()?;
    let quiet = config.json;

    if !quiet {
        eprintln!(
            "{} job {} (timeout {}s)",
            "Waiting for".bold(),
            job_id.to_string().cyan(),
            wait_config.max_wait.as_secs()
        );
    }

    let waiter = JobWaiter::new(client, wait_config.clone()).with_observer(move |attempt| {
        if !quiet {
            print_progress(attempt);
        }
    });

    let result = tokio::select! {
        result = waiter.wait(&job_id) => result,
        _ = tokio::signal::ctrl_c() => return Ok(interrupted(&job_id)),
    };

    let outcome = match result {
        Ok(outcome) => outcome,
        Err(e) => return report_wait_error(e),
    };

    debug!(
        "Job {} finished as {} after {} poll(s)",
        job_id, outcome.status, outcome.attempts
    );

    if !quiet {
        eprintln!(
            "{} job {} finished as {} after {}s",
            "✓".green(),
            job_id,
            colorize_status(&outcome.status),
            outcome.elapsed.as_secs()
        );
        if let Some(info) = &outcome.payload {
            println!();
            print_job_details(info);
            println!();
        }
    }

    // The verdict can lag behind the terminal status
    let budget = wait_config.max_wait.saturating_sub(outcome.elapsed);
    let response = tokio::select! {
        response = wait_for_verdict(client, &job_id, verdict, &wait_config, budget) => response?,
        _ = tokio::signal::ctrl_c() => return Ok(interrupted(&job_id)),
    };

    match response {
        Some(response) => report_verdict(config, &job_id, verdict, &response),
        None => report_missing_verdict(config, &job_id, verdict),
    }
}

fn interrupted(job_id: &JobId) -> ExitCode {
    eprintln!(
        "\n{} job {} keeps running remotely; use `cancel` to stop it",
        "Interrupted:".yellow().bold(),
        job_id
    );
    ExitCode::from(EXIT_INTERRUPTED)
}

/// Poll the success endpoint until it returns a verdict
///
/// Uses the same backoff and transient-retry budget as the status wait and
/// gives up with `None` once `budget` is spent.
async fn wait_for_verdict(
    client: &JobManagerClient,
    job_id: &JobId,
    verdict: &VerdictArgs,
    wait_config: &WaitConfig,
    budget: Duration,
) -> Result<Option<JobSuccessResponse>> {
    let started = Instant::now();
    let mut backoff = Backoff::new(wait_config);
    let mut consecutive_transient: u32 = 0;

    loop {
        match client.get_job_success(job_id, &verdict.query()).await {
            Ok(response) if response.success.is_some() => return Ok(Some(response)),
            Ok(_) => {
                consecutive_transient = 0;
                debug!("No verdict yet for job {}", job_id);
            }
            Err(e)
                if e.is_transient() && consecutive_transient < wait_config.max_transient_retries =>
            {
                consecutive_transient += 1;
                warn!(
                    "Transient failure fetching verdict of job {} (retry {}/{}): {}",
                    job_id, consecutive_transient, wait_config.max_transient_retries, e
                );
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to get success of job {}", job_id));
            }
        }

        let remaining = budget.saturating_sub(started.elapsed());
        if remaining.is_zero() {
            return Ok(None);
        }
        sleep(backoff.next_delay().min(remaining)).await;
    }
}

/// No verdict arrived before the deadline; never reported as success
fn report_missing_verdict(
    config: &Config,
    job_id: &JobId,
    verdict: &VerdictArgs,
) -> Result<ExitCode> {
    if config.json {
        print_json(&JobSuccessResponse::default())?;
    } else {
        eprintln!(
            "{} no verdict for job {} before the timeout",
            "Error:".red().bold(),
            job_id
        );
    }

    Ok(missing_verdict_exit_code(verdict.no_fail))
}

fn missing_verdict_exit_code(no_fail: bool) -> ExitCode {
    if no_fail {
        ExitCode::from(EXIT_TIMED_OUT)
    } else {
        ExitCode::from(EXIT_JOB_UNSUCCESSFUL)
    }
}

async fn fetch_verdict(
    client: &JobManagerClient,
    job_id: &JobId,
    verdict: &VerdictArgs,
) -> Result<JobSuccessResponse> {
    client
        .get_job_success(job_id, &verdict.query())
        .await
        .with_context(|| format!("Failed to get success of job {}", job_id))
}

fn report_verdict(
    config: &Config,
    job_id: &JobId,
    verdict: &VerdictArgs,
    response: &JobSuccessResponse,
) -> Result<ExitCode> {
    if config.json {
        print_json(response)?;
    } else {
        let message = response.message.as_deref().unwrap_or("");
        match response.success {
            Some(true) => println!("{} job {} succeeded {}", "✓".green(), job_id, message),
            Some(false) => println!(
                "{} job {} failed at severity {} {}",
                "✗".red(),
                job_id,
                verdict.severity,
                message
            ),
            None => println!("{} job {} has not finished yet", "…".yellow(), job_id),
        }
    }

    Ok(verdict_exit_code(response.success, verdict.no_fail))
}

/// Map a verdict to an exit code
///
/// Only an explicit `false` fails; `--no-fail` turns that into success too.
fn verdict_exit_code(success: Option<bool>, no_fail: bool) -> ExitCode {
    match success {
        Some(false) if !no_fail => ExitCode::from(EXIT_JOB_UNSUCCESSFUL),
        _ => ExitCode::SUCCESS,
    }
}

fn report_wait_error(error: WaitError) -> Result<ExitCode> {
    let Some(code) = wait_error_code(&error) else {
        return Err(error.into());
    };

    eprintln!("{} {}", "Error:".red().bold(), error);
    if let Some(status) = error.last_status() {
        eprintln!(
            "  The job was still {}; run `await` again to keep waiting.",
            colorize_status(&status)
        );
    }
    if let Some(hint) = error.client_error().and_then(failure_hint) {
        eprintln!("  {}", hint);
    }

    Ok(ExitCode::from(code))
}

fn failure_hint(error: &ClientError) -> Option<String> {
    if error.is_unauthorized() {
        Some("Check the API key and secret.".to_string())
    } else if error.is_not_found() {
        Some("No job with this ID exists.".to_string())
    } else if error.is_server_error() {
        error
            .status()
            .map(|status| format!("The API kept answering {}; try again later.", status))
    } else {
        None
    }
}

/// Exit code for a failed wait; `None` for configuration errors
fn wait_error_code(error: &WaitError) -> Option<u8> {
    match error {
        WaitError::TimedOut { .. } => Some(EXIT_TIMED_OUT),
        WaitError::Fatal { .. } | WaitError::RetriesExhausted { .. } => Some(EXIT_WAIT_FAILED),
        WaitError::InvalidConfig(_) => None,
    }
}

fn print_progress(attempt: &PollAttempt) {
    let elapsed = format!("{:>5}s", attempt.elapsed.as_secs());
    match (&attempt.status, &attempt.condition) {
        (Some(status), _) => eprintln!(
            "  {} #{:<3} {}",
            elapsed.dimmed(),
            attempt.attempt,
            colorize_status(status)
        ),
        (None, Some(condition)) => eprintln!(
            "  {} #{:<3} {}",
            elapsed.dimmed(),
            attempt.attempt,
            condition.yellow()
        ),
        (None, None) => {}
    }
}
