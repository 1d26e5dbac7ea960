//! Job command handlers
//!
//! Handles the job inspection commands: listing, viewing details,
//! status and cancellation.

use std::process::ExitCode;

use anyhow::{Context, Result};
use colored::*;
use jobman_client::JobManagerClient;
use jobman_core::domain::finding::{Finding, Severity};
use jobman_core::domain::job::{Job, JobFindings, JobId, JobStatus};

use super::print_json;
use crate::config::Config;
use crate::id_resolver::resolve_job_id;
use crate::types::IdOrPrefix;

/// Resolve a user-supplied job ID or prefix
pub async fn resolve(client: &JobManagerClient, id: &str) -> Result<JobId> {
    resolve_job_id(client, &IdOrPrefix::parse(id)).await
}

/// List all jobs
pub async fn list_jobs(client: &JobManagerClient, config: &Config) -> Result<ExitCode> {
    let response = client.list_jobs().await.context("Failed to list jobs")?;

    if config.json {
        print_json(&response)?;
        return Ok(ExitCode::SUCCESS);
    }

    if response.jobs.is_empty() {
        println!("{}", "No jobs found.".yellow());
    } else {
        println!("{}", format!("Found {} job(s):", response.jobs.len()).bold());
        println!();
        for job in &response.jobs {
            print_job_summary(job);
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Get and display a single job with its findings
pub async fn get_job_info(client: &JobManagerClient, config: &Config, id: &str) -> Result<ExitCode> {
    let job_id = resolve(client, id).await?;
    let response = client
        .get_job_info(&job_id)
        .await
        .with_context(|| format!("Failed to get job {}", job_id))?;

    if config.json {
        print_json(&response)?;
    } else {
        print_job_details(&response.job);
    }

    Ok(ExitCode::SUCCESS)
}

/// Show the current status of a job
pub async fn get_job_status(
    client: &JobManagerClient,
    config: &Config,
    id: &str,
) -> Result<ExitCode> {
    let job_id = resolve(client, id).await?;
    let response = client
        .get_job_status(&job_id)
        .await
        .with_context(|| format!("Failed to get status of job {}", job_id))?;

    if config.json {
        print_json(&response)?;
    } else {
        println!("Job {}: {}", job_id.to_string().cyan(), colorize_status(&response.status));
    }

    Ok(ExitCode::SUCCESS)
}

/// Cancel a queued or running job
pub async fn cancel_job(client: &JobManagerClient, config: &Config, id: &str) -> Result<ExitCode> {
    let job_id = resolve(client, id).await?;
    let response = client
        .cancel_job(&job_id)
        .await
        .with_context(|| format!("Failed to cancel job {}", job_id))?;

    if config.json {
        print_json(&response)?;
    } else if response.success {
        println!("{} {}", "✓".green(), response.message);
    } else {
        println!("{} {}", "✗".red(), response.message);
    }

    Ok(if response.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Print a job summary
fn print_job_summary(job: &Job) {
    let status_colored = colorize_status(&job.status);

    println!("  {} Job {}", "▸".cyan(), job.uuid.to_string().dimmed());
    println!("    Target:   {}", job.url);
    println!("    Status:   {}", status_colored);
    println!(
        "    Created:  {}",
        job.created
            .format("%Y-%m-%d %H:%M:%S")
            .to_string()
            .dimmed()
    );
    println!();
}

/// Print detailed job information
pub fn print_job_details(info: &JobFindings) {
    let job = &info.job;
    let status_colored = colorize_status(&job.status);

    println!("{}", "Job Details:".bold());
    println!("  ID:          {}", job.uuid.to_string().cyan());
    println!("  Target:      {}", job.url);
    println!("  Status:      {}", status_colored);
    println!("  Created:     {}", job.created.format("%Y-%m-%d %H:%M:%S"));

    if let Some(started) = job.started {
        println!("  Started:     {}", started.format("%Y-%m-%d %H:%M:%S"));
    }

    if let Some(finished) = job.finished {
        println!("  Finished:    {}", finished.format("%Y-%m-%d %H:%M:%S"));

        if let Some(started) = job.started {
            let duration = finished.signed_duration_since(started);
            println!("  Duration:    {}s", duration.num_seconds());
        }
    }

    if info.findings.is_empty() {
        println!("\n{}", "No findings.".dimmed());
    } else {
        println!("\n{}", format!("Findings ({}):", info.findings.len()).bold());
        let mut findings: Vec<&Finding> = info.findings.iter().collect();
        findings.sort_by_key(|f| f.severity);
        for finding in findings {
            println!(
                "  [{}] {}",
                colorize_severity(&finding.severity),
                finding.title
            );
        }
    }
}

/// Colorize job status for display
pub fn colorize_status(status: &JobStatus) -> colored::ColoredString {
    let status_str = status.as_str();
    match status {
        JobStatus::Queued => status_str.yellow(),
        JobStatus::Running => status_str.cyan(),
        JobStatus::Succeeded => status_str.green(),
        JobStatus::Failed => status_str.red(),
        JobStatus::Cancelled => status_str.dimmed(),
        JobStatus::Error => status_str.red().bold(),
    }
}

fn colorize_severity(severity: &Severity) -> colored::ColoredString {
    let label = severity.as_str().to_uppercase();
    match severity {
        Severity::Cosmic | Severity::Critical => label.magenta().bold(),
        Severity::High => label.red(),
        Severity::Medium => label.yellow(),
        Severity::Low => label.cyan(),
        Severity::Info | Severity::None => label.dimmed(),
    }
}
