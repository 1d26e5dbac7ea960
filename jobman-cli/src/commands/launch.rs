//! Check and launch command handlers

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Args;
use colored::*;
use jobman_client::{ClientError, JobManagerClient};
use jobman_core::domain::job::JobId;
use jobman_core::domain::service::Service;
use jobman_core::dto::job::CheckResponse;

use super::{EXIT_JOB_UNSUCCESSFUL, print_json};
use crate::config::Config;

/// Optional details about the target service
#[derive(Args, Debug, Clone, Default)]
pub struct TargetArgs {
    /// Beacon ID of the service
    #[arg(long)]
    pub beacon_id: Option<i64>,

    /// Event slug of the service
    #[arg(long)]
    pub event_slug: Option<String>,
}

impl TargetArgs {
    pub fn service(&self, url: &str) -> Service {
        let mut service = Service::new(url);
        if let Some(beacon_id) = self.beacon_id {
            service = service.with_beacon_id(beacon_id);
        }
        if let Some(slug) = &self.event_slug {
            service = service.with_event_slug(slug.clone());
        }
        service
    }
}

/// Check whether a job can be launched against a URL
pub async fn check(
    client: &JobManagerClient,
    config: &Config,
    url: &str,
    target: &TargetArgs,
    fail: bool,
) -> Result<ExitCode> {
    let service = target.service(url);
    let response = match client.check(&service).await {
        Ok(response) => response,
        Err(ClientError::InvalidRequest(reason)) => {
            if config.json {
                print_json(&CheckResponse {
                    url: service.url,
                    valid: false,
                })?;
            } else {
                println!("{} {}", "✗".red(), reason);
            }
            return Ok(check_exit_code(false, fail));
        }
        Err(e) => return Err(e).with_context(|| format!("Failed to check {}", service.url)),
    };

    if config.json {
        print_json(&response)?;
    } else if response.valid {
        println!("{} {} is valid", "✓".green(), response.url.cyan());
    } else {
        println!("{} {} is not valid", "✗".red(), response.url.cyan());
    }

    Ok(check_exit_code(response.valid, fail))
}

fn check_exit_code(valid: bool, fail: bool) -> ExitCode {
    if !valid && fail {
        ExitCode::from(EXIT_JOB_UNSUCCESSFUL)
    } else {
        ExitCode::SUCCESS
    }
}

/// Launch a job and return its ID
pub async fn launch(
    client: &JobManagerClient,
    config: &Config,
    url: &str,
    target: &TargetArgs,
) -> Result<JobId> {
    let service = target.service(url);
    let response = client
        .launch_job(&service)
        .await
        .with_context(|| format!("Failed to launch job against {}", service.url))?;

    if config.json {
        print_json(&response)?;
    } else {
        println!("{}", "✓ Job launched".green().bold());
        println!("  ID:     {}", response.uuid.to_string().cyan());
        println!("  Target: {}", response.url);
    }

    Ok(response.uuid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jobman_client::ClientConfig;

    #[test]
    fn test_target_service() {
        let target = TargetArgs {
            beacon_id: Some(12),
            event_slug: Some("summer".to_string()),
        };
        let service = target.service("https://example.com/");
        assert_eq!(service.url, "https://example.com");
        assert_eq!(service.beacon_id, Some(12));
        assert_eq!(service.event_slug.as_deref(), Some("summer"));

        let service = TargetArgs::default().service("https://example.com");
        assert_eq!(service.beacon_id, None);
    }

    fn offline() -> (JobManagerClient, Config) {
        // Nothing listens here, so any request would fail.
        let client_config =
            ClientConfig::new("key", "secret").with_base_url("http://127.0.0.1:1");
        let client = JobManagerClient::new(client_config.clone()).unwrap();
        let config = Config {
            client: client_config,
            json: true,
        };
        (client, config)
    }

    #[tokio::test]
    async fn test_check_rejected_url_honors_no_fail() {
        let (client, config) = offline();
        let target = TargetArgs::default();

        let code = check(&client, &config, "not a url", &target, true)
            .await
            .unwrap();
        assert_eq!(code, ExitCode::from(EXIT_JOB_UNSUCCESSFUL));

        let code = check(&client, &config, "not a url", &target, false)
            .await
            .unwrap();
        assert_eq!(code, ExitCode::SUCCESS);
    }
}
