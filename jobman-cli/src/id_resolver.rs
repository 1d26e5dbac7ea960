//! ID resolver module
//!
//! Handles resolution of UUID prefixes to full job IDs by querying the API.
//! This allows users to specify short, unambiguous prefixes instead of full UUIDs.

use anyhow::{Context, Result, anyhow};
use jobman_client::JobManagerClient;
use jobman_core::domain::job::{Job, JobId};

use crate::types::IdOrPrefix;

/// Resolve a job ID or prefix to a full job ID
///
/// If the input is already a full UUID, returns it immediately.
/// Otherwise, fetches all jobs and finds the one matching the prefix.
///
/// # Errors
/// Returns an error if:
/// - No job matches the prefix
/// - Multiple jobs match the prefix (ambiguous)
/// - API call fails
pub async fn resolve_job_id(client: &JobManagerClient, id_or_prefix: &IdOrPrefix) -> Result<JobId> {
    let prefix = match id_or_prefix {
        IdOrPrefix::Full(uuid) => return Ok(JobId::new(uuid.hyphenated().to_string())),
        IdOrPrefix::Prefix(prefix) => prefix,
    };

    let jobs = client
        .list_jobs()
        .await
        .context("Failed to fetch jobs for ID resolution")?
        .jobs;

    match_prefix(&jobs, prefix)
}

/// Find the single job whose ID starts with `prefix`
fn match_prefix(jobs: &[Job], prefix: &str) -> Result<JobId> {
    let prefix = prefix.to_lowercase();

    let matches: Vec<_> = jobs
        .iter()
        .filter(|j| j.uuid.as_str().to_lowercase().starts_with(&prefix))
        .collect();

    match matches.len() {
        0 => Err(anyhow!("No job found with ID starting with '{}'", prefix)),
        1 => Ok(matches[0].uuid.clone()),
        _ => {
            let ids: Vec<&str> = matches.iter().map(|j| j.uuid.as_str()).collect();
            Err(anyhow!(
                "Ambiguous prefix '{}' matches multiple jobs: {}",
                prefix,
                ids.join(", ")
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jobman_core::domain::job::JobStatus;

    fn job(id: &str) -> Job {
        Job {
            uuid: JobId::from(id),
            url: "https://example.com".to_string(),
            status: JobStatus::Queued,
            created: chrono::Utc::now(),
            started: None,
            finished: None,
        }
    }

    #[test]
    fn test_unique_prefix() {
        let jobs = vec![job("abc123"), job("abd456")];
        assert_eq!(match_prefix(&jobs, "ABC").unwrap(), JobId::from("abc123"));
    }

    #[test]
    fn test_ambiguous_prefix() {
        let jobs = vec![job("abc123"), job("abd456")];
        let err = match_prefix(&jobs, "ab").unwrap_err();
        assert!(err.to_string().contains("Ambiguous prefix"));
    }

    #[tokio::test]
    async fn test_full_uuid_resolves_without_listing() {
        // Nothing listens here, so any request would fail.
        let client = JobManagerClient::new(
            jobman_client::ClientConfig::new("key", "secret").with_base_url("http://127.0.0.1:1"),
        )
        .unwrap();

        let id = IdOrPrefix::parse("0D7C2A5E-6A0E-4C55-9F55-3F8A0B3A1A11");
        let job_id = resolve_job_id(&client, &id).await.unwrap();

        assert_eq!(job_id, JobId::from("0d7c2a5e-6a0e-4c55-9f55-3f8a0b3a1a11"));
    }

    #[test]
    fn test_unknown_prefix() {
        let jobs = vec![job("abc123")];
        assert!(match_prefix(&jobs, "ff").is_err());
    }
}
