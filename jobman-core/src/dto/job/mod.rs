//! Job DTOs for the job-management API

use serde::{Deserialize, Serialize};

use crate::domain::finding::Severity;
use crate::domain::job::{Job, JobFindings, JobId, JobStatus};

/// Response of `POST jobs/check`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckResponse {
    pub url: String,
    pub valid: bool,
}

/// Response of `POST jobs/launch`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaunchJobResponse {
    pub url: String,
    pub uuid: JobId,
    #[serde(default = "default_true")]
    pub success: bool,
}

/// Response of `POST jobs/{id}/cancel`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelJobResponse {
    pub success: bool,
    #[serde(alias = "description")]
    pub message: String,
}

/// Response of `GET jobs/{id}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobInfoResponse {
    pub job: JobFindings,
}

/// Response of `GET jobs`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListJobsResponse {
    pub jobs: Vec<Job>,
}

/// Response of `GET jobs/{id}/status`
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct JobStatusResponse {
    pub status: JobStatus,
}

/// Query string of `GET jobs/{id}/success`
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct JobSuccessQuery {
    /// Minimum severity level that should fail
    pub severity: Severity,
    #[serde(default = "default_true")]
    pub fail: bool,
}

impl Default for JobSuccessQuery {
    fn default() -> Self {
        Self {
            severity: Severity::default(),
            fail: true,
        }
    }
}

/// Response of `GET jobs/{id}/success`
///
/// `success` stays `None` while the job has not finished.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobSuccessResponse {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default, alias = "description")]
    pub message: Option<String>,
}

fn default_true() -> bool {
    true
}
