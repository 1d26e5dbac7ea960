//! Job domain types

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::finding::Finding;

/// Opaque job identifier assigned by the remote service (a UUID on the wire)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for JobId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for JobId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Job execution status
///
/// The remote API reports `PENDING`, `IN_PROGRESS`, `FINISHED`, `FAILED`,
/// `CANCELED` and `ERROR`. The long-form spellings are accepted as aliases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobStatus {
    #[serde(rename = "PENDING", alias = "QUEUED")]
    Queued,
    #[serde(rename = "IN_PROGRESS", alias = "RUNNING")]
    Running,
    #[serde(rename = "FINISHED", alias = "SUCCEEDED")]
    Succeeded,
    #[serde(rename = "FAILED")]
    Failed,
    #[serde(rename = "CANCELED", alias = "CANCELLED")]
    Cancelled,
    #[serde(rename = "ERROR")]
    Error,
}

impl JobStatus {
    /// Whether no further transition can happen from this status
    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobStatus::Queued | JobStatus::Running)
    }

    /// Terminal and successful
    pub fn is_success(&self) -> bool {
        matches!(self, JobStatus::Succeeded)
    }

    /// Wire name used by the API
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "PENDING",
            JobStatus::Running => "IN_PROGRESS",
            JobStatus::Succeeded => "FINISHED",
            JobStatus::Failed => "FAILED",
            JobStatus::Cancelled => "CANCELED",
            JobStatus::Error => "ERROR",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Job record as listed by the API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub uuid: JobId,
    /// URL of the target service
    pub url: String,
    pub status: JobStatus,
    pub created: DateTime<Utc>,
    #[serde(default)]
    pub started: Option<DateTime<Utc>>,
    #[serde(default)]
    pub finished: Option<DateTime<Utc>>,
}

/// Job record together with the findings it produced
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobFindings {
    #[serde(flatten)]
    pub job: Job,
    #[serde(default)]
    pub findings: Vec<Finding>,
}
