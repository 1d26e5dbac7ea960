//! Job-related API endpoints

use async_trait::async_trait;
use jobman_core::domain::job::{JobFindings, JobId};
use jobman_core::domain::service::Service;
use jobman_core::dto::job::{
    CancelJobResponse, CheckResponse, JobInfoResponse, JobStatusResponse, JobSuccessQuery,
    JobSuccessResponse, LaunchJobResponse, ListJobsResponse,
};
use reqwest::Method;

use crate::JobManagerClient;
use crate::error::{ClientError, Result};
use crate::waiter::{FetchOutcome, JobWaiter, StatusSource, WaitConfig, WaitResult};

impl JobManagerClient {
    // =============================================================================
    // Launching
    // =============================================================================

    /// Check whether a job can be launched against a service
    ///
    /// # Arguments
    /// * `service` - The target service
    ///
    /// # Returns
    /// Whether the service URL is valid for a job
    pub async fn check(&self, service: &Service) -> Result<CheckResponse> {
        validate_service(service)?;

        let response = self
            .request(Method::POST, "jobs/check")
            .json(service)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Launch a new job against a service
    ///
    /// # Arguments
    /// * `service` - The target service
    ///
    /// # Returns
    /// The identifier of the launched job
    pub async fn launch_job(&self, service: &Service) -> Result<LaunchJobResponse> {
        validate_service(service)?;

        let response = self
            .request(Method::POST, "jobs/launch")
            .json(service)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Cancel a queued or running job
    ///
    /// # Arguments
    /// * `job_id` - The job to cancel
    pub async fn cancel_job(&self, job_id: &JobId) -> Result<CancelJobResponse> {
        let path = format!("jobs/{}/cancel", job_id);
        let response = self.request(Method::POST, &path).send().await?;

        self.handle_response(response).await
    }

    // =============================================================================
    // Inspection
    // =============================================================================

    /// Get a job by ID, including its findings
    pub async fn get_job_info(&self, job_id: &JobId) -> Result<JobInfoResponse> {
        let path = format!("jobs/{}", job_id);
        let response = self.request(Method::GET, &path).send().await?;

        self.handle_response(response).await
    }

    /// List all jobs
    pub async fn list_jobs(&self) -> Result<ListJobsResponse> {
        let response = self.request(Method::GET, "jobs").send().await?;

        self.handle_response(response).await
    }

    /// Get the current status of a job
    pub async fn get_job_status(&self, job_id: &JobId) -> Result<JobStatusResponse> {
        let path = format!("jobs/{}/status", job_id);
        let response = self.request(Method::GET, &path).send().await?;

        self.handle_response(response).await
    }

    /// Get the success verdict of a job
    ///
    /// # Arguments
    /// * `job_id` - The job UUID
    /// * `query` - Minimum severity that counts as a failure
    ///
    /// # Returns
    /// The verdict; `success` is `None` while the job has not finished
    pub async fn get_job_success(
        &self,
        job_id: &JobId,
        query: &JobSuccessQuery,
    ) -> Result<JobSuccessResponse> {
        let path = format!("jobs/{}/success", job_id);
        let response = self
            .request(Method::GET, &path)
            .query(query)
            .send()
            .await?;

        self.handle_response(response).await
    }

    // =============================================================================
    // Waiting
    // =============================================================================

    /// Wait until a job reaches a terminal status
    ///
    /// The outcome payload holds the job with its findings as fetched right
    /// after the terminal status was observed.
    pub async fn wait_for_job(
        &self,
        job_id: &JobId,
        config: &WaitConfig,
    ) -> WaitResult<JobFindings> {
        JobWaiter::new(self, config.clone()).wait(job_id).await
    }
}

#[async_trait]
impl StatusSource for JobManagerClient {
    type Payload = JobFindings;

    /// Poll the status endpoint; on a terminal status also fetch the job info
    async fn fetch_status(&self, job_id: &JobId) -> FetchOutcome<JobFindings> {
        let polled = self.get_job_status(job_id).await.map(|r| r.status);

        match FetchOutcome::from(polled) {
            FetchOutcome::Terminal { status, .. } => match self.get_job_info(job_id).await {
                Ok(info) => FetchOutcome::Terminal {
                    status,
                    payload: Some(info.job),
                },
                Err(e) => FetchOutcome::from_error(e),
            },
            other => other,
        }
    }
}

/// Reject service URLs the API would refuse anyway
fn validate_service(service: &Service) -> Result<()> {
    let url = reqwest::Url::parse(&service.url)
        .map_err(|e| ClientError::InvalidRequest(format!("invalid URL '{}': {}", service.url, e)))?;

    if url.cannot_be_a_base() {
        return Err(ClientError::InvalidRequest(format!(
            "invalid URL '{}': not a hierarchical URL",
            service.url
        )));
    }

    Ok(())
}
