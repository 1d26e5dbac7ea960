//! End-to-end waits against a mock job-management API

use std::time::Duration;

use jobman_client::waiter::{WaitConfig, WaitError};
use jobman_client::{ClientConfig, JobManagerClient};
use jobman_core::domain::job::{JobId, JobStatus};
use mockito::{Mock, Server, ServerGuard};

const JOB: &str = "7f3e9a10-1c2d-4b5e-8f90-a1b2c3d4e5f6";

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn client(server: &ServerGuard) -> JobManagerClient {
    JobManagerClient::new(ClientConfig::new("key", "secret").with_base_url(server.url())).unwrap()
}

fn fast_config() -> WaitConfig {
    WaitConfig::default()
        .with_poll_interval(Duration::from_millis(10))
        .with_backoff_multiplier(2.0)
        .with_max_backoff(Duration::from_millis(40))
        .with_max_wait(Duration::from_secs(5))
        .with_max_transient_retries(2)
}

async fn status_mock(server: &mut ServerGuard, status: usize, body: &str, hits: usize) -> Mock {
    server
        .mock("GET", format!("/v1/jobs/{}/status", JOB).as_str())
        .with_status(status)
        .with_header("content-type", "application/json")
        .with_body(body)
        .expect(hits)
        .create_async()
        .await
}

async fn info_mock(server: &mut ServerGuard) -> Mock {
    server
        .mock("GET", format!("/v1/jobs/{}", JOB).as_str())
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(format!(
            r#"{{"job": {{"uuid": "{}", "url": "https://example.com", "status": "FINISHED",
                "created": "2024-05-01T10:00:00Z", "started": "2024-05-01T10:00:05Z",
                "finished": "2024-05-01T10:12:00Z",
                "findings": [{{"title": "Reflected XSS", "severity": "high"}}]}}}}"#,
            JOB
        ))
        .create_async()
        .await
}

#[tokio::test]
async fn waits_through_queued_and_running() {
    init_tracing();
    let mut server = Server::new_async().await;
    let queued = status_mock(&mut server, 200, r#"{"status": "PENDING"}"#, 1).await;
    let running = status_mock(&mut server, 200, r#"{"status": "IN_PROGRESS"}"#, 1).await;
    let finished = status_mock(&mut server, 200, r#"{"status": "FINISHED"}"#, 1).await;
    let info = info_mock(&mut server).await;

    let outcome = client(&server)
        .wait_for_job(&JobId::from(JOB), &fast_config())
        .await
        .unwrap();

    assert_eq!(outcome.status, JobStatus::Succeeded);
    assert_eq!(outcome.attempts, 3);
    let findings = outcome.payload.unwrap().findings;
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].title, "Reflected XSS");

    queued.assert_async().await;
    running.assert_async().await;
    finished.assert_async().await;
    info.assert_async().await;
}

#[tokio::test]
async fn retries_server_errors() {
    init_tracing();
    let mut server = Server::new_async().await;
    let unavailable = status_mock(&mut server, 503, r#"{"error": "maintenance"}"#, 2).await;
    let finished = status_mock(&mut server, 200, r#"{"status": "CANCELED"}"#, 1).await;
    let info = info_mock(&mut server).await;

    let outcome = client(&server)
        .wait_for_job(&JobId::from(JOB), &fast_config())
        .await
        .unwrap();

    assert_eq!(outcome.status, JobStatus::Cancelled);
    assert_eq!(outcome.attempts, 3);
    unavailable.assert_async().await;
    finished.assert_async().await;
    info.assert_async().await;
}

#[tokio::test]
async fn gives_up_after_too_many_server_errors() {
    init_tracing();
    let mut server = Server::new_async().await;
    let unavailable = status_mock(&mut server, 502, "Bad Gateway", 3).await;

    let err = client(&server)
        .wait_for_job(&JobId::from(JOB), &fast_config())
        .await
        .unwrap_err();

    assert!(matches!(err, WaitError::RetriesExhausted { retries: 2, .. }));
    assert!(err.client_error().unwrap().is_server_error());
    unavailable.assert_async().await;
}

#[tokio::test]
async fn missing_job_fails_without_retry() {
    init_tracing();
    let mut server = Server::new_async().await;
    let missing = status_mock(&mut server, 404, r#"{"error": "job not found"}"#, 1).await;

    let err = client(&server)
        .wait_for_job(&JobId::from(JOB), &fast_config())
        .await
        .unwrap_err();

    assert!(matches!(err, WaitError::Fatal { .. }));
    assert!(err.to_string().contains("job not found"));
    missing.assert_async().await;
}

#[tokio::test]
async fn times_out_with_last_status() {
    init_tracing();
    let mut server = Server::new_async().await;
    let _running = server
        .mock("GET", format!("/v1/jobs/{}/status", JOB).as_str())
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"status": "IN_PROGRESS"}"#)
        .expect_at_least(2)
        .create_async()
        .await;

    let config = fast_config().with_max_wait(Duration::from_millis(150));
    let err = client(&server)
        .wait_for_job(&JobId::from(JOB), &config)
        .await
        .unwrap_err();

    assert!(err.is_timeout());
    assert_eq!(err.last_status(), Some(JobStatus::Running));
}
