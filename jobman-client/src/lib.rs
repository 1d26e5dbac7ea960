//! Jobman HTTP Client
//!
//! A type-safe HTTP client for a remote job-management API, plus the
//! [`waiter`] that polls a job until it reaches a terminal state.
//!
//! # Example
//!
//! ```no_run
//! use jobman_client::{ClientConfig, JobManagerClient};
//! use jobman_client::waiter::WaitConfig;
//! use jobman_core::domain::service::Service;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = JobManagerClient::new(ClientConfig::from_env()?)?;
//!
//!     let launched = client.launch_job(&Service::new("https://example.com")).await?;
//!     let outcome = client.wait_for_job(&launched.uuid, &WaitConfig::default()).await?;
//!
//!     println!("Job {} finished as {}", launched.uuid, outcome.status);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
mod jobs;
pub mod waiter;

// Re-export commonly used types
pub use config::{ClientConfig, Credentials};
pub use error::{ClientError, Result};

use reqwest::Client;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

/// HTTP client for the job-management API
///
/// Endpoint methods live in the `jobs` module; this type owns the connection
/// settings and the shared response handling.
#[derive(Debug, Clone)]
pub struct JobManagerClient {
    /// Base URL of the API, without trailing slash
    base_url: String,
    /// Version path segment, without slashes
    api_version: String,
    credentials: Credentials,
    /// HTTP client instance
    client: Client,
}

impl JobManagerClient {
    /// Create a new client from a validated configuration
    ///
    /// The underlying HTTP client is built with the configured connect and
    /// read timeouts and a JSON `Accept` header.
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.read_timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self::with_client(config, client))
    }

    /// Create a new client with a custom HTTP client
    ///
    /// This allows you to configure proxies, TLS settings, etc. The timeouts
    /// of `config` are not applied to `client`.
    pub fn with_client(config: ClientConfig, client: Client) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_version: config.api_version.trim_matches('/').to_string(),
            credentials: config.credentials,
            client,
        }
    }

    /// Get the base URL of the API
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build the full URL of an endpoint path below the API version
    pub(crate) fn endpoint(&self, path: &str) -> String {
        format!("{}/{}/{}", self.base_url, self.api_version, path)
    }

    /// Start an authenticated request
    pub(crate) fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let url = self.endpoint(path);
        debug!("{} {}", method, url);

        self.client.request(method, url).basic_auth(
            &self.credentials.api_key,
            Some(&self.credentials.api_secret),
        )
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Handle an API response and deserialize JSON
    ///
    /// This method checks the status code and returns an appropriate error if
    /// the request failed, or deserializes the response body if successful.
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let status = response.status();

        if !status.is_success() {
            let is_json = response
                .headers()
                .get(reqwest::header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .is_some_and(|v| v.contains("application/json"));
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            let message = describe_error_body(&error_text, is_json);

            warn!("Request failed with status {}: {}", status, message);
            return Err(ClientError::api_error(status.as_u16(), message));
        }

        let body = response.text().await?;
        serde_json::from_str(&body)
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }
}

/// Error body shape used by the API
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: Option<serde_json::Value>,
    validation_error: Option<serde_json::Value>,
}

/// Turn an error response body into a readable message
///
/// JSON bodies carrying `error` or `validation_error` are labelled
/// accordingly; any other body is returned as-is.
fn describe_error_body(body: &str, is_json: bool) -> String {
    if !is_json {
        return body.to_string();
    }

    match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(ApiErrorBody {
            error: Some(error), ..
        }) => format!("(Error) {}", display_value(&error)),
        Ok(ApiErrorBody {
            validation_error: Some(error),
            ..
        }) => format!("(Validation Error) {}", display_value(&error)),
        _ => format!("(Unknown error) {}", body),
    }
}

fn display_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(base_url: &str) -> ClientConfig {
        ClientConfig::new("key", "secret").with_base_url(base_url)
    }

    #[test]
    fn test_client_creation() {
        let client = JobManagerClient::new(config("http://localhost:8080")).unwrap();
        assert_eq!(client.base_url(), "http://localhost:8080");
    }

    #[test]
    fn test_client_trims_trailing_slash() {
        let client = JobManagerClient::new(config("http://localhost:8080/")).unwrap();
        assert_eq!(client.base_url(), "http://localhost:8080");
        assert_eq!(
            client.endpoint("jobs/abc/status"),
            "http://localhost:8080/v1/jobs/abc/status"
        );
    }

    #[test]
    fn test_client_with_custom_client() {
        let client = JobManagerClient::with_client(
            config("http://localhost:8080").with_api_version("/v2/"),
            Client::new(),
        );
        assert_eq!(client.endpoint("jobs"), "http://localhost:8080/v2/jobs");
    }

    #[test]
    fn test_client_rejects_invalid_config() {
        let result = JobManagerClient::new(ClientConfig::new("", "secret"));
        assert!(matches!(result, Err(ClientError::InvalidConfig(_))));
    }

    #[test]
    fn test_describe_error_body() {
        assert_eq!(
            describe_error_body(r#"{"error": "job not found"}"#, true),
            "(Error) job not found"
        );
        assert_eq!(
            describe_error_body(r#"{"validation_error": {"url": "invalid"}}"#, true),
            r#"(Validation Error) {"url":"invalid"}"#
        );
        assert_eq!(
            describe_error_body(r#"{"detail": "nope"}"#, true),
            r#"(Unknown error) {"detail": "nope"}"#
        );
        assert_eq!(describe_error_body("Bad Gateway", false), "Bad Gateway");
    }
}
