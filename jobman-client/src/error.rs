//! Error types for the job-management client

use thiserror::Error;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that can occur when using the job-management client
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed before a response was received
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// API returned an error status code
    #[error("API error (status {status}): {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Error message from the API
        message: String,
    },

    /// Failed to parse response
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Resource not found (HTTP 404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Credentials rejected (HTTP 401/403)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Invalid request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Client configuration is incomplete or malformed
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl ClientError {
    /// Create an error from a non-success status code and message
    ///
    /// 401/403 become [`ClientError::Unauthorized`] and 404 becomes
    /// [`ClientError::NotFound`]; everything else is an [`ClientError::ApiError`].
    pub fn api_error(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            401 | 403 => Self::Unauthorized(message),
            404 => Self::NotFound(message),
            _ => Self::ApiError { status, message },
        }
    }

    /// HTTP status code carried by this error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::ApiError { status, .. } => Some(*status),
            Self::NotFound(_) => Some(404),
            Self::RequestFailed(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Check if this error is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_)) || matches!(self, Self::ApiError { status: 404, .. })
    }

    /// Check if the credentials were rejected
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized(_))
            || matches!(self, Self::ApiError { status: 401 | 403, .. })
    }

    /// Check if this error is a server error (5xx status)
    pub fn is_server_error(&self) -> bool {
        matches!(self, Self::ApiError { status, .. } if *status >= 500)
    }

    /// Whether retrying the same request may succeed
    ///
    /// Transport timeouts and connection failures, request timeouts (408),
    /// rate limiting (429) and server errors (5xx) are transient. Everything
    /// else, including auth failures, missing jobs and unparseable bodies, is
    /// fatal.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::RequestFailed(e) => {
                if e.is_builder() || e.is_decode() || e.is_redirect() {
                    return false;
                }
                e.is_timeout() || e.is_connect() || e.is_request() || e.is_body()
            }
            Self::ApiError { status, .. } => matches!(*status, 408 | 429 | 500..=599),
            Self::ParseError(_)
            | Self::NotFound(_)
            | Self::Unauthorized(_)
            | Self::InvalidRequest(_)
            | Self::InvalidConfig(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_mapping() {
        assert!(ClientError::api_error(404, "missing").is_not_found());
        assert!(ClientError::api_error(401, "bad key").is_unauthorized());
        assert!(ClientError::api_error(403, "forbidden").is_unauthorized());
        assert!(ClientError::api_error(500, "boom").is_server_error());
        assert!(!ClientError::api_error(422, "invalid").is_transient());
        assert_eq!(ClientError::api_error(502, "bad gateway").status(), Some(502));
    }

    #[test]
    fn test_transient_statuses() {
        for status in [408, 429, 500, 502, 503, 504] {
            assert!(
                ClientError::api_error(status, "retry me").is_transient(),
                "status {} should be transient",
                status
            );
        }
    }

    #[test]
    fn test_fatal_statuses() {
        for status in [400, 401, 403, 404, 409, 422] {
            assert!(
                !ClientError::api_error(status, "give up").is_transient(),
                "status {} should be fatal",
                status
            );
        }
    }

    #[test]
    fn test_local_errors_are_fatal() {
        assert!(!ClientError::ParseError("bad json".into()).is_transient());
        assert!(!ClientError::InvalidRequest("bad url".into()).is_transient());
        assert!(!ClientError::InvalidConfig("no key".into()).is_transient());
    }
}
