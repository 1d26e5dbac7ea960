//! Client configuration
//!
//! Connection settings and credentials for the job-management API. Nothing is
//! read from process-wide state at request time: a [`ClientConfig`] is built
//! once (by hand or from the environment) and handed to the client.

use std::time::Duration;

use crate::error::{ClientError, Result};

pub const DEFAULT_API_URL: &str = "https://api.ethiack.com";
pub const DEFAULT_API_VERSION: &str = "v1";
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(3);
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(30);

pub const ENV_API_URL: &str = "JOBMAN_API_URL";
pub const ENV_API_VERSION: &str = "JOBMAN_API_VERSION";
pub const ENV_API_KEY: &str = "JOBMAN_API_KEY";
pub const ENV_API_SECRET: &str = "JOBMAN_API_SECRET";
pub const ENV_CONNECT_TIMEOUT: &str = "JOBMAN_CONNECT_TIMEOUT";
pub const ENV_READ_TIMEOUT: &str = "JOBMAN_READ_TIMEOUT";

/// Older variable names, read when the `JOBMAN_*` one is unset
const LEGACY_ENV_NAMES: [(&str, &str); 6] = [
    (ENV_API_URL, "ETHIACK_API_URL"),
    (ENV_API_VERSION, "ETHIACK_API_VER"),
    (ENV_API_KEY, "ETHIACK_API_KEY"),
    (ENV_API_SECRET, "ETHIACK_API_SECRET"),
    (ENV_CONNECT_TIMEOUT, "CONNECT_TIMEOUT"),
    (ENV_READ_TIMEOUT, "READ_TIMEOUT"),
];

/// Legacy name of a `JOBMAN_*` variable, if it has one
pub fn legacy_env_name(name: &str) -> Option<&'static str> {
    LEGACY_ENV_NAMES
        .iter()
        .find(|(current, _)| *current == name)
        .map(|(_, legacy)| *legacy)
}

/// Read a setting from the process environment, falling back to its legacy name
pub fn env_var(name: &str) -> Option<String> {
    lookup_setting(&|name: &str| std::env::var(name).ok(), name)
}

fn lookup_setting<F>(lookup: &F, name: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .filter(|v| !v.is_empty())
        .or_else(|| legacy_env_name(name).and_then(lookup))
        .filter(|v| !v.is_empty())
}

/// API key and secret sent as HTTP basic auth
#[derive(Clone)]
pub struct Credentials {
    pub api_key: String,
    pub api_secret: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .finish()
    }
}

/// Job-management client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the API (e.g., "https://api.ethiack.com")
    pub base_url: String,

    /// API version path segment (e.g., "v1")
    pub api_version: String,

    pub credentials: Credentials,

    /// Time allowed to establish a connection
    pub connect_timeout: Duration,

    /// Time allowed for a whole request, response body included
    pub read_timeout: Duration,
}

impl ClientConfig {
    /// Creates a configuration with default URL, version and timeouts
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            credentials: Credentials {
                api_key: api_key.into(),
                api_secret: api_secret.into(),
            },
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            read_timeout: DEFAULT_READ_TIMEOUT,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Creates configuration from environment variables
    ///
    /// Expected environment variables:
    /// - JOBMAN_API_KEY (required)
    /// - JOBMAN_API_SECRET (required)
    /// - JOBMAN_API_URL (optional, default: https://api.ethiack.com)
    /// - JOBMAN_API_VERSION (optional, default: v1)
    /// - JOBMAN_CONNECT_TIMEOUT (optional, seconds, default: 3)
    /// - JOBMAN_READ_TIMEOUT (optional, seconds, default: 30)
    ///
    /// The older names `ETHIACK_API_KEY`, `ETHIACK_API_SECRET`,
    /// `ETHIACK_API_URL`, `ETHIACK_API_VER`, `CONNECT_TIMEOUT` and
    /// `READ_TIMEOUT` are used when the matching variable above is unset.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`ClientConfig::from_env`] with an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &str| {
            lookup_setting(&lookup, name).ok_or_else(|| {
                ClientError::InvalidConfig(format!(
                    "API key and secret must be set (environment variables {} and {})",
                    ENV_API_KEY, ENV_API_SECRET
                ))
            })
        };

        let api_key = required(ENV_API_KEY)?;
        let api_secret = required(ENV_API_SECRET)?;

        let mut config = Self::new(api_key, api_secret);

        if let Some(url) = lookup_setting(&lookup, ENV_API_URL) {
            config.base_url = url;
        }

        if let Some(version) = lookup_setting(&lookup, ENV_API_VERSION) {
            config.api_version = version;
        }

        if let Some(secs) = parse_secs(&lookup, ENV_CONNECT_TIMEOUT)? {
            config.connect_timeout = secs;
        }

        if let Some(secs) = parse_secs(&lookup, ENV_READ_TIMEOUT)? {
            config.read_timeout = secs;
        }

        Ok(config)
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<()> {
        if self.credentials.api_key.is_empty() || self.credentials.api_secret.is_empty() {
            return Err(ClientError::InvalidConfig(
                "API key and secret cannot be empty".to_string(),
            ));
        }

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ClientError::InvalidConfig(
                "base_url must start with http:// or https://".to_string(),
            ));
        }

        if self.api_version.trim_matches('/').is_empty() {
            return Err(ClientError::InvalidConfig(
                "api_version cannot be empty".to_string(),
            ));
        }

        if self.connect_timeout.is_zero() || self.read_timeout.is_zero() {
            return Err(ClientError::InvalidConfig(
                "timeouts must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

fn parse_secs<F>(lookup: &F, name: &str) -> Result<Option<Duration>>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup_setting(lookup, name) {
        None => Ok(None),
        Some(raw) => raw
            .parse::<u64>()
            .map(|secs| Some(Duration::from_secs(secs)))
            .map_err(|_| {
                ClientError::InvalidConfig(format!("{} must be a whole number of seconds", name))
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = ClientConfig::new("key", "secret");
        assert_eq!(config.base_url, DEFAULT_API_URL);
        assert_eq!(config.api_version, "v1");
        assert_eq!(config.connect_timeout, Duration::from_secs(3));
        assert_eq!(config.read_timeout, Duration::from_secs(30));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_lookup_requires_credentials() {
        let err = ClientConfig::from_lookup(lookup_from(&[(ENV_API_KEY, "key")])).unwrap_err();
        assert!(matches!(err, ClientError::InvalidConfig(_)));

        let err = ClientConfig::from_lookup(lookup_from(&[
            (ENV_API_KEY, "key"),
            (ENV_API_SECRET, ""),
        ]))
        .unwrap_err();
        assert!(matches!(err, ClientError::InvalidConfig(_)));
    }

    #[test]
    fn test_from_lookup_overrides() {
        let config = ClientConfig::from_lookup(lookup_from(&[
            (ENV_API_KEY, "key"),
            (ENV_API_SECRET, "secret"),
            (ENV_API_URL, "http://localhost:9000"),
            (ENV_API_VERSION, "v2"),
            (ENV_CONNECT_TIMEOUT, "1"),
            (ENV_READ_TIMEOUT, "5"),
        ]))
        .unwrap();

        assert_eq!(config.base_url, "http://localhost:9000");
        assert_eq!(config.api_version, "v2");
        assert_eq!(config.connect_timeout, Duration::from_secs(1));
        assert_eq!(config.read_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_from_lookup_accepts_legacy_names() {
        let config = ClientConfig::from_lookup(lookup_from(&[
            ("ETHIACK_API_KEY", "key"),
            ("ETHIACK_API_SECRET", "secret"),
            ("ETHIACK_API_URL", "http://localhost:9000"),
            ("ETHIACK_API_VER", "v2"),
            ("CONNECT_TIMEOUT", "7"),
            ("READ_TIMEOUT", "60"),
        ]))
        .unwrap();

        assert_eq!(config.credentials.api_key, "key");
        assert_eq!(config.base_url, "http://localhost:9000");
        assert_eq!(config.api_version, "v2");
        assert_eq!(config.connect_timeout, Duration::from_secs(7));
        assert_eq!(config.read_timeout, Duration::from_secs(60));
    }

    #[test]
    fn test_current_names_win_over_legacy() {
        let config = ClientConfig::from_lookup(lookup_from(&[
            (ENV_API_KEY, "new-key"),
            ("ETHIACK_API_KEY", "old-key"),
            (ENV_API_SECRET, ""),
            ("ETHIACK_API_SECRET", "old-secret"),
        ]))
        .unwrap();

        assert_eq!(config.credentials.api_key, "new-key");
        assert_eq!(config.credentials.api_secret, "old-secret");
        assert_eq!(legacy_env_name(ENV_API_VERSION), Some("ETHIACK_API_VER"));
        assert_eq!(legacy_env_name("HOME"), None);
    }

    #[test]
    fn test_from_lookup_rejects_bad_timeout() {
        let result = ClientConfig::from_lookup(lookup_from(&[
            (ENV_API_KEY, "key"),
            (ENV_API_SECRET, "secret"),
            (ENV_READ_TIMEOUT, "soon"),
        ]));
        assert!(result.is_err());
    }

    #[test]
    fn test_config_validation() {
        let mut config = ClientConfig::new("key", "secret");
        assert!(config.validate().is_ok());

        config.base_url = "not-a-url".to_string();
        assert!(config.validate().is_err());

        config.base_url = "http://localhost:8080".to_string();
        config.read_timeout = Duration::ZERO;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_secret_redacted_in_debug() {
        let config = ClientConfig::new("key", "hunter2");
        assert!(!format!("{:?}", config).contains("hunter2"));
    }
}
