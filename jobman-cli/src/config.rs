//! Configuration module
//!
//! Handles CLI configuration: API connection settings and output format.

use std::time::Duration;

use anyhow::{Result, anyhow};
use jobman_client::ClientConfig;
use jobman_client::config::{ENV_API_KEY, ENV_API_SECRET};

/// CLI configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Connection settings for the API client
    pub client: ClientConfig,

    /// Print raw JSON instead of formatted text
    pub json: bool,
}

/// Connection options as given on the command line or in the environment
#[derive(Debug, Clone, Default)]
pub struct ConnectionOptions {
    pub api_url: String,
    pub api_version: String,
    pub api_key: Option<String>,
    pub api_secret: Option<String>,
    pub connect_timeout_secs: u64,
    pub read_timeout_secs: u64,
}

impl Config {
    /// Build the configuration, requiring both credentials
    pub fn new(options: ConnectionOptions, json: bool) -> Result<Self> {
        let (api_key, api_secret) = match (options.api_key, options.api_secret) {
            (Some(key), Some(secret)) if !key.is_empty() && !secret.is_empty() => (key, secret),
            _ => {
                return Err(anyhow!(
                    "API key and secret must be set (environment variables {} and {}). \
                     See --help for more information.",
                    ENV_API_KEY,
                    ENV_API_SECRET
                ));
            }
        };

        let client = ClientConfig::new(api_key, api_secret)
            .with_base_url(options.api_url)
            .with_api_version(options.api_version)
            .with_connect_timeout(Duration::from_secs(options.connect_timeout_secs))
            .with_read_timeout(Duration::from_secs(options.read_timeout_secs));

        client.validate()?;

        Ok(Self { client, json })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> ConnectionOptions {
        ConnectionOptions {
            api_url: "http://localhost:8080".to_string(),
            api_version: "v1".to_string(),
            api_key: Some("key".to_string()),
            api_secret: Some("secret".to_string()),
            connect_timeout_secs: 3,
            read_timeout_secs: 30,
        }
    }

    #[test]
    fn test_config_from_options() {
        let config = Config::new(options(), true).unwrap();
        assert_eq!(config.client.base_url, "http://localhost:8080");
        assert_eq!(config.client.read_timeout, Duration::from_secs(30));
        assert!(config.json);
    }

    #[test]
    fn test_missing_credentials() {
        let mut opts = options();
        opts.api_secret = None;
        let err = Config::new(opts, false).unwrap_err();
        assert!(err.to_string().contains(ENV_API_SECRET));
    }

    #[test]
    fn test_invalid_url() {
        let mut opts = options();
        opts.api_url = "localhost".to_string();
        assert!(Config::new(opts, false).is_err());
    }
}
