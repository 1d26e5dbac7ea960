//! Jobman CLI
//!
//! Command-line interface for launching, inspecting and awaiting jobs on the
//! job-management API.

mod commands;
mod config;
mod id_resolver;
mod types;

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use commands::{Commands, handle_command};
use config::{Config, ConnectionOptions};
use jobman_client::config::{
    DEFAULT_API_URL, DEFAULT_API_VERSION, DEFAULT_CONNECT_TIMEOUT, DEFAULT_READ_TIMEOUT,
    ENV_API_KEY, ENV_API_SECRET, ENV_API_URL, ENV_API_VERSION, ENV_CONNECT_TIMEOUT,
    ENV_READ_TIMEOUT, env_var,
};

/// Manage jobs through the job-management API
///
/// Credentials and connection settings can be given as flags, as environment
/// variables or in a `.env` file in the working directory. The older
/// `ETHIACK_API_KEY`, `ETHIACK_API_SECRET`, `ETHIACK_API_URL`,
/// `ETHIACK_API_VER`, `CONNECT_TIMEOUT` and `READ_TIMEOUT` names are
/// still read.
#[derive(Parser)]
#[command(name = "jobman", version)]
struct Cli {
    /// API base URL [default: https://api.ethiack.com]
    #[arg(long, global = true, env = ENV_API_URL)]
    api_url: Option<String>,

    /// API version [default: v1]
    #[arg(long, global = true, env = ENV_API_VERSION)]
    api_version: Option<String>,

    /// API key
    #[arg(long, global = true, env = ENV_API_KEY, hide_env_values = true)]
    api_key: Option<String>,

    /// API secret
    #[arg(long, global = true, env = ENV_API_SECRET, hide_env_values = true)]
    api_secret: Option<String>,

    /// Connection timeout in seconds [default: 3]
    #[arg(long, global = true, env = ENV_CONNECT_TIMEOUT)]
    connect_timeout: Option<u64>,

    /// Request timeout in seconds [default: 30]
    #[arg(long, global = true, env = ENV_READ_TIMEOUT)]
    read_timeout: Option<u64>,

    /// Print raw JSON responses
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    /// Fill unset connection options from legacy variables, then defaults
    fn connection_options<F>(&self, lookup: F) -> Result<ConnectionOptions>
    where
        F: Fn(&str) -> Option<String>,
    {
        let secs = |given: Option<u64>, name: &str, default: u64| -> Result<u64> {
            match given {
                Some(secs) => Ok(secs),
                None => lookup(name)
                    .map(|raw| raw.parse::<u64>())
                    .transpose()
                    .with_context(|| format!("{} must be a whole number of seconds", name))
                    .map(|secs| secs.unwrap_or(default)),
            }
        };

        Ok(ConnectionOptions {
            api_url: self
                .api_url
                .clone()
                .or_else(|| lookup(ENV_API_URL))
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            api_version: self
                .api_version
                .clone()
                .or_else(|| lookup(ENV_API_VERSION))
                .unwrap_or_else(|| DEFAULT_API_VERSION.to_string()),
            api_key: self.api_key.clone().or_else(|| lookup(ENV_API_KEY)),
            api_secret: self.api_secret.clone().or_else(|| lookup(ENV_API_SECRET)),
            connect_timeout_secs: secs(
                self.connect_timeout,
                ENV_CONNECT_TIMEOUT,
                DEFAULT_CONNECT_TIMEOUT.as_secs(),
            )?,
            read_timeout_secs: secs(
                self.read_timeout,
                ENV_READ_TIMEOUT,
                DEFAULT_READ_TIMEOUT.as_secs(),
            )?,
        })
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // A missing .env file is fine
    match dotenvy::dotenv() {
        Err(e) if !e.not_found() => {
            eprintln!("{} failed to read .env: {}", "Warning:".yellow().bold(), e);
        }
        _ => {}
    }

    // Logs go to stderr so stdout stays parseable with --json
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli
        .connection_options(env_var)
        .and_then(|options| Config::new(options, cli.json))
    {
        Ok(config) => handle_command(cli.command, &config).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}
