use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Result};
use clap::Parser;
use dotenvy::dotenv;
use serde::Deserialize;

fn default_api_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_log_file() -> PathBuf {
    PathBuf::from("task_manager.log")
}

/// Configuration for the application
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Base URL of the project-management API
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Where log output goes; the terminal belongs to the UI
    #[serde(default = "default_log_file")]
    pub log_file: PathBuf,
}

/// Command-line overrides for the environment configuration
#[derive(Debug, Default, Parser)]
#[command(name = "task_manager", version, about = "Terminal client for the project-management API")]
pub struct Cli {
    /// API base URL (overrides API_URL)
    #[arg(long)]
    pub api_url: Option<String>,

    /// Request timeout in seconds (overrides REQUEST_TIMEOUT_SECS)
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Log file path (overrides LOG_FILE)
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// This function will:
    /// 1. Load variables from .env file if it exists
    /// 2. Deserialize environment variables into Config struct
    pub fn load() -> Result<Self> {
        dotenv().ok();

        let config = envy::from_env::<Config>()?;

        Ok(config)
    }

    /// Command-line flags win over the environment.
    pub fn with_overrides(mut self, cli: Cli) -> Self {
        if let Some(url) = cli.api_url {
            self.api_url = url;
        }
        if let Some(secs) = cli.timeout {
            self.request_timeout_secs = secs;
        }
        if let Some(path) = cli.log_file {
            self.log_file = path;
        }
        self
    }

    /// Rejects settings that would make every request fail.
    pub fn validate(&self) -> Result<()> {
        if self.request_timeout_secs == 0 {
            bail!("request timeout must be at least one second");
        }
        Ok(())
    }

    /// Base URL without a trailing slash
    pub fn api_url(&self) -> &str {
        self.api_url.trim_end_matches('/')
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Initialize environment variables and load configuration
pub fn init(cli: Cli) -> Result<Config> {
    // Ensure .env file is loaded
    dotenv().ok();

    let config = Config::load()?.with_overrides(cli);
    config.validate()?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn defaults_fill_optional_settings() {
        let config: Config = envy::from_iter(vars(&[("API_URL", "http://localhost:8000/")])).unwrap();
        assert_eq!(config.api_url(), "http://localhost:8000");
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.log_file, PathBuf::from("task_manager.log"));
    }

    #[test]
    fn malformed_timeout_is_rejected() {
        assert!(envy::from_iter::<_, Config>(vars(&[("REQUEST_TIMEOUT_SECS", "soon")])).is_err());
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let config: Config = envy::from_iter(vars(&[("REQUEST_TIMEOUT_SECS", "0")])).unwrap();
        assert!(config.validate().is_err());

        let config: Config = envy::from_iter(vars(&[])).unwrap();
        assert!(config.validate().is_ok());
        let config = config.with_overrides(Cli::parse_from(["task_manager", "--timeout", "0"]));
        assert!(config.validate().is_err());
    }

    #[test]
    fn api_url_defaults_to_local_server() {
        let config: Config = envy::from_iter(vars(&[])).unwrap();
        assert_eq!(config.api_url(), "http://localhost:8000");
    }

    #[test]
    fn cli_overrides_environment() {
        let config: Config = envy::from_iter(vars(&[
            ("API_URL", "http://env:8000"),
            ("REQUEST_TIMEOUT_SECS", "10"),
        ]))
        .unwrap();

        let cli = Cli::parse_from(["task_manager", "--api-url", "http://cli:9000", "--timeout", "3"]);
        let config = config.with_overrides(cli);

        assert_eq!(config.api_url(), "http://cli:9000");
        assert_eq!(config.request_timeout_secs, 3);
    }
}
