use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use crate::error::SongError;
use crate::fetcher::RetryPolicy;

pub const DEFAULT_CONFIG_FILE: &str = "pmf-chansons.json";
pub const DEFAULT_BASE_URL: &str = "https://pardon-my-french.fr";
pub const DEFAULT_OUTPUT: &str = "site/chansons";

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub output: Option<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub download_timeout_secs: Option<u64>,
    #[serde(default)]
    pub download_attempts: Option<usize>,
    #[serde(default)]
    pub retry_backoff_secs: Option<u64>,
    #[serde(default)]
    pub user_agent: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ImportConfig {
    pub base_url: String,
    pub output: Utf8PathBuf,
    /// Connect timeout, and whole-request deadline for pages and HEAD calls.
    pub timeout: Duration,
    /// Whole-request deadline for audio downloads; `None` leaves them unbounded.
    pub download_timeout: Option<Duration>,
    pub retry: RetryPolicy,
    pub user_agent: String,
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// An explicit path must exist; otherwise `pmf-chansons.json` in the
    /// working directory is used when present, and defaults when not.
    pub fn resolve(path: Option<&str>) -> Result<ImportConfig, SongError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(DEFAULT_CONFIG_FILE),
        };

        if path.is_none() && !config_path.exists() {
            return Ok(Self::resolve_config(Config::default()));
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|_| SongError::ConfigRead(config_path.clone()))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|err| SongError::ConfigParse(err.to_string()))?;

        Ok(Self::resolve_config(config))
    }

    pub fn resolve_config(config: Config) -> ImportConfig {
        let defaults = RetryPolicy::default();
        ImportConfig {
            base_url: config
                .base_url
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            output: config
                .output
                .map(Utf8PathBuf::from)
                .unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_OUTPUT)),
            timeout: Duration::from_secs(config.timeout_secs.unwrap_or(30)),
            download_timeout: config.download_timeout_secs.map(Duration::from_secs),
            retry: RetryPolicy {
                max_attempts: config.download_attempts.unwrap_or(defaults.max_attempts),
                backoff: config
                    .retry_backoff_secs
                    .map(Duration::from_secs)
                    .unwrap_or(defaults.backoff),
            },
            user_agent: config.user_agent.unwrap_or_else(default_user_agent),
        }
    }
}

pub fn default_user_agent() -> String {
    format!("pmf-chansons/{}", env!("CARGO_PKG_VERSION"))
}
