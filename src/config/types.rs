use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;

use super::defaults::{
    DEFAULT_CONNECT_TIMEOUT, DEFAULT_MAX_CONCURRENCY, DEFAULT_MAX_RESPONSE_SIZE,
    DEFAULT_MAX_RETRIES, DEFAULT_MAX_RETRY_DELAY, DEFAULT_POOL_IDLE_TIMEOUT,
    DEFAULT_POOL_MAX_IDLE_PER_HOST, DEFAULT_RATE_LIMIT_PER_SECOND, DEFAULT_RETRY_DELAY,
    DEFAULT_TIMEOUT, DEFAULT_USER_AGENT,
};
use super::parse_duration_value;

/// Resolved engine settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Applied to probes that arrive with a zero timeout.
    pub default_timeout: Duration,
    /// Batch admission gate size when the caller passes zero.
    pub max_concurrency: usize,
    pub rate_limit_per_second: u32,
    /// Applied to probes that arrive with zero max retries.
    pub max_retries: u32,
    /// Base delay for exponential backoff.
    pub retry_delay: Duration,
    /// Ceiling for a single backoff delay.
    pub max_retry_delay: Duration,
    /// Response bodies are silently truncated at this many bytes.
    pub max_response_size: usize,
    /// Used by front ends when a request does not say whether to follow redirects.
    pub follow_redirects: bool,
    pub connect_timeout: Duration,
    pub pool_max_idle_per_host: usize,
    pub pool_idle_timeout: Duration,
    pub user_agent: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_timeout: DEFAULT_TIMEOUT,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            rate_limit_per_second: DEFAULT_RATE_LIMIT_PER_SECOND,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay: DEFAULT_RETRY_DELAY,
            max_retry_delay: DEFAULT_MAX_RETRY_DELAY,
            max_response_size: DEFAULT_MAX_RESPONSE_SIZE,
            follow_redirects: true,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            pool_max_idle_per_host: DEFAULT_POOL_MAX_IDLE_PER_HOST,
            pool_idle_timeout: DEFAULT_POOL_IDLE_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_owned(),
        }
    }
}

impl EngineConfig {
    /// Overlays every field the config file sets.
    ///
    /// # Errors
    ///
    /// Returns an error when a duration field cannot be parsed.
    pub fn apply_file(&mut self, file: &ConfigFile) -> Result<(), ConfigError> {
        if let Some(value) = file.default_timeout.as_ref() {
            self.default_timeout = value.to_duration()?;
        }
        if let Some(value) = file.max_concurrency {
            self.max_concurrency = value;
        }
        if let Some(value) = file.rate_limit_per_second {
            self.rate_limit_per_second = value;
        }
        if let Some(value) = file.max_retries {
            self.max_retries = value;
        }
        if let Some(value) = file.retry_delay.as_ref() {
            self.retry_delay = value.to_duration()?;
        }
        if let Some(value) = file.max_retry_delay.as_ref() {
            self.max_retry_delay = value.to_duration()?;
        }
        if let Some(value) = file.max_response_size {
            self.max_response_size = value;
        }
        if let Some(value) = file.follow_redirects {
            self.follow_redirects = value;
        }
        if let Some(value) = file.connect_timeout.as_ref() {
            self.connect_timeout = value.to_duration()?;
        }
        if let Some(value) = file.pool_max_idle_per_host {
            self.pool_max_idle_per_host = value;
        }
        if let Some(value) = file.pool_idle_timeout.as_ref() {
            self.pool_idle_timeout = value.to_duration()?;
        }
        if let Some(value) = file.user_agent.as_ref() {
            self.user_agent.clone_from(value);
        }
        Ok(())
    }
}

/// On-disk shape of `apiprobe.toml` / `apiprobe.json`.
#[derive(Debug, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(alias = "timeout")]
    pub default_timeout: Option<DurationValue>,
    #[serde(alias = "concurrency")]
    pub max_concurrency: Option<usize>,
    #[serde(alias = "rate")]
    pub rate_limit_per_second: Option<u32>,
    #[serde(alias = "retries")]
    pub max_retries: Option<u32>,
    pub retry_delay: Option<DurationValue>,
    pub max_retry_delay: Option<DurationValue>,
    pub max_response_size: Option<usize>,
    pub follow_redirects: Option<bool>,
    pub connect_timeout: Option<DurationValue>,
    pub pool_max_idle_per_host: Option<usize>,
    pub pool_idle_timeout: Option<DurationValue>,
    pub user_agent: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DurationValue {
    Seconds(u64),
    Text(String),
}

impl DurationValue {
    /// # Errors
    ///
    /// Returns an error when a text duration cannot be parsed.
    pub fn to_duration(&self) -> Result<Duration, ConfigError> {
        match self {
            DurationValue::Seconds(secs) => Ok(Duration::from_secs(*secs)),
            DurationValue::Text(text) => parse_duration_value(text),
        }
    }
}
