use std::time::Duration;

use crate::error::ConfigError;

use super::parse_duration_value;
use super::types::EngineConfig;

pub(super) const ENV_DEFAULT_TIMEOUT: &str = "APIPROBE_DEFAULT_TIMEOUT";
pub(super) const ENV_MAX_CONCURRENCY: &str = "APIPROBE_MAX_CONCURRENCY";
pub(super) const ENV_RATE_LIMIT: &str = "APIPROBE_RATE_LIMIT";
pub(super) const ENV_MAX_RETRIES: &str = "APIPROBE_MAX_RETRIES";
pub(super) const ENV_RETRY_DELAY: &str = "APIPROBE_RETRY_DELAY";
pub(super) const ENV_MAX_RETRY_DELAY: &str = "APIPROBE_MAX_RETRY_DELAY";
pub(super) const ENV_MAX_RESPONSE_SIZE: &str = "APIPROBE_MAX_RESPONSE_SIZE";
pub(super) const ENV_FOLLOW_REDIRECTS: &str = "APIPROBE_FOLLOW_REDIRECTS";

/// Applies `APIPROBE_*` overrides on top of `config`.
///
/// `lookup` resolves a variable name to its value; empty values are ignored.
///
/// # Errors
///
/// Returns an error when a set variable cannot be parsed.
pub fn apply_env_overrides<F>(config: &mut EngineConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let read = |key: &'static str| lookup(key).filter(|value| !value.trim().is_empty());

    if let Some(value) = read(ENV_DEFAULT_TIMEOUT) {
        config.default_timeout = env_duration(ENV_DEFAULT_TIMEOUT, &value)?;
    }
    if let Some(value) = read(ENV_MAX_CONCURRENCY) {
        config.max_concurrency = env_number(ENV_MAX_CONCURRENCY, &value)?;
    }
    if let Some(value) = read(ENV_RATE_LIMIT) {
        config.rate_limit_per_second = env_number(ENV_RATE_LIMIT, &value)?;
    }
    if let Some(value) = read(ENV_MAX_RETRIES) {
        config.max_retries = env_number(ENV_MAX_RETRIES, &value)?;
    }
    if let Some(value) = read(ENV_RETRY_DELAY) {
        config.retry_delay = env_duration(ENV_RETRY_DELAY, &value)?;
    }
    if let Some(value) = read(ENV_MAX_RETRY_DELAY) {
        config.max_retry_delay = env_duration(ENV_MAX_RETRY_DELAY, &value)?;
    }
    if let Some(value) = read(ENV_MAX_RESPONSE_SIZE) {
        config.max_response_size = env_number(ENV_MAX_RESPONSE_SIZE, &value)?;
    }
    if let Some(value) = read(ENV_FOLLOW_REDIRECTS) {
        config.follow_redirects = env_bool(ENV_FOLLOW_REDIRECTS, &value)?;
    }
    Ok(())
}

fn env_duration(key: &'static str, value: &str) -> Result<Duration, ConfigError> {
    parse_duration_value(value).map_err(|err| ConfigError::InvalidEnvValue {
        key,
        value: value.to_owned(),
        reason: err.to_string(),
    })
}

fn env_number<T>(key: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse::<T>()
        .map_err(|err| ConfigError::InvalidEnvValue {
            key,
            value: value.to_owned(),
            reason: err.to_string(),
        })
}

fn env_bool(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "on" => Ok(true),
        "0" | "false" | "no" | "n" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidEnvValue {
            key,
            value: value.to_owned(),
            reason: "expected a boolean".to_owned(),
        }),
    }
}
