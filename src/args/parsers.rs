use std::time::Duration;

use apiprobe::config::parse_duration_value;
use apiprobe::error::ConfigError;

pub(crate) fn parse_header(s: &str) -> Result<(String, String), ConfigError> {
    match s.split_once(':') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_owned(), value.trim().to_owned()))
        }
        Some(_) | None => Err(ConfigError::InvalidHeaderFormat {
            value: s.to_owned(),
        }),
    }
}

pub(super) fn parse_duration_arg(s: &str) -> Result<Duration, ConfigError> {
    parse_duration_value(s)
}
