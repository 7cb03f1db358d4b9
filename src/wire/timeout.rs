use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::parse_duration_value;

/// A timeout as sent by clients: duration text or integer nanoseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TimeoutValue {
    Nanos(u64),
    Text(String),
}

impl TimeoutValue {
    /// Zero, unparsable and absent values all resolve to `default`.
    #[must_use]
    pub fn resolve(value: Option<&Self>, default: Duration) -> Duration {
        let parsed = match value {
            Some(TimeoutValue::Nanos(nanos)) => Some(Duration::from_nanos(*nanos)),
            Some(TimeoutValue::Text(text)) => parse_timeout_text(text),
            None => None,
        };
        match parsed {
            Some(timeout) if !timeout.is_zero() => timeout,
            Some(_) | None => default,
        }
    }
}

/// Duration text must carry a unit; a bare number in a string is rejected.
pub(crate) fn parse_timeout_text(text: &str) -> Option<Duration> {
    let trimmed = text.trim();
    if trimmed.is_empty() || trimmed.chars().all(|ch| ch.is_ascii_digit()) {
        return None;
    }
    parse_duration_value(trimmed).ok()
}
