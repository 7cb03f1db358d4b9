//! Field-for-field shapes exchanged with the HTTP (JSON) and RPC front ends.
pub mod json;
pub mod rpc;
mod timeout;


use std::time::Duration;

use crate::config::EngineConfig;

pub use timeout::TimeoutValue;

/// Engine defaults applied while converting inbound payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WireDefaults {
    pub timeout: Duration,
    pub max_retries: u32,
    pub follow_redirects: bool,
}

impl From<&EngineConfig> for WireDefaults {
    fn from(config: &EngineConfig) -> Self {
        Self {
            timeout: config.default_timeout,
            max_retries: config.max_retries,
            follow_redirects: config.follow_redirects,
        }
    }
}

pub(crate) fn duration_nanos(duration: Duration) -> u64 {
    u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX)
}

/// Positive counts are kept; zero or negative means "use the default".
pub(crate) fn retries_or_default(value: i64, default: u32) -> u32 {
    if value <= 0 {
        return default;
    }
    u32::try_from(value).unwrap_or(u32::MAX)
}
