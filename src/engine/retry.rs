use std::time::Duration;

use crate::config::{DEFAULT_MAX_RETRY_DELAY, DEFAULT_RETRY_DELAY, HARD_RETRY_CAP};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    Stop,
    Retry,
}

/// Decides whether an attempt outcome is worth another try.
///
/// Status zero means no response arrived; the error text is then matched
/// case-insensitively for transient transport failures. An EOF is only
/// retried after the first attempt.
#[must_use]
pub fn classify(status: u16, error: Option<&str>, attempt: u32) -> RetryDecision {
    match status {
        200..=299 => RetryDecision::Stop,
        500..=599 | 408 | 429 => RetryDecision::Retry,
        400..=499 => RetryDecision::Stop,
        0 => classify_transport(error.unwrap_or_default(), attempt),
        _ => RetryDecision::Stop,
    }
}

fn classify_transport(error: &str, attempt: u32) -> RetryDecision {
    let lowered = error.to_lowercase();
    if lowered.contains("timeout")
        || lowered.contains("connection reset")
        || lowered.contains("no such host")
    {
        return RetryDecision::Retry;
    }
    if lowered.contains("eof") && attempt == 0 {
        return RetryDecision::Retry;
    }
    RetryDecision::Stop
}

/// Exponential backoff without jitter, clamped to `max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    base: Duration,
    max: Duration,
}

impl Backoff {
    /// Zero values fall back to the defaults (1s base, 2s ceiling).
    #[must_use]
    pub const fn new(base: Duration, max: Duration) -> Self {
        Self {
            base: if base.is_zero() { DEFAULT_RETRY_DELAY } else { base },
            max: if max.is_zero() { DEFAULT_MAX_RETRY_DELAY } else { max },
        }
    }

    #[must_use]
    pub fn delay(&self, attempt: u32) -> Duration {
        let factor = 1_u32.checked_shl(attempt).unwrap_or(0);
        if factor == 0 {
            return self.max;
        }
        self.base
            .checked_mul(factor)
            .map_or(self.max, |delay| delay.min(self.max))
    }
}

/// Requested retries (or the default when zero), never above [`HARD_RETRY_CAP`].
#[must_use]
pub fn effective_retry_cap(requested: u32, default: u32) -> u32 {
    let wanted = if requested > 0 { requested } else { default };
    wanted.min(HARD_RETRY_CAP)
}
