use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};
use std::time::{Duration, Instant};

use crate::domain::ProbeOutcome;

pub const KEY_TOTAL_TESTS: &str = "total_tests";
pub const KEY_SUCCESSFUL_TESTS: &str = "successful_tests";
pub const KEY_FAILED_TESTS: &str = "failed_tests";
pub const KEY_SUCCESS_RATE: &str = "success_rate";
pub const KEY_AVG_RESPONSE_TIME: &str = "avg_response_time";
pub const KEY_MIN_RESPONSE_TIME: &str = "min_response_time";
pub const KEY_MAX_RESPONSE_TIME: &str = "max_response_time";
pub const KEY_UPTIME_SECONDS: &str = "uptime_seconds";

#[derive(Debug)]
struct RegistryState {
    total_tests: u64,
    successful_tests: u64,
    failed_tests: u64,
    total_response_time: Duration,
    min_response_time: Duration,
    max_response_time: Duration,
    started_at: Instant,
}

impl RegistryState {
    fn new() -> Self {
        Self {
            total_tests: 0,
            successful_tests: 0,
            failed_tests: 0,
            total_response_time: Duration::ZERO,
            min_response_time: Duration::ZERO,
            max_response_time: Duration::ZERO,
            started_at: Instant::now(),
        }
    }
}

/// Point-in-time copy of the registry. Durations are in nanoseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub total_tests: i64,
    pub successful_tests: i64,
    pub failed_tests: i64,
    /// Integer percentage of successful outcomes.
    pub success_rate: i64,
    pub avg_response_time: i64,
    pub min_response_time: i64,
    pub max_response_time: i64,
    pub uptime_seconds: i64,
}

impl MetricsSnapshot {
    #[must_use]
    pub fn to_map(&self) -> BTreeMap<&'static str, i64> {
        BTreeMap::from([
            (KEY_TOTAL_TESTS, self.total_tests),
            (KEY_SUCCESSFUL_TESTS, self.successful_tests),
            (KEY_FAILED_TESTS, self.failed_tests),
            (KEY_SUCCESS_RATE, self.success_rate),
            (KEY_AVG_RESPONSE_TIME, self.avg_response_time),
            (KEY_MIN_RESPONSE_TIME, self.min_response_time),
            (KEY_MAX_RESPONSE_TIME, self.max_response_time),
            (KEY_UPTIME_SECONDS, self.uptime_seconds),
        ])
    }
}

/// Engine-wide running statistics over every recorded outcome.
#[derive(Debug)]
pub struct MetricsRegistry {
    state: RwLock<RegistryState>,
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: RwLock::new(RegistryState::new()),
        }
    }

    pub fn record_outcome(&self, outcome: &ProbeOutcome) {
        let elapsed = outcome.elapsed();
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let first = state.total_tests == 0;
        state.total_tests = state.total_tests.saturating_add(1);
        if outcome.success() {
            state.successful_tests = state.successful_tests.saturating_add(1);
        } else {
            state.failed_tests = state.failed_tests.saturating_add(1);
        }
        state.total_response_time = state.total_response_time.saturating_add(elapsed);
        if first || elapsed < state.min_response_time {
            state.min_response_time = elapsed;
        }
        if first || elapsed > state.max_response_time {
            state.max_response_time = elapsed;
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        let total = state.total_tests;
        let average = if total == 0 {
            0
        } else {
            state
                .total_response_time
                .as_nanos()
                .checked_div(u128::from(total))
                .unwrap_or(0)
        };
        let success_rate = state
            .successful_tests
            .saturating_mul(100)
            .checked_div(total)
            .unwrap_or(0);
        MetricsSnapshot {
            total_tests: to_i64(u128::from(total)),
            successful_tests: to_i64(u128::from(state.successful_tests)),
            failed_tests: to_i64(u128::from(state.failed_tests)),
            success_rate: to_i64(u128::from(success_rate)),
            avg_response_time: to_i64(average),
            min_response_time: to_i64(state.min_response_time.as_nanos()),
            max_response_time: to_i64(state.max_response_time.as_nanos()),
            uptime_seconds: to_i64(u128::from(state.started_at.elapsed().as_secs())),
        }
    }

    /// Clears every counter and restarts the uptime clock.
    pub fn reset(&self) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        *state = RegistryState::new();
    }
}

fn to_i64(value: u128) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}
