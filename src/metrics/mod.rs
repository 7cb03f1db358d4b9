//! Engine-wide running statistics and per-batch summaries.
mod registry;
mod summary;


pub use registry::{
    KEY_AVG_RESPONSE_TIME, KEY_FAILED_TESTS, KEY_MAX_RESPONSE_TIME, KEY_MIN_RESPONSE_TIME,
    KEY_SUCCESS_RATE, KEY_SUCCESSFUL_TESTS, KEY_TOTAL_TESTS, KEY_UPTIME_SECONDS, MetricsRegistry,
    MetricsSnapshot,
};
pub use summary::{Summary, summarize};
