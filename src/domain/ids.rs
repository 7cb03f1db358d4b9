use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;

static ID_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Generates a process-unique identifier such as `probe_1718000000000000000_7`.
#[must_use]
pub fn generate_id(prefix: &str) -> String {
    let nanos = Utc::now().timestamp_nanos_opt().unwrap_or_default();
    let seq = ID_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    format!("{}_{}_{}", prefix, nanos, seq)
}
