use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};

/// Liveness report for front ends' health endpoints.
#[derive(Debug, Clone)]
pub struct HealthReport {
    pub status: &'static str,
    pub version: &'static str,
    pub uptime: Duration,
    pub metrics: BTreeMap<&'static str, i64>,
    pub timestamp: DateTime<Utc>,
}
