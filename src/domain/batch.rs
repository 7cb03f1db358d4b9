use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::metrics::Summary;

use super::{ProbeOutcome, ProbeRequest, generate_id};

/// An ordered set of probes submitted together.
#[derive(Debug, Clone)]
pub struct ProbeBatch {
    pub id: String,
    pub requests: Vec<ProbeRequest>,
    pub submitted_by: String,
    pub created_at: DateTime<Utc>,
}

impl ProbeBatch {
    #[must_use]
    pub fn new(requests: Vec<ProbeRequest>) -> Self {
        Self {
            id: generate_id("batch"),
            requests,
            submitted_by: String::new(),
            created_at: Utc::now(),
        }
    }
}

/// Outcomes of a batch, positionally aligned with the submitted requests.
#[derive(Debug, Clone)]
pub struct BatchResult {
    pub id: String,
    pub outcomes: Vec<ProbeOutcome>,
    pub summary: Summary,
    pub duration: Duration,
}
