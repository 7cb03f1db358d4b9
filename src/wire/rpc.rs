//! snake_case messages of the RPC front end. Bodies are raw bytes and
//! timestamps RFC 3339 strings.
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{BatchResult, HealthReport, ProbeBatch, ProbeOutcome, ProbeRequest, generate_id};
use crate::metrics::Summary;

use super::json::rfc3339;
use super::timeout::parse_timeout_text;
use super::{WireDefaults, duration_nanos, retries_or_default};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeRequestMessage {
    pub id: String,
    pub endpoint_id: String,
    pub method: String,
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub body: Vec<u8>,
    pub timeout: String,
    pub follow_redirects: bool,
    pub max_retries: i32,
    pub user_id: String,
    pub created_at: String,
}

impl ProbeRequestMessage {
    /// Converts the message; unparsable timeouts and timestamps fall back to
    /// the default and the current time.
    #[must_use]
    pub fn into_request(self, defaults: &WireDefaults) -> ProbeRequest {
        let timeout = parse_timeout_text(&self.timeout)
            .filter(|timeout| !timeout.is_zero())
            .unwrap_or(defaults.timeout);
        ProbeRequest {
            id: if self.id.is_empty() {
                generate_id("probe")
            } else {
                self.id
            },
            endpoint_id: self.endpoint_id,
            method: self.method,
            url: self.url,
            headers: self.headers,
            body: if self.body.is_empty() {
                None
            } else {
                Some(self.body)
            },
            timeout,
            follow_redirects: self.follow_redirects,
            max_retries: retries_or_default(i64::from(self.max_retries), defaults.max_retries),
            submitted_by: self.user_id,
            created_at: parse_created_at(&self.created_at),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchRequestMessage {
    pub id: String,
    pub requests: Vec<ProbeRequestMessage>,
    pub user_id: String,
}

impl BatchRequestMessage {
    #[must_use]
    pub fn into_batch(self, defaults: &WireDefaults) -> ProbeBatch {
        ProbeBatch {
            id: if self.id.is_empty() {
                generate_id("batch")
            } else {
                self.id
            },
            requests: self
                .requests
                .into_iter()
                .map(|message| message.into_request(defaults))
                .collect(),
            submitted_by: self.user_id,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeOutcomeMessage {
    pub id: String,
    pub test_request_id: String,
    pub endpoint_id: String,
    pub status_code: i32,
    pub response_time_nanos: i64,
    pub response_body: Vec<u8>,
    pub response_headers: BTreeMap<String, String>,
    pub error: String,
    pub success: bool,
    pub timestamp: String,
    pub retry_count: i32,
}

impl From<&ProbeOutcome> for ProbeOutcomeMessage {
    fn from(outcome: &ProbeOutcome) -> Self {
        Self {
            id: outcome.id().to_owned(),
            test_request_id: outcome.request_id().to_owned(),
            endpoint_id: outcome.endpoint_id().to_owned(),
            status_code: i32::from(outcome.status_code()),
            response_time_nanos: signed_nanos(duration_nanos(outcome.elapsed())),
            response_body: outcome.body().to_vec(),
            response_headers: outcome.headers().clone(),
            error: outcome.error().unwrap_or_default().to_owned(),
            success: outcome.success(),
            timestamp: rfc3339(outcome.completed_at()),
            retry_count: i32::try_from(outcome.retry_count()).unwrap_or(i32::MAX),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryMessage {
    pub total_tests: i32,
    pub successful: i32,
    pub failed: i32,
    pub average_time_nanos: i64,
    pub min_time_nanos: i64,
    pub max_time_nanos: i64,
    pub success_rate: f64,
    pub error_rate: f64,
}

impl From<&Summary> for SummaryMessage {
    fn from(summary: &Summary) -> Self {
        Self {
            total_tests: count_i32(summary.total),
            successful: count_i32(summary.successful),
            failed: count_i32(summary.failed),
            average_time_nanos: signed_nanos(duration_nanos(summary.average)),
            min_time_nanos: signed_nanos(duration_nanos(summary.min)),
            max_time_nanos: signed_nanos(duration_nanos(summary.max)),
            success_rate: summary.success_rate,
            error_rate: summary.error_rate,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchResultMessage {
    pub id: String,
    pub results: Vec<ProbeOutcomeMessage>,
    pub summary: SummaryMessage,
    pub duration_nanos: i64,
}

impl From<&BatchResult> for BatchResultMessage {
    fn from(result: &BatchResult) -> Self {
        Self {
            id: result.id.clone(),
            results: result.outcomes.iter().map(ProbeOutcomeMessage::from).collect(),
            summary: SummaryMessage::from(&result.summary),
            duration_nanos: signed_nanos(duration_nanos(result.duration)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthMessage {
    pub status: String,
    pub version: String,
    pub uptime_seconds: i64,
    pub metrics: BTreeMap<String, i64>,
    pub timestamp: String,
}

impl From<&HealthReport> for HealthMessage {
    fn from(report: &HealthReport) -> Self {
        Self {
            status: report.status.to_owned(),
            version: report.version.to_owned(),
            uptime_seconds: i64::try_from(report.uptime.as_secs()).unwrap_or(i64::MAX),
            metrics: report
                .metrics
                .iter()
                .map(|(key, value)| ((*key).to_owned(), *value))
                .collect(),
            timestamp: rfc3339(report.timestamp),
        }
    }
}

fn parse_created_at(value: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value.trim())
        .map(|parsed| parsed.with_timezone(&Utc))
        .unwrap_or_else(|_err| Utc::now())
}

fn signed_nanos(nanos: u64) -> i64 {
    i64::try_from(nanos).unwrap_or(i64::MAX)
}

fn count_i32(count: u64) -> i32 {
    i32::try_from(count).unwrap_or(i32::MAX)
}
