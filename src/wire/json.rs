//! camelCase JSON documents of the HTTP front end. Bodies travel as base64.
use std::collections::BTreeMap;

use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{BatchResult, HealthReport, ProbeBatch, ProbeOutcome, ProbeRequest, generate_id};
use crate::error::WireError;
use crate::metrics::Summary;

use super::{TimeoutValue, WireDefaults, duration_nanos, retries_or_default};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProbeRequestPayload {
    pub id: String,
    pub endpoint_id: String,
    pub method: String,
    pub url: String,
    pub headers: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<TimeoutValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub follow_redirects: Option<bool>,
    pub max_retries: i64,
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl ProbeRequestPayload {
    /// Converts the payload, filling generated ids and engine defaults.
    ///
    /// # Errors
    ///
    /// Returns an error when the body is not valid base64.
    pub fn into_request(self, defaults: &WireDefaults) -> Result<ProbeRequest, WireError> {
        let id = if self.id.is_empty() {
            generate_id("probe")
        } else {
            self.id
        };
        let body = match self.body.as_deref() {
            Some(encoded) if !encoded.is_empty() => {
                Some(B64.decode(encoded).map_err(|source| WireError::InvalidBody {
                    id: id.clone(),
                    source,
                })?)
            }
            Some(_) | None => None,
        };
        Ok(ProbeRequest {
            id,
            endpoint_id: self.endpoint_id,
            method: self.method,
            url: self.url,
            headers: self.headers,
            body,
            timeout: TimeoutValue::resolve(self.timeout.as_ref(), defaults.timeout),
            follow_redirects: self.follow_redirects.unwrap_or(defaults.follow_redirects),
            max_retries: retries_or_default(self.max_retries, defaults.max_retries),
            submitted_by: self.user_id,
            created_at: self.created_at.unwrap_or_else(Utc::now),
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BatchRequestPayload {
    pub id: String,
    pub requests: Vec<ProbeRequestPayload>,
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl BatchRequestPayload {
    /// # Errors
    ///
    /// Returns an error when any request body is not valid base64.
    pub fn into_batch(self, defaults: &WireDefaults) -> Result<ProbeBatch, WireError> {
        let requests = self
            .requests
            .into_iter()
            .map(|payload| payload.into_request(defaults))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ProbeBatch {
            id: if self.id.is_empty() {
                generate_id("batch")
            } else {
                self.id
            },
            requests,
            submitted_by: self.user_id,
            created_at: self.created_at.unwrap_or_else(Utc::now),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeOutcomePayload {
    pub id: String,
    pub test_request_id: String,
    pub endpoint_id: String,
    pub status_code: u16,
    /// Nanoseconds.
    pub response_time: u64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub response_body: String,
    pub response_headers: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub error: String,
    pub success: bool,
    pub timestamp: String,
    pub retry_count: u32,
}

impl From<&ProbeOutcome> for ProbeOutcomePayload {
    fn from(outcome: &ProbeOutcome) -> Self {
        Self {
            id: outcome.id().to_owned(),
            test_request_id: outcome.request_id().to_owned(),
            endpoint_id: outcome.endpoint_id().to_owned(),
            status_code: outcome.status_code(),
            response_time: duration_nanos(outcome.elapsed()),
            response_body: if outcome.body().is_empty() {
                String::new()
            } else {
                B64.encode(outcome.body())
            },
            response_headers: outcome.headers().clone(),
            error: outcome.error().unwrap_or_default().to_owned(),
            success: outcome.success(),
            timestamp: rfc3339(outcome.completed_at()),
            retry_count: outcome.retry_count(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryPayload {
    pub total_tests: u64,
    pub successful: u64,
    pub failed: u64,
    pub average_time: u64,
    pub min_time: u64,
    pub max_time: u64,
    pub success_rate: f64,
    pub error_rate: f64,
}

impl From<&Summary> for SummaryPayload {
    fn from(summary: &Summary) -> Self {
        Self {
            total_tests: summary.total,
            successful: summary.successful,
            failed: summary.failed,
            average_time: duration_nanos(summary.average),
            min_time: duration_nanos(summary.min),
            max_time: duration_nanos(summary.max),
            success_rate: summary.success_rate,
            error_rate: summary.error_rate,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchResultPayload {
    pub id: String,
    pub results: Vec<ProbeOutcomePayload>,
    pub summary: SummaryPayload,
    /// Nanoseconds.
    pub duration: u64,
}

impl From<&BatchResult> for BatchResultPayload {
    fn from(result: &BatchResult) -> Self {
        Self {
            id: result.id.clone(),
            results: result.outcomes.iter().map(ProbeOutcomePayload::from).collect(),
            summary: SummaryPayload::from(&result.summary),
            duration: duration_nanos(result.duration),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthPayload {
    pub status: String,
    pub version: String,
    /// Nanoseconds.
    pub uptime: u64,
    pub metrics: BTreeMap<String, i64>,
    pub timestamp: String,
}

impl From<&HealthReport> for HealthPayload {
    fn from(report: &HealthReport) -> Self {
        Self {
            status: report.status.to_owned(),
            version: report.version.to_owned(),
            uptime: duration_nanos(report.uptime),
            metrics: report
                .metrics
                .iter()
                .map(|(key, value)| ((*key).to_owned(), *value))
                .collect(),
            timestamp: rfc3339(report.timestamp),
        }
    }
}

pub(crate) fn rfc3339(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Secs, true)
}
