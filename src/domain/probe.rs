use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::error::ProbeError;

use super::generate_id;

/// Returns true for statuses in `[200, 300)`.
#[must_use]
pub const fn is_success_status(status: u16) -> bool {
    status >= 200 && status < 300
}

/// Description of one API call to probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeRequest {
    pub id: String,
    pub endpoint_id: String,
    /// Kept as text so malformed methods surface as a failed outcome.
    pub method: String,
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub body: Option<Vec<u8>>,
    /// Zero means "use the engine default".
    pub timeout: Duration,
    pub follow_redirects: bool,
    /// Zero means "use the engine default".
    pub max_retries: u32,
    pub submitted_by: String,
    pub created_at: DateTime<Utc>,
}

impl ProbeRequest {
    #[must_use]
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: generate_id("probe"),
            endpoint_id: String::new(),
            method: method.into(),
            url: url.into(),
            headers: BTreeMap::new(),
            body: None,
            timeout: Duration::ZERO,
            follow_redirects: true,
            max_retries: 0,
            submitted_by: String::new(),
            created_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn with_endpoint_id(mut self, endpoint_id: impl Into<String>) -> Self {
        self.endpoint_id = endpoint_id.into();
        self
    }

    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub const fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    #[must_use]
    pub const fn with_follow_redirects(mut self, follow_redirects: bool) -> Self {
        self.follow_redirects = follow_redirects;
        self
    }
}

/// Immutable result of a probe: the last attempt of its retry sequence.
///
/// `success` is derived from the status code and cannot disagree with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOutcome {
    id: String,
    request_id: String,
    endpoint_id: String,
    status_code: u16,
    elapsed: Duration,
    body: Vec<u8>,
    headers: BTreeMap<String, String>,
    error: Option<String>,
    success: bool,
    completed_at: DateTime<Utc>,
    retry_count: u32,
}

impl ProbeOutcome {
    /// Outcome for an attempt that received a response. `error` carries a body
    /// read failure, if any; it does not affect `success`.
    #[must_use]
    pub fn response(
        request: &ProbeRequest,
        status_code: u16,
        elapsed: Duration,
        body: Vec<u8>,
        headers: BTreeMap<String, String>,
        error: Option<String>,
        retry_count: u32,
    ) -> Self {
        Self {
            id: generate_id("outcome"),
            request_id: request.id.clone(),
            endpoint_id: request.endpoint_id.clone(),
            status_code,
            elapsed,
            body,
            headers,
            error,
            success: is_success_status(status_code),
            completed_at: Utc::now(),
            retry_count,
        }
    }

    /// Outcome for an attempt that never received a response.
    #[must_use]
    pub fn failure(
        request: &ProbeRequest,
        elapsed: Duration,
        error: &ProbeError,
        retry_count: u32,
    ) -> Self {
        Self::failure_for(
            request.id.clone(),
            request.endpoint_id.clone(),
            elapsed,
            error,
            retry_count,
        )
    }

    /// Like [`ProbeOutcome::failure`] when only the request's identifiers survive.
    #[must_use]
    pub fn failure_for(
        request_id: String,
        endpoint_id: String,
        elapsed: Duration,
        error: &ProbeError,
        retry_count: u32,
    ) -> Self {
        Self {
            id: generate_id("outcome"),
            request_id,
            endpoint_id,
            status_code: 0,
            elapsed,
            body: Vec::new(),
            headers: BTreeMap::new(),
            error: Some(error.to_string()),
            success: false,
            completed_at: Utc::now(),
            retry_count,
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    #[must_use]
    pub fn endpoint_id(&self) -> &str {
        &self.endpoint_id
    }

    /// Zero when no response was received.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        self.status_code
    }

    #[must_use]
    pub const fn elapsed(&self) -> Duration {
        self.elapsed
    }

    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    #[must_use]
    pub const fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    #[must_use]
    pub const fn success(&self) -> bool {
        self.success
    }

    #[must_use]
    pub const fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }

    #[must_use]
    pub const fn retry_count(&self) -> u32 {
        self.retry_count
    }
}
