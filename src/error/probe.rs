use std::time::Duration;

use thiserror::Error;

/// Failure modes of a single probe attempt. These never escape the engine;
/// they are rendered into the outcome's error text.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("Invalid HTTP method '{method}'.")]
    InvalidMethod { method: String },
    #[error("Invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("Unsupported URL scheme '{scheme}' in '{url}'.")]
    UnsupportedScheme { url: String, scheme: String },
    #[error("Invalid header name '{header}'.")]
    InvalidHeaderName { header: String },
    #[error("Invalid value for header '{header}'.")]
    InvalidHeaderValue { header: String },
    #[error("Failed to build request: {source}")]
    BuildRequest {
        #[source]
        source: reqwest::Error,
    },
    #[error("Request timeout: no response within {}ms", .limit.as_millis())]
    Timeout { limit: Duration },
    #[error("Connection closed unexpectedly (EOF) while requesting {url}; the server dropped the connection before responding.")]
    UnexpectedEof { url: String },
    #[error("Lookup failed, no such host '{host}': {detail}")]
    NoSuchHost { host: String, detail: String },
    #[error("{detail}")]
    Transport { detail: String },
    #[error("Failed to read response body: {detail}")]
    BodyRead { detail: String },
    #[error("Request cancelled: {reason}")]
    Cancelled { reason: &'static str },
    #[error("Probe task failed: {detail}")]
    TaskFailed { detail: String },
}

impl ProbeError {
    /// Construction failures are terminal: the request never reaches the wire.
    #[must_use]
    pub const fn is_construction(&self) -> bool {
        matches!(
            self,
            ProbeError::InvalidMethod { .. }
                | ProbeError::InvalidUrl { .. }
                | ProbeError::UnsupportedScheme { .. }
                | ProbeError::InvalidHeaderName { .. }
                | ProbeError::InvalidHeaderValue { .. }
                | ProbeError::BuildRequest { .. }
        )
    }
}
