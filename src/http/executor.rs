use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, Request};
use tokio::time::{Instant, timeout_at};
use tracing::debug;

use crate::domain::{ProbeOutcome, ProbeRequest};
use crate::engine::{ProbeContext, REASON_CANCELED};
use crate::error::ProbeError;

use super::body::read_capped_body;
use super::client::HttpClients;

/// A validated request, built once and cloned for every attempt.
#[derive(Debug)]
pub struct PreparedProbe<'req> {
    probe: &'req ProbeRequest,
    request: Request,
    client: Client,
}

impl<'req> PreparedProbe<'req> {
    /// Validates method, URL and headers and builds the wire request.
    ///
    /// # Errors
    ///
    /// Returns a construction error when any part of the request is malformed.
    pub fn prepare(probe: &'req ProbeRequest, clients: &HttpClients) -> Result<Self, ProbeError> {
        let method = parse_method(&probe.method)?;
        let url = parse_url(&probe.url)?;
        let headers = build_headers(&probe.headers)?;
        let client = clients.for_request(probe.follow_redirects).clone();

        let mut builder = client.request(method, url).headers(headers);
        if let Some(body) = probe.body.as_ref() {
            builder = builder.body(body.clone());
        }
        let request = builder
            .build()
            .map_err(|source| ProbeError::BuildRequest { source })?;

        Ok(Self {
            probe,
            request,
            client,
        })
    }

    #[must_use]
    pub const fn probe(&self) -> &ProbeRequest {
        self.probe
    }

    /// Runs one attempt. Never fails: every path ends in an outcome whose
    /// `retry_count` is `attempt`.
    pub async fn execute_attempt(
        &self,
        attempt: u32,
        ctx: &ProbeContext,
        timeout: Duration,
        body_limit: usize,
    ) -> ProbeOutcome {
        let start = Instant::now();
        if let Some(reason) = ctx.cancellation_reason() {
            return ProbeOutcome::failure(
                self.probe,
                Duration::ZERO,
                &ProbeError::Cancelled { reason },
                attempt,
            );
        }

        let budget = ctx.attempt_budget(timeout);
        let deadline = start.checked_add(budget).unwrap_or(start);
        let Some(request) = self.request.try_clone() else {
            let error = ProbeError::Transport {
                detail: "request body cannot be replayed".to_owned(),
            };
            return ProbeOutcome::failure(self.probe, start.elapsed(), &error, attempt);
        };

        debug!(
            "Attempt {} for {} {} (budget {}ms)",
            attempt,
            self.request.method(),
            self.probe.url,
            budget.as_millis()
        );

        let sent = tokio::select! {
            result = timeout_at(deadline, self.client.execute(request)) => result,
            () = ctx.token().cancelled() => {
                return ProbeOutcome::failure(
                    self.probe,
                    start.elapsed(),
                    &ProbeError::Cancelled { reason: REASON_CANCELED },
                    attempt,
                );
            }
        };

        let response = match sent {
            Ok(Ok(response)) => response,
            Ok(Err(err)) => {
                let error = if err.is_timeout() {
                    ProbeError::Timeout { limit: budget }
                } else {
                    let host = self.request.url().host_str().unwrap_or_default();
                    transport_failure(&report(&err), host, &self.probe.url)
                };
                return ProbeOutcome::failure(self.probe, start.elapsed(), &error, attempt);
            }
            Err(_) => {
                let error = ProbeError::Timeout { limit: budget };
                return ProbeOutcome::failure(self.probe, start.elapsed(), &error, attempt);
            }
        };

        let status = response.status().as_u16();
        let headers = first_header_values(response.headers());

        let read = tokio::select! {
            read = timeout_at(deadline, read_capped_body(response, body_limit)) => read,
            () = ctx.token().cancelled() => {
                let error = ProbeError::Cancelled { reason: REASON_CANCELED };
                return ProbeOutcome::response(
                    self.probe,
                    status,
                    start.elapsed(),
                    Vec::new(),
                    headers,
                    Some(error.to_string()),
                    attempt,
                );
            }
        };
        let (body, body_error) = match read {
            Ok((body, None)) => (body, None),
            Ok((body, Some(err))) => {
                let error = ProbeError::BodyRead {
                    detail: report(&err),
                };
                (body, Some(error.to_string()))
            }
            Err(_) => {
                let error = ProbeError::BodyRead {
                    detail: ProbeError::Timeout { limit: budget }.to_string(),
                };
                (Vec::new(), Some(error.to_string()))
            }
        };

        ProbeOutcome::response(
            self.probe,
            status,
            start.elapsed(),
            body,
            headers,
            body_error,
            attempt,
        )
    }
}

/// Empty means GET; otherwise the token is uppercased and validated.
pub(crate) fn parse_method(method: &str) -> Result<Method, ProbeError> {
    let trimmed = method.trim();
    if trimmed.is_empty() {
        return Ok(Method::GET);
    }
    Method::from_bytes(trimmed.to_ascii_uppercase().as_bytes()).map_err(|_err| {
        ProbeError::InvalidMethod {
            method: method.to_owned(),
        }
    })
}

pub(crate) fn parse_url(raw: &str) -> Result<url::Url, ProbeError> {
    let url = url::Url::parse(raw.trim()).map_err(|source| ProbeError::InvalidUrl {
        url: raw.to_owned(),
        source,
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ProbeError::UnsupportedScheme {
            url: raw.to_owned(),
            scheme: other.to_owned(),
        }),
    }
}

fn build_headers(headers: &BTreeMap<String, String>) -> Result<HeaderMap, ProbeError> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let header_name =
            HeaderName::from_bytes(name.trim().as_bytes()).map_err(|_err| {
                ProbeError::InvalidHeaderName {
                    header: name.clone(),
                }
            })?;
        let header_value =
            HeaderValue::from_str(value).map_err(|_err| ProbeError::InvalidHeaderValue {
                header: name.clone(),
            })?;
        map.insert(header_name, header_value);
    }
    Ok(map)
}

/// Keeps the first value of each response header; non-UTF-8 values are dropped.
fn first_header_values(headers: &HeaderMap) -> BTreeMap<String, String> {
    let mut out = BTreeMap::new();
    for (name, value) in headers {
        if let Ok(text) = value.to_str() {
            out.entry(name.as_str().to_owned())
                .or_insert_with(|| text.to_owned());
        }
    }
    out
}

fn report(mut err: &(dyn std::error::Error + 'static)) -> String {
    let mut text = err.to_string();
    while let Some(source) = err.source() {
        let _ = write!(text, ": {}", source);
        err = source;
    }
    text
}

/// Maps a transport failure's cause chain to a descriptive error.
pub(crate) fn transport_failure(report: &str, host: &str, url: &str) -> ProbeError {
    let lowered = report.to_ascii_lowercase();
    if lowered.contains("dns error")
        || lowered.contains("failed to lookup address")
        || lowered.contains("name or service not known")
        || lowered.contains("no such host")
    {
        return ProbeError::NoSuchHost {
            host: host.to_owned(),
            detail: report.to_owned(),
        };
    }
    if lowered.contains("eof") || lowered.contains("connection closed before message completed") {
        return ProbeError::UnexpectedEof {
            url: url.to_owned(),
        };
    }
    ProbeError::Transport {
        detail: report.to_owned(),
    }
}
