//! The probe engine: admission, retries, batches and statistics.
mod batch;
mod context;
pub mod retry;
mod runner;


use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::domain::{BatchResult, HealthReport, ProbeBatch, ProbeOutcome, ProbeRequest};
use crate::error::{AppResult, ProbeError};
use crate::http::{Acquire, HttpClients, PreparedProbe, RateLimiter};
use crate::metrics::MetricsRegistry;

pub use context::ProbeContext;
pub(crate) use context::REASON_CANCELED;
pub use retry::{Backoff, RetryDecision, classify, effective_retry_cap};
use runner::{RetryPlan, run_with_retries};

/// Executes probes against a shared rate limit and records every terminal
/// outcome. Cheap to clone; clones share all state.
#[derive(Debug, Clone)]
pub struct ProbeEngine {
    inner: Arc<EngineInner>,
}

#[derive(Debug)]
struct EngineInner {
    config: EngineConfig,
    clients: HttpClients,
    rate_limiter: RateLimiter,
    metrics: Arc<MetricsRegistry>,
    started_at: Instant,
}

impl ProbeEngine {
    /// Builds the engine and starts its rate limiter on the current runtime.
    ///
    /// # Errors
    ///
    /// Returns an error when called outside a Tokio runtime or when the HTTP
    /// clients cannot be built.
    pub fn new(config: EngineConfig) -> AppResult<Self> {
        let _runtime = tokio::runtime::Handle::try_current()?;
        let clients = HttpClients::new(&config)?;
        let rate_limiter = RateLimiter::new(config.rate_limit_per_second);
        debug!(
            "Probe engine ready: {} req/s, concurrency {}, retries {}",
            rate_limiter.rate(),
            config.max_concurrency,
            config.max_retries
        );
        Ok(Self {
            inner: Arc::new(EngineInner {
                config,
                clients,
                rate_limiter,
                metrics: Arc::new(MetricsRegistry::new()),
                started_at: Instant::now(),
            }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn metrics(&self) -> Arc<MetricsRegistry> {
        self.inner.metrics.clone()
    }

    /// Runs one probe to completion. Never fails; errors are carried in the
    /// outcome, which is also recorded in the metrics.
    pub async fn execute_one(&self, request: ProbeRequest, ctx: &ProbeContext) -> ProbeOutcome {
        let outcome = self.inner.probe(request, ctx).await;
        self.inner.metrics.record_outcome(&outcome);
        outcome
    }

    /// Runs every request of the batch with at most `max_concurrency` in
    /// flight (zero means the configured default). Outcomes keep input order.
    pub async fn execute_batch(
        &self,
        batch: ProbeBatch,
        max_concurrency: usize,
        ctx: &ProbeContext,
    ) -> BatchResult {
        batch::run_batch(self, batch, max_concurrency, ctx).await
    }

    #[must_use]
    pub fn metrics_snapshot(&self) -> BTreeMap<&'static str, i64> {
        self.inner.metrics.snapshot().to_map()
    }

    pub fn reset_metrics(&self) {
        self.inner.metrics.reset();
    }

    #[must_use]
    pub fn uptime(&self) -> Duration {
        self.inner.started_at.elapsed()
    }

    #[must_use]
    pub fn health(&self) -> HealthReport {
        HealthReport {
            status: "healthy",
            version: env!("CARGO_PKG_VERSION"),
            uptime: self.uptime(),
            metrics: self.metrics_snapshot(),
            timestamp: Utc::now(),
        }
    }

    /// Stops the rate limiter. Probes admitted afterwards run unthrottled.
    pub fn shutdown(&self) {
        self.inner.rate_limiter.shutdown();
    }
}

impl EngineInner {
    async fn probe(&self, mut request: ProbeRequest, ctx: &ProbeContext) -> ProbeOutcome {
        if request.timeout.is_zero() {
            request.timeout = self.config.default_timeout;
        }

        let admitted = tokio::select! {
            acquired = self.rate_limiter.acquire() => acquired,
            reason = ctx.cancelled() => {
                let error = ProbeError::Cancelled { reason };
                return ProbeOutcome::failure(&request, Duration::ZERO, &error, 0);
            }
        };
        if admitted == Acquire::Closed {
            warn!(
                "Rate limiter closed; probe {} proceeds without a token",
                request.id
            );
        }

        let prepared = match PreparedProbe::prepare(&request, &self.clients) {
            Ok(prepared) => prepared,
            Err(err) => {
                if err.is_construction() {
                    debug!("Probe {} rejected: {}", request.id, err);
                } else {
                    warn!("Probe {} could not be prepared: {}", request.id, err);
                }
                return ProbeOutcome::failure(&request, Duration::ZERO, &err, 0);
            }
        };
        let plan = RetryPlan {
            max_retries: effective_retry_cap(request.max_retries, self.config.max_retries),
            backoff: Backoff::new(self.config.retry_delay, self.config.max_retry_delay),
            timeout: request.timeout,
            body_limit: self.config.max_response_size,
        };
        run_with_retries(&prepared, plan, ctx).await
    }
}
