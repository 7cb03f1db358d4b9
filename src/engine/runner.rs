use std::time::Duration;

use tracing::{debug, warn};

use crate::domain::ProbeOutcome;
use crate::http::PreparedProbe;

use super::ProbeContext;
use super::retry::{Backoff, RetryDecision, classify};

/// Limits for one probe's retry sequence.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RetryPlan {
    pub(crate) max_retries: u32,
    pub(crate) backoff: Backoff,
    pub(crate) timeout: Duration,
    pub(crate) body_limit: usize,
}

/// Runs attempts until one succeeds, the classifier gives up, the cap is
/// reached, or the context ends. Always returns the most recent outcome.
pub(crate) async fn run_with_retries(
    prepared: &PreparedProbe<'_>,
    plan: RetryPlan,
    ctx: &ProbeContext,
) -> ProbeOutcome {
    let mut attempt: u32 = 0;
    loop {
        let outcome = prepared
            .execute_attempt(attempt, ctx, plan.timeout, plan.body_limit)
            .await;
        if outcome.success() {
            return outcome;
        }

        let decision = classify(outcome.status_code(), outcome.error(), attempt);
        if decision == RetryDecision::Stop || attempt >= plan.max_retries {
            debug!(
                "Probe {} finished after {} retries (status {})",
                prepared.probe().id,
                attempt,
                outcome.status_code()
            );
            return outcome;
        }
        if let Some(reason) = ctx.cancellation_reason() {
            debug!("Probe {} not retried: {}", prepared.probe().id, reason);
            return outcome;
        }

        let delay = plan.backoff.delay(attempt);
        warn!(
            "Retrying probe {} in {}ms (attempt {}, status {}, error: {})",
            prepared.probe().id,
            delay.as_millis(),
            attempt.saturating_add(1),
            outcome.status_code(),
            outcome.error().unwrap_or("none")
        );
        tokio::select! {
            () = tokio::time::sleep(delay) => {}
            reason = ctx.cancelled() => {
                debug!("Backoff for probe {} interrupted: {}", prepared.probe().id, reason);
                return outcome;
            }
        }
        attempt = attempt.saturating_add(1);
    }
}
