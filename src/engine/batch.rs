use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Semaphore;
use tracing::{debug, error};

use crate::domain::{BatchResult, ProbeBatch, ProbeOutcome};
use crate::error::ProbeError;
use crate::metrics::summarize;

use super::{ProbeContext, ProbeEngine};

/// Zero falls back to the configured default, and the gate always has at
/// least one slot.
pub(super) fn resolve_concurrency(requested: usize, configured: usize) -> usize {
    let limit = if requested == 0 { configured } else { requested };
    limit.clamp(1, Semaphore::MAX_PERMITS)
}

pub(super) async fn run_batch(
    engine: &ProbeEngine,
    batch: ProbeBatch,
    max_concurrency: usize,
    ctx: &ProbeContext,
) -> BatchResult {
    let start = Instant::now();
    let limit = resolve_concurrency(max_concurrency, engine.config().max_concurrency);
    let gate = Arc::new(Semaphore::new(limit));
    debug!(
        "Running batch {} with {} probes, concurrency {}",
        batch.id,
        batch.requests.len(),
        limit
    );

    let mut handles = Vec::with_capacity(batch.requests.len());
    for request in batch.requests {
        let ids = (request.id.clone(), request.endpoint_id.clone());
        let engine = engine.clone();
        let gate = gate.clone();
        let ctx = ctx.clone();
        let handle = tokio::spawn(async move {
            let slot = tokio::select! {
                slot = gate.acquire_owned() => slot,
                reason = ctx.cancelled() => {
                    let outcome = ProbeOutcome::failure(
                        &request,
                        Duration::ZERO,
                        &ProbeError::Cancelled { reason },
                        0,
                    );
                    engine.metrics().record_outcome(&outcome);
                    return outcome;
                }
            };
            let _slot = match slot {
                Ok(slot) => slot,
                Err(err) => {
                    let outcome = ProbeOutcome::failure(
                        &request,
                        Duration::ZERO,
                        &ProbeError::TaskFailed {
                            detail: err.to_string(),
                        },
                        0,
                    );
                    engine.metrics().record_outcome(&outcome);
                    return outcome;
                }
            };
            engine.execute_one(request, &ctx).await
        });
        handles.push((ids, handle));
    }

    let mut outcomes = Vec::with_capacity(handles.len());
    for ((request_id, endpoint_id), handle) in handles {
        let outcome = match handle.await {
            Ok(outcome) => outcome,
            Err(err) => {
                error!("Probe task for request {} failed: {}", request_id, err);
                let outcome = ProbeOutcome::failure_for(
                    request_id,
                    endpoint_id,
                    Duration::ZERO,
                    &ProbeError::TaskFailed {
                        detail: err.to_string(),
                    },
                    0,
                );
                engine.metrics().record_outcome(&outcome);
                outcome
            }
        };
        outcomes.push(outcome);
    }

    let summary = summarize(&outcomes);
    BatchResult {
        id: batch.id,
        outcomes,
        summary,
        duration: start.elapsed(),
    }
}
