use std::time::Duration;

use crate::domain::ProbeOutcome;

/// Aggregate over one batch's outcomes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    pub total: u64,
    pub successful: u64,
    pub failed: u64,
    pub average: Duration,
    pub min: Duration,
    pub max: Duration,
    /// Percentages; both zero for an empty batch.
    pub success_rate: f64,
    pub error_rate: f64,
}

impl Default for Summary {
    fn default() -> Self {
        Self {
            total: 0,
            successful: 0,
            failed: 0,
            average: Duration::ZERO,
            min: Duration::ZERO,
            max: Duration::ZERO,
            success_rate: 0.0,
            error_rate: 0.0,
        }
    }
}

#[must_use]
pub fn summarize(outcomes: &[ProbeOutcome]) -> Summary {
    let Some(first) = outcomes.first() else {
        return Summary::default();
    };

    let mut summary = Summary {
        min: first.elapsed(),
        max: first.elapsed(),
        ..Summary::default()
    };
    let mut elapsed_total = Duration::ZERO;
    for outcome in outcomes {
        summary.total = summary.total.saturating_add(1);
        if outcome.success() {
            summary.successful = summary.successful.saturating_add(1);
        } else {
            summary.failed = summary.failed.saturating_add(1);
        }
        let elapsed = outcome.elapsed();
        elapsed_total = elapsed_total.saturating_add(elapsed);
        summary.min = summary.min.min(elapsed);
        summary.max = summary.max.max(elapsed);
    }

    let count = u32::try_from(summary.total).unwrap_or(u32::MAX);
    summary.average = elapsed_total.checked_div(count).unwrap_or_default();
    let total = summary.total as f64;
    summary.success_rate = summary.successful as f64 / total * 100.0;
    summary.error_rate = summary.failed as f64 / total * 100.0;
    summary
}
