use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::config::DEFAULT_RATE_LIMIT_PER_SECOND;

const MIN_REFILL_PERIOD: Duration = Duration::from_millis(1);
const NANOS_PER_SECOND: u64 = 1_000_000_000;

/// Result of waiting for a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acquire {
    Granted,
    /// The limiter was shut down; no token was issued.
    Closed,
}

/// Process-wide token bucket shared by every probe.
///
/// Starts full with `rate` tokens; a background task adds tokens at a steady
/// pace and never past capacity. Waiters are served in FIFO order.
#[derive(Debug)]
pub struct RateLimiter {
    permits: Arc<Semaphore>,
    rate: u32,
    shutdown: CancellationToken,
}

impl RateLimiter {
    /// Creates a limiter and spawns its refill task on the current runtime.
    /// A rate of zero falls back to the default.
    ///
    /// # Panics
    ///
    /// Panics when called outside a Tokio runtime.
    #[must_use]
    pub fn new(rate_per_second: u32) -> Self {
        let rate = if rate_per_second == 0 {
            DEFAULT_RATE_LIMIT_PER_SECOND
        } else {
            rate_per_second
        };
        let capacity = usize::try_from(rate)
            .unwrap_or(usize::MAX)
            .min(Semaphore::MAX_PERMITS);
        let permits = Arc::new(Semaphore::new(capacity));
        let shutdown = CancellationToken::new();
        spawn_refill(permits.clone(), shutdown.clone(), rate, capacity);
        Self {
            permits,
            rate,
            shutdown,
        }
    }

    /// Waits for a token. Cancellation is the caller's concern: race this
    /// future against the probe context.
    pub async fn acquire(&self) -> Acquire {
        match self.permits.acquire().await {
            Ok(permit) => {
                permit.forget();
                Acquire::Granted
            }
            Err(_) => Acquire::Closed,
        }
    }

    #[must_use]
    pub const fn rate(&self) -> u32 {
        self.rate
    }

    #[must_use]
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.permits.is_closed()
    }

    /// Stops the refill task and wakes every waiter with [`Acquire::Closed`].
    pub fn shutdown(&self) {
        if !self.shutdown.is_cancelled() {
            debug!("Shutting down rate limiter ({} req/s)", self.rate);
        }
        self.shutdown.cancel();
        self.permits.close();
    }
}

impl Drop for RateLimiter {
    fn drop(&mut self) {
        self.shutdown();
    }
}

pub(super) fn refill_period(rate: u32) -> Duration {
    let period_nanos = NANOS_PER_SECOND
        .checked_div(u64::from(rate.max(1)))
        .unwrap_or(NANOS_PER_SECOND);
    Duration::from_nanos(period_nanos).max(MIN_REFILL_PERIOD)
}

/// Tracks how many tokens the refill task owes since it started.
///
/// Tokens are derived from elapsed time rather than counted per tick, so a
/// floored tick period or a late tick never loses the fractional share.
#[derive(Debug, Clone, Copy)]
pub(super) struct RefillLedger {
    rate: u128,
    issued: u128,
}

impl RefillLedger {
    pub(super) fn new(rate: u32) -> Self {
        Self {
            rate: u128::from(rate),
            issued: 0,
        }
    }

    /// Returns the tokens earned between the previous call and `elapsed`.
    pub(super) fn owed(&mut self, elapsed: Duration) -> usize {
        let earned = elapsed
            .as_nanos()
            .checked_mul(self.rate)
            .and_then(|scaled| scaled.checked_div(u128::from(NANOS_PER_SECOND)))
            .unwrap_or(u128::MAX);
        let due = earned.saturating_sub(self.issued);
        self.issued = earned.max(self.issued);
        usize::try_from(due).unwrap_or(usize::MAX)
    }
}

fn spawn_refill(limiter: Arc<Semaphore>, shutdown: CancellationToken, rate: u32, capacity: usize) {
    let period = refill_period(rate);
    tokio::spawn(async move {
        let origin = Instant::now();
        let start = origin.checked_add(period).unwrap_or(origin);
        let mut refill_tick = interval_at(start, period);
        refill_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut ledger = RefillLedger::new(rate);
        loop {
            tokio::select! {
                () = shutdown.cancelled() => break,
                _ = refill_tick.tick() => {}
            }
            if limiter.is_closed() {
                break;
            }
            // Tokens that would overflow the bucket are discarded.
            let due = ledger.owed(origin.elapsed());
            let available = limiter.available_permits();
            if due > 0 && available < capacity {
                limiter.add_permits(due.min(capacity.saturating_sub(available)));
            }
        }
    });
}
