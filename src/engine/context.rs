use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

pub(crate) const REASON_CANCELED: &str = "context canceled";
const REASON_DEADLINE: &str = "context deadline exceeded";

/// Caller-supplied cancellation signal with an optional deadline.
///
/// Cloning shares the token; [`ProbeContext::child`] derives a context that is
/// cancelled with its parent but can also be cancelled on its own.
#[derive(Debug, Clone, Default)]
pub struct ProbeContext {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl ProbeContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn from_token(token: CancellationToken) -> Self {
        Self {
            token,
            deadline: None,
        }
    }

    #[must_use]
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(existing) => existing.min(deadline),
            None => deadline,
        });
        self
    }

    #[must_use]
    pub fn with_timeout(self, timeout: Duration) -> Self {
        let deadline = Instant::now()
            .checked_add(timeout)
            .unwrap_or_else(far_future);
        self.with_deadline(deadline)
    }

    #[must_use]
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            deadline: self.deadline,
        }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    #[must_use]
    pub const fn token(&self) -> &CancellationToken {
        &self.token
    }

    #[must_use]
    pub const fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// `None` while the context is live.
    #[must_use]
    pub fn cancellation_reason(&self) -> Option<&'static str> {
        if self.token.is_cancelled() {
            return Some(REASON_CANCELED);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(REASON_DEADLINE),
            _ => None,
        }
    }

    #[must_use]
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    /// The per-attempt time budget: the request timeout, shortened to the
    /// context deadline when that comes first.
    #[must_use]
    pub fn attempt_budget(&self, timeout: Duration) -> Duration {
        match self.remaining() {
            Some(remaining) => timeout.min(remaining),
            None => timeout,
        }
    }

    /// Resolves once the context is cancelled or its deadline passes.
    pub async fn cancelled(&self) -> &'static str {
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    () = self.token.cancelled() => REASON_CANCELED,
                    () = tokio::time::sleep_until(deadline) => REASON_DEADLINE,
                }
            }
            None => {
                self.token.cancelled().await;
                REASON_CANCELED
            }
        }
    }
}

fn far_future() -> Instant {
    // Roughly thirty years; tokio's own "never" horizon.
    Instant::now()
        .checked_add(Duration::from_secs(946_080_000))
        .unwrap_or_else(Instant::now)
}
