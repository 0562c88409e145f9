use std::time::Duration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

/// Verdict for one job after a poll tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome<T> {
    /// Not done yet; try again after the next delay.
    Retry,
    /// The job left the polling state.
    Terminal(T),
}

impl<T> TickOutcome<T> {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TickOutcome::Terminal(_))
    }
}

/// Fixed-interval polling with a hard ceiling on attempts.
///
/// Every tick that does not complete a job counts against the budget,
/// whether the service said "not yet" or the request failed outright. Total
/// waiting is therefore bounded by `max_attempts * interval`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 100,
            interval: Duration::from_secs(3),
        }
    }
}

impl PollPolicy {
    pub fn new(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            interval,
        }
    }

    /// Upper bound of time spent waiting between ticks.
    pub fn max_wait(&self) -> Duration {
        self.interval.saturating_mul(self.max_attempts)
    }

    pub fn is_exhausted(&self, attempts: u32) -> bool {
        attempts >= self.max_attempts
    }

    /// Sleeps for one interval. Returns `false` if `cancel` fired first.
    pub async fn pause(&self, cancel: &CancellationToken) -> bool {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => false,
            _ = sleep(self.interval) => true,
        }
    }
}
