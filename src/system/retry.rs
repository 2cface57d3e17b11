//! Backoff policy for the HTTP retry loop.

use std::time::Duration;

/// Total attempts (first try included) for a transient failure.
pub const MAX_ATTEMPTS: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    wait_min_ms: u64,
    wait_max_ms: u64,
    max_attempts: u32,
}

impl RetryPolicy {
    #[must_use]
    pub fn new(wait_min_ms: u64, wait_max_ms: u64) -> Self {
        Self {
            wait_min_ms,
            wait_max_ms,
            max_attempts: MAX_ATTEMPTS,
        }
    }

    /// Policy without waits between attempts.
    #[must_use]
    pub fn immediate() -> Self {
        Self::new(0, 0)
    }

    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay before the attempt following `attempt` (1-based).
    #[must_use]
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let shift = attempt.saturating_sub(1).min(20);
        let calculated = self.wait_min_ms.saturating_mul(1_u64 << shift);
        Duration::from_millis(calculated.min(self.wait_max_ms))
    }

    /// Whether a response status is worth another attempt.
    #[must_use]
    pub fn is_retryable_status(status: u16) -> bool {
        status == 429 || (status >= 500 && status != 501 && status < 600)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(1_000, 30_000)
    }
}
