use std::time::Duration;

use super::error::CallError;

const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);
const MAX_SHIFT: u32 = 20;

/// Decides whether a failed attempt is retried and how long to wait first.
///
/// Attempts are numbered from zero. A policy with `max_retries = 3` allows at
/// most four dispatches of the same request. Backoff is `base * 2^attempt`
/// with no jitter, so the delay sequence for the defaults is 1s, 2s, 4s.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_retries: u32,
    base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: DEFAULT_BASE_DELAY,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    /// A policy that never retries.
    pub fn none() -> Self {
        Self::new(0, Duration::ZERO)
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn base_delay(&self) -> Duration {
        self.base_delay
    }

    /// `attempt` is the zero-based index of the attempt that just failed.
    pub fn should_retry(&self, error: &CallError, attempt: u32) -> bool {
        error.is_retryable() && attempt < self.max_retries
    }

    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let factor = 1u32 << attempt.min(MAX_SHIFT);
        self.base_delay.saturating_mul(factor)
    }
}
