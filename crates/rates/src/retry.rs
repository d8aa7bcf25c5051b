//! Retry policy for the reconciliation engine.
//!
//! The policy only describes the schedule; the loop itself lives in the
//! reconciliation engine so a retry re-runs the whole provider fan-out.

use std::time::Duration;

/// Default number of retries after the first attempt (3 attempts total).
const DEFAULT_MAX_RETRIES: u32 = 2;

/// Default delay before the first retry.
const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(250);

/// Default exponential growth factor between retries.
const DEFAULT_FACTOR: u32 = 2;

/// Bounded exponential-backoff schedule.
#[derive(Clone, Debug)]
pub struct RetryPolicy {
    /// Retries allowed after the initial attempt.
    pub max_retries: u32,
    /// Delay before the first retry.
    pub base_delay: Duration,
    /// Multiplier applied for each subsequent retry.
    pub factor: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: DEFAULT_BASE_DELAY,
            factor: DEFAULT_FACTOR,
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `retry` (zero-based).
    pub fn delay(&self, retry: u32) -> Duration {
        self.base_delay * self.factor.saturating_pow(retry)
    }
}
