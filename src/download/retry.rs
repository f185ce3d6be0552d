//! Retry policy for chunk fetches.
//!
//! A chunk is attempted at most `max_attempts` times. Between attempts the
//! fetcher may wait according to an exponential backoff; by default it retries
//! immediately.

use reqwest_retry::{policies::ExponentialBackoff, RetryDecision, RetryPolicy as _};
use std::time::{Duration, SystemTime};

/// Default number of attempts per chunk.
pub const MAX_RETRIES: u32 = 5;

/// How often, and how patiently, a chunk is retried.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    backoff: Option<ExponentialBackoff>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(MAX_RETRIES)
    }
}

impl RetryPolicy {
    /// Retries immediately, up to `max_attempts` attempts in total (at least one).
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff: None,
        }
    }

    /// Waits between `min` and `max`, growing exponentially, between attempts.
    pub fn with_backoff(mut self, min: Duration, max: Duration) -> Self {
        self.backoff = Some(
            ExponentialBackoff::builder()
                .retry_bounds(min, max)
                .build_with_max_retries(self.max_attempts),
        );
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn has_backoff(&self) -> bool {
        self.backoff.is_some()
    }

    /// Whether another attempt is allowed after `failures` failed ones.
    pub fn should_retry(&self, failures: u32) -> bool {
        failures < self.max_attempts
    }

    /// Delay to wait before the next attempt, given when the first attempt
    /// started and how many attempts have failed so far.
    pub fn delay(&self, started: SystemTime, failures: u32) -> Option<Duration> {
        let backoff = self.backoff.as_ref()?;
        match backoff.should_retry(started, failures) {
            RetryDecision::Retry { execute_after } => {
                execute_after.duration_since(SystemTime::now()).ok()
            }
            RetryDecision::DoNotRetry => None,
        }
    }
}
