//! Retry budget and exponential backoff.

use std::time::Duration;

use rand::Rng;

use crate::Failure;

/// How transient failures are retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt. Default: 2 (3 attempts total).
    pub max_retries: u32,
    /// Backoff before retry `i` is `base_delay * 2^i`. Default: 300 ms.
    pub base_delay: Duration,
    /// Adds up to half the backoff again, uniformly at random, so
    /// clients that failed together don't retry together.
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: Self::DEFAULT_MAX_RETRIES,
            base_delay: Self::DEFAULT_BASE_DELAY,
            jitter: true,
        }
    }
}

impl RetryPolicy {
    pub const DEFAULT_MAX_RETRIES: u32 = 2;
    pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(300);

    /// A policy that never retries.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    pub fn without_jitter(mut self) -> Self {
        self.jitter = false;
        self
    }

    /// Un-jittered backoff before retry number `attempt_index` (0-based).
    pub fn backoff(&self, attempt_index: u32) -> Duration {
        self.base_delay
            .saturating_mul(2u32.saturating_pow(attempt_index))
    }

    /// Fresh per-request retry state.
    pub fn start(&self) -> RetryState {
        RetryState {
            policy: *self,
            retries_used: 0,
        }
    }

    fn jittered(&self, delay: Duration) -> Duration {
        if !self.jitter {
            return delay;
        }
        let max_extra = (delay / 2).as_millis() as u64;
        if max_extra == 0 {
            return delay;
        }
        let extra = rand::rng().random_range(0..=max_extra);
        delay + Duration::from_millis(extra)
    }
}

/// Retry bookkeeping for one logical request. Not shared, not persisted.
#[derive(Debug, Clone)]
pub struct RetryState {
    policy: RetryPolicy,
    retries_used: u32,
}

impl RetryState {
    pub fn retries_used(&self) -> u32 {
        self.retries_used
    }

    pub fn attempts_remaining(&self) -> u32 {
        self.policy.max_retries.saturating_sub(self.retries_used)
    }

    /// Decides whether `failure` gets another attempt.
    ///
    /// Returns the delay to wait first, or `None` when the failure is not
    /// transient or the budget is spent. Consumes one retry when it
    /// returns `Some`.
    pub fn next_delay(&mut self, failure: &Failure) -> Option<Duration> {
        if !failure.is_retryable() || self.retries_used >= self.policy.max_retries {
            return None;
        }
        let delay = self.policy.backoff(self.retries_used);
        self.retries_used += 1;
        Some(self.policy.jittered(delay))
    }
}
