//! Retry policy
//!
//! The policy is stateless: the attempt count and accumulated delay live in a
//! [`RetryState`] owned by the in-flight request, so one policy can be shared
//! by any number of concurrent requests.

use super::types::ResponseOutcome;
use crate::error::Error;
use crate::types::BackoffType;
use std::time::Duration;

/// What to do after a failed attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Give up and surface the failure
    Stop,
    /// Sleep for the given delay, then try again
    RetryAfter(Duration),
}

/// Per-request retry bookkeeping
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetryState {
    attempt: u32,
    elapsed: Duration,
}

impl RetryState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Retries already performed (0 on the first attempt)
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Total backoff delay slept so far
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Transport calls made once the current attempt has completed
    pub fn attempts_made(&self) -> u32 {
        self.attempt + 1
    }

    /// Record a backoff sleep and move to the next attempt
    pub fn record(&mut self, delay: Duration) {
        self.attempt += 1;
        self.elapsed += delay;
    }
}

/// Retry and backoff configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of retries after the first attempt
    pub max_retries: u32,
    /// Delay before the first retry
    pub base_delay: Duration,
    /// Upper bound on any single delay
    pub max_delay: Duration,
    /// How delays grow between attempts
    pub backoff: BackoffType,
    /// Optional bound on the total time spent sleeping
    pub max_elapsed: Option<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(60),
            backoff: BackoffType::Exponential,
            max_elapsed: None,
        }
    }
}

impl RetryPolicy {
    /// Exponential policy with the given budget and base delay
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
            ..Self::default()
        }
    }

    /// A policy that never retries
    pub fn no_retry() -> Self {
        Self::new(0, Duration::ZERO)
    }

    #[must_use]
    pub fn with_backoff(mut self, backoff: BackoffType) -> Self {
        self.backoff = backoff;
        self
    }

    #[must_use]
    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    #[must_use]
    pub fn with_max_elapsed(mut self, max_elapsed: Duration) -> Self {
        self.max_elapsed = Some(max_elapsed);
        self
    }

    /// Calculate backoff delay for a given attempt
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let delay = match self.backoff {
            BackoffType::Constant => Some(self.base_delay),
            BackoffType::Linear => self.base_delay.checked_mul(attempt.saturating_add(1)),
            BackoffType::Exponential => self
                .base_delay
                .checked_mul(2u32.saturating_pow(attempt)),
        };

        delay.map_or(self.max_delay, |d| d.min(self.max_delay))
    }

    /// Decide whether a failed attempt should be retried
    pub fn should_retry<T>(&self, state: &RetryState, outcome: &ResponseOutcome<T>) -> Decision {
        let ResponseOutcome::RetryableFailure(error) = outcome else {
            return Decision::Stop;
        };

        if state.attempt() >= self.max_retries {
            return Decision::Stop;
        }

        let mut delay = self.delay_for_attempt(state.attempt());
        if let Error::Throttled {
            retry_after: Some(retry_after),
            ..
        } = error
        {
            delay = delay.max(*retry_after).min(self.max_delay);
        }

        if let Some(budget) = self.max_elapsed {
            if state.elapsed() + delay > budget {
                return Decision::Stop;
            }
        }

        Decision::RetryAfter(delay)
    }
}
