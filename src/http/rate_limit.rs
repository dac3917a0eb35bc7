//! Client-side request pacing
//!
//! Uses the governor crate with a one-request quota per interval and no
//! burst, which enforces a minimum gap between consecutive request starts.
//! Governor reads time from the crate's [`Clock`], so pacing follows virtual
//! time under a mock clock.

use crate::clock::{Clock, SystemClock};
use governor::middleware::NoOpMiddleware;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter as Governor};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// Governor clock backed by a crate [`Clock`]
#[derive(Clone)]
struct GovernorClock(Arc<dyn Clock>);

impl governor::clock::Clock for GovernorClock {
    type Instant = Instant;

    fn now(&self) -> Instant {
        self.0.now()
    }
}

type DirectLimiter = Governor<NotKeyed, InMemoryState, GovernorClock, NoOpMiddleware<Instant>>;

/// Minimum-interval rate limiter
///
/// Admission is decided atomically by governor, so callers sharing one
/// limiter across tasks still observe the spacing.
pub struct RateLimiter {
    min_interval: Duration,
    limiter: Option<DirectLimiter>,
    clock: Arc<dyn Clock>,
}

impl RateLimiter {
    /// Create a limiter with the given spacing and clock
    pub fn new(min_interval: Duration, clock: Arc<dyn Clock>) -> Self {
        let limiter = Quota::with_period(min_interval).map(|quota| {
            Governor::direct_with_clock(
                quota.allow_burst(NonZeroU32::MIN),
                &GovernorClock(clock.clone()),
            )
        });

        Self {
            min_interval,
            limiter,
            clock,
        }
    }

    /// Create a limiter on the wall clock
    pub fn with_interval(min_interval: Duration) -> Self {
        Self::new(min_interval, Arc::new(SystemClock))
    }

    /// A limiter that never waits
    pub fn disabled() -> Self {
        Self::with_interval(Duration::ZERO)
    }

    /// Configured spacing
    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Whether this limiter can ever suspend
    pub fn is_enabled(&self) -> bool {
        self.limiter.is_some()
    }

    /// Wait until a request may start, then record its start
    ///
    /// Returns how long the caller was suspended.
    pub async fn wait_if_needed(&self) -> Duration {
        let Some(limiter) = &self.limiter else {
            return Duration::ZERO;
        };

        let mut waited = Duration::ZERO;
        while let Err(not_until) = limiter.check() {
            let wait = not_until.wait_time_from(self.clock.now());
            debug!("Rate limiter pacing request, waiting {:?}", wait);
            self.clock.sleep(wait).await;
            waited += wait;
        }
        waited
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::disabled()
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("min_interval", &self.min_interval)
            .finish_non_exhaustive()
    }
}
