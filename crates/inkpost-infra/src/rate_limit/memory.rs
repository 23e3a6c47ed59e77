//! Process-local rate limiter backed by governor.

use std::num::NonZeroU32;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use governor::clock::{Clock, DefaultClock};
use governor::state::keyed::DefaultKeyedStateStore;
use governor::{Quota, RateLimiter as GovernorRateLimiter};

use inkpost_core::ports::{RateDecision, RateLimitError, RateLimiter};

type KeyedLimiter = GovernorRateLimiter<String, DefaultKeyedStateStore<String>, DefaultClock>;

/// Idle clients are swept once per this many acquisitions.
const SWEEP_EVERY: u64 = 1024;

/// Requests each client may make per window.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 100,
            window: Duration::from_secs(60),
        }
    }
}

impl RateLimitConfig {
    /// Load from `RATE_LIMIT_MAX_REQUESTS` and `RATE_LIMIT_WINDOW_SECS`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let var = |name| std::env::var(name).ok().and_then(|s| s.parse::<u64>().ok());

        Self {
            max_requests: var("RATE_LIMIT_MAX_REQUESTS")
                .and_then(|n| u32::try_from(n).ok())
                .unwrap_or(defaults.max_requests),
            window: var("RATE_LIMIT_WINDOW_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.window),
        }
    }
}

/// GCRA limiter keyed by client address.
///
/// A full quota is available as a burst; it refills evenly over the window.
/// State lives in this process only. Clients whose quota has fully
/// refilled are dropped periodically, so memory tracks active clients.
pub struct InMemoryRateLimiter {
    limiter: KeyedLimiter,
    clock: DefaultClock,
    acquired: AtomicU64,
}

impl InMemoryRateLimiter {
    pub fn new(config: RateLimitConfig) -> Result<Self, RateLimitError> {
        let burst = NonZeroU32::new(config.max_requests)
            .ok_or(RateLimitError::InvalidQuota("max_requests must be non-zero"))?;
        let quota = Quota::with_period(config.window / config.max_requests)
            .ok_or(RateLimitError::InvalidQuota("window must be non-zero"))?
            .allow_burst(burst);

        tracing::debug!(
            max_requests = config.max_requests,
            window_secs = config.window.as_secs(),
            "Rate limiter configured"
        );

        Ok(Self {
            limiter: KeyedLimiter::keyed(quota),
            clock: DefaultClock::default(),
            acquired: AtomicU64::new(0),
        })
    }

    /// Forget clients whose quota has fully refilled.
    pub fn evict_idle(&self) {
        self.limiter.retain_recent();
        self.limiter.shrink_to_fit();
        tracing::debug!(tracked = self.limiter.len(), "Evicted idle rate limit entries");
    }

    /// Number of clients currently holding limiter state.
    pub fn tracked_clients(&self) -> usize {
        self.limiter.len()
    }
}

#[async_trait]
impl RateLimiter for InMemoryRateLimiter {
    async fn acquire(&self, client_key: &str) -> RateDecision {
        let decision = match self.limiter.check_key(&client_key.to_string()) {
            Ok(()) => RateDecision::Allowed,
            Err(not_until) => RateDecision::Limited {
                retry_after: not_until.wait_time_from(self.clock.now()),
            },
        };

        if self.acquired.fetch_add(1, Ordering::Relaxed) % SWEEP_EVERY == SWEEP_EVERY - 1 {
            self.evict_idle();
        }

        decision
    }
}
