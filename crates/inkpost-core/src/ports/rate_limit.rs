//! Request rate limiting port.

use async_trait::async_trait;
use std::time::Duration;

/// Outcome of charging one request against a client's quota.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed,
    /// Quota spent; the client may retry after `retry_after`.
    Limited { retry_after: Duration },
}

impl RateDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateDecision::Allowed)
    }
}

/// Per-client request limiter.
#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Charge one request to `client_key`.
    async fn acquire(&self, client_key: &str) -> RateDecision;
}

#[derive(Debug, thiserror::Error)]
pub enum RateLimitError {
    #[error("Invalid rate limit quota: {0}")]
    InvalidQuota(&'static str),
}
