//! Per-client rate limiting using the token bucket algorithm.

use axum::Router;
use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use std::sync::Arc;
use tower_governor::{
    GovernorLayer,
    governor::{GovernorConfig, GovernorConfigBuilder},
    key_extractor::{KeyExtractor, PeerIpKeyExtractor, SmartIpKeyExtractor},
};

use crate::state::AppState;

/// Token bucket parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quota {
    /// Seconds to replenish one request.
    pub per_second: u64,
    pub burst_size: u32,
}

/// Public tracking endpoints: one request every 2 seconds, burst of 100.
pub const PUBLIC: Quota = Quota {
    per_second: 2,
    burst_size: 100,
};

/// Admin endpoints: one request per second, burst of 10.
pub const ADMIN: Quota = Quota {
    per_second: 1,
    burst_size: 10,
};

fn config<K: KeyExtractor>(
    quota: Quota,
    key_extractor: K,
) -> Option<Arc<GovernorConfig<K, NoOpMiddleware<QuantaInstant>>>> {
    GovernorConfigBuilder::default()
        .key_extractor(key_extractor)
        .per_second(quota.per_second)
        .burst_size(quota.burst_size)
        .finish()
        .map(Arc::new)
}

/// Wraps `router` in a rate limiter keyed by client IP.
///
/// With `behind_proxy` the key is taken from `X-Forwarded-For` /
/// `X-Real-IP`, otherwise from the socket peer address. Requests over the
/// limit receive `429 Too Many Requests`.
pub fn apply(router: Router<AppState>, quota: Quota, behind_proxy: bool) -> Router<AppState> {
    if behind_proxy {
        match config(quota, SmartIpKeyExtractor) {
            Some(conf) => router.layer(GovernorLayer::new(conf)),
            None => invalid_quota(router, quota),
        }
    } else {
        match config(quota, PeerIpKeyExtractor) {
            Some(conf) => router.layer(GovernorLayer::new(conf)),
            None => invalid_quota(router, quota),
        }
    }
}

fn invalid_quota(router: Router<AppState>, quota: Quota) -> Router<AppState> {
    tracing::warn!(?quota, "invalid rate limit quota, rate limiting disabled");
    router
}
