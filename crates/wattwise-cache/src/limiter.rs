//! Fixed-window rate limiting on top of the cache store.
//!
//! Counters are keyed by scope, optional caller identity and the start of
//! the current window, so each window begins at zero without a reset step.

use chrono::{DateTime, TimeZone, Utc};
use wattwise_core::RateLimit;

use crate::response::CacheResult;
use crate::store::CacheStore;

/// Fixed-window limiter sharing the cache backend's counters.
#[derive(Clone)]
pub struct RateLimiter {
    store: CacheStore,
}

impl RateLimiter {
    pub fn new(store: CacheStore) -> Self {
        Self { store }
    }

    /// Consume one hit for `scope` (and `identity`) in the current window.
    ///
    /// Returns `true` when the scope was already at or over its quota, i.e.
    /// this hit pushed the count past `limit.amount`.
    pub async fn test(
        &self,
        limit: &RateLimit,
        scope: &str,
        identity: Option<&str>,
    ) -> CacheResult<bool> {
        self.test_at(limit, scope, identity, Utc::now()).await
    }

    pub async fn test_at(
        &self,
        limit: &RateLimit,
        scope: &str,
        identity: Option<&str>,
        now: DateTime<Utc>,
    ) -> CacheResult<bool> {
        let start = window_start(limit, now);
        let key = counter_key(scope, identity, start);
        let expires_at = Utc
            .timestamp_opt(start + limit.window_secs as i64, 0)
            .single()
            .unwrap_or(now);

        let count = self.store.incr(&key, expires_at, now).await?;
        let exceeded = count > limit.amount;

        tracing::debug!(
            scope,
            identity = identity.unwrap_or("-"),
            count,
            limit = %limit,
            exceeded,
            "Rate limit checked"
        );
        Ok(exceeded)
    }
}

/// Unix second at which the window containing `now` began.
pub fn window_start(limit: &RateLimit, now: DateTime<Utc>) -> i64 {
    let window = limit.window_secs.max(1) as i64;
    now.timestamp().div_euclid(window) * window
}

pub fn counter_key(scope: &str, identity: Option<&str>, window_start: i64) -> String {
    match identity {
        Some(identity) => format!("ratelimit:{}:{}:{}", scope, identity, window_start),
        None => format!("ratelimit:{}:{}", scope, window_start),
    }
}
