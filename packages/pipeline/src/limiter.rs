//! Per-source rate limiting.
//!
//! One governor limiter per source id, shared across every config
//! that scrapes the source. Concurrent scrapes of different configs
//! therefore still respect a single spacing floor per site.

use governor::{Quota, RateLimiter};
use nonzero_ext::nonzero;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

type DirectLimiter = RateLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// Registry of per-source rate limiters.
///
/// Limiters are created lazily on first use and live for the life of
/// the registry, so the spacing clock survives across runs.
pub struct SourceLimiters {
    limiters: Mutex<HashMap<String, Arc<DirectLimiter>>>,
    quota: Quota,
}

impl SourceLimiters {
    /// Create a registry enforcing one request per `spacing` for each
    /// source. Burst of one: requests are evenly spaced, never bunched.
    pub fn new(spacing: Duration) -> Self {
        let quota = Quota::with_period(spacing)
            .expect("spacing must be > 0")
            .allow_burst(nonzero!(1u32));
        Self {
            limiters: Mutex::new(HashMap::new()),
            quota,
        }
    }

    /// Get or create the limiter for a source.
    pub fn limiter(&self, source_id: &str) -> Arc<DirectLimiter> {
        let mut limiters = self.limiters.lock().expect("limiter registry poisoned");
        limiters
            .entry(source_id.to_string())
            .or_insert_with(|| Arc::new(RateLimiter::direct(self.quota)))
            .clone()
    }

    /// Suspend until the source's next request slot is available.
    pub async fn acquire(&self, source_id: &str) {
        // Clone out of the registry first so the mutex is not held
        // across the await.
        let limiter = self.limiter(source_id);
        limiter.until_ready().await;
    }
}
