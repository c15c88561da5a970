//! Sliding-window rate limiting.
//!
//! Each key keeps the timestamps of its admitted requests. Timestamps older
//! than the window are pruned on every check, so the stored window never
//! holds more than `max_requests` entries.

use std::sync::Arc;

use chrono::Duration;
use tracing::{debug, warn};

use crate::clock::Clock;
use crate::store::{self, KeyValueStore, keys};

/// Rate limiter backed by the shared store.
#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
}

impl RateLimiter {
    /// Create a new rate limiter.
    pub fn new(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Admit or reject a request for `key`.
    ///
    /// Returns `true` and records the request if fewer than `max_requests`
    /// were admitted within the trailing `window`; otherwise returns `false`.
    pub fn rate_limit(&self, key: &str, max_requests: usize, window: Duration) -> bool {
        let now = self.clock.now_millis();
        let mut requests = self.window(key, now, window);

        let admitted = requests.len() < max_requests;
        if admitted {
            requests.push(now);
        } else {
            debug!(key = %key, count = requests.len(), limit = max_requests, "rate limit exceeded");
        }

        if let Err(e) = store::save(self.store.as_ref(), &keys::rate_limit(key), &requests) {
            warn!(key = %key, error = %e, "failed to persist rate limit window");
        }

        admitted
    }

    /// Requests currently counted against `key`.
    pub fn count(&self, key: &str, window: Duration) -> usize {
        self.window(key, self.clock.now_millis(), window).len()
    }

    /// Forget the window for `key`.
    pub fn reset(&self, key: &str) {
        if let Err(e) = self.store.remove(&keys::rate_limit(key)) {
            warn!(key = %key, error = %e, "failed to reset rate limit window");
        }
    }

    fn window(&self, key: &str, now: i64, window: Duration) -> Vec<i64> {
        let stored: Vec<i64> = store::load_or_default(self.store.as_ref(), &keys::rate_limit(key));
        let span = window.num_milliseconds();
        stored.into_iter().filter(|t| now - t < span).collect()
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter").finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::store::MemoryStore;

    fn limiter(clock: &ManualClock) -> RateLimiter {
        RateLimiter::new(Arc::new(MemoryStore::new()), Arc::new(clock.clone()))
    }

    #[test]
    fn fourth_request_in_window_is_rejected() {
        let clock = ManualClock::at_millis(10_000);
        let limiter = limiter(&clock);
        let window = Duration::milliseconds(1000);

        assert!(limiter.rate_limit("k", 3, window));
        clock.advance(Duration::milliseconds(100));
        assert!(limiter.rate_limit("k", 3, window));
        clock.advance(Duration::milliseconds(100));
        assert!(limiter.rate_limit("k", 3, window));
        clock.advance(Duration::milliseconds(100));
        assert!(!limiter.rate_limit("k", 3, window));
        assert_eq!(limiter.count("k", window), 3);

        clock.advance(Duration::milliseconds(1001));
        assert!(limiter.rate_limit("k", 3, window));
        assert_eq!(limiter.count("k", window), 1);
    }

    #[test]
    fn window_slides() {
        let clock = ManualClock::at_millis(0);
        let limiter = limiter(&clock);
        let window = Duration::milliseconds(1000);

        assert!(limiter.rate_limit("k", 2, window));
        clock.advance(Duration::milliseconds(600));
        assert!(limiter.rate_limit("k", 2, window));
        assert!(!limiter.rate_limit("k", 2, window));

        // The first request leaves the window; one slot opens.
        clock.advance(Duration::milliseconds(400));
        assert!(limiter.rate_limit("k", 2, window));
        assert!(!limiter.rate_limit("k", 2, window));
    }

    #[test]
    fn keys_are_independent_and_resettable() {
        let clock = ManualClock::at_millis(0);
        let limiter = limiter(&clock);
        let window = Duration::seconds(60);

        assert!(limiter.rate_limit("a", 1, window));
        assert!(!limiter.rate_limit("a", 1, window));
        assert!(limiter.rate_limit("b", 1, window));

        limiter.reset("a");
        assert!(limiter.rate_limit("a", 1, window));
    }

    #[test]
    fn zero_limit_rejects_everything() {
        let clock = ManualClock::at_millis(0);
        let limiter = limiter(&clock);
        assert!(!limiter.rate_limit("k", 0, Duration::seconds(1)));
    }
}
