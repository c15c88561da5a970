//! Login attempt tracking and lockout.
//!
//! Tracks failed login attempts per identity and temporarily locks the
//! identity out after too many failures.

use std::sync::Arc;

use chrono::Duration;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::clock::Clock;
use crate::store::{self, KeyValueStore, keys};

/// Stored lockout state for an identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LockoutRecord {
    /// Unix milliseconds at which the lockout ends.
    pub until: i64,
}

/// Whether an identity may attempt to log in right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginCheck {
    pub can_login: bool,
    /// Milliseconds until the lockout ends, when locked out.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining_time: Option<i64>,
}

impl LoginCheck {
    fn allowed() -> Self {
        Self {
            can_login: true,
            remaining_time: None,
        }
    }

    fn locked(remaining_ms: i64) -> Self {
        Self {
            can_login: false,
            remaining_time: Some(remaining_ms),
        }
    }
}

/// Account lockout service.
#[derive(Clone)]
pub struct LockoutService {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    max_attempts: usize,
    lockout_duration: Duration,
    attempt_window: Duration,
}

impl LockoutService {
    /// Create a new lockout service.
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
        max_attempts: usize,
        lockout_duration: Duration,
        attempt_window: Duration,
    ) -> Self {
        Self {
            store,
            clock,
            max_attempts,
            lockout_duration,
            attempt_window,
        }
    }

    /// Decide whether `identity` may attempt a login.
    ///
    /// An expired lockout is cleared together with its attempts. Reaching the
    /// attempt ceiling installs a fresh lockout.
    pub fn check_login_attempts(&self, identity: &str) -> LoginCheck {
        let now = self.clock.now_millis();
        let lockout_key = keys::lockout(identity);
        let attempts_key = keys::login_attempts(identity);

        if let Some(lockout) = store::load::<LockoutRecord>(self.store.as_ref(), &lockout_key) {
            if now < lockout.until {
                return LoginCheck::locked(lockout.until - now);
            }

            debug!(identity = %identity, "lockout expired, clearing");
            self.forget(&lockout_key);
            self.forget(&attempts_key);
        }

        let attempts = self.recent_attempts(identity, now);
        if attempts.len() >= self.max_attempts {
            let until = now + self.lockout_duration.num_milliseconds();
            if let Err(e) = store::save(self.store.as_ref(), &lockout_key, &LockoutRecord { until })
            {
                warn!(identity = %identity, error = %e, "failed to persist lockout");
            }

            warn!(
                identity = %identity,
                attempts = attempts.len(),
                "identity locked due to failed attempts"
            );
            return LoginCheck::locked(until - now);
        }

        LoginCheck::allowed()
    }

    /// Record the outcome of a login attempt.
    ///
    /// Success clears all lockout state for the identity.
    pub fn record_login_attempt(&self, identity: &str, success: bool) {
        if success {
            self.clear_all(identity);
            return;
        }

        let now = self.clock.now_millis();
        let mut attempts = self.recent_attempts(identity, now);
        attempts.push(now);

        if let Err(e) = store::save(
            self.store.as_ref(),
            &keys::login_attempts(identity),
            &attempts,
        ) {
            warn!(identity = %identity, error = %e, "failed to record login attempt");
        }

        debug!(identity = %identity, attempts = attempts.len(), "failed login attempt recorded");
    }

    /// Failed attempts inside the window. Older entries are pruned from the
    /// store as a side effect.
    pub fn recent_attempts(&self, identity: &str, now: i64) -> Vec<i64> {
        let key = keys::login_attempts(identity);
        let stored: Vec<i64> = store::load_or_default(self.store.as_ref(), &key);
        let cutoff = now - self.attempt_window.num_milliseconds();

        let recent: Vec<i64> = stored.iter().copied().filter(|t| *t > cutoff).collect();
        if recent.len() != stored.len()
            && let Err(e) = store::save(self.store.as_ref(), &key, &recent)
        {
            warn!(identity = %identity, error = %e, "failed to prune login attempts");
        }
        recent
    }

    /// Attempts left before a lockout.
    pub fn attempts_remaining(&self, identity: &str) -> usize {
        let now = self.clock.now_millis();
        self.max_attempts
            .saturating_sub(self.recent_attempts(identity, now).len())
    }

    /// Clear all lockout state (both attempts and lock) for an identity.
    pub fn clear_all(&self, identity: &str) {
        self.forget(&keys::login_attempts(identity));
        self.forget(&keys::lockout(identity));
        debug!(identity = %identity, "lockout state cleared");
    }

    fn forget(&self, key: &str) {
        if let Err(e) = self.store.remove(key) {
            warn!(key = %key, error = %e, "failed to remove lockout state");
        }
    }
}

impl std::fmt::Debug for LockoutService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LockoutService")
            .field("max_attempts", &self.max_attempts)
            .field("lockout_duration", &self.lockout_duration)
            .finish()
    }
}
