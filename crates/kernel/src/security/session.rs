//! Admin session bookkeeping.
//!
//! One session per store. The token is random but carries no signature; it
//! only marks that the login gate was passed on this profile.

use std::sync::Arc;

use chrono::Duration;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::clock::Clock;
use crate::store::{self, KeyValueStore, keys};

/// Stored session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub token: String,
    /// Unix milliseconds.
    pub created: i64,
    /// Unix milliseconds after which the session is invalid.
    pub expires: i64,
}

/// Session issuance, validation and inactivity tracking.
#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    lifetime: Duration,
    inactivity_timeout: Duration,
}

impl SessionManager {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
        lifetime: Duration,
        inactivity_timeout: Duration,
    ) -> Self {
        Self {
            store,
            clock,
            lifetime,
            inactivity_timeout,
        }
    }

    /// Issue a new session, replacing any existing one, and mark activity.
    pub fn create_session(&self) -> Session {
        let now = self.clock.now_millis();
        let session = Session {
            token: generate_token(),
            created: now,
            expires: now + self.lifetime.num_milliseconds(),
        };

        if let Err(e) = store::save(self.store.as_ref(), keys::ADMIN_SESSION, &session) {
            warn!(error = %e, "failed to persist session");
        }
        self.update_last_activity();

        debug!(expires = session.expires, "session created");
        session
    }

    /// True while a session exists and has not expired. An expired session
    /// is deleted.
    pub fn validate_session(&self) -> bool {
        let Some(session) = self.current_session() else {
            return false;
        };

        if self.clock.now_millis() > session.expires {
            debug!("session expired");
            self.destroy_session();
            return false;
        }
        true
    }

    /// The stored session, if any.
    pub fn current_session(&self) -> Option<Session> {
        store::load(self.store.as_ref(), keys::ADMIN_SESSION)
    }

    /// Delete the session unconditionally.
    pub fn destroy_session(&self) {
        if let Err(e) = self.store.remove(keys::ADMIN_SESSION) {
            warn!(error = %e, "failed to remove session");
        }
    }

    /// True if there is no recorded activity or the last activity is older
    /// than the inactivity timeout.
    pub fn check_session_timeout(&self) -> bool {
        let Some(last) = store::load::<i64>(self.store.as_ref(), keys::LAST_ACTIVITY) else {
            return true;
        };
        self.clock.now_millis() - last > self.inactivity_timeout.num_milliseconds()
    }

    /// Stamp now as the last activity time.
    pub fn update_last_activity(&self) {
        let now = self.clock.now_millis();
        if let Err(e) = store::save(self.store.as_ref(), keys::LAST_ACTIVITY, &now) {
            warn!(error = %e, "failed to record activity");
        }
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("lifetime", &self.lifetime)
            .field("inactivity_timeout", &self.inactivity_timeout)
            .finish()
    }
}

/// Generate a 32-byte random hex token.
fn generate_token() -> String {
    let bytes: [u8; 32] = rand::random();
    hex::encode(bytes)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::store::MemoryStore;

    fn manager(clock: &ManualClock) -> SessionManager {
        SessionManager::new(
            Arc::new(MemoryStore::new()),
            Arc::new(clock.clone()),
            Duration::hours(24),
            Duration::minutes(30),
        )
    }

    #[test]
    fn token_generation() {
        let t1 = generate_token();
        let t2 = generate_token();
        assert_ne!(t1, t2);
        assert_eq!(t1.len(), 64);
    }

    #[test]
    fn session_lifecycle() {
        let clock = ManualClock::at_millis(0);
        let sessions = manager(&clock);
        assert!(!sessions.validate_session());

        let session = sessions.create_session();
        assert_eq!(session.expires - session.created, 24 * 60 * 60 * 1000);
        assert!(sessions.validate_session());
        assert_eq!(sessions.current_session(), Some(session));

        sessions.destroy_session();
        assert!(!sessions.validate_session());
        assert_eq!(sessions.current_session(), None);
    }

    #[test]
    fn expired_session_is_deleted() {
        let clock = ManualClock::at_millis(0);
        let sessions = manager(&clock);
        sessions.create_session();

        clock.advance(Duration::hours(24));
        assert!(sessions.validate_session(), "valid up to and including expiry");

        clock.advance(Duration::milliseconds(1));
        assert!(!sessions.validate_session());
        assert_eq!(sessions.current_session(), None);
    }

    #[test]
    fn inactivity_timeout() {
        let clock = ManualClock::at_millis(0);
        let sessions = manager(&clock);
        assert!(sessions.check_session_timeout(), "no activity yet");

        sessions.update_last_activity();
        clock.advance(Duration::minutes(30));
        assert!(!sessions.check_session_timeout());

        clock.advance(Duration::milliseconds(1));
        assert!(sessions.check_session_timeout());

        sessions.update_last_activity();
        assert!(!sessions.check_session_timeout());
    }
}
