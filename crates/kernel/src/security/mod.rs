//! Security bookkeeping for the editing surface.
//!
//! Login attempt tracking, lockouts, rate limiting, session issuance and
//! expiry, input sanitization, XSS detection and an audit log. All state
//! lives in the shared key-value store. None of this is a trust boundary:
//! it gates a local editor, it does not authenticate anyone.
//!
//! Policy denials are returned as values ([`LoginCheck`], [`PasswordCheck`],
//! `bool`), never as errors. Unreadable stored state counts as empty.

mod audit;
mod lockout;
mod password;
mod policy;
mod rate_limit;
mod sanitize;
mod session;

use std::collections::VecDeque;
use std::sync::Arc;

use chrono::Duration;

pub use audit::{CallerContext, SecurityLog, SecurityLogEntry};
pub use lockout::{LockoutRecord, LockoutService, LoginCheck};
pub use password::{PasswordCheck, PasswordViolation, validate_password};
pub use policy::{PolicyPreset, SecurityPolicy};
pub use rate_limit::RateLimiter;
pub use sanitize::{detect_xss, sanitize_input};
pub use session::{Session, SessionManager};

use crate::clock::Clock;
use crate::store::KeyValueStore;

/// Facade over the individual security services, sharing one store, clock
/// and policy.
#[derive(Clone)]
pub struct SecurityEngine {
    policy: SecurityPolicy,
    lockout: LockoutService,
    sessions: SessionManager,
    rate_limiter: RateLimiter,
    log: SecurityLog,
}

impl SecurityEngine {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
        policy: SecurityPolicy,
        context: CallerContext,
    ) -> Self {
        let lockout = LockoutService::new(
            Arc::clone(&store),
            Arc::clone(&clock),
            policy.max_login_attempts,
            policy.lockout_duration,
            policy.attempt_window,
        );
        let sessions = SessionManager::new(
            Arc::clone(&store),
            Arc::clone(&clock),
            policy.session_lifetime,
            policy.session_timeout,
        );
        let rate_limiter = RateLimiter::new(Arc::clone(&store), Arc::clone(&clock));
        let log = SecurityLog::new(store, clock, context, policy.log_capacity);

        Self {
            policy,
            lockout,
            sessions,
            rate_limiter,
            log,
        }
    }

    pub fn policy(&self) -> &SecurityPolicy {
        &self.policy
    }

    pub fn lockout(&self) -> &LockoutService {
        &self.lockout
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.rate_limiter
    }

    pub fn log(&self) -> &SecurityLog {
        &self.log
    }

    /// Check a password against the policy's strength rules.
    pub fn validate_password(&self, password: &str) -> PasswordCheck {
        validate_password(password, self.policy.min_password_length)
    }

    pub fn check_login_attempts(&self, identity: &str) -> LoginCheck {
        self.lockout.check_login_attempts(identity)
    }

    pub fn record_login_attempt(&self, identity: &str, success: bool) {
        self.lockout.record_login_attempt(identity, success);
    }

    pub fn check_session_timeout(&self) -> bool {
        self.sessions.check_session_timeout()
    }

    pub fn update_last_activity(&self) {
        self.sessions.update_last_activity();
    }

    pub fn create_session(&self) -> Session {
        self.sessions.create_session()
    }

    pub fn validate_session(&self) -> bool {
        self.sessions.validate_session()
    }

    pub fn current_session(&self) -> Option<Session> {
        self.sessions.current_session()
    }

    pub fn destroy_session(&self) {
        self.sessions.destroy_session();
    }

    pub fn sanitize_input(&self, text: &str) -> String {
        sanitize_input(text)
    }

    pub fn detect_xss(&self, content: &str) -> bool {
        detect_xss(content)
    }

    pub fn rate_limit(&self, key: &str, max_requests: usize, window: Duration) -> bool {
        self.rate_limiter.rate_limit(key, max_requests, window)
    }

    pub fn log_security_event(&self, event: &str, details: serde_json::Value) {
        self.log.log_security_event(event, details);
    }

    pub fn security_logs(&self) -> VecDeque<SecurityLogEntry> {
        self.log.entries()
    }

    pub fn clear_security_logs(&self) {
        self.log.clear();
    }

    /// Run the admin login gate for `identity`.
    ///
    /// Checks the lockout, records the outcome reported by `verify`, logs the
    /// result, and issues a session on success. Returns the lockout check
    /// that applied and the session, if one was issued.
    pub fn attempt_login(
        &self,
        identity: &str,
        verify: impl FnOnce() -> bool,
    ) -> (LoginCheck, Option<Session>) {
        let check = self.check_login_attempts(identity);
        if !check.can_login {
            self.log_security_event(
                "login_blocked",
                serde_json::json!({
                    "identity": identity,
                    "remainingTime": check.remaining_time,
                }),
            );
            return (check, None);
        }

        let success = verify();
        self.record_login_attempt(identity, success);

        if success {
            self.log_security_event("login_success", serde_json::json!({ "identity": identity }));
            (check, Some(self.create_session()))
        } else {
            self.log_security_event(
                "login_failed",
                serde_json::json!({
                    "identity": identity,
                    "attemptsRemaining": self.lockout.attempts_remaining(identity),
                }),
            );
            (check, None)
        }
    }
}

impl std::fmt::Debug for SecurityEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecurityEngine")
            .field("policy", &self.policy)
            .finish()
    }
}
