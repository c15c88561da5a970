//! Logical key layout of the shared store.

/// The root content document.
pub const DOCUMENT: &str = "document";

/// The single admin session.
pub const ADMIN_SESSION: &str = "admin_session";

/// Append-only security log.
pub const SECURITY_LOGS: &str = "security_logs";

/// Last user-activity timestamp.
pub const LAST_ACTIVITY: &str = "last_activity";

/// Failed login attempt timestamps for an identity.
pub fn login_attempts(identity: &str) -> String {
    format!("login_attempts_{identity}")
}

/// Lockout expiry for an identity.
pub fn lockout(identity: &str) -> String {
    format!("lockout_{identity}")
}

/// Sliding rate-limit window for a caller key.
pub fn rate_limit(key: &str) -> String {
    format!("rate_limit_{key}")
}
