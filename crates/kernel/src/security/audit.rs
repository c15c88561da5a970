//! Security audit log.
//!
//! Append-only, bounded ring of security events stored under the
//! `security_logs` key. When the log is full the oldest entry is evicted.

use std::collections::VecDeque;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::clock::Clock;
use crate::store::{self, KeyValueStore, keys};

/// Where security events originate. Attached to every log entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallerContext {
    pub user_agent: String,
    pub url: String,
}

impl Default for CallerContext {
    fn default() -> Self {
        Self {
            user_agent: format!("folio/{}", env!("CARGO_PKG_VERSION")),
            url: "local://folio".to_string(),
        }
    }
}

/// One recorded security event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityLogEntry {
    pub event: String,
    pub details: serde_json::Value,
    pub user_agent: String,
    pub url: String,
    pub timestamp: DateTime<Utc>,
}

/// Security audit log service.
#[derive(Clone)]
pub struct SecurityLog {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    context: CallerContext,
    capacity: usize,
}

impl SecurityLog {
    /// Create a new security log.
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
        context: CallerContext,
        capacity: usize,
    ) -> Self {
        Self {
            store,
            clock,
            context,
            capacity,
        }
    }

    /// Append an event, evicting the oldest entries beyond capacity.
    pub fn log_security_event(&self, event: &str, details: serde_json::Value) {
        info!(event = %event, details = %details, "security event");

        let mut entries = self.entries();
        entries.push_back(SecurityLogEntry {
            event: event.to_string(),
            details,
            user_agent: self.context.user_agent.clone(),
            url: self.context.url.clone(),
            timestamp: self.clock.now(),
        });
        while entries.len() > self.capacity {
            entries.pop_front();
        }

        if let Err(e) = store::save(self.store.as_ref(), keys::SECURITY_LOGS, &entries) {
            warn!(event = %event, error = %e, "failed to write security log");
        }
    }

    /// Stored entries, oldest first.
    pub fn entries(&self) -> VecDeque<SecurityLogEntry> {
        store::load_or_default(self.store.as_ref(), keys::SECURITY_LOGS)
    }

    /// Drop every entry.
    pub fn clear(&self) {
        if let Err(e) = self.store.remove(keys::SECURITY_LOGS) {
            warn!(error = %e, "failed to clear security log");
        }
    }
}

impl std::fmt::Debug for SecurityLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecurityLog")
            .field("context", &self.context)
            .field("capacity", &self.capacity)
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::store::MemoryStore;
    use serde_json::json;

    fn log(capacity: usize) -> SecurityLog {
        SecurityLog::new(
            Arc::new(MemoryStore::new()),
            Arc::new(ManualClock::at_millis(0)),
            CallerContext {
                user_agent: "test-agent".to_string(),
                url: "https://example.com/admin".to_string(),
            },
            capacity,
        )
    }

    #[test]
    fn entries_carry_context() {
        let log = log(100);
        log.log_security_event("login_failed", json!({"identity": "1.2.3.4"}));

        let entries = log.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].event, "login_failed");
        assert_eq!(entries[0].details["identity"], "1.2.3.4");
        assert_eq!(entries[0].user_agent, "test-agent");
        assert_eq!(entries[0].url, "https://example.com/admin");
    }

    #[test]
    fn oldest_entries_are_evicted() {
        let log = log(100);
        for i in 0..150 {
            log.log_security_event("tick", json!({ "n": i }));
        }

        let entries = log.entries();
        assert_eq!(entries.len(), 100);
        assert_eq!(entries.front().unwrap().details["n"], 50);
        assert_eq!(entries.back().unwrap().details["n"], 149);
    }

    #[test]
    fn clear_empties_the_log() {
        let log = log(10);
        log.log_security_event("a", json!(null));
        log.clear();
        assert!(log.entries().is_empty());
    }
}
