#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Common test utilities for integration tests.
//!
//! Tests run against the real kernel services over either an in-memory
//! store or a file-backed store in a unique temp directory. Time is driven
//! by a [`ManualClock`] so lockouts and timeouts are deterministic.

#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use serde_json::Value;

use folio_kernel::AppState;
use folio_kernel::clock::ManualClock;
use folio_kernel::security::{CallerContext, SecurityPolicy};
use folio_kernel::store::{FileStore, KeyValueStore, MemoryStore};

/// 2023-11-14T22:13:20Z
pub const START_MILLIS: i64 = 1_700_000_000_000;

/// Test application wrapping a real [`AppState`].
pub struct TestApp {
    pub state: AppState,
    pub clock: ManualClock,
    pub store: Arc<dyn KeyValueStore>,
}

impl TestApp {
    /// App over a fresh in-memory store with the strict policy.
    pub fn new() -> Self {
        Self::with_policy(SecurityPolicy::strict())
    }

    /// App over a fresh in-memory store.
    pub fn with_policy(policy: SecurityPolicy) -> Self {
        Self::over(Arc::new(MemoryStore::new()), policy)
    }

    /// App over a file store at `path`.
    pub fn on_disk(path: &Path) -> Self {
        let store = FileStore::open(path).expect("open file store");
        Self::over(Arc::new(store), SecurityPolicy::strict())
    }

    fn over(store: Arc<dyn KeyValueStore>, policy: SecurityPolicy) -> Self {
        let clock = ManualClock::at_millis(START_MILLIS);
        let state = AppState::with_store(
            Arc::clone(&store),
            Arc::new(clock.clone()),
            policy,
            CallerContext {
                user_agent: "integration-test".to_string(),
                url: "https://folio.test/admin".to_string(),
            },
        )
        .expect("build app state");

        Self {
            state,
            clock,
            store,
        }
    }

    /// Emit a wire envelope built by `folio_test_utils`.
    pub fn emit(&self, envelope: Value) -> u64 {
        let event = envelope["event"].as_str().expect("envelope has event");
        self.state
            .content()
            .emit_raw(event, envelope["data"].clone())
            .expect("well-formed event")
    }

    /// Emit and wait for the queue to drain.
    pub async fn apply(&self, envelope: Value) -> u64 {
        let id = self.emit(envelope);
        self.state.content().settled().await;
        id
    }
}
