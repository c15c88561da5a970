//! Application state shared by the binary and tests.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::content::ContentService;
use crate::security::{CallerContext, SecurityEngine, SecurityPolicy};
use crate::store::{FileStore, KeyValueStore};

/// Shared application state.
///
/// Wrapped in Arc internally so Clone is cheap.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Backing store shared by content and security.
    store: Arc<dyn KeyValueStore>,

    /// Content document, event bus and update queue.
    content: ContentService,

    /// Login gate, sessions, rate limits and audit log.
    security: SecurityEngine,
}

impl AppState {
    /// Open the file-backed store named by `config` and build every service
    /// on top of it. Must be called inside a tokio runtime.
    pub fn new(config: &Config) -> Result<Self> {
        let store = FileStore::open(&config.store_path).with_context(|| {
            format!("failed to open store at {}", config.store_path.display())
        })?;
        info!(path = %store.path().display(), policy = %config.security_policy, "store opened");

        Self::with_store(
            Arc::new(store),
            Arc::new(SystemClock),
            config.policy(),
            config.caller_context(),
        )
    }

    /// Build state over an existing store and clock.
    pub fn with_store(
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
        policy: SecurityPolicy,
        context: CallerContext,
    ) -> Result<Self> {
        let content = ContentService::new(Arc::clone(&store), Arc::clone(&clock))
            .context("failed to start content service")?;
        let security = SecurityEngine::new(Arc::clone(&store), clock, policy, context);

        Ok(Self {
            inner: Arc::new(AppStateInner {
                store,
                content,
                security,
            }),
        })
    }

    /// Get the backing store.
    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.inner.store
    }

    /// Get the content service.
    pub fn content(&self) -> &ContentService {
        &self.inner.content
    }

    /// Get the security engine.
    pub fn security(&self) -> &SecurityEngine {
        &self.inner.security
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("content", &self.inner.content)
            .field("security", &self.inner.security)
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::events::DomainEvent;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn content_and_security_share_one_store() {
        let state = AppState::with_store(
            Arc::new(MemoryStore::new()),
            Arc::new(ManualClock::at_millis(1_700_000_000_000)),
            SecurityPolicy::strict(),
            CallerContext::default(),
        )
        .unwrap();

        state.content().emit(DomainEvent::SkillAdded {
            category: "Languages".to_string(),
            skill: "Rust".to_string(),
        });
        state.content().settled().await;
        state.security().create_session();

        let keys = state.store().keys();
        assert!(keys.contains(&crate::store::keys::DOCUMENT.to_string()));
        assert!(keys.contains(&crate::store::keys::ADMIN_SESSION.to_string()));
    }

    #[test]
    fn requires_a_runtime() {
        let result = AppState::with_store(
            Arc::new(MemoryStore::new()),
            Arc::new(SystemClock),
            SecurityPolicy::default(),
            CallerContext::default(),
        );
        assert!(result.is_err());
    }
}
