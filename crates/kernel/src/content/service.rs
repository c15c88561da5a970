//! Content service: the single entry point for reading and changing content.

use std::sync::Arc;

use serde_json::Value;
use tracing::{info, warn};

use super::{Document, DocumentStore};
use crate::clock::Clock;
use crate::error::{ServiceError, WireError};
use crate::events::{
    DocumentChanged, DomainEvent, EventBus, EventKind, ListenerList, Subscription, UpdateQueue,
    wire,
};
use crate::store::KeyValueStore;

/// Owns the event bus, the update queue and the document observers.
///
/// Construct one per process inside a tokio runtime. Cloning is cheap and
/// clones share all state.
#[derive(Clone)]
pub struct ContentService {
    documents: DocumentStore,
    bus: EventBus,
    observers: Arc<ListenerList<DocumentChanged>>,
}

impl ContentService {
    /// Create a service persisting to `store`.
    ///
    /// Fails if called outside a tokio runtime.
    pub fn new(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Result<Self, ServiceError> {
        let documents = DocumentStore::new(store);
        let observers = Arc::new(ListenerList::new());
        let queue = UpdateQueue::new(documents.clone(), Arc::clone(&observers), clock)?;

        Ok(Self {
            documents,
            bus: EventBus::new(queue),
            observers,
        })
    }

    /// Current document as persisted.
    pub fn document(&self) -> Document {
        self.documents.read()
    }

    /// Propose a change. Direct listeners run now; the document is updated
    /// when the queue reaches the event.
    pub fn emit(&self, event: DomainEvent) -> u64 {
        self.bus.emit(event)
    }

    /// Propose a change in wire form.
    ///
    /// Malformed input is logged and rejected without touching the queue.
    pub fn emit_raw(&self, event: &str, data: Value) -> Result<u64, WireError> {
        match wire::parse(event, data) {
            Ok(parsed) => Ok(self.emit(parsed)),
            Err(e) => {
                warn!(event = %event, error = %e, "rejecting malformed event");
                Err(e)
            }
        }
    }

    /// Listen for events of one kind as they are emitted.
    pub fn subscribe<F>(&self, kind: EventKind, callback: F) -> Subscription
    where
        F: Fn(&DomainEvent) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.bus.subscribe(kind, callback)
    }

    /// Listen for store-wide "document changed" notices.
    ///
    /// Fired once per applied update, after the document is persisted.
    pub fn on_document_changed<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&DocumentChanged) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.observers.add(callback)
    }

    /// Number of direct listeners for `kind`.
    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.bus.listener_count(kind)
    }

    /// Number of document observers.
    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    /// Updates still waiting in the queue.
    pub fn pending(&self) -> usize {
        self.bus.queue().pending()
    }

    /// Wait until every event emitted so far has been applied or dropped.
    pub async fn settled(&self) {
        self.bus.queue().settled().await;
    }

    /// Log a one-line summary of the current document.
    pub fn log_summary(&self) {
        let doc = self.document();
        info!(
            blog_posts = doc.blog_posts.len(),
            projects = doc.projects.len(),
            certificates = doc.certificates.len(),
            skill_categories = doc.skills.len(),
            "content loaded"
        );
    }
}

impl std::fmt::Debug for ContentService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentService")
            .field("bus", &self.bus)
            .field("observers", &self.observers.len())
            .finish()
    }
}
