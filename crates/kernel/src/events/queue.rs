//! Serializing update queue.
//!
//! Emitted events are appended to a FIFO. The first enqueue on an idle queue
//! spawns a drain task; later enqueues while it runs only append, and the
//! running drain picks them up. The drain applies one event, persists the
//! document, notifies document observers, then yields to the scheduler
//! before taking the next event.

use std::collections::VecDeque;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::Notify;
use tracing::{debug, error, warn};

use super::listeners::ListenerList;
use super::{DomainEvent, EventKind};
use crate::clock::Clock;
use crate::content::{DocumentStore, merge};
use crate::error::ServiceError;

/// An event waiting to be applied.
#[derive(Debug, Clone)]
pub struct QueuedUpdate {
    /// Sequence number, unique per queue.
    pub id: u64,
    pub event: DomainEvent,
    /// When the event was enqueued.
    pub timestamp: DateTime<Utc>,
}

/// Store-wide notice that the document changed and should be re-read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentChanged {
    /// Id of the queued update that produced the change.
    pub update_id: u64,
    pub kind: EventKind,
    pub at: DateTime<Utc>,
}

/// FIFO of pending document updates with a single cooperative drainer.
#[derive(Clone)]
pub struct UpdateQueue {
    inner: Arc<QueueInner>,
}

struct QueueInner {
    pending: Mutex<VecDeque<QueuedUpdate>>,
    draining: AtomicBool,
    next_id: AtomicU64,
    idle: Notify,
    documents: DocumentStore,
    observers: Arc<ListenerList<DocumentChanged>>,
    clock: Arc<dyn Clock>,
    runtime: Handle,
}

impl UpdateQueue {
    /// Create a queue bound to the current tokio runtime.
    pub fn new(
        documents: DocumentStore,
        observers: Arc<ListenerList<DocumentChanged>>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ServiceError> {
        let runtime = Handle::try_current()?;
        Ok(Self {
            inner: Arc::new(QueueInner {
                pending: Mutex::new(VecDeque::new()),
                draining: AtomicBool::new(false),
                next_id: AtomicU64::new(1),
                idle: Notify::new(),
                documents,
                observers,
                clock,
                runtime,
            }),
        })
    }

    /// Append an event and make sure a drain is running.
    ///
    /// Returns the queued update's id.
    pub(crate) fn enqueue(&self, event: DomainEvent) -> u64 {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let update = QueuedUpdate {
            id,
            event,
            timestamp: self.inner.clock.now(),
        };
        self.inner.pending.lock().push_back(update);

        if !self.inner.draining.swap(true, Ordering::AcqRel) {
            debug!(update = id, "starting queue drain");
            self.inner.runtime.spawn(drain(Arc::clone(&self.inner)));
        }

        id
    }

    /// Number of updates not yet applied.
    pub fn pending(&self) -> usize {
        self.inner.pending.lock().len()
    }

    /// True when nothing is queued and no drain is running.
    pub fn is_idle(&self) -> bool {
        !self.inner.draining.load(Ordering::Acquire) && self.inner.pending.lock().is_empty()
    }

    /// Wait until every update enqueued so far has been applied or dropped.
    pub async fn settled(&self) {
        loop {
            let notified = self.inner.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.is_idle() {
                return;
            }
            notified.await;
        }
    }
}

impl std::fmt::Debug for UpdateQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpdateQueue")
            .field("pending", &self.pending())
            .field("draining", &self.inner.draining.load(Ordering::Relaxed))
            .finish()
    }
}

async fn drain(inner: Arc<QueueInner>) {
    loop {
        let next = inner.pending.lock().pop_front();
        let Some(update) = next else {
            inner.draining.store(false, Ordering::Release);
            // An enqueue may have landed between the pop and the store above
            // and seen `draining == true`; pick its item up here.
            let missed = !inner.pending.lock().is_empty();
            if missed && !inner.draining.swap(true, Ordering::AcqRel) {
                continue;
            }
            break;
        };

        let id = update.id;
        if catch_unwind(AssertUnwindSafe(|| inner.apply(update))).is_err() {
            error!(update = id, "queued update panicked, dropping");
        }
        tokio::task::yield_now().await;
    }

    inner.idle.notify_waiters();
}

impl QueueInner {
    fn apply(&self, update: QueuedUpdate) {
        let QueuedUpdate { id, event, .. } = update;
        let kind = event.kind();
        let action = event.action();

        let doc = self.documents.read();
        let now = self.clock.now();

        let doc = match merge::apply(doc, event, now) {
            Ok(doc) => doc,
            Err(e) => {
                warn!(update = id, event = %kind, action, error = %e, "dropping queued update");
                return;
            }
        };

        if let Err(e) = self.documents.write(&doc) {
            error!(update = id, event = %kind, action, error = %e, "failed to persist document");
            return;
        }

        debug!(update = id, event = %kind, action, "queued update applied");

        let notice = DocumentChanged {
            update_id: id,
            kind,
            at: now,
        };
        self.observers.notify(&notice, "document_changed");
    }
}
