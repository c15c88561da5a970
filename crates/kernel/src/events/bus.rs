//! Event bus: per-kind listener fan-out in front of the update queue.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use super::listeners::{ListenerList, Subscription};
use super::queue::UpdateQueue;
use super::{DomainEvent, EventKind};

/// Delivers emitted events to direct listeners, then queues them for
/// application to the document.
///
/// Cloning is cheap; clones share listeners and queue.
#[derive(Clone)]
pub struct EventBus {
    inner: Arc<BusInner>,
}

struct BusInner {
    listeners: HashMap<EventKind, Arc<ListenerList<DomainEvent>>>,
    queue: UpdateQueue,
}

impl EventBus {
    /// Create a bus that feeds `queue`.
    pub fn new(queue: UpdateQueue) -> Self {
        let listeners = EventKind::ALL
            .into_iter()
            .map(|kind| (kind, Arc::new(ListenerList::new())))
            .collect();

        Self {
            inner: Arc::new(BusInner { listeners, queue }),
        }
    }

    fn channel(&self, kind: EventKind) -> &Arc<ListenerList<DomainEvent>> {
        // Every kind is inserted in `new`, so the index cannot miss.
        &self.inner.listeners[&kind]
    }

    /// Register `callback` for events of `kind`.
    pub fn subscribe<F>(&self, kind: EventKind, callback: F) -> Subscription
    where
        F: Fn(&DomainEvent) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let subscription = self.channel(kind).add(callback);
        debug!(event = %kind, listeners = self.listener_count(kind), "listener subscribed");
        subscription
    }

    /// Number of listeners registered for `kind`.
    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.channel(kind).len()
    }

    /// Deliver `event` to its listeners, then queue it.
    ///
    /// Returns the queued update's id. Listener failures are logged and never
    /// reach the caller.
    pub fn emit(&self, event: DomainEvent) -> u64 {
        let kind = event.kind();
        let failures = self.channel(kind).notify(&event, kind.as_str());
        let update = self.inner.queue.enqueue(event);

        debug!(event = %kind, update, failures, "event emitted");
        update
    }

    /// The queue this bus feeds.
    pub fn queue(&self) -> &UpdateQueue {
        &self.inner.queue
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut counts: Vec<(&str, usize)> = EventKind::ALL
            .into_iter()
            .map(|kind| (kind.as_str(), self.listener_count(kind)))
            .collect();
        counts.sort_unstable();
        f.debug_struct("EventBus")
            .field("listeners", &counts)
            .field("queue", &self.inner.queue)
            .finish()
    }
}
