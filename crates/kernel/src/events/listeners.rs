//! Ordered listener lists with isolated invocation.
//!
//! Listeners run in registration order. A listener that returns an error or
//! panics is logged and skipped; the rest still run and the caller never sees
//! the failure.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use tracing::error;

type Callback<T> = Arc<dyn Fn(&T) -> anyhow::Result<()> + Send + Sync>;

/// Registration-ordered callbacks for one channel.
pub struct ListenerList<T> {
    next_id: AtomicU64,
    entries: RwLock<Vec<(u64, Callback<T>)>>,
}

impl<T: 'static> ListenerList<T> {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            entries: RwLock::new(Vec::new()),
        }
    }

    /// Register `callback` and return the handle that removes it.
    pub fn add<F>(self: &Arc<Self>, callback: F) -> Subscription
    where
        F: Fn(&T) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.entries.write().push((id, Arc::new(callback)));

        let list: Weak<Self> = Arc::downgrade(self);
        Subscription {
            remove: Box::new(move || list.upgrade().is_some_and(|list| list.remove(id))),
        }
    }

    fn remove(&self, id: u64) -> bool {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|(entry_id, _)| *entry_id != id);
        entries.len() != before
    }

    /// Number of registered callbacks.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Invoke every callback with `value`. Returns how many failed.
    ///
    /// The list is snapshotted first, so callbacks may subscribe or
    /// unsubscribe without deadlocking; such changes apply from the next
    /// notification on.
    pub fn notify(&self, value: &T, channel: &str) -> usize {
        let snapshot: Vec<(u64, Callback<T>)> = self.entries.read().clone();
        let mut failures = 0;

        for (id, callback) in snapshot {
            match catch_unwind(AssertUnwindSafe(|| callback(value))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    failures += 1;
                    error!(channel = %channel, listener = id, error = %e, "listener failed");
                }
                Err(_) => {
                    failures += 1;
                    error!(channel = %channel, listener = id, "listener panicked");
                }
            }
        }

        failures
    }
}

impl<T: 'static> Default for ListenerList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for ListenerList<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerList")
            .field("len", &self.entries.read().len())
            .finish()
    }
}

/// Handle returned by a subscription.
///
/// Dropping the handle does not unsubscribe; call [`Subscription::unsubscribe`].
#[must_use = "keep the subscription to be able to unsubscribe later"]
pub struct Subscription {
    remove: Box<dyn Fn() -> bool + Send + Sync>,
}

impl Subscription {
    /// Remove exactly the callback this handle was issued for.
    ///
    /// Returns `false` if it was already removed.
    pub fn unsubscribe(&self) -> bool {
        (self.remove)()
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[test]
    fn callbacks_run_in_registration_order() {
        let list = Arc::new(ListenerList::<u32>::new());
        let seen = Arc::new(Mutex::new(Vec::new()));

        for tag in ["first", "second", "third"] {
            let seen = Arc::clone(&seen);
            let _ = list.add(move |v: &u32| {
                seen.lock().push(format!("{tag}:{v}"));
                Ok(())
            });
        }

        assert_eq!(list.notify(&7, "test"), 0);
        assert_eq!(*seen.lock(), vec!["first:7", "second:7", "third:7"]);
    }

    #[test]
    fn failing_and_panicking_callbacks_are_isolated() {
        let list = Arc::new(ListenerList::<u32>::new());
        let hits = Arc::new(Mutex::new(0));

        let _ = list.add(|_: &u32| anyhow::bail!("boom"));
        let _ = list.add(|_: &u32| panic!("listener exploded"));
        let counter = Arc::clone(&hits);
        let _ = list.add(move |_: &u32| {
            *counter.lock() += 1;
            Ok(())
        });

        assert_eq!(list.notify(&1, "test"), 2);
        assert_eq!(*hits.lock(), 1);
    }

    #[test]
    fn unsubscribe_removes_only_that_callback() {
        let list = Arc::new(ListenerList::<u32>::new());
        let a = list.add(|_: &u32| Ok(()));
        let _b = list.add(|_: &u32| Ok(()));
        assert_eq!(list.len(), 2);

        assert!(a.unsubscribe());
        assert_eq!(list.len(), 1);

        // Second removal is a no-op.
        assert!(!a.unsubscribe());
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn unsubscribe_after_list_dropped_is_noop() {
        let list = Arc::new(ListenerList::<u32>::new());
        let sub = list.add(|_: &u32| Ok(()));
        drop(list);
        assert!(!sub.unsubscribe());
    }
}
