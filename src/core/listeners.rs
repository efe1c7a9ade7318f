/*!
 * Listener Registry
 * Subscription list with stable order and copy-on-notify semantics
 */

use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Handle returned by [`Listeners::subscribe`], used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Ordered listener registry. Notification iterates a snapshot of the
/// subscription list, so a listener that unsubscribes (or subscribes)
/// during a callback cannot corrupt the iteration. A listener that panics
/// is contained and logged; remaining listeners still run.
pub struct Listeners<T: ?Sized> {
    entries: RwLock<Vec<(ListenerId, Arc<T>)>>,
    next_id: AtomicU64,
}

impl<T: ?Sized> Listeners<T> {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn subscribe(&self, listener: Arc<T>) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.entries.write().push((id, listener));
        id
    }

    pub fn unsubscribe(&self, id: ListenerId) {
        self.entries.write().retain(|(lid, _)| *lid != id);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Snapshot of the current listeners, in subscription order
    pub fn snapshot(&self) -> Vec<Arc<T>> {
        self.entries
            .read()
            .iter()
            .map(|(_, l)| Arc::clone(l))
            .collect()
    }

    /// Invoke `f` for each subscribed listener. Panics in a callback are
    /// contained so that one misbehaving listener cannot starve the rest or
    /// skip resource cleanup in the caller.
    pub fn notify(&self, mut f: impl FnMut(&T)) {
        for listener in self.snapshot() {
            let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                f(&listener);
            }));
            if result.is_err() {
                tracing::warn!("listener panicked during notification");
            }
        }
    }
}

impl<T: ?Sized> Default for Listeners<T> {
    fn default() -> Self {
        Self::new()
    }
}
