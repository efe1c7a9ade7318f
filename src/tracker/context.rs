/*!
 * Context Binding
 * One tracker per execution context, bound through a thread-local slot
 *
 * Rebinding closes the previous tracker first; operations on an unbound
 * context fail fast with a usage error, because instrumentation calls made
 * before registration indicate a caller bug.
 */

use super::session::Tracker;
use crate::core::errors::{UsageError, UsageResult};
use std::cell::RefCell;
use std::sync::Arc;

thread_local! {
    static CURRENT: RefCell<Option<Arc<Tracker>>> = RefCell::new(None);
}

/// Bind a tracker to the current execution context. Any previously bound
/// tracker is closed (exactly once) before the new one becomes active.
pub fn register(tracker: impl Into<Arc<Tracker>>) -> Arc<Tracker> {
    let tracker = tracker.into();
    CURRENT.with(|slot| {
        if let Some(previous) = slot.borrow_mut().replace(Arc::clone(&tracker)) {
            previous.close();
        }
    });
    tracker
}

/// Close and unbind the current context's tracker, if any
pub fn deregister() {
    CURRENT.with(|slot| {
        if let Some(previous) = slot.borrow_mut().take() {
            previous.close();
        }
    });
}

/// The tracker bound to this context
pub fn current() -> UsageResult<Arc<Tracker>> {
    CURRENT
        .with(|slot| slot.borrow().clone())
        .ok_or(UsageError::NoTracker)
}

pub fn is_registered() -> bool {
    CURRENT.with(|slot| slot.borrow().is_some())
}

/// Run `f` against the bound tracker, failing fast when none is bound
pub fn with_current<R>(f: impl FnOnce(&Tracker) -> R) -> UsageResult<R> {
    let tracker = current()?;
    Ok(f(&tracker))
}
