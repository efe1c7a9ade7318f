/*!
 * Rule Stores
 * Keyed stores of raw sampling-rule text with change notifications
 *
 * The selector engine never reads rule files itself; it consumes this
 * narrow capability. Stores own the raw `key=SEVERITY[:pattern]` text and
 * tell subscribers when it changes.
 */

mod file;
mod memory;

pub use file::FileRuleStore;
pub use memory::MemoryRuleStore;

use crate::core::errors::{StoreError, StoreResult};
use crate::core::listeners::ListenerId;
use std::sync::Arc;

/// Change notification delivered to rule store subscribers. Delivery runs
/// on whatever thread mutated the store (the reload thread for file
/// stores), potentially concurrent with application reads.
#[derive(Debug, Clone)]
pub enum StoreEvent {
    KeyAdded { key: String, value: String },
    KeySet { key: String, value: String },
    KeyCleared { key: String },
    Cleared,
    Reloaded,
    Error(StoreError),
}

/// Subscriber to rule store changes
pub trait RuleStoreListener: Send + Sync {
    fn store_event(&self, event: &StoreEvent);
}

/// Keyed string store with change notifications. The selector engine
/// depends on this capability alone; the backing medium (file, memory,
/// anything else) is an implementation concern.
pub trait RuleStore: Send + Sync {
    /// Human-readable identity, used in diagnostics
    fn name(&self) -> &str;

    fn open(&self) -> StoreResult<()>;
    fn close(&self) -> StoreResult<()>;
    fn is_open(&self) -> bool;

    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> StoreResult<()>;
    fn remove(&self, key: &str) -> StoreResult<()>;
    fn keys(&self) -> Vec<String>;

    fn subscribe(&self, listener: Arc<dyn RuleStoreListener>) -> ListenerId;
    fn unsubscribe(&self, id: ListenerId);
}
