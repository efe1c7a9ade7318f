/*!
 * In-Memory Rule Store
 * Process-local store for embedding and tests
 *
 * Mutations echo synchronously to subscribers on the mutating thread,
 * which makes selector round-trips deterministic in tests.
 */

use super::{RuleStore, RuleStoreListener, StoreEvent};
use crate::core::errors::{StoreError, StoreResult};
use crate::core::listeners::{ListenerId, Listeners};
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub struct MemoryRuleStore {
    name: String,
    entries: DashMap<String, String>,
    listeners: Listeners<dyn RuleStoreListener>,
    open: AtomicBool,
}

impl MemoryRuleStore {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: DashMap::new(),
            listeners: Listeners::new(),
            open: AtomicBool::new(false),
        }
    }

    /// Pre-populated store, still requires `open()` before use
    pub fn with_rules<K, V>(name: impl Into<String>, rules: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let store = Self::new(name);
        for (key, value) in rules {
            store.entries.insert(key.into(), value.into());
        }
        store
    }

    /// Drop every key and notify subscribers with a single `Cleared` event
    pub fn clear(&self) -> StoreResult<()> {
        self.ensure_open()?;
        self.entries.clear();
        self.listeners.notify(|l| l.store_event(&StoreEvent::Cleared));
        Ok(())
    }

    /// Replace the whole contents and notify subscribers with `Reloaded`,
    /// simulating an external reload cycle
    pub fn replace_all<K, V>(&self, rules: impl IntoIterator<Item = (K, V)>) -> StoreResult<()>
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.ensure_open()?;
        self.entries.clear();
        for (key, value) in rules {
            self.entries.insert(key.into(), value.into());
        }
        self.listeners.notify(|l| l.store_event(&StoreEvent::Reloaded));
        Ok(())
    }

    /// Deliver a synthetic error event to subscribers
    pub fn inject_error(&self, error: StoreError) {
        self.listeners
            .notify(|l| l.store_event(&StoreEvent::Error(error.clone())));
    }

    fn ensure_open(&self) -> StoreResult<()> {
        if self.open.load(Ordering::Acquire) {
            Ok(())
        } else {
            Err(StoreError::NotOpen)
        }
    }
}

impl RuleStore for MemoryRuleStore {
    fn name(&self) -> &str {
        &self.name
    }

    fn open(&self) -> StoreResult<()> {
        self.open.store(true, Ordering::Release);
        Ok(())
    }

    fn close(&self) -> StoreResult<()> {
        self.open.store(false, Ordering::Release);
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).map(|v| v.value().clone())
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        self.ensure_open()?;
        let previous = self.entries.insert(key.to_string(), value.to_string());
        let event = match previous {
            None => StoreEvent::KeyAdded {
                key: key.to_string(),
                value: value.to_string(),
            },
            Some(_) => StoreEvent::KeySet {
                key: key.to_string(),
                value: value.to_string(),
            },
        };
        self.listeners.notify(|l| l.store_event(&event));
        Ok(())
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        self.ensure_open()?;
        if self.entries.remove(key).is_some() {
            let event = StoreEvent::KeyCleared {
                key: key.to_string(),
            };
            self.listeners.notify(|l| l.store_event(&event));
        }
        Ok(())
    }

    fn keys(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.key().clone()).collect()
    }

    fn subscribe(&self, listener: Arc<dyn RuleStoreListener>) -> ListenerId {
        self.listeners.subscribe(listener)
    }

    fn unsubscribe(&self, id: ListenerId) {
        self.listeners.unsubscribe(id);
    }
}
