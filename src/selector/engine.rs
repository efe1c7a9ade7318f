/*!
 * Selector Engine
 * Runtime sampling decisions from a live-reloading token table
 *
 * The table is an immutable map behind an atomic pointer swap: application
 * threads read without blocking while store notifications (delivered on
 * the store's reload thread) replace tokens wholesale. A reader sees either
 * the fully-old or fully-new token for a key, never a partial one.
 */

use super::token::{Token, TokenParseError};
use crate::core::errors::StoreResult;
use crate::core::listeners::ListenerId;
use crate::core::severity::Severity;
use crate::store::{RuleStore, RuleStoreListener, StoreEvent};
use arc_swap::ArcSwap;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use tracing::{debug, error, warn};

type TokenTable = HashMap<String, Arc<Token>>;

pub struct SelectorEngine {
    store: Arc<dyn RuleStore>,
    table: Arc<ArcSwap<TokenTable>>,
    default_level: Severity,
    subscription: Mutex<Option<ListenerId>>,
}

impl SelectorEngine {
    pub fn new(store: Arc<dyn RuleStore>, default_level: Severity) -> Self {
        Self {
            store,
            table: Arc::new(ArcSwap::from_pointee(TokenTable::new())),
            default_level,
            subscription: Mutex::new(None),
        }
    }

    /// Open the backing store, load every rule synchronously, and subscribe
    /// to future changes. A store open failure propagates to the caller.
    pub fn open(&self) -> StoreResult<()> {
        self.store.open()?;
        let updater = Arc::new(TableUpdater {
            table: Arc::clone(&self.table),
            store: Arc::downgrade(&self.store),
        });
        let id = self.store.subscribe(updater);
        *self.subscription.lock() = Some(id);
        self.table
            .store(Arc::new(build_table(self.store.as_ref())));
        debug!(store = self.store.name(), rules = self.rule_count(), "selector opened");
        Ok(())
    }

    /// Unsubscribe, drop the table, and close the backing store
    pub fn close(&self) -> StoreResult<()> {
        if let Some(id) = self.subscription.lock().take() {
            self.store.unsubscribe(id);
        }
        self.table.store(Arc::new(TokenTable::new()));
        self.store.close()
    }

    pub fn is_open(&self) -> bool {
        self.store.is_open()
    }

    /// Strict rule check: a key with no token is disabled. When `value` is
    /// supplied and the token carries a pattern, the whole value must match.
    pub fn is_enabled(&self, severity: Severity, key: &str, value: Option<&str>) -> bool {
        self.table
            .load()
            .get(key)
            .map(|token| token.matches(severity, value))
            .unwrap_or(false)
    }

    /// Report-path check: the token decides when one exists for the key;
    /// otherwise the configured default threshold applies.
    pub fn is_allowed(&self, severity: Severity, key: &str) -> bool {
        match self.table.load().get(key) {
            Some(token) => token.matches(severity, None),
            None => severity >= self.default_level,
        }
    }

    /// Write a rule through the backing store. The table is updated only by
    /// the store's echo notification, keeping the store the single writer
    /// of truth.
    pub fn set_rule(&self, severity: Severity, key: &str, value: Option<&str>) -> StoreResult<()> {
        let raw = match value {
            Some(value) => format!("{severity}:{value}"),
            None => severity.to_string(),
        };
        self.store.set(key, &raw)
    }

    /// Clear a rule from the backing store. Removing an absent key is a
    /// no-op, so repeated removal is harmless.
    pub fn remove_rule(&self, key: &str) -> StoreResult<()> {
        self.store.remove(key)
    }

    /// Raw rule text backing a key's token, if one is loaded
    pub fn get_rule(&self, key: &str) -> Option<String> {
        self.table.load().get(key).map(|t| t.raw().to_string())
    }

    pub fn rule_count(&self) -> usize {
        self.table.load().len()
    }

    #[inline]
    pub fn default_level(&self) -> Severity {
        self.default_level
    }
}

/// Store subscription that maintains the token table. Runs on whatever
/// thread the store delivers notifications from.
struct TableUpdater {
    table: Arc<ArcSwap<TokenTable>>,
    store: Weak<dyn RuleStore>,
}

impl RuleStoreListener for TableUpdater {
    fn store_event(&self, event: &StoreEvent) {
        match event {
            StoreEvent::KeyAdded { key, value } | StoreEvent::KeySet { key, value } => {
                upsert_token(&self.table, key, value);
            }
            StoreEvent::KeyCleared { key } => {
                self.table.rcu(|table| {
                    let mut next = TokenTable::clone(table);
                    next.remove(key);
                    next
                });
            }
            StoreEvent::Cleared => {
                self.table.store(Arc::new(TokenTable::new()));
            }
            StoreEvent::Reloaded => {
                if let Some(store) = self.store.upgrade() {
                    self.table.store(Arc::new(build_table(store.as_ref())));
                }
            }
            StoreEvent::Error(cause) => {
                // table left as-is
                error!(%cause, "rule store reported an error");
            }
        }
    }
}

/// Parse and install one key's rule. Failures are isolated to the key:
/// logged, skipped, the previous token (if any) left in place.
fn upsert_token(table: &ArcSwap<TokenTable>, key: &str, value: &str) {
    match Token::parse(key, value) {
        Ok(token) => {
            let token = Arc::new(token);
            table.rcu(|table| {
                let mut next = TokenTable::clone(table);
                next.insert(key.to_string(), Arc::clone(&token));
                next
            });
        }
        Err(TokenParseError::EmptyRule) => {}
        Err(cause) => {
            warn!(key, value, %cause, "skipping malformed sampling rule");
        }
    }
}

/// Drain every key from the store into a fresh table, skipping keys that
/// fail to parse.
fn build_table(store: &dyn RuleStore) -> TokenTable {
    let mut table = TokenTable::new();
    for key in store.keys() {
        let Some(raw) = store.get(&key) else { continue };
        match Token::parse(&key, &raw) {
            Ok(token) => {
                table.insert(key, Arc::new(token));
            }
            Err(TokenParseError::EmptyRule) => {}
            Err(cause) => {
                warn!(key = %key, value = %raw, %cause, "skipping malformed sampling rule");
            }
        }
    }
    table
}
