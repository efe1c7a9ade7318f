/*!
 * File Rule Store
 * Property-file-backed store with background change detection
 *
 * Format: `key=SEVERITY[:pattern]` per line; `#` and `!` start comments.
 * A reload thread polls the file mtime at the configured interval and
 * replays content changes to subscribers as per-key events followed by a
 * `Reloaded` event. Read failures leave the previous contents in place.
 */

use super::{RuleStore, RuleStoreListener, StoreEvent};
use crate::config::Config;
use crate::core::errors::{StoreError, StoreResult};
use crate::core::listeners::{ListenerId, Listeners};
use dashmap::DashMap;
use parking_lot::{Condvar, Mutex};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, SystemTime};
use tracing::{debug, warn};

pub struct FileRuleStore {
    inner: Arc<Inner>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

struct Inner {
    name: String,
    path: PathBuf,
    reload_interval: Duration,
    entries: DashMap<String, String>,
    listeners: Listeners<dyn RuleStoreListener>,
    open: AtomicBool,
    stop: Mutex<bool>,
    stop_signal: Condvar,
    last_modified: Mutex<Option<SystemTime>>,
}

impl FileRuleStore {
    pub fn new(path: impl Into<PathBuf>, reload_interval: Duration) -> Self {
        let path = path.into();
        Self {
            inner: Arc::new(Inner {
                name: path.display().to_string(),
                path,
                reload_interval,
                entries: DashMap::new(),
                listeners: Listeners::new(),
                open: AtomicBool::new(false),
                stop: Mutex::new(false),
                stop_signal: Condvar::new(),
                last_modified: Mutex::new(None),
            }),
            worker: Mutex::new(None),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.rule_file, config.reload_interval)
    }

    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    fn spawn_reload_thread(&self) -> StoreResult<()> {
        let inner = Arc::clone(&self.inner);
        let handle = std::thread::Builder::new()
            .name("optrack-rule-reload".into())
            .spawn(move || {
                let mut stopped = inner.stop.lock();
                loop {
                    if *stopped {
                        break;
                    }
                    let timed_out = inner
                        .stop_signal
                        .wait_for(&mut stopped, inner.reload_interval)
                        .timed_out();
                    if *stopped {
                        break;
                    }
                    if timed_out {
                        drop(stopped);
                        inner.check_reload();
                        stopped = inner.stop.lock();
                    }
                }
            })
            .map_err(|e| StoreError::Io(format!("failed to spawn reload thread: {e}")))?;
        *self.worker.lock() = Some(handle);
        Ok(())
    }
}

impl RuleStore for FileRuleStore {
    fn name(&self) -> &str {
        &self.inner.name
    }

    fn open(&self) -> StoreResult<()> {
        if self.is_open() {
            return Ok(());
        }
        let content = std::fs::read_to_string(&self.inner.path).map_err(|e| {
            StoreError::OpenFailed {
                path: self.inner.name.clone(),
                cause: e.to_string(),
            }
        })?;
        self.inner.entries.clear();
        for (key, value) in parse_properties(&content) {
            self.inner.entries.insert(key, value);
        }
        *self.inner.last_modified.lock() = modified_time(&self.inner.path);
        *self.inner.stop.lock() = false;
        self.inner.open.store(true, Ordering::Release);

        if !self.inner.reload_interval.is_zero() {
            self.spawn_reload_thread()?;
        }
        debug!(store = %self.inner.name, keys = self.inner.entries.len(), "rule store opened");
        Ok(())
    }

    fn close(&self) -> StoreResult<()> {
        self.inner.open.store(false, Ordering::Release);
        {
            let mut stopped = self.inner.stop.lock();
            *stopped = true;
            self.inner.stop_signal.notify_all();
        }
        if let Some(handle) = self.worker.lock().take() {
            let _ = handle.join();
        }
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.inner.open.load(Ordering::Acquire)
    }

    fn get(&self, key: &str) -> Option<String> {
        self.inner.entries.get(key).map(|v| v.value().clone())
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        self.inner.ensure_open()?;
        let previous = self
            .inner
            .entries
            .insert(key.to_string(), value.to_string());
        self.inner.persist()?;
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
        self.inner.listeners.notify(|l| l.store_event(&event));
        Ok(())
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        self.inner.ensure_open()?;
        if self.inner.entries.remove(key).is_some() {
            self.inner.persist()?;
            let event = StoreEvent::KeyCleared {
                key: key.to_string(),
            };
            self.inner.listeners.notify(|l| l.store_event(&event));
        }
        Ok(())
    }

    fn keys(&self) -> Vec<String> {
        self.inner.entries.iter().map(|e| e.key().clone()).collect()
    }

    fn subscribe(&self, listener: Arc<dyn RuleStoreListener>) -> ListenerId {
        self.inner.listeners.subscribe(listener)
    }

    fn unsubscribe(&self, id: ListenerId) {
        self.inner.listeners.unsubscribe(id);
    }
}

impl Drop for FileRuleStore {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

impl Inner {
    fn ensure_open(&self) -> StoreResult<()> {
        if self.open.load(Ordering::Acquire) {
            Ok(())
        } else {
            Err(StoreError::NotOpen)
        }
    }

    /// Re-read the file when its mtime moved, replaying the content diff
    /// to subscribers. Runs on the reload thread.
    fn check_reload(&self) {
        if !self.open.load(Ordering::Acquire) {
            return;
        }
        let current = match std::fs::metadata(&self.path).and_then(|m| m.modified()) {
            Ok(mtime) => mtime,
            Err(e) => {
                let error = StoreError::Io(format!("stat {}: {e}", self.name));
                warn!(store = %self.name, %error, "rule file check failed");
                self.listeners
                    .notify(|l| l.store_event(&StoreEvent::Error(error.clone())));
                return;
            }
        };
        {
            let mut last = self.last_modified.lock();
            if *last == Some(current) {
                return;
            }
            *last = Some(current);
        }

        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) => {
                let error = StoreError::Io(format!("read {}: {e}", self.name));
                warn!(store = %self.name, %error, "rule file reload failed");
                self.listeners
                    .notify(|l| l.store_event(&StoreEvent::Error(error.clone())));
                return;
            }
        };

        let fresh: HashMap<String, String> = parse_properties(&content).collect();
        let stale: HashMap<String, String> = self
            .entries
            .iter()
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect();

        for (key, value) in &fresh {
            match stale.get(key) {
                None => {
                    self.entries.insert(key.clone(), value.clone());
                    let event = StoreEvent::KeyAdded {
                        key: key.clone(),
                        value: value.clone(),
                    };
                    self.listeners.notify(|l| l.store_event(&event));
                }
                Some(old) if old != value => {
                    self.entries.insert(key.clone(), value.clone());
                    let event = StoreEvent::KeySet {
                        key: key.clone(),
                        value: value.clone(),
                    };
                    self.listeners.notify(|l| l.store_event(&event));
                }
                Some(_) => {}
            }
        }
        for key in stale.keys() {
            if !fresh.contains_key(key) {
                self.entries.remove(key);
                let event = StoreEvent::KeyCleared { key: key.clone() };
                self.listeners.notify(|l| l.store_event(&event));
            }
        }

        debug!(store = %self.name, keys = fresh.len(), "rule file reloaded");
        self.listeners.notify(|l| l.store_event(&StoreEvent::Reloaded));
    }

    /// Write the current contents back to the file, keys sorted for a
    /// stable layout. Also refreshes the recorded mtime so the reload
    /// thread does not replay our own write as an external change.
    fn persist(&self) -> StoreResult<()> {
        let mut lines: Vec<String> = self
            .entries
            .iter()
            .map(|e| format!("{}={}", e.key(), e.value()))
            .collect();
        lines.sort();
        let mut content = lines.join("\n");
        content.push('\n');
        std::fs::write(&self.path, content)?;
        *self.last_modified.lock() = modified_time(&self.path);
        Ok(())
    }
}

fn modified_time(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}

fn parse_properties(content: &str) -> impl Iterator<Item = (String, String)> + '_ {
    content.lines().filter_map(|line| {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
            return None;
        }
        let (key, value) = line.split_once('=')?;
        let key = key.trim();
        if key.is_empty() {
            return None;
        }
        Some((key.to_string(), value.trim().to_string()))
    })
}
