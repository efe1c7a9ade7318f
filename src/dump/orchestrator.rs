/*!
 * Dump Orchestrator
 * Coordinates providers and sinks with isolated failure domains
 *
 * One batch runs at a time process-wide. No single provider or sink
 * failure aborts a batch, and every sink the batch opened is closed on
 * every path out.
 */

use super::{DumpCollection, DumpError, DumpListener, DumpNotice, DumpProvider, DumpSink};
use crate::core::limits::SHUTDOWN_DUMP_REASON;
use crate::core::listeners::{ListenerId, Listeners};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

struct ProviderEntry {
    provider: Arc<dyn DumpProvider>,
    sinks: Vec<Arc<dyn DumpSink>>,
}

pub struct DumpOrchestrator {
    default_sink: Arc<dyn DumpSink>,
    entries: Mutex<Vec<ProviderEntry>>,
    listeners: Listeners<dyn DumpListener>,
    batch: Mutex<()>,
    dump_on_exit: AtomicBool,
}

impl DumpOrchestrator {
    pub fn new(default_sink: Arc<dyn DumpSink>) -> Self {
        Self {
            default_sink,
            entries: Mutex::new(Vec::new()),
            listeners: Listeners::new(),
            batch: Mutex::new(()),
            dump_on_exit: AtomicBool::new(false),
        }
    }

    /// Orchestrator honoring the config knobs: a file sink at the
    /// configured dump path, the built-in providers when enabled, and the
    /// shutdown dump armed when enabled.
    pub fn from_config(config: &crate::config::Config) -> Self {
        let sink = Arc::new(super::FileDumpSink::new(&config.dump_path));
        let orchestrator = Self::new(sink);
        if config.default_dump_providers {
            orchestrator.add_provider(Arc::new(super::ProcessInfoProvider::new()));
            orchestrator.add_provider(Arc::new(super::RuntimePropsProvider::new()));
        }
        orchestrator.dump_on_shutdown(config.dump_on_exit);
        orchestrator
    }

    /// Register a provider against the default sink
    pub fn add_provider(&self, provider: Arc<dyn DumpProvider>) {
        let sink = Arc::clone(&self.default_sink);
        self.add_provider_with_sink(provider, sink);
    }

    /// Register a provider against a specific sink. Idempotent: a provider
    /// registers once, and a sink associates with a provider once;
    /// registration and association order are preserved.
    pub fn add_provider_with_sink(&self, provider: Arc<dyn DumpProvider>, sink: Arc<dyn DumpSink>) {
        let mut entries = self.entries.lock();
        match entries
            .iter_mut()
            .find(|e| Arc::ptr_eq(&e.provider, &provider))
        {
            Some(entry) => {
                if !entry.sinks.iter().any(|s| Arc::ptr_eq(s, &sink)) {
                    entry.sinks.push(sink);
                }
            }
            None => {
                entries.push(ProviderEntry {
                    provider,
                    sinks: vec![sink],
                });
            }
        }
    }

    pub fn provider_count(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn on_dump(&self, listener: Arc<dyn DumpListener>) -> ListenerId {
        self.listeners.subscribe(listener)
    }

    pub fn remove_listener(&self, id: ListenerId) {
        self.listeners.unsubscribe(id);
    }

    /// Run one dump batch: open every distinct sink, poll each provider in
    /// registration order, write its collection to its associated sinks in
    /// association order, then close everything. Synchronous; concurrent
    /// callers queue behind the batch lock.
    pub fn dump(&self, reason: Option<&str>) {
        let _batch = self.batch.lock();

        // snapshot registrations so providers registered mid-batch wait
        // for the next one
        let entries: Vec<(Arc<dyn DumpProvider>, Vec<Arc<dyn DumpSink>>)> = self
            .entries
            .lock()
            .iter()
            .map(|e| (Arc::clone(&e.provider), e.sinks.clone()))
            .collect();

        let sinks = distinct_sinks(&entries);
        let mut opened: Vec<Arc<dyn DumpSink>> = Vec::with_capacity(sinks.len());
        for sink in &sinks {
            match sink.open() {
                Ok(()) => opened.push(Arc::clone(sink)),
                Err(error) => {
                    warn!(sink = sink.name(), %error, "dump sink failed to open");
                    self.notify(&DumpNotice::SinkError {
                        sink: sink.name().to_string(),
                        error,
                    });
                }
            }
        }

        for (provider, sinks) in &entries {
            self.notify(&DumpNotice::Before {
                provider: provider.name().to_string(),
                reason: reason.map(str::to_string),
            });

            let collected = collect_guarded(provider.as_ref());
            let (collection, error) = match collected {
                Ok(mut collection) => {
                    if let Some(reason) = reason {
                        collection.set_reason(reason);
                    }
                    let mut write_error = None;
                    for sink in sinks {
                        if let Err(error) = sink.write(&collection) {
                            warn!(
                                provider = provider.name(),
                                sink = sink.name(),
                                %error,
                                "dump write failed"
                            );
                            write_error = Some(error);
                            break;
                        }
                    }
                    (Some(collection), write_error)
                }
                Err(error) => {
                    warn!(provider = provider.name(), %error, "dump provider failed");
                    (None, Some(error))
                }
            };

            self.notify(&DumpNotice::After {
                provider: provider.name().to_string(),
                collection,
                error,
            });
        }

        self.notify(&DumpNotice::Complete);

        for sink in opened {
            if let Err(error) = sink.close() {
                warn!(sink = sink.name(), %error, "dump sink failed to close");
                self.notify(&DumpNotice::SinkError {
                    sink: sink.name().to_string(),
                    error,
                });
            }
        }
        debug!(providers = entries.len(), "dump batch complete");
    }

    /// Arm or disarm the shutdown dump. Idempotent; consulted by
    /// [`ShutdownDump`] guards when they drop.
    pub fn dump_on_shutdown(&self, enable: bool) {
        self.dump_on_exit.store(enable, Ordering::Release);
    }

    pub fn is_dump_on_shutdown(&self) -> bool {
        self.dump_on_exit.load(Ordering::Acquire)
    }

    /// Guard that runs a shutdown dump when dropped, if armed. Hold it for
    /// the life of `main`.
    pub fn shutdown_guard(self: &Arc<Self>) -> ShutdownDump {
        ShutdownDump {
            orchestrator: Arc::clone(self),
        }
    }

    fn notify(&self, notice: &DumpNotice) {
        self.listeners.notify(|l| l.on_dump(notice));
    }
}

/// Distinct sinks across all registrations, in first-association order
fn distinct_sinks(
    entries: &[(Arc<dyn DumpProvider>, Vec<Arc<dyn DumpSink>>)],
) -> Vec<Arc<dyn DumpSink>> {
    let mut sinks: Vec<Arc<dyn DumpSink>> = Vec::new();
    for (_, entry_sinks) in entries {
        for sink in entry_sinks {
            if !sinks.iter().any(|s| Arc::ptr_eq(s, sink)) {
                sinks.push(Arc::clone(sink));
            }
        }
    }
    sinks
}

/// Poll a provider, containing panics as provider failures
fn collect_guarded(provider: &dyn DumpProvider) -> Result<DumpCollection, DumpError> {
    std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| provider.collect()))
        .unwrap_or_else(|_| Err(DumpError::ProviderFailed("provider panicked".into())))
}

/// RAII trigger for shutdown dumps. Dropping the guard runs
/// `dump("process shutdown")` when the orchestrator is armed.
pub struct ShutdownDump {
    orchestrator: Arc<DumpOrchestrator>,
}

impl Drop for ShutdownDump {
    fn drop(&mut self) {
        if self.orchestrator.is_dump_on_shutdown() {
            self.orchestrator.dump(Some(SHUTDOWN_DUMP_REASON));
        }
    }
}
