/*!
 * Event Sinks
 * Destinations for accepted records, with filter chains and listeners
 */

mod buffer;
mod filter;
mod tracing_sink;

pub use buffer::{BufferSink, BufferStats, SinkItem};
pub use filter::{SinkFilter, ThresholdFilter};
pub use tracing_sink::{init_diagnostics, TracingSink};

use crate::core::errors::{SinkError, SinkResult};
use crate::core::listeners::{ListenerId, Listeners};
use crate::core::severity::Severity;
use crate::tracker::{Activity, Event};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Record shape passed to log-occurred listeners
pub enum SinkRecord<'a> {
    Event(&'a Event),
    Activity(&'a Activity),
    Message { severity: Severity, message: &'a str },
}

/// Notified after a record is delivered to the sink backend
pub trait SinkLogListener: Send + Sync {
    fn log_occurred(&self, record: &SinkRecord<'_>);
}

/// Notified when a sink fails to deliver a record
pub trait SinkErrorListener: Send + Sync {
    fn log_failed(&self, error: &SinkError);
}

/// Destination for accepted records. Implementations embed a [`SinkCore`]
/// for the filter chain and listener fan-out, and route delivered records
/// to their backend.
pub trait EventSink: Send + Sync {
    fn name(&self) -> &str;

    /// Shared filter/listener state
    fn core(&self) -> &SinkCore;

    /// Whether the backend will record this severity at all. Required for
    /// delivery regardless of which filters are configured.
    fn is_enabled(&self, severity: Severity) -> bool;

    fn log_event(&self, event: Event) -> SinkResult<()>;
    fn log_activity(&self, activity: Activity) -> SinkResult<()>;
    fn log_message(&self, severity: Severity, message: &str) -> SinkResult<()>;

    fn open(&self) -> SinkResult<()> {
        self.core().set_open(true);
        Ok(())
    }

    fn close(&self) -> SinkResult<()> {
        self.core().set_open(false);
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.core().is_open()
    }

    fn add_filter(&self, filter: Arc<dyn SinkFilter>) {
        self.core().add_filter(filter);
    }

    fn on_logged(&self, listener: Arc<dyn SinkLogListener>) -> ListenerId {
        self.core().logged.subscribe(listener)
    }

    fn remove_logged(&self, id: ListenerId) {
        self.core().logged.unsubscribe(id);
    }

    fn on_failed(&self, listener: Arc<dyn SinkErrorListener>) -> ListenerId {
        self.core().failed.subscribe(listener)
    }

    fn remove_failed(&self, id: ListenerId) {
        self.core().failed.unsubscribe(id);
    }
}

/// Filter chain and listener fan-out shared by sink implementations.
/// Filters are ANDed in registration order and short-circuit on the first
/// veto; the sink's own severity enablement is then required on top.
pub struct SinkCore {
    filters: RwLock<Vec<Arc<dyn SinkFilter>>>,
    pub(crate) logged: Listeners<dyn SinkLogListener>,
    pub(crate) failed: Listeners<dyn SinkErrorListener>,
    open: AtomicBool,
}

impl SinkCore {
    /// Core that starts open; sinks without backend resources to acquire
    /// are usable immediately.
    pub fn new() -> Self {
        Self {
            filters: RwLock::new(Vec::new()),
            logged: Listeners::new(),
            failed: Listeners::new(),
            open: AtomicBool::new(true),
        }
    }

    pub fn set_open(&self, open: bool) {
        self.open.store(open, Ordering::Release);
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    pub fn add_filter(&self, filter: Arc<dyn SinkFilter>) {
        self.filters.write().push(filter);
    }

    pub fn filter_count(&self) -> usize {
        self.filters.read().len()
    }

    fn filters(&self) -> Vec<Arc<dyn SinkFilter>> {
        self.filters.read().iter().map(Arc::clone).collect()
    }

    /// Run the chain over an event. Filters may stamp the record's TTL
    /// before the verdict.
    pub fn accept_event(&self, sink: &dyn EventSink, event: &mut Event) -> bool {
        for filter in self.filters() {
            if !filter.accept_event(sink, event) {
                return false;
            }
        }
        sink.is_enabled(event.severity())
    }

    pub fn accept_activity(&self, sink: &dyn EventSink, activity: &mut Activity) -> bool {
        for filter in self.filters() {
            if !filter.accept_activity(sink, activity) {
                return false;
            }
        }
        sink.is_enabled(activity.severity())
    }

    pub fn accept_message(&self, sink: &dyn EventSink, severity: Severity, message: &str) -> bool {
        for filter in self.filters() {
            if !filter.accept_message(sink, severity, message) {
                return false;
            }
        }
        sink.is_enabled(severity)
    }

    pub fn notify_logged(&self, record: &SinkRecord<'_>) {
        self.logged.notify(|l| l.log_occurred(record));
    }

    pub fn notify_failed(&self, error: &SinkError) {
        self.failed.notify(|l| l.log_failed(error));
    }
}

impl Default for SinkCore {
    fn default() -> Self {
        Self::new()
    }
}
