/*!
 * Tracker Session
 * Per-execution-context session minting and reporting records
 *
 * A tracker is bound to one logical execution context and is not meant to
 * be shared across threads. `report_*` is the single path by which a
 * record leaves the in-memory graph: selector consult, then the sink's
 * filter chain, then delivery.
 */

use super::activity::Activity;
use super::event::Event;
use crate::core::errors::{SinkError, SinkResult};
use crate::core::severity::{CompCode, OpType, Severity};
use crate::core::types::Usec;
use crate::selector::SelectorEngine;
use crate::sink::EventSink;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tracing::warn;

/// Reporting counters for one tracker session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerStats {
    /// Records handed to the sink (the sink's filters may still veto)
    pub reported: u64,
    /// Records dropped by the selector before reaching the sink
    pub dropped: u64,
}

pub struct Tracker {
    source: String,
    selector: Arc<SelectorEngine>,
    sink: Arc<dyn EventSink>,
    reported: AtomicU64,
    dropped: AtomicU64,
    closed: AtomicBool,
}

impl Tracker {
    pub fn new(
        source: impl Into<String>,
        selector: Arc<SelectorEngine>,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            source: source.into(),
            selector,
            sink,
            reported: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
            closed: AtomicBool::new(false),
        }
    }

    #[inline]
    pub fn source(&self) -> &str {
        &self.source
    }

    #[inline]
    pub fn selector(&self) -> &Arc<SelectorEngine> {
        &self.selector
    }

    #[inline]
    pub fn sink(&self) -> &Arc<dyn EventSink> {
        &self.sink
    }

    // --- construction (no filtering yet) ---

    pub fn new_event(
        &self,
        severity: Severity,
        op_type: OpType,
        op_name: impl Into<String>,
        message: impl Into<String>,
    ) -> Event {
        Event::new(severity, op_type, op_name, message)
    }

    pub fn new_activity(&self, name: impl Into<String>) -> Activity {
        Activity::new(name)
    }

    // --- reporting ---

    /// Report a completed event. Dropped silently when the selector
    /// disables this severity for the tracker's source; otherwise the
    /// sink's filter chain decides.
    pub fn report_event(&self, event: Event) -> SinkResult<()> {
        if self.is_closed() {
            return Err(SinkError::Closed);
        }
        if !self.selector.is_allowed(event.severity(), &self.source) {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            return Ok(());
        }
        self.sink.log_event(event)?;
        self.reported.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Report a completed activity
    pub fn report_activity(&self, activity: Activity) -> SinkResult<()> {
        if self.is_closed() {
            return Err(SinkError::Closed);
        }
        if !self.selector.is_allowed(activity.severity(), &self.source) {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            return Ok(());
        }
        self.sink.log_activity(activity)?;
        self.reported.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Report a standalone message
    pub fn log(&self, severity: Severity, message: &str) -> SinkResult<()> {
        if self.is_closed() {
            return Err(SinkError::Closed);
        }
        if !self.selector.is_allowed(severity, &self.source) {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            return Ok(());
        }
        self.sink.log_message(severity, message)?;
        self.reported.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// One-shot convenience for caller-timed work: builds an event with a
    /// backdated start, stops it (with a warning comp code when an error
    /// text is supplied), and reports it.
    pub fn report_completed(
        &self,
        severity: Severity,
        op_type: OpType,
        op_name: impl Into<String>,
        correlator: Option<&str>,
        elapsed: Usec,
        message: impl Into<String>,
        error: Option<&str>,
    ) -> SinkResult<()> {
        let mut event = Event::new(severity, op_type, op_name, message);
        if let Some(correlator) = correlator {
            event = event.with_correlator(correlator);
        }
        let comp_code = if error.is_some() {
            CompCode::Warning
        } else {
            CompCode::Success
        };
        // freshly created above, the backdated stop cannot fail
        let _ = event.stop_backdated_with(elapsed, comp_code, error);
        self.report_event(event)
    }

    /// Conditional keyed logging: does a rule enable this severity for an
    /// arbitrary key (and optional value)?
    pub fn is_enabled(&self, severity: Severity, key: &str, value: Option<&str>) -> bool {
        self.selector.is_enabled(severity, key, value)
    }

    pub fn stats(&self) -> TrackerStats {
        TrackerStats {
            reported: self.reported.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Close this session and its sink. Idempotent: only the first call
    /// closes the sink.
    pub fn close(&self) {
        if self
            .closed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            if let Err(error) = self.sink.close() {
                warn!(source = %self.source, %error, "sink close failed");
            }
        }
    }
}
