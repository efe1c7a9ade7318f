/*!
 * Buffer Sink
 * Bounded lock-free ring of accepted records
 *
 * Producers never block: when the ring is full the record is dropped and
 * counted, and failure listeners are told. Consumers poll with `try_next`
 * or `drain`.
 */

use super::{EventSink, SinkCore, SinkRecord};
use crate::core::errors::{SinkError, SinkResult};
use crate::core::limits::SINK_RING_SIZE;
use crate::core::severity::Severity;
use crate::tracker::{Activity, Event};
use crossbeam_queue::ArrayQueue;
use std::sync::atomic::{AtomicU64, Ordering};

/// Record held by the buffer
#[derive(Debug, Clone)]
pub enum SinkItem {
    Event(Event),
    Activity(Activity),
    Message { severity: Severity, message: String },
}

impl SinkItem {
    pub fn severity(&self) -> Severity {
        match self {
            SinkItem::Event(event) => event.severity(),
            SinkItem::Activity(activity) => activity.severity(),
            SinkItem::Message { severity, .. } => *severity,
        }
    }
}

/// Counters for observing buffer behavior
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BufferStats {
    pub produced: u64,
    pub consumed: u64,
    pub dropped: u64,
}

pub struct BufferSink {
    name: String,
    core: SinkCore,
    queue: ArrayQueue<SinkItem>,
    produced: AtomicU64,
    consumed: AtomicU64,
    dropped: AtomicU64,
    close_count: AtomicU64,
}

impl BufferSink {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_capacity(name, SINK_RING_SIZE)
    }

    pub fn with_capacity(name: impl Into<String>, capacity: usize) -> Self {
        Self {
            name: name.into(),
            core: SinkCore::new(),
            queue: ArrayQueue::new(capacity),
            produced: AtomicU64::new(0),
            consumed: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
            close_count: AtomicU64::new(0),
        }
    }

    fn push(&self, item: SinkItem) {
        match self.queue.push(item) {
            Ok(()) => {
                self.produced.fetch_add(1, Ordering::Relaxed);
            }
            Err(_) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                self.core
                    .notify_failed(&SinkError::WriteFailed("buffer full".into()));
            }
        }
    }

    /// Consume one record
    pub fn try_next(&self) -> Option<SinkItem> {
        self.queue.pop().map(|item| {
            self.consumed.fetch_add(1, Ordering::Relaxed);
            item
        })
    }

    /// Consume everything currently buffered
    pub fn drain(&self) -> Vec<SinkItem> {
        let mut items = Vec::new();
        while let Some(item) = self.try_next() {
            items.push(item);
        }
        items
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn stats(&self) -> BufferStats {
        BufferStats {
            produced: self.produced.load(Ordering::Relaxed),
            consumed: self.consumed.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
        }
    }

    /// Number of times `close()` has been called on this sink
    pub fn close_count(&self) -> u64 {
        self.close_count.load(Ordering::Relaxed)
    }
}

impl EventSink for BufferSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn core(&self) -> &SinkCore {
        &self.core
    }

    fn is_enabled(&self, _severity: Severity) -> bool {
        true
    }

    fn close(&self) -> SinkResult<()> {
        self.close_count.fetch_add(1, Ordering::Relaxed);
        self.core.set_open(false);
        Ok(())
    }

    fn log_event(&self, mut event: Event) -> SinkResult<()> {
        if !self.is_open() {
            return Err(SinkError::Closed);
        }
        if !self.core.accept_event(self, &mut event) {
            return Ok(());
        }
        self.core.notify_logged(&SinkRecord::Event(&event));
        self.push(SinkItem::Event(event));
        Ok(())
    }

    fn log_activity(&self, mut activity: Activity) -> SinkResult<()> {
        if !self.is_open() {
            return Err(SinkError::Closed);
        }
        if !self.core.accept_activity(self, &mut activity) {
            return Ok(());
        }
        self.core.notify_logged(&SinkRecord::Activity(&activity));
        self.push(SinkItem::Activity(activity));
        Ok(())
    }

    fn log_message(&self, severity: Severity, message: &str) -> SinkResult<()> {
        if !self.is_open() {
            return Err(SinkError::Closed);
        }
        if !self.core.accept_message(self, severity, message) {
            return Ok(());
        }
        self.core.notify_logged(&SinkRecord::Message { severity, message });
        self.push(SinkItem::Message {
            severity,
            message: message.to_string(),
        });
        Ok(())
    }
}
