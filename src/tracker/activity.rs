/*!
 * Activities
 * Containers aggregating events under one timed unit of work
 */

use super::event::Event;
use super::timing::{RunState, Timing};
use crate::core::errors::{UsageError, UsageResult};
use crate::core::severity::{CompCode, Severity, Ttl};
use crate::core::types::{new_signature, Signature, Usec, UsecTimestamp};
use serde::{Deserialize, Serialize};

/// A timed container of events. Children attach in order until `stop()`,
/// which is terminal: a stopped activity refuses further children and a
/// second stop reports a usage error without touching the recorded timing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Activity {
    signature: Signature,
    name: String,
    severity: Severity,
    comp_code: CompCode,
    error_message: Option<String>,
    timing: Timing,
    children: Vec<Event>,
    ttl: Ttl,
}

impl Activity {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            signature: new_signature(),
            name: name.into(),
            severity: Severity::Info,
            comp_code: CompCode::Success,
            error_message: None,
            timing: Timing::new(),
            children: Vec::new(),
            ttl: Ttl::Inherit,
        }
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    // --- lifecycle ---

    pub fn start(&mut self) -> UsageResult<()> {
        self.timing.start()
    }

    pub fn start_at(&mut self, timestamp: UsecTimestamp) -> UsageResult<()> {
        self.timing.start_at(timestamp)
    }

    pub fn stop(&mut self) -> UsageResult<()> {
        self.timing.stop()
    }

    pub fn stop_at(&mut self, timestamp: UsecTimestamp) -> UsageResult<()> {
        self.timing.stop_at(timestamp)
    }

    /// Stop and record a failure; completion code changes, severity does not
    pub fn stop_failed(&mut self, comp_code: CompCode, error: impl Into<String>) -> UsageResult<()> {
        self.timing.stop()?;
        self.comp_code = comp_code;
        self.error_message = Some(error.into());
        Ok(())
    }

    /// Attach a completed child event. The child's wait time aggregates
    /// into the activity's wait.
    pub fn add_event(&mut self, event: Event) -> UsageResult<()> {
        if self.timing.state() == RunState::Stopped {
            return Err(UsageError::ActivitySealed(self.name.clone()));
        }
        let wait = event.wait_usec();
        if wait > 0 {
            self.timing.add_wait(wait)?;
        }
        self.children.push(event);
        Ok(())
    }

    pub fn add_wait(&mut self, wait: Usec) -> UsageResult<()> {
        self.timing.add_wait(wait)
    }

    // --- accessors ---

    #[inline]
    pub fn signature(&self) -> &str {
        &self.signature
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn set_severity(&mut self, severity: Severity) {
        self.severity = severity;
    }

    #[inline]
    pub fn comp_code(&self) -> CompCode {
        self.comp_code
    }

    #[inline]
    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    #[inline]
    pub fn state(&self) -> RunState {
        self.timing.state()
    }

    #[inline]
    pub fn children(&self) -> &[Event] {
        &self.children
    }

    #[inline]
    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    #[inline]
    pub fn start_usec(&self) -> UsecTimestamp {
        self.timing.start_usec()
    }

    #[inline]
    pub fn stop_usec(&self) -> UsecTimestamp {
        self.timing.stop_usec()
    }

    /// Elapsed time net of aggregated wait
    #[inline]
    pub fn elapsed_usec(&self) -> Usec {
        self.timing.elapsed_usec()
    }

    #[inline]
    pub fn wait_usec(&self) -> Usec {
        self.timing.wait_usec()
    }

    /// Full start-to-stop window including nested work
    #[inline]
    pub fn wall_usec(&self) -> Usec {
        self.timing.wall_usec()
    }

    #[inline]
    pub fn ttl(&self) -> Ttl {
        self.ttl
    }

    pub fn set_ttl(&mut self, ttl: Ttl) {
        self.ttl = ttl;
    }
}
