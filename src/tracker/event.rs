/*!
 * Events
 * Leaf records of timed work
 */

use super::timing::{RunState, Timing};
use crate::core::errors::UsageResult;
use crate::core::severity::{CompCode, OpType, Severity, Ttl};
use crate::core::types::{new_signature, Correlator, Signature, Usec, UsecTimestamp};
use serde::{Deserialize, Serialize};

/// A single timed operation. Created through a tracker (or directly),
/// started and stopped on the owning thread, immutable once stopped except
/// for the TTL, which sink filters may override in flight.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    signature: Signature,
    severity: Severity,
    op_type: OpType,
    op_name: String,
    correlator: Option<Correlator>,
    message: String,
    comp_code: CompCode,
    error_message: Option<String>,
    timing: Timing,
    ttl: Ttl,
}

impl Event {
    pub fn new(
        severity: Severity,
        op_type: OpType,
        op_name: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            signature: new_signature(),
            severity,
            op_type,
            op_name: op_name.into(),
            correlator: None,
            message: message.into(),
            comp_code: CompCode::Success,
            error_message: None,
            timing: Timing::new(),
            ttl: Ttl::Inherit,
        }
    }

    pub fn with_correlator(mut self, correlator: impl Into<Correlator>) -> Self {
        self.correlator = Some(correlator.into());
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

    /// Stop with caller-computed elapsed time, backdating the start instant
    pub fn stop_backdated(&mut self, elapsed: Usec) -> UsageResult<()> {
        self.timing.stop_backdated(elapsed)
    }

    /// Backdated stop recording a completion code and optional error text
    /// in the same call
    pub fn stop_backdated_with(
        &mut self,
        elapsed: Usec,
        comp_code: CompCode,
        error: Option<&str>,
    ) -> UsageResult<()> {
        self.timing.stop_backdated(elapsed)?;
        self.comp_code = comp_code;
        self.error_message = error.map(str::to_string);
        Ok(())
    }

    /// Stop and record a failure. The completion code and error message
    /// change; severity does not unless the caller sets it explicitly.
    pub fn stop_failed(&mut self, comp_code: CompCode, error: impl Into<String>) -> UsageResult<()> {
        self.timing.stop()?;
        self.comp_code = comp_code;
        self.error_message = Some(error.into());
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
    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn set_severity(&mut self, severity: Severity) {
        self.severity = severity;
    }

    #[inline]
    pub fn op_type(&self) -> OpType {
        self.op_type
    }

    #[inline]
    pub fn op_name(&self) -> &str {
        &self.op_name
    }

    #[inline]
    pub fn correlator(&self) -> Option<&str> {
        self.correlator.as_deref()
    }

    #[inline]
    pub fn message(&self) -> &str {
        &self.message
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
    pub fn start_usec(&self) -> UsecTimestamp {
        self.timing.start_usec()
    }

    #[inline]
    pub fn stop_usec(&self) -> UsecTimestamp {
        self.timing.stop_usec()
    }

    #[inline]
    pub fn elapsed_usec(&self) -> Usec {
        self.timing.elapsed_usec()
    }

    #[inline]
    pub fn wait_usec(&self) -> Usec {
        self.timing.wait_usec()
    }

    #[inline]
    pub fn ttl(&self) -> Ttl {
        self.ttl
    }

    pub fn set_ttl(&mut self, ttl: Ttl) {
        self.ttl = ttl;
    }
}
