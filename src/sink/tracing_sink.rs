/*!
 * Tracing Sink
 * Routes accepted records to the `tracing` framework
 *
 * Severity maps onto a fixed `tracing::Level` table; enablement defers to
 * the installed subscriber, so records below the subscriber's filter never
 * leave this sink.
 */

use super::{EventSink, SinkCore, SinkRecord};
use crate::core::errors::{SinkError, SinkResult};
use crate::core::severity::Severity;
use crate::tracker::{Activity, Event};
use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Fixed severity-to-level map
fn level_for(severity: Severity) -> Level {
    match severity {
        Severity::None | Severity::Trace => Level::TRACE,
        Severity::Debug => Level::DEBUG,
        Severity::Info | Severity::Success => Level::INFO,
        Severity::Warning => Level::WARN,
        Severity::Error | Severity::Critical | Severity::Failure | Severity::Fatal => Level::ERROR,
    }
}

macro_rules! emit_at {
    ($level:expr, $($body:tt)*) => {
        match $level {
            Level::TRACE => ::tracing::event!(target: "optrack::sink", Level::TRACE, $($body)*),
            Level::DEBUG => ::tracing::event!(target: "optrack::sink", Level::DEBUG, $($body)*),
            Level::INFO => ::tracing::event!(target: "optrack::sink", Level::INFO, $($body)*),
            Level::WARN => ::tracing::event!(target: "optrack::sink", Level::WARN, $($body)*),
            Level::ERROR => ::tracing::event!(target: "optrack::sink", Level::ERROR, $($body)*),
        }
    };
}

pub struct TracingSink {
    name: String,
    core: SinkCore,
}

impl TracingSink {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            core: SinkCore::new(),
        }
    }
}

impl EventSink for TracingSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn core(&self) -> &SinkCore {
        &self.core
    }

    fn is_enabled(&self, severity: Severity) -> bool {
        match level_for(severity) {
            Level::TRACE => tracing::enabled!(target: "optrack::sink", Level::TRACE),
            Level::DEBUG => tracing::enabled!(target: "optrack::sink", Level::DEBUG),
            Level::INFO => tracing::enabled!(target: "optrack::sink", Level::INFO),
            Level::WARN => tracing::enabled!(target: "optrack::sink", Level::WARN),
            Level::ERROR => tracing::enabled!(target: "optrack::sink", Level::ERROR),
        }
    }

    fn log_event(&self, mut event: Event) -> SinkResult<()> {
        if !self.is_open() {
            return Err(SinkError::Closed);
        }
        if !self.core.accept_event(self, &mut event) {
            return Ok(());
        }
        emit_at!(
            level_for(event.severity()),
            source = %self.name,
            severity = %event.severity(),
            op_name = event.op_name(),
            op_type = ?event.op_type(),
            correlator = event.correlator().unwrap_or(""),
            elapsed_us = event.elapsed_usec(),
            wait_us = event.wait_usec(),
            comp_code = ?event.comp_code(),
            error = event.error_message().unwrap_or(""),
            "{}",
            event.message()
        );
        self.core.notify_logged(&SinkRecord::Event(&event));
        Ok(())
    }

    fn log_activity(&self, mut activity: Activity) -> SinkResult<()> {
        if !self.is_open() {
            return Err(SinkError::Closed);
        }
        if !self.core.accept_activity(self, &mut activity) {
            return Ok(());
        }
        emit_at!(
            level_for(activity.severity()),
            source = %self.name,
            severity = %activity.severity(),
            activity = activity.name(),
            children = activity.child_count(),
            elapsed_us = activity.elapsed_usec(),
            wait_us = activity.wait_usec(),
            wall_us = activity.wall_usec(),
            comp_code = ?activity.comp_code(),
            error = activity.error_message().unwrap_or(""),
            "activity complete"
        );
        self.core.notify_logged(&SinkRecord::Activity(&activity));
        Ok(())
    }

    fn log_message(&self, severity: Severity, message: &str) -> SinkResult<()> {
        if !self.is_open() {
            return Err(SinkError::Closed);
        }
        if !self.core.accept_message(self, severity, message) {
            return Ok(());
        }
        emit_at!(
            level_for(severity),
            source = %self.name,
            severity = %severity,
            "{}",
            message
        );
        self.core
            .notify_logged(&SinkRecord::Message { severity, message });
        Ok(())
    }
}

/// Install a subscriber for the crate's own diagnostics and any
/// [`TracingSink`] output. Honors `RUST_LOG`; `OPTRACK_LOG_JSON=1` switches
/// to JSON output. Safe to call more than once; later calls are no-ops.
pub fn init_diagnostics() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let use_json = std::env::var("OPTRACK_LOG_JSON")
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(env_filter);

    if use_json {
        let _ = registry
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .try_init();
    } else {
        let _ = registry
            .with(tracing_subscriber::fmt::layer().with_target(true).compact())
            .try_init();
    }
}
