/*!
 * Error Types
 * Centralized error handling with thiserror, miette, and serde support
 */

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use super::severity::ParseSeverityError;

/// Caller-side programming defects. These fail fast and loud: an
/// instrumentation call made in the wrong lifecycle state indicates a bug in
/// the calling code, never a condition to paper over.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum UsageError {
    #[error("record was never started")]
    #[diagnostic(
        code(track::not_started),
        help("Call start() before stop(). Timing requires a start instant.")
    )]
    NotStarted,

    #[error("record already started")]
    #[diagnostic(
        code(track::already_started),
        help("start() may be called once per record. Create a new record instead.")
    )]
    AlreadyStarted,

    #[error("record already stopped")]
    #[diagnostic(
        code(track::already_stopped),
        help("stop() is terminal. The recorded timing is unchanged by this call.")
    )]
    AlreadyStopped,

    #[error("activity is stopped: {0}")]
    #[diagnostic(
        code(track::activity_sealed),
        help("A stopped activity refuses further children. Attach events before stop().")
    )]
    ActivitySealed(String),

    #[error("no tracker bound to this context")]
    #[diagnostic(
        code(track::no_tracker),
        help("Call register() on this thread before using tracking operations.")
    )]
    NoTracker,
}

/// Rule store failures. Open failures are structural and propagate to the
/// caller; per-key problems are contained where they occur.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum StoreError {
    #[error("store is not open")]
    #[diagnostic(
        code(store::not_open),
        help("Call open() on the rule store before reading or writing keys.")
    )]
    NotOpen,

    #[error("failed to open rule store {path}: {cause}")]
    #[diagnostic(
        code(store::open_failed),
        help("Check that the rule file exists and is readable.")
    )]
    OpenFailed { path: String, cause: String },

    #[error("rule store i/o failure: {0}")]
    #[diagnostic(
        code(store::io),
        help("The backing file could not be read or written. Check permissions and disk state.")
    )]
    Io(String),
}

/// Event sink failures
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum SinkError {
    #[error("sink is closed")]
    #[diagnostic(
        code(sink::closed),
        help("Call open() on the sink before logging records to it.")
    )]
    Closed,

    #[error("sink write failed: {0}")]
    #[diagnostic(
        code(sink::write_failed),
        help("The sink backend rejected the record. See the sink's failure listeners.")
    )]
    WriteFailed(String),
}

/// Dump subsystem failures. All of these are isolated per provider or per
/// sink inside a dump batch; none aborts the batch.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum DumpError {
    #[error("dump sink is closed")]
    #[diagnostic(
        code(dump::sink_closed),
        help("The orchestrator opens sinks at the start of each batch; a closed sink here means its open() failed.")
    )]
    SinkClosed,

    #[error("dump sink open failed: {0}")]
    #[diagnostic(
        code(dump::sink_open_failed),
        help("Check the dump destination path and permissions.")
    )]
    SinkOpenFailed(String),

    #[error("dump write failed: {0}")]
    #[diagnostic(code(dump::write_failed), help("The dump destination rejected the write."))]
    WriteFailed(String),

    #[error("dump provider failed: {0}")]
    #[diagnostic(
        code(dump::provider_failed),
        help("The provider could not produce a collection. Other providers in the batch are unaffected.")
    )]
    ProviderFailed(String),
}

pub type UsageResult<T> = Result<T, UsageError>;
pub type StoreResult<T> = Result<T, StoreError>;
pub type SinkResult<T> = Result<T, SinkError>;
pub type DumpResult<T> = Result<T, DumpError>;

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Io(err.to_string())
    }
}

impl From<std::io::Error> for DumpError {
    fn from(err: std::io::Error) -> Self {
        DumpError::WriteFailed(err.to_string())
    }
}
