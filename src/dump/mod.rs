/*!
 * Diagnostic Dumps
 * Named property snapshots from providers, written to dump sinks
 */

mod file;
mod orchestrator;
mod providers;

pub use file::FileDumpSink;
pub use orchestrator::{DumpOrchestrator, ShutdownDump};
pub use providers::{ProcessInfoProvider, RuntimePropsProvider};

use crate::core::errors::{DumpError, DumpResult};
use crate::core::types::{now_usec, UsecTimestamp};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A snapshot produced by one provider for one dump request: a named,
/// timestamped, ordered collection of key/value properties. Produced fresh
/// on every request and immutable once handed to a sink.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DumpCollection {
    name: String,
    category: String,
    provider_name: String,
    provider_category: String,
    timestamp_usec: UsecTimestamp,
    reason: Option<String>,
    properties: Vec<(String, Value)>,
}

impl DumpCollection {
    pub fn new(
        name: impl Into<String>,
        category: impl Into<String>,
        provider_name: impl Into<String>,
        provider_category: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            category: category.into(),
            provider_name: provider_name.into(),
            provider_category: provider_category.into(),
            timestamp_usec: now_usec(),
            reason: None,
            properties: Vec::new(),
        }
    }

    pub fn add_property(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.properties.push((key.into(), value.into()));
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.add_property(key, value);
        self
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn category(&self) -> &str {
        &self.category
    }

    #[inline]
    pub fn provider_name(&self) -> &str {
        &self.provider_name
    }

    #[inline]
    pub fn provider_category(&self) -> &str {
        &self.provider_category
    }

    #[inline]
    pub fn timestamp_usec(&self) -> UsecTimestamp {
        self.timestamp_usec
    }

    #[inline]
    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }

    pub fn set_reason(&mut self, reason: impl Into<String>) {
        self.reason = Some(reason.into());
    }

    /// Properties in insertion order
    pub fn properties(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.properties.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn property_count(&self) -> usize {
        self.properties.len()
    }
}

/// Source of dump collections. Providers are registered with the
/// orchestrator and polled on every dump request.
pub trait DumpProvider: Send + Sync {
    fn name(&self) -> &str;
    fn category(&self) -> &str;
    fn collect(&self) -> DumpResult<DumpCollection>;
}

/// Destination for dump collections
pub trait DumpSink: Send + Sync {
    fn name(&self) -> &str;
    fn open(&self) -> DumpResult<()>;
    fn close(&self) -> DumpResult<()>;
    fn is_open(&self) -> bool;
    fn write(&self, dump: &DumpCollection) -> DumpResult<()>;
}

/// Lifecycle notification delivered to dump listeners during a batch
#[derive(Debug, Clone)]
pub enum DumpNotice {
    /// A provider is about to be polled
    Before {
        provider: String,
        reason: Option<String>,
    },
    /// A provider finished, successfully or not. The error, when present,
    /// belongs to this provider alone.
    After {
        provider: String,
        collection: Option<DumpCollection>,
        error: Option<DumpError>,
    },
    /// A sink failed to open or close; the batch continues without it
    SinkError { sink: String, error: DumpError },
    /// All providers in the batch have been processed
    Complete,
}

pub trait DumpListener: Send + Sync {
    fn on_dump(&self, notice: &DumpNotice);
}
