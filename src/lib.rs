/*!
 * optrack
 * Application instrumentation core
 *
 * Records hierarchical, timed units of work (activities composed of
 * events), decides at runtime which are worth recording through a
 * live-reloading rule engine, and flushes accepted records through
 * pluggable, filtered sinks. An orthogonal dump subsystem snapshots
 * registered providers to dump sinks on demand or at shutdown.
 *
 * ```no_run
 * use optrack::{Config, SelectorEngine, Tracker, Severity, OpType};
 * use optrack::sink::TracingSink;
 * use optrack::store::FileRuleStore;
 * use std::sync::Arc;
 *
 * let config = Config::from_env();
 * let store = Arc::new(FileRuleStore::from_config(&config));
 * let selector = Arc::new(SelectorEngine::new(store, config.default_level));
 * selector.open()?;
 *
 * let sink = Arc::new(TracingSink::new("order-service"));
 * let tracker = optrack::tracker::context::register(
 *     Tracker::new("order-service", selector, sink),
 * );
 *
 * let mut event = tracker.new_event(Severity::Info, OpType::Call, "lookup", "customer lookup");
 * event.start()?;
 * // ... the timed work ...
 * event.stop()?;
 * tracker.report_event(event)?;
 * # Ok::<(), Box<dyn std::error::Error>>(())
 * ```
 */

pub mod config;
pub mod core;
pub mod dump;
pub mod selector;
pub mod sink;
pub mod store;
pub mod tracker;

// Re-exports
pub use crate::core::errors::{DumpError, SinkError, StoreError, UsageError};
pub use crate::core::severity::{CompCode, OpType, Severity, Ttl};
pub use config::Config;
pub use dump::{DumpCollection, DumpOrchestrator, DumpProvider, DumpSink};
pub use selector::SelectorEngine;
pub use store::{RuleStore, StoreEvent};
pub use tracker::{Activity, Event, Tracker};
