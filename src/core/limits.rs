/*!
 * Limits and Defaults
 *
 * Centralized location for tunable constants and their rationale.
 */

use std::time::Duration;

// =============================================================================
// RULE STORE
// =============================================================================

/// Default interval between rule-file change checks (20s).
/// Matches the refresh cadence instrumented processes tolerate without
/// noticeable lag between editing a rule and it taking effect.
pub const DEFAULT_RELOAD_INTERVAL: Duration = Duration::from_millis(20_000);

/// Default rule file consulted when no path is configured
pub const DEFAULT_RULE_FILE: &str = "optrack-rules.properties";

// =============================================================================
// SINKS
// =============================================================================

/// Buffering sink ring capacity (power of 2 for index math)
pub const SINK_RING_SIZE: usize = 8192;

// =============================================================================
// DUMPS
// =============================================================================

/// Default dump destination when no path is configured
pub const DEFAULT_DUMP_PATH: &str = "./optrack.dump";

/// Reason string attached to shutdown-triggered dumps
pub const SHUTDOWN_DUMP_REASON: &str = "process shutdown";
