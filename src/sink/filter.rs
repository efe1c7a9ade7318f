/*!
 * Sink Filters
 * Predicate policies each record must pass before a sink accepts it
 */

use super::EventSink;
use crate::core::severity::{Severity, Ttl};
use crate::core::types::Usec;
use crate::selector::full_match_regex;
use crate::tracker::{Activity, Event};
use regex::Regex;

/// Per-record predicate evaluated against events, activities, or raw
/// severity/message pairs. A filter may additionally stamp a TTL override
/// on the record before returning its verdict.
pub trait SinkFilter: Send + Sync {
    fn accept_event(&self, sink: &dyn EventSink, event: &mut Event) -> bool;
    fn accept_activity(&self, sink: &dyn EventSink, activity: &mut Activity) -> bool;
    fn accept_message(&self, sink: &dyn EventSink, severity: Severity, message: &str) -> bool;
}

/// The reference level+time filter: severity threshold, elapsed/wait/wall
/// floors, and an optional full-match message pattern, evaluated in that
/// fixed order with a short-circuit on the first failing clause. Floors
/// left unset do not participate.
pub struct ThresholdFilter {
    threshold: Severity,
    elapsed_floor: Option<Usec>,
    wait_floor: Option<Usec>,
    wall_floor: Option<Usec>,
    pattern: Option<Regex>,
    ttl: Ttl,
}

impl ThresholdFilter {
    pub fn new(threshold: Severity) -> Self {
        Self {
            threshold,
            elapsed_floor: None,
            wait_floor: None,
            wall_floor: None,
            pattern: None,
            ttl: Ttl::Inherit,
        }
    }

    pub fn with_elapsed_floor(mut self, usec: Usec) -> Self {
        self.elapsed_floor = Some(usec);
        self
    }

    pub fn with_wait_floor(mut self, usec: Usec) -> Self {
        self.wait_floor = Some(usec);
        self
    }

    pub fn with_wall_floor(mut self, usec: Usec) -> Self {
        self.wall_floor = Some(usec);
        self
    }

    /// Message pattern; the whole message must match
    pub fn with_message_pattern(mut self, pattern: &str) -> Result<Self, regex::Error> {
        self.pattern = Some(full_match_regex(pattern)?);
        Ok(self)
    }

    /// TTL stamped onto every record that reaches the stamping step;
    /// `Ttl::Inherit` disables stamping
    pub fn with_ttl(mut self, ttl: Ttl) -> Self {
        self.ttl = ttl;
        self
    }

    #[inline]
    fn message_matches(&self, message: &str) -> bool {
        self.pattern
            .as_ref()
            .map(|p| p.is_match(message))
            .unwrap_or(true)
    }

    #[inline]
    fn verdict(&self, sink: &dyn EventSink, severity: Severity) -> bool {
        severity >= self.threshold && sink.is_enabled(severity)
    }
}

impl Default for ThresholdFilter {
    fn default() -> Self {
        Self::new(Severity::Info)
    }
}

impl SinkFilter for ThresholdFilter {
    fn accept_event(&self, sink: &dyn EventSink, event: &mut Event) -> bool {
        if let Some(floor) = self.elapsed_floor {
            if event.elapsed_usec() < floor {
                return false;
            }
        }
        if let Some(floor) = self.wait_floor {
            if event.wait_usec() < floor {
                return false;
            }
        }
        if !self.message_matches(event.message()) {
            return false;
        }
        if self.ttl.is_override() {
            event.set_ttl(self.ttl);
        }
        self.verdict(sink, event.severity())
    }

    fn accept_activity(&self, sink: &dyn EventSink, activity: &mut Activity) -> bool {
        if let Some(floor) = self.elapsed_floor {
            if activity.elapsed_usec() < floor {
                return false;
            }
        }
        if let Some(floor) = self.wait_floor {
            if activity.wait_usec() < floor {
                return false;
            }
        }
        if let Some(floor) = self.wall_floor {
            if activity.wall_usec() < floor {
                return false;
            }
        }
        if self.ttl.is_override() {
            activity.set_ttl(self.ttl);
        }
        self.verdict(sink, activity.severity())
    }

    fn accept_message(&self, sink: &dyn EventSink, severity: Severity, message: &str) -> bool {
        if !self.message_matches(message) {
            return false;
        }
        self.verdict(sink, severity)
    }
}
