/*!
 * Severity Levels
 * Ordered criticality ranks used by every threshold decision
 */

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Record severity, ordered by rank. Threshold checks compare ranks only,
/// never names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
#[repr(u8)]
pub enum Severity {
    None = 0,
    Trace = 1,
    Debug = 2,
    Info = 3,
    Success = 4,
    Warning = 5,
    Error = 6,
    Critical = 7,
    Failure = 8,
    Fatal = 9,
}

impl Severity {
    /// Numeric rank used in threshold comparisons
    #[inline]
    pub const fn rank(self) -> u8 {
        self as u8
    }

    /// Canonical uppercase name
    pub const fn as_str(self) -> &'static str {
        match self {
            Severity::None => "NONE",
            Severity::Trace => "TRACE",
            Severity::Debug => "DEBUG",
            Severity::Info => "INFO",
            Severity::Success => "SUCCESS",
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
            Severity::Critical => "CRITICAL",
            Severity::Failure => "FAILURE",
            Severity::Fatal => "FATAL",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unrecognized severity name in rule text or configuration
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown severity name: {0}")]
pub struct ParseSeverityError(pub String);

impl FromStr for Severity {
    type Err = ParseSeverityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "NONE" => Ok(Severity::None),
            "TRACE" => Ok(Severity::Trace),
            "DEBUG" => Ok(Severity::Debug),
            "INFO" => Ok(Severity::Info),
            "SUCCESS" => Ok(Severity::Success),
            "WARNING" | "WARN" => Ok(Severity::Warning),
            "ERROR" => Ok(Severity::Error),
            "CRITICAL" => Ok(Severity::Critical),
            "FAILURE" => Ok(Severity::Failure),
            "FATAL" => Ok(Severity::Fatal),
            other => Err(ParseSeverityError(other.to_string())),
        }
    }
}

/// Completion code recorded when a unit of work stops. Orthogonal to
/// severity: attaching an error at stop time sets the comp code, not the
/// severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum CompCode {
    Success = 0,
    Warning = 1,
    Error = 2,
}

/// Operation type carried by events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum OpType {
    Call,
    Send,
    Receive,
    Open,
    Close,
    Start,
    Stop,
    Other,
}

/// Record time-to-live. `Inherit` is the sentinel that leaves a record's
/// TTL untouched when a filter is configured without an override.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Ttl {
    #[default]
    Inherit,
    Seconds(u64),
}

impl Ttl {
    /// True when this value would override a record's TTL
    #[inline]
    pub const fn is_override(self) -> bool {
        !matches!(self, Ttl::Inherit)
    }
}
