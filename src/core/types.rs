/*!
 * Core Types
 * Common aliases and time helpers used across the crate
 */

use std::time::{SystemTime, UNIX_EPOCH};

/// Timestamp in microseconds since the Unix epoch
pub type UsecTimestamp = u64;

/// Elapsed/wait duration in microseconds
pub type Usec = u64;

/// Correlator linking related records across activities
pub type Correlator = String;

/// Unique record signature
pub type Signature = String;

/// Current wall-clock time in microseconds since the Unix epoch
#[inline]
pub fn now_usec() -> UsecTimestamp {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_micros() as u64)
        .unwrap_or(0)
}

/// Mint a unique signature for a new record
#[inline]
pub fn new_signature() -> Signature {
    uuid::Uuid::new_v4().to_string()
}
