//! Time-related abstractions.
//!
//! Re-exports Tokio's timer primitives so tests can pause and advance the clock
//! (`tokio::time::pause`) while production code keeps using the same names.

pub use std::time::{Duration, SystemTime, UNIX_EPOCH};
pub use tokio::time::{interval, sleep, sleep_until, timeout, Instant, Interval, Sleep, Timeout};

/// Returns the current time as milliseconds since UNIX_EPOCH.
///
/// Clamps to zero if the system clock reports a time before the epoch.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or(0)
}
