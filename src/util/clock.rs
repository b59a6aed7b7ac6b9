//! Clock helpers bridging wall-clock and monotonic time.

use std::time::{Instant, SystemTime, UNIX_EPOCH};

/// Current wall-clock time in milliseconds since the Unix epoch.
#[must_use]
pub fn now_ms() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis()
}

/// Convert a wall-clock instant to the monotonic clock the scheduler runs on.
///
/// A `SystemTime` in the past maps to "now", which makes the corresponding
/// task immediately due.
#[must_use]
pub fn instant_at(at: SystemTime) -> Instant {
    let delay = at
        .duration_since(SystemTime::now())
        .unwrap_or_default();
    Instant::now() + delay
}
