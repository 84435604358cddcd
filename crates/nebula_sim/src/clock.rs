use std::time::{SystemTime, UNIX_EPOCH};

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Seconds since the start of the current UTC day.
///
/// Every surface derives its animation time from the wall clock, so
/// independently started processes agree on the attractor positions.
pub fn session_time() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64() % SECONDS_PER_DAY)
        .unwrap_or(0.0)
}
