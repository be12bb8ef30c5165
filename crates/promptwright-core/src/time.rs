//! Record timestamps.
//!
//! All `created_at`/`updated_at` values are Unix epoch milliseconds taken
//! from a process-wide clock that is strictly increasing, so two records
//! created back to back never share a timestamp and "most recently created"
//! is always well defined.

use std::sync::atomic::{AtomicI64, Ordering};

static LAST_ISSUED: AtomicI64 = AtomicI64::new(0);

/// Returns the current time in epoch milliseconds, bumped past the last
/// value this process issued when the wall clock hasn't advanced.
pub fn now_millis() -> i64 {
    let wall = chrono::Utc::now().timestamp_millis();
    let mut last = LAST_ISSUED.load(Ordering::Relaxed);
    loop {
        let next = if wall > last { wall } else { last + 1 };
        match LAST_ISSUED.compare_exchange_weak(last, next, Ordering::AcqRel, Ordering::Relaxed) {
            Ok(_) => return next,
            Err(actual) => last = actual,
        }
    }
}

/// Formats epoch milliseconds as RFC 3339 for display.
pub fn format_millis(millis: i64) -> String {
    chrono::DateTime::from_timestamp_millis(millis)
        .map(|dt| dt.to_rfc3339_opts(chrono::SecondsFormat::Secs, true))
        .unwrap_or_else(|| millis.to_string())
}
