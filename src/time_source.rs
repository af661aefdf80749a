//! Time source abstraction for real and controlled clocks.
//!
//! The event loop asks a [`TimeSource`] for the current instant instead of
//! calling `Utc::now()` directly, which lets tests drive the daemon through a
//! whole solar day without waiting for it.

use chrono::{DateTime, Utc};
use std::time::Duration as StdDuration;

/// Trait for abstracting time operations
pub trait TimeSource: Send + Sync {
    /// Get the current time
    fn now(&self) -> DateTime<Utc>;
}

/// Real-time implementation that uses actual system time
#[derive(Debug, Clone, Copy, Default)]
pub struct RealTimeSource;

impl TimeSource for RealTimeSource {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually advanced clock for tests.
#[cfg(any(test, feature = "testing-support"))]
#[derive(Debug)]
pub struct ManualTimeSource {
    current: std::sync::Mutex<DateTime<Utc>>,
}

#[cfg(any(test, feature = "testing-support"))]
impl ManualTimeSource {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            current: std::sync::Mutex::new(start),
        }
    }

    /// Move the clock forward.
    pub fn advance(&self, by: chrono::Duration) {
        let mut guard = self.current.lock().unwrap();
        *guard += by;
    }

    /// Jump to an absolute instant.
    pub fn set(&self, to: DateTime<Utc>) {
        *self.current.lock().unwrap() = to;
    }
}

#[cfg(any(test, feature = "testing-support"))]
impl TimeSource for ManualTimeSource {
    fn now(&self) -> DateTime<Utc> {
        *self.current.lock().unwrap()
    }
}

/// Non-negative wait between `now` and `deadline`.
pub fn duration_until(now: DateTime<Utc>, deadline: DateTime<Utc>) -> StdDuration {
    (deadline - now).to_std().unwrap_or(StdDuration::ZERO)
}

/// Parse a datetime string in the format "YYYY-MM-DD HH:MM:SS" as UTC.
///
/// Also accepts RFC 3339 input such as `2024-06-21T18:00:00+02:00`.
pub fn parse_datetime(s: &str) -> Result<DateTime<Utc>, String> {
    use chrono::NaiveDateTime;

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .map(|naive| naive.and_utc())
        .map_err(|e| format!("Invalid datetime format: {e}. Use YYYY-MM-DD HH:MM:SS (UTC)"))
}

/// Render a delay the way the logs show it, e.g. `5h 03m 10s`.
pub fn format_delay(delay: StdDuration) -> String {
    let total = delay.as_secs();
    let (hours, minutes, seconds) = (total / 3600, (total % 3600) / 60, total % 60);
    if hours > 0 {
        format!("{hours}h {minutes:02}m {seconds:02}s")
    } else if minutes > 0 {
        format!("{minutes}m {seconds:02}s")
    } else {
        format!("{seconds}s")
    }
}
