//! Owned, cancellable one-shot timers.
//!
//! A timer here is just a wall-clock deadline. The event loop sleeps until the
//! earliest deadline of all timers and then polls them, so no thread is parked
//! per timer and cancelling is a plain state change.

use chrono::{DateTime, Utc};

/// A single-fire deadline.
///
/// Firing disarms the timer, so each arming produces at most one fire.
/// Cancelling an idle, fired or already cancelled timer is a no-op.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OneShot {
    deadline: Option<DateTime<Utc>>,
}

impl OneShot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm (or re-arm) the timer for `at`, replacing any previous deadline.
    pub fn arm(&mut self, at: DateTime<Utc>) {
        self.deadline = Some(at);
    }

    /// Disarm the timer. Returns whether a deadline was pending.
    pub fn cancel(&mut self) -> bool {
        self.deadline.take().is_some()
    }

    pub fn deadline(&self) -> Option<DateTime<Utc>> {
        self.deadline
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Fire if the deadline has been reached.
    ///
    /// Returns `true` exactly once per arming, on the first poll at or after
    /// the deadline.
    pub fn fire_if_due(&mut self, now: DateTime<Utc>) -> bool {
        match self.deadline {
            Some(at) if at <= now => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 6, 0, 0).unwrap()
    }

    #[test]
    fn test_fires_once_at_deadline() {
        let mut timer = OneShot::new();
        timer.arm(t0());

        assert!(!timer.fire_if_due(t0() - Duration::milliseconds(1)));
        assert!(timer.fire_if_due(t0()));
        assert!(!timer.fire_if_due(t0() + Duration::hours(1)));
        assert!(!timer.is_armed());
    }

    #[test]
    fn test_cancel_is_idempotent() {
        let mut timer = OneShot::new();
        assert!(!timer.cancel());

        timer.arm(t0());
        assert!(timer.cancel());
        assert!(!timer.cancel());
        assert!(!timer.fire_if_due(t0() + Duration::days(1)));
    }

    #[test]
    fn test_rearm_replaces_deadline() {
        let mut timer = OneShot::new();
        timer.arm(t0());
        timer.arm(t0() + Duration::minutes(10));

        assert!(!timer.fire_if_due(t0()));
        assert_eq!(timer.deadline(), Some(t0() + Duration::minutes(10)));
    }
}
