//! Validated geographic coordinates.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;

use crate::error::SchedulerError;

/// A point on Earth, immutable once constructed.
///
/// Construction is the only place coordinates are checked, so every
/// `Location` in the program is known to be within range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Location {
    latitude: f64,
    longitude: f64,
}

impl Location {
    /// Validate and build a location.
    ///
    /// Latitude must be within -90..=90 and longitude within -180..=180;
    /// NaN and infinities are rejected.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, SchedulerError> {
        let valid = latitude.is_finite()
            && longitude.is_finite()
            && (-90.0..=90.0).contains(&latitude)
            && (-180.0..=180.0).contains(&longitude);

        if !valid {
            return Err(SchedulerError::InvalidLocation {
                latitude,
                longitude,
            });
        }

        Ok(Self {
            latitude,
            longitude,
        })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Calendar date at this location for the given instant.
    ///
    /// Uses local mean solar time (UTC shifted by four minutes per degree of
    /// longitude) rather than a political timezone, so that "today" always
    /// contains the local solar noon.
    pub fn solar_date(&self, instant: DateTime<Utc>) -> NaiveDate {
        let shift = Duration::seconds((self.longitude * 240.0).round() as i64);
        (instant + shift).date_naive()
    }
}
