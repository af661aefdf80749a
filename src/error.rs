//! Typed errors for the accessory domain.
//!
//! The scheduler reports failures through [`SchedulerError`] so that the
//! bridge can answer a characteristic write with a precise reason. Every
//! variant is `Clone` because the same error is both logged by the event loop
//! and handed back to the caller that requested the change.
//!
//! Application plumbing (configuration files, sockets, lock files) keeps
//! using `anyhow` with context, converting from these types where needed.

use chrono::NaiveDate;
use std::fmt;

use crate::geo::SolarPeriod;

/// Failure reported by a [`StateStore`](crate::state::StateStore).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Reading or writing the backing file failed.
    Io(String),
    /// The stored record could not be encoded or decoded.
    Format(String),
    /// The store refused the write (volatile stores used in tests).
    Rejected(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(msg) => write!(f, "i/o: {msg}"),
            Self::Format(msg) => write!(f, "format: {msg}"),
            Self::Rejected(msg) => write!(f, "rejected: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {}

/// Every fallible scheduler operation funnels into this type.
#[derive(Debug, Clone, PartialEq)]
pub enum SchedulerError {
    /// Latitude or longitude outside the valid range (or not finite).
    InvalidLocation { latitude: f64, longitude: f64 },
    /// Period index outside the solar period catalog.
    InvalidPeriod { index: usize },
    /// The store did not acknowledge a configuration write.
    Persistence(StoreError),
    /// The period does not occur today or tomorrow at this location.
    ScheduleUnavailable { period: SolarPeriod, date: NaiveDate },
    /// A bridge request named an accessory that is not configured.
    UnknownAccessory(String),
}

impl fmt::Display for SchedulerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidLocation {
                latitude,
                longitude,
            } => write!(
                f,
                "invalid location ({latitude}, {longitude}): latitude must be within -90..=90 \
                 and longitude within -180..=180"
            ),
            Self::InvalidPeriod { index } => write!(
                f,
                "invalid period index {index}: must be below {}",
                SolarPeriod::ALL.len()
            ),
            Self::Persistence(e) => write!(f, "failed to persist configuration: {e}"),
            Self::ScheduleUnavailable { period, date } => write!(
                f,
                "{period} does not occur on {date} or the following day at this location"
            ),
            Self::UnknownAccessory(name) => write!(f, "no accessory named '{name}'"),
        }
    }
}

impl std::error::Error for SchedulerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Persistence(e) => Some(e),
            _ => None,
        }
    }
}

impl From<StoreError> for SchedulerError {
    fn from(e: StoreError) -> Self {
        Self::Persistence(e)
    }
}
