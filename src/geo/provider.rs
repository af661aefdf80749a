//! Astronomical time provider.
//!
//! The scheduler never computes sun positions itself. It asks a
//! [`SolarTimesProvider`] for the instants of every catalog period on a given
//! date, and the provider is free to leave out periods that do not happen
//! (polar day, polar night, or twilight that never gets dark enough).
//!
//! [`SunriseProvider`] is the production implementation, backed by the
//! `sunrise` crate. Tests substitute fixed tables.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use std::collections::BTreeMap;
use sunrise::{Coordinates, DawnType, SolarDay, SolarEvent};

use super::{Location, SolarPeriod};

/// Elevation of the sun's lower limb touching the horizon (degrees).
const HORIZON_TOUCH_ELEVATION: f64 = -0.3;

/// Elevation at which the golden hour begins and ends (degrees).
const GOLDEN_HOUR_ELEVATION: f64 = 6.0;

/// `SolarEvent::Elevation` takes a depression angle in radians: positive
/// values are below the horizon, like the crate's own sunrise (0.833°) and
/// civil dawn (6°).
fn elevation_event(elevation_degrees: f64, morning: bool) -> SolarEvent {
    SolarEvent::Elevation {
        elevation: (-elevation_degrees).to_radians(),
        morning,
    }
}

/// Results further than this from midday of the requested date are
/// treated as "event does not occur".
const PLAUSIBLE_WINDOW_HOURS: i64 = 36;

/// Morning/evening pairs that are symmetric around solar noon, in the order
/// they are tried when deriving noon.
const SYMMETRIC_PAIRS: [(SolarPeriod, SolarPeriod); 6] = [
    (SolarPeriod::Sunrise, SolarPeriod::Sunset),
    (SolarPeriod::SunriseEnd, SolarPeriod::SunsetStart),
    (SolarPeriod::GoldenHourEnd, SolarPeriod::GoldenHour),
    (SolarPeriod::Dawn, SolarPeriod::Dusk),
    (SolarPeriod::NauticalDawn, SolarPeriod::NauticalDusk),
    (SolarPeriod::NightEnd, SolarPeriod::Night),
];

/// Instants of the solar periods on one date at one location.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SolarTimes {
    times: BTreeMap<SolarPeriod, DateTime<Utc>>,
}

impl SolarTimes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, period: SolarPeriod, at: DateTime<Utc>) {
        self.times.insert(period, at);
    }

    /// Instant of `period`, or `None` if it does not occur on this date.
    pub fn get(&self, period: SolarPeriod) -> Option<DateTime<Utc>> {
        self.times.get(&period).copied()
    }

    /// Periods that occur, in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = (SolarPeriod, DateTime<Utc>)> + '_ {
        self.times.iter().map(|(period, at)| (*period, *at))
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }
}

/// Source of raw solar event times.
pub trait SolarTimesProvider {
    /// Instants of every period that occurs on `date` at `location`.
    fn solar_times(&self, date: NaiveDate, location: &Location) -> SolarTimes;
}

/// Provider backed by the `sunrise` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct SunriseProvider;

impl SunriseProvider {
    /// The `sunrise` event that corresponds to a catalog period.
    ///
    /// Solar noon and nadir have no direct counterpart and are derived
    /// from the symmetric pairs instead.
    fn event_for(period: SolarPeriod) -> Option<SolarEvent> {
        let event = match period {
            SolarPeriod::Sunrise => SolarEvent::Sunrise,
            SolarPeriod::Sunset => SolarEvent::Sunset,
            SolarPeriod::SunriseEnd => elevation_event(HORIZON_TOUCH_ELEVATION, true),
            SolarPeriod::SunsetStart => elevation_event(HORIZON_TOUCH_ELEVATION, false),
            SolarPeriod::GoldenHourEnd => elevation_event(GOLDEN_HOUR_ELEVATION, true),
            SolarPeriod::GoldenHour => elevation_event(GOLDEN_HOUR_ELEVATION, false),
            SolarPeriod::Dawn => SolarEvent::Dawn(DawnType::Civil),
            SolarPeriod::Dusk => SolarEvent::Dusk(DawnType::Civil),
            SolarPeriod::NauticalDawn => SolarEvent::Dawn(DawnType::Nautical),
            SolarPeriod::NauticalDusk => SolarEvent::Dusk(DawnType::Nautical),
            SolarPeriod::NightEnd => SolarEvent::Dawn(DawnType::Astronomical),
            SolarPeriod::Night => SolarEvent::Dusk(DawnType::Astronomical),
            SolarPeriod::SolarNoon | SolarPeriod::Nadir => return None,
        };
        Some(event)
    }
}

impl SolarTimesProvider for SunriseProvider {
    fn solar_times(&self, date: NaiveDate, location: &Location) -> SolarTimes {
        let mut times = SolarTimes::new();

        let Some(coordinates) = Coordinates::new(location.latitude(), location.longitude()) else {
            return times;
        };
        let day = SolarDay::new(coordinates, date);

        // When the sun never reaches an elevation the underlying hour angle is
        // undefined and the crate yields an instant nowhere near `date`.
        let Some(midday) = date.and_hms_opt(12, 0, 0).map(|naive| naive.and_utc()) else {
            return times;
        };
        let window = Duration::hours(PLAUSIBLE_WINDOW_HOURS);
        let plausible = |at: DateTime<Utc>| (at - midday).abs() <= window;

        for period in SolarPeriod::ALL {
            if let Some(event) = Self::event_for(period) {
                let at = day.event_time(event);
                if plausible(at) {
                    times.insert(period, at);
                }
            }
        }

        // A morning event that is not strictly before its evening twin is a
        // degenerate result at the edge of polar day or night.
        for (morning, evening) in SYMMETRIC_PAIRS {
            if let (Some(m), Some(e)) = (times.get(morning), times.get(evening))
                && m >= e
            {
                times.times.remove(&morning);
                times.times.remove(&evening);
            }
        }

        if let Some(noon) = derive_solar_noon(&times) {
            times.insert(SolarPeriod::SolarNoon, noon);
            times.insert(SolarPeriod::Nadir, noon - Duration::hours(12));
        }

        times
    }
}

/// Solar noon as the midpoint of the first complete symmetric pair.
fn derive_solar_noon(times: &SolarTimes) -> Option<DateTime<Utc>> {
    SYMMETRIC_PAIRS.iter().find_map(|(morning, evening)| {
        let m = times.get(*morning)?;
        let e = times.get(*evening)?;
        Some(m + (e - m) / 2)
    })
}
