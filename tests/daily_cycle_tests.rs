use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use suncontact::core::scheduler::{
    SchedulerParams, SensorState, SolarScheduler, compute_next_occurrence,
};
use suncontact::error::SchedulerError;
use suncontact::geo::{Location, SolarPeriod, SolarTimes, SolarTimesProvider, SunriseProvider};
use suncontact::state::{MemoryStore, SolarConfig};

/// Sunset at 18:00 UTC, sunrise at 06:00 UTC, every day.
struct Equinox;

impl SolarTimesProvider for Equinox {
    fn solar_times(&self, date: NaiveDate, _location: &Location) -> SolarTimes {
        let mut times = SolarTimes::new();
        times.insert(
            SolarPeriod::Sunrise,
            date.and_hms_opt(6, 0, 0).unwrap().and_utc(),
        );
        times.insert(
            SolarPeriod::Sunset,
            date.and_hms_opt(18, 0, 0).unwrap().and_utc(),
        );
        times
    }
}

/// A provider for a location where nothing ever happens.
struct PolarNight;

impl SolarTimesProvider for PolarNight {
    fn solar_times(&self, _date: NaiveDate, _location: &Location) -> SolarTimes {
        SolarTimes::new()
    }
}

fn params(
    store: MemoryStore,
    provider: Box<dyn SolarTimesProvider>,
    enabled: bool,
) -> SchedulerParams {
    SchedulerParams {
        name: "Sunset".to_string(),
        version: "1.0.0".to_string(),
        latitude: 0.0,
        longitude: 0.0,
        period_name: "sunset".to_string(),
        offset_minutes: None,
        enabled: Some(enabled),
        store: Box::new(store),
        provider,
    }
}

fn at(hour: u32, minute: u32, second: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 20, hour, minute, second)
        .unwrap()
}

#[test]
fn test_full_day_cycle_pulses_once_and_rearms_for_tomorrow() {
    let mut scheduler =
        SolarScheduler::new(params(MemoryStore::new(), Box::new(Equinox), true), at(17, 0, 0))
            .unwrap();

    assert_eq!(scheduler.next_fire(), Some(at(18, 0, 0)));
    assert_eq!(scheduler.sensor_state(), SensorState::NoEvent);

    // Nothing happens before the deadline
    assert!(scheduler.poll(at(17, 59, 59)).is_empty());

    assert_eq!(
        scheduler.poll(at(18, 0, 0)),
        vec![SensorState::EventActive]
    );
    assert_eq!(scheduler.sensor_state(), SensorState::EventActive);
    assert_eq!(scheduler.next_deadline(), Some(at(18, 0, 1)));

    assert_eq!(scheduler.poll(at(18, 0, 1)), vec![SensorState::NoEvent]);
    assert_eq!(scheduler.sensor_state(), SensorState::NoEvent);
    assert_eq!(scheduler.next_fire(), Some(at(18, 0, 0) + Duration::days(1)));
}

#[test]
fn test_disabled_accessory_never_fires() {
    let mut scheduler =
        SolarScheduler::new(params(MemoryStore::new(), Box::new(Equinox), false), at(17, 0, 0))
            .unwrap();

    assert_eq!(scheduler.next_fire(), None);
    for hours in 0..72 {
        assert!(scheduler.poll(at(17, 0, 0) + Duration::hours(hours)).is_empty());
    }
    assert_eq!(scheduler.sensor_state(), SensorState::NoEvent);
}

#[test]
fn test_failed_write_leaves_everything_untouched() {
    let store = MemoryStore::new();
    let mut scheduler =
        SolarScheduler::new(params(store.clone(), Box::new(Equinox), true), at(12, 0, 0)).unwrap();
    let before = scheduler.config();
    let armed = scheduler.next_fire();

    store.set_failing(true);
    let mut outcome = None;
    scheduler.set_offset(30, at(12, 0, 0), |result| outcome = Some(result));

    assert!(matches!(outcome, Some(Err(SchedulerError::Persistence(_)))));
    assert_eq!(scheduler.config(), before);
    assert_eq!(scheduler.next_fire(), armed);
    assert_eq!(store.writes(), 0);
}

#[test]
fn test_offset_change_shifts_the_armed_timer() {
    let store = MemoryStore::new();
    let mut scheduler =
        SolarScheduler::new(params(store.clone(), Box::new(Equinox), true), at(12, 0, 0)).unwrap();
    assert_eq!(scheduler.next_fire(), Some(at(18, 0, 0)));

    let mut outcome = None;
    scheduler.set_offset(-45, at(12, 0, 0), |result| outcome = Some(result));

    assert_eq!(outcome, Some(Ok(())));
    assert_eq!(scheduler.next_fire(), Some(at(17, 15, 0)));
    assert_eq!(store.saved().map(|c| c.offset_minutes), Some(-45));
}

#[test]
fn test_saved_state_survives_a_restart() {
    let store = MemoryStore::new();
    {
        let mut scheduler =
            SolarScheduler::new(params(store.clone(), Box::new(Equinox), false), at(5, 0, 0))
                .unwrap();
        scheduler.set_period(SolarPeriod::Sunrise.index(), at(5, 0, 0), |_| {});
        scheduler.set_enabled(true, at(5, 0, 0), |_| {});
    }

    let restarted =
        SolarScheduler::new(params(store, Box::new(Equinox), false), at(5, 30, 0)).unwrap();
    assert_eq!(
        restarted.config(),
        SolarConfig {
            period: SolarPeriod::Sunrise.index(),
            offset_minutes: 0,
            enabled: true,
        }
    );
    assert_eq!(restarted.next_fire(), Some(at(6, 0, 0)));
}

#[test]
fn test_unavailable_period_leaves_the_accessory_idle() {
    let scheduler =
        SolarScheduler::new(params(MemoryStore::new(), Box::new(PolarNight), true), at(12, 0, 0))
            .unwrap();

    assert_eq!(scheduler.next_fire(), None);
    assert_eq!(scheduler.sensor_state(), SensorState::NoEvent);
}

#[test]
fn test_real_sunset_at_null_island_one_hour_ahead() {
    let location = Location::new(0.0, 0.0).unwrap();
    let date = NaiveDate::from_ymd_opt(2024, 3, 20).unwrap();
    let sunset = SunriseProvider
        .solar_times(date, &location)
        .get(SolarPeriod::Sunset)
        .expect("sunset occurs at the equator");

    let now = sunset - Duration::hours(1);
    let occurrence =
        compute_next_occurrence(now, &location, SolarPeriod::Sunset, 0, &SunriseProvider).unwrap();

    assert_eq!(occurrence.at, sunset);
    let delay = occurrence.delay.as_secs();
    assert!((3599..=3601).contains(&delay), "delay was {delay}s");

    let mut scheduler = SolarScheduler::new(
        params(MemoryStore::new(), Box::new(SunriseProvider), true),
        now,
    )
    .unwrap();
    assert_eq!(scheduler.next_fire(), Some(sunset));

    assert_eq!(scheduler.poll(sunset), vec![SensorState::EventActive]);
    assert_eq!(
        scheduler.poll(sunset + Duration::seconds(1)),
        vec![SensorState::NoEvent]
    );

    let tomorrow = scheduler.next_fire().unwrap();
    let gap = tomorrow - sunset;
    assert!(
        gap > Duration::hours(23) && gap < Duration::hours(25),
        "next sunset {tomorrow} is not a day after {sunset}"
    );
}
