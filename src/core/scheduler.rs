//! Solar event scheduler for one contact-sensor accessory.
//!
//! The scheduler owns an accessory's configuration snapshot, its location, the
//! sensor state and two timers:
//!
//! ```text
//!            configuration change
//!                    │ persist ─▶ commit ─▶ acknowledge ─▶ restart_timer
//!                    ▼
//!   ┌────────┐  event timer   ┌────────┐  silence (1s)   ┌──────┐
//!   │ Armed  │ ─────────────▶ │ Active │ ──────────────▶ │ Idle │ ──▶ restart_timer
//!   └────────┘                └────────┘                 └──────┘
//! ```
//!
//! A configuration change cancels the armed event timer only. The silence
//! timer started by a pulse always runs to completion.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration as StdDuration;

use super::timer::OneShot;
use crate::constants::{ACCESSORY_MANUFACTURER, ACCESSORY_MODEL, PULSE_DURATION};
use crate::error::SchedulerError;
use crate::geo::{Location, SolarPeriod, SolarTimesProvider};
use crate::state::{SolarConfig, StateStore};
use crate::time_source::{duration_until, format_delay};

/// Binary state of the contact sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorState {
    /// Contact closed: no solar event in progress.
    #[default]
    NoEvent,
    /// Contact open for the duration of a pulse.
    EventActive,
}

impl SensorState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SensorState::NoEvent => "no event",
            SensorState::EventActive => "event active",
        }
    }
}

/// The next instant a solar period (plus offset) occurs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Occurrence {
    pub period: SolarPeriod,
    /// Event time with the offset applied.
    pub at: DateTime<Utc>,
    /// Wait from the computation instant to `at`, always positive.
    pub delay: StdDuration,
}

/// Find the next instant after `now` at which `period + offset` occurs.
///
/// "Today" is the local solar date of `now - offset`, so that large offsets
/// still find the nearest occurrence. If today's instant is missing or not in
/// the future, tomorrow's is used; if that is missing too the period is
/// unavailable. An event that precedes its own solar date (nadir) may need
/// one more date, but the result is never more than a day away.
pub fn compute_next_occurrence(
    now: DateTime<Utc>,
    location: &Location,
    period: SolarPeriod,
    offset_minutes: i64,
    provider: &dyn SolarTimesProvider,
) -> Result<Occurrence, SchedulerError> {
    let unavailable = |date: NaiveDate| SchedulerError::ScheduleUnavailable { period, date };

    let offset = Duration::try_minutes(offset_minutes).ok_or(unavailable(now.date_naive()))?;
    let anchor = now
        .checked_sub_signed(offset)
        .ok_or(unavailable(now.date_naive()))?;
    let today = location.solar_date(anchor);

    let adjusted = |date: NaiveDate| {
        provider
            .solar_times(date, location)
            .get(period)
            .and_then(|raw| raw.checked_add_signed(offset))
    };

    let at = match adjusted(today) {
        Some(at) if at > now => at,
        _ => {
            let tomorrow = today.succ_opt().ok_or(unavailable(today))?;
            match adjusted(tomorrow) {
                Some(at) if at > now => at,
                // Nadir sits on the solar date boundary and can precede the
                // anchor on both dates; its next instant is one date further.
                Some(_) => tomorrow
                    .succ_opt()
                    .and_then(adjusted)
                    .filter(|at| *at > now)
                    .ok_or(unavailable(today))?,
                None => return Err(unavailable(today)),
            }
        }
    };

    Ok(Occurrence {
        period,
        at,
        delay: duration_until(now, at),
    })
}

/// Everything needed to bring an accessory up.
pub struct SchedulerParams {
    pub name: String,
    pub version: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Configured period name, matched case-insensitively.
    pub period_name: String,
    pub offset_minutes: Option<i64>,
    pub enabled: Option<bool>,
    pub store: Box<dyn StateStore>,
    pub provider: Box<dyn SolarTimesProvider>,
}

/// Snapshot of an accessory for the bridge and the CLI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessoryStatus {
    pub name: String,
    pub manufacturer: String,
    pub model: String,
    pub serial_number: String,
    pub firmware_revision: String,
    pub latitude: f64,
    pub longitude: f64,
    pub period: SolarPeriod,
    pub period_index: usize,
    pub offset_minutes: i64,
    pub enabled: bool,
    pub sensor: SensorState,
    pub next_fire: Option<DateTime<Utc>>,
}

/// Scheduler and state machine for one accessory.
pub struct SolarScheduler {
    name: String,
    version: String,
    location: Location,
    config: SolarConfig,
    sensor: SensorState,
    event_timer: OneShot,
    silence_timer: OneShot,
    store: Box<dyn StateStore>,
    provider: Box<dyn SolarTimesProvider>,
}

impl SolarScheduler {
    /// Create the accessory and arm its first timer if it is enabled.
    ///
    /// Fails only when the location is out of range. An unknown period name
    /// resolves to the first catalog entry, and an unreadable or invalid
    /// stored record is replaced by the configured defaults; both are logged.
    pub fn new(params: SchedulerParams, now: DateTime<Utc>) -> Result<Self, SchedulerError> {
        let location = Location::new(params.latitude, params.longitude)?;

        let (period, matched) = SolarPeriod::resolve_index(&params.period_name);
        if !matched {
            log_warning!(
                "{}: unknown period '{}', using '{}'",
                params.name,
                params.period_name,
                SolarPeriod::ALL[0]
            );
        }

        let defaults = SolarConfig {
            period,
            offset_minutes: params.offset_minutes.unwrap_or_default(),
            enabled: params.enabled.unwrap_or_default(),
        };

        let config = match params.store.retrieve(defaults) {
            Ok(saved) if saved.solar_period().is_some() => saved,
            Ok(saved) => {
                log_warning!(
                    "{}: stored period index {} is out of range, using defaults",
                    params.name,
                    saved.period
                );
                defaults
            }
            Err(e) => {
                log_warning!("{}: could not load saved state ({e}), using defaults", params.name);
                defaults
            }
        };

        let mut scheduler = Self {
            name: params.name,
            version: params.version,
            location,
            config,
            sensor: SensorState::NoEvent,
            event_timer: OneShot::new(),
            silence_timer: OneShot::new(),
            store: params.store,
            provider: params.provider,
        };

        log_block_start!("Accessory '{}' ready", scheduler.name);
        log_indented!(
            "Location: {:.4}°, {:.4}°",
            location.latitude(),
            location.longitude()
        );
        log_indented!("Period: {}", scheduler.period());
        log_indented!("Offset: {} min", scheduler.config.offset_minutes);
        log_indented!("Enabled: {}", scheduler.config.enabled);

        if scheduler.config.enabled {
            scheduler.restart_timer(now);
        }

        Ok(scheduler)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    /// The committed configuration snapshot.
    pub fn config(&self) -> SolarConfig {
        self.config
    }

    pub fn sensor_state(&self) -> SensorState {
        self.sensor
    }

    /// When the armed event timer fires, if one is armed.
    pub fn next_fire(&self) -> Option<DateTime<Utc>> {
        self.event_timer.deadline()
    }

    /// Earliest pending deadline of either timer.
    pub fn next_deadline(&self) -> Option<DateTime<Utc>> {
        match (self.event_timer.deadline(), self.silence_timer.deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    fn period(&self) -> SolarPeriod {
        // The snapshot is validated before it is ever committed
        self.config.solar_period().unwrap_or(SolarPeriod::ALL[0])
    }

    /// Select a new solar period by catalog index.
    pub fn set_period<F>(&mut self, index: usize, now: DateTime<Utc>, done: F)
    where
        F: FnOnce(Result<(), SchedulerError>),
    {
        let Some(period) = SolarPeriod::from_index(index) else {
            log_pipe!();
            log_error!("{}: rejected period index {index}", self.name);
            done(Err(SchedulerError::InvalidPeriod { index }));
            return;
        };

        log_block_start!("{}: period set to {period}", self.name);
        let next = self.config.with_period(index);
        self.persist(next, now, done);
    }

    /// Change the offset in minutes (negative fires earlier).
    pub fn set_offset<F>(&mut self, offset_minutes: i64, now: DateTime<Utc>, done: F)
    where
        F: FnOnce(Result<(), SchedulerError>),
    {
        log_block_start!("{}: offset set to {offset_minutes} min", self.name);
        let next = self.config.with_offset(offset_minutes);
        self.persist(next, now, done);
    }

    /// Enable or disable the trigger.
    pub fn set_enabled<F>(&mut self, enabled: bool, now: DateTime<Utc>, done: F)
    where
        F: FnOnce(Result<(), SchedulerError>),
    {
        log_block_start!(
            "{}: trigger {}",
            self.name,
            if enabled { "enabled" } else { "disabled" }
        );
        let next = self.config.with_enabled(enabled);
        self.persist(next, now, done);
    }

    /// Store `next`, then commit it, acknowledge the caller and rearm.
    ///
    /// On a store failure the caller gets the error and nothing else changes:
    /// neither the snapshot nor the armed timer.
    fn persist<F>(&mut self, next: SolarConfig, now: DateTime<Utc>, done: F)
    where
        F: FnOnce(Result<(), SchedulerError>),
    {
        if let Err(e) = self.store.store(&next) {
            log_error!("{}: failed to save configuration: {e}", self.name);
            done(Err(SchedulerError::Persistence(e)));
            return;
        }

        self.config = next;
        done(Ok(()));
        self.restart_timer(now);
    }

    /// Cancel the armed event timer and arm a fresh one if enabled.
    pub fn restart_timer(&mut self, now: DateTime<Utc>) {
        self.event_timer.cancel();

        if !self.config.enabled {
            log_decorated!("{}: disabled, no timer armed", self.name);
            return;
        }

        match compute_next_occurrence(
            now,
            &self.location,
            self.period(),
            self.config.offset_minutes,
            self.provider.as_ref(),
        ) {
            Ok(occurrence) => {
                self.event_timer.arm(occurrence.at);
                log_decorated!(
                    "{}: next {} at {} (in {})",
                    self.name,
                    occurrence.period,
                    occurrence.at.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M:%S"),
                    format_delay(occurrence.delay)
                );
            }
            Err(e) => {
                log_pipe!();
                log_error!("{}: {e}", self.name);
                log_indented!("No timer armed until the configuration changes");
            }
        }
    }

    /// Fire every timer that is due at `now`.
    ///
    /// Returns the sensor states entered, in order.
    pub fn poll(&mut self, now: DateTime<Utc>) -> Vec<SensorState> {
        let mut changes = Vec::new();

        if self.event_timer.fire_if_due(now) {
            log_block_start!("{}: {} reached", self.name, self.period());
            if self.sensor != SensorState::EventActive {
                self.sensor = SensorState::EventActive;
                changes.push(SensorState::EventActive);
            }
            if !self.silence_timer.is_armed() {
                let pulse = Duration::from_std(PULSE_DURATION).unwrap_or(Duration::seconds(1));
                self.silence_timer.arm(now + pulse);
            }
        }

        if self.silence_timer.fire_if_due(now) {
            self.sensor = SensorState::NoEvent;
            changes.push(SensorState::NoEvent);
            log_decorated!("{}: sensor reset", self.name);
            self.restart_timer(now);
        }

        changes
    }

    /// Host identify hook: log and acknowledge.
    pub fn identify(&self) {
        log_block_start!("Identify requested for '{}'", self.name);
    }

    pub fn status(&self) -> AccessoryStatus {
        let period = self.period();
        AccessoryStatus {
            name: self.name.clone(),
            manufacturer: ACCESSORY_MANUFACTURER.to_string(),
            model: ACCESSORY_MODEL.to_string(),
            serial_number: crate::state::state_file_name(&self.name)
                .trim_end_matches(".json")
                .to_string(),
            firmware_revision: self.version.clone(),
            latitude: self.location.latitude(),
            longitude: self.location.longitude(),
            period,
            period_index: period.index(),
            offset_minutes: self.config.offset_minutes,
            enabled: self.config.enabled,
            sensor: self.sensor,
            next_fire: self.next_fire(),
        }
    }
}
