//! Core event loop.
//!
//! `Core` owns every configured [`SolarScheduler`] and is the only place their
//! state is touched. It blocks on a single channel with `recv_timeout` until
//! either a message arrives or the earliest timer deadline is due:
//!
//! - bridge requests (status, characteristic writes, identify) arrive as
//!   [`RuntimeMessage::Bridge`] and are answered through their reply sender
//! - shutdown signals arrive as [`RuntimeMessage::Shutdown`]
//! - timer deadlines are polled after every wake-up
//!
//! Every wait is capped at [`MAX_LOOP_WAIT`] so that a suspend/resume or a
//! wall-clock step delays a due timer by at most that long.

pub mod scheduler;
pub mod timer;

use anyhow::Result;
use chrono::{DateTime, Utc};
use std::sync::{Arc, mpsc};
use std::time::Duration;

use crate::bridge::{BridgeEvent, BridgeNotifier, BridgeRequest, BridgeResponse, Setting};
use crate::constants::MAX_LOOP_WAIT;
use crate::error::SchedulerError;
use crate::time_source::{TimeSource, duration_until};

use scheduler::SolarScheduler;

/// Messages delivered to the event loop.
#[derive(Debug)]
pub enum RuntimeMessage {
    /// A bridge request and where to send its response.
    Bridge {
        request: BridgeRequest,
        reply: mpsc::Sender<BridgeResponse>,
    },
    /// Stop the loop (SIGINT, SIGTERM, SIGHUP).
    Shutdown,
}

/// Dependencies of a Core instance.
pub struct CoreParams {
    pub schedulers: Vec<SolarScheduler>,
    pub time_source: Arc<dyn TimeSource>,
    pub receiver: mpsc::Receiver<RuntimeMessage>,
    pub notifier: Option<BridgeNotifier>,
    pub debug_enabled: bool,
}

/// Single-threaded owner of all accessories.
pub struct Core {
    schedulers: Vec<SolarScheduler>,
    time_source: Arc<dyn TimeSource>,
    receiver: mpsc::Receiver<RuntimeMessage>,
    notifier: Option<BridgeNotifier>,
    debug_enabled: bool,
    /// Last announced `next_fire` per scheduler, index-aligned.
    announced: Vec<Option<Option<DateTime<Utc>>>>,
}

impl Core {
    pub fn new(params: CoreParams) -> Self {
        let announced = vec![None; params.schedulers.len()];
        let mut core = Self {
            schedulers: params.schedulers,
            time_source: params.time_source,
            receiver: params.receiver,
            notifier: params.notifier,
            debug_enabled: params.debug_enabled,
            announced,
        };
        core.announce_schedules();
        core
    }

    /// Run until a shutdown message arrives or every sender is gone.
    pub fn execute(mut self) -> Result<()> {
        log_block_start!(
            "Watching {} accessor{}",
            self.schedulers.len(),
            if self.schedulers.len() == 1 { "y" } else { "ies" }
        );

        loop {
            self.tick();

            let wait = self.wait_duration();
            if self.debug_enabled {
                log_debug!("Sleeping up to {}s", wait.as_secs());
            }

            match self.receiver.recv_timeout(wait) {
                Ok(message) => {
                    if !self.handle_message(message) {
                        break;
                    }
                }
                Err(mpsc::RecvTimeoutError::Timeout) => {}
                Err(mpsc::RecvTimeoutError::Disconnected) => break,
            }
        }

        log_block_start!("Shutting down");
        Ok(())
    }

    /// Fire every due timer and publish the resulting events.
    pub fn tick(&mut self) {
        let now = self.time_source.now();
        for index in 0..self.schedulers.len() {
            let changes = self.schedulers[index].poll(now);
            for state in changes {
                self.notify(BridgeEvent::Sensor {
                    accessory: self.schedulers[index].name().to_string(),
                    state,
                    at: now,
                });
            }
        }
        self.announce_schedules();
    }

    /// How long the loop may block before the next deadline is due.
    pub fn wait_duration(&self) -> Duration {
        let now = self.time_source.now();
        self.schedulers
            .iter()
            .filter_map(SolarScheduler::next_deadline)
            .min()
            .map(|deadline| duration_until(now, deadline))
            .map_or(MAX_LOOP_WAIT, |wait| wait.min(MAX_LOOP_WAIT))
    }

    /// Handle one message. Returns `false` when the loop should stop.
    pub fn handle_message(&mut self, message: RuntimeMessage) -> bool {
        match message {
            RuntimeMessage::Shutdown => false,
            RuntimeMessage::Bridge { request, reply } => {
                let response = self.handle_request(request);
                // The connection may have given up waiting
                let _ = reply.send(response);
                self.announce_schedules();
                true
            }
        }
    }

    pub fn schedulers(&self) -> &[SolarScheduler] {
        &self.schedulers
    }

    fn handle_request(&mut self, request: BridgeRequest) -> BridgeResponse {
        let now = self.time_source.now();

        match request {
            BridgeRequest::Status { accessory: None } => BridgeResponse::Status {
                accessories: self.schedulers.iter().map(SolarScheduler::status).collect(),
            },
            BridgeRequest::Status {
                accessory: Some(name),
            } => match self.find(&name) {
                Ok(scheduler) => BridgeResponse::Status {
                    accessories: vec![scheduler.status()],
                },
                Err(e) => BridgeResponse::error(e.to_string()),
            },
            BridgeRequest::Identify { accessory } => match self.find(&accessory) {
                Ok(scheduler) => {
                    scheduler.identify();
                    BridgeResponse::Ok
                }
                Err(e) => BridgeResponse::error(e.to_string()),
            },
            BridgeRequest::Set {
                accessory,
                characteristic,
                value,
            } => {
                let setting = match characteristic.parse_value(&value) {
                    Ok(setting) => setting,
                    Err(message) => return BridgeResponse::error(message),
                };
                match self.apply(&accessory, setting, now) {
                    Ok(()) => BridgeResponse::Ok,
                    Err(e) => BridgeResponse::error(e.to_string()),
                }
            }
            // Subscriptions are handled by the socket server itself
            BridgeRequest::Subscribe => BridgeResponse::error("subscribe is not a core request"),
        }
    }

    /// Route a characteristic write and collect its acknowledgement.
    fn apply(
        &mut self,
        accessory: &str,
        setting: Setting,
        now: DateTime<Utc>,
    ) -> Result<(), SchedulerError> {
        let index = self
            .schedulers
            .iter()
            .position(|s| s.name() == accessory)
            .ok_or_else(|| SchedulerError::UnknownAccessory(accessory.to_string()))?;
        let scheduler = &mut self.schedulers[index];

        let mut outcome = None;
        let done = |result: Result<(), SchedulerError>| outcome = Some(result);
        match setting {
            Setting::Period(period) => scheduler.set_period(period, now, done),
            Setting::Offset(minutes) => scheduler.set_offset(minutes, now, done),
            Setting::Enabled(enabled) => scheduler.set_enabled(enabled, now, done),
        }

        outcome.unwrap_or(Ok(()))
    }

    fn find(&self, name: &str) -> Result<&SolarScheduler, SchedulerError> {
        self.schedulers
            .iter()
            .find(|s| s.name() == name)
            .ok_or_else(|| SchedulerError::UnknownAccessory(name.to_string()))
    }

    /// Emit a `scheduled` event for every scheduler whose timer changed.
    fn announce_schedules(&mut self) {
        for index in 0..self.schedulers.len() {
            let next_fire = self.schedulers[index].next_fire();
            if self.announced[index] != Some(next_fire) {
                self.announced[index] = Some(next_fire);
                self.notify(BridgeEvent::Scheduled {
                    accessory: self.schedulers[index].name().to_string(),
                    next_fire,
                });
            }
        }
    }

    fn notify(&self, event: BridgeEvent) {
        if self.debug_enabled {
            match &event {
                BridgeEvent::Sensor {
                    accessory, state, ..
                } => log_debug!("{accessory}: sensor is now {}", state.as_str()),
                BridgeEvent::Scheduled { accessory, .. } => {
                    log_debug!("{accessory}: schedule changed")
                }
            }
        }
        if let Some(notifier) = &self.notifier {
            notifier.send(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::Characteristic;
    use crate::geo::{Location, SolarPeriod, SolarTimes, SolarTimesProvider};
    use crate::state::MemoryStore;
    use crate::time_source::ManualTimeSource;
    use scheduler::SensorState;
    use chrono::{Duration as ChronoDuration, NaiveDate, TimeZone};
    use scheduler::SchedulerParams;
    use serde_json::json;

    struct SunsetAtSix;

    impl SolarTimesProvider for SunsetAtSix {
        fn solar_times(&self, date: NaiveDate, _location: &Location) -> SolarTimes {
            let mut times = SolarTimes::new();
            times.insert(
                SolarPeriod::Sunset,
                date.and_hms_opt(18, 0, 0).unwrap().and_utc(),
            );
            times
        }
    }

    struct Harness {
        core: Core,
        clock: Arc<ManualTimeSource>,
        events: mpsc::Receiver<BridgeEvent>,
        _sender: mpsc::Sender<RuntimeMessage>,
        store: MemoryStore,
    }

    fn harness(enabled: bool) -> Harness {
        let start = Utc.with_ymd_and_hms(2024, 3, 20, 17, 0, 0).unwrap();
        let clock = Arc::new(ManualTimeSource::new(start));
        let store = MemoryStore::new();

        let scheduler = SolarScheduler::new(
            SchedulerParams {
                name: "Sunset".to_string(),
                version: "1.0.0".to_string(),
                latitude: 0.0,
                longitude: 0.0,
                period_name: "sunset".to_string(),
                offset_minutes: None,
                enabled: Some(enabled),
                store: Box::new(store.clone()),
                provider: Box::new(SunsetAtSix),
            },
            start,
        )
        .unwrap();

        let (sender, receiver) = mpsc::channel();
        let (notifier, events) = BridgeNotifier::new();
        let core = Core::new(CoreParams {
            schedulers: vec![scheduler],
            time_source: clock.clone(),
            receiver,
            notifier: Some(notifier),
            debug_enabled: false,
        });

        Harness {
            core,
            clock,
            events,
            _sender: sender,
            store,
        }
    }

    fn ask(core: &mut Core, request: BridgeRequest) -> BridgeResponse {
        let (reply, replies) = mpsc::channel();
        assert!(core.handle_message(RuntimeMessage::Bridge { request, reply }));
        replies.try_recv().unwrap()
    }

    #[test]
    fn test_initial_schedule_is_announced() {
        let h = harness(true);
        let event = h.events.try_recv().unwrap();
        assert_eq!(
            event,
            BridgeEvent::Scheduled {
                accessory: "Sunset".to_string(),
                next_fire: Some(Utc.with_ymd_and_hms(2024, 3, 20, 18, 0, 0).unwrap()),
            }
        );
    }

    #[test]
    fn test_wait_is_capped_and_tracks_deadline() {
        let h = harness(true);
        assert_eq!(h.core.wait_duration(), MAX_LOOP_WAIT);

        h.clock.advance(ChronoDuration::minutes(59) + ChronoDuration::seconds(30));
        assert_eq!(h.core.wait_duration(), Duration::from_secs(30));
    }

    #[test]
    fn test_pulse_is_published_to_subscribers() {
        let mut h = harness(true);
        let _ = h.events.try_recv();

        h.clock.advance(ChronoDuration::hours(1));
        h.core.tick();
        h.clock.advance(ChronoDuration::seconds(1));
        h.core.tick();

        let events: Vec<_> = h.events.try_iter().collect();
        let states: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                BridgeEvent::Sensor { state, .. } => Some(*state),
                _ => None,
            })
            .collect();
        assert_eq!(states, vec![SensorState::EventActive, SensorState::NoEvent]);
        assert!(events.iter().any(|e| matches!(
            e,
            BridgeEvent::Scheduled { next_fire: Some(at), .. }
                if *at == Utc.with_ymd_and_hms(2024, 3, 21, 18, 0, 0).unwrap()
        )));
    }

    #[test]
    fn test_set_request_persists_and_reschedules() {
        let mut h = harness(false);

        let response = ask(
            &mut h.core,
            BridgeRequest::Set {
                accessory: "Sunset".to_string(),
                characteristic: Characteristic::Enabled,
                value: json!(true),
            },
        );
        assert_eq!(response, BridgeResponse::Ok);
        assert_eq!(h.store.writes(), 1);
        assert!(h.core.schedulers()[0].next_fire().is_some());
    }

    #[test]
    fn test_store_failure_is_reported_to_the_client() {
        let mut h = harness(true);
        h.store.set_failing(true);

        let response = ask(
            &mut h.core,
            BridgeRequest::Set {
                accessory: "Sunset".to_string(),
                characteristic: Characteristic::Offset,
                value: json!(30),
            },
        );
        assert!(matches!(response, BridgeResponse::Error { .. }));
        assert_eq!(h.core.schedulers()[0].config().offset_minutes, 0);
    }

    #[test]
    fn test_unknown_accessory_and_bad_values() {
        let mut h = harness(true);

        let unknown = ask(
            &mut h.core,
            BridgeRequest::Identify {
                accessory: "Moonrise".to_string(),
            },
        );
        assert_eq!(
            unknown,
            BridgeResponse::error("no accessory named 'Moonrise'")
        );

        let bad = ask(
            &mut h.core,
            BridgeRequest::Set {
                accessory: "Sunset".to_string(),
                characteristic: Characteristic::Period,
                value: json!(99),
            },
        );
        assert!(matches!(bad, BridgeResponse::Error { .. }));
        assert_eq!(h.store.writes(), 0);
    }

    #[test]
    fn test_status_lists_accessories() {
        let mut h = harness(true);
        match ask(&mut h.core, BridgeRequest::Status { accessory: None }) {
            BridgeResponse::Status { accessories } => {
                assert_eq!(accessories.len(), 1);
                assert_eq!(accessories[0].name, "Sunset");
                assert!(accessories[0].enabled);
            }
            other => panic!("unexpected response: {other:?}"),
        }
    }

    #[test]
    fn test_shutdown_stops_the_loop() {
        let mut h = harness(true);
        assert!(!h.core.handle_message(RuntimeMessage::Shutdown));
    }
}
