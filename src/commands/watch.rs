//! Watch command - stream sensor and schedule events from the running daemon.
//!
//! The daemon replays the current schedule of every accessory right after
//! subscribing, then pushes events as they happen. The command runs until the
//! daemon goes away or the user interrupts it.

use anyhow::Result;
use chrono::Local;

use crate::bridge::BridgeEvent;

/// Handle the watch command.
pub fn handle_watch_command(config_dir: Option<&str>, json: bool) -> Result<()> {
    let mut client = super::connect(config_dir)?;
    client.subscribe()?;

    if !json {
        log_version!();
        log_block_start!("Watching accessory events (Ctrl+C to stop)");
    }

    loop {
        let event = client.next_event()?;
        if json {
            println!("{}", serde_json::to_string(&event)?);
        } else {
            log_decorated!("{}", describe(&event));
        }
    }
}

/// One-line human-readable rendering of an event.
fn describe(event: &BridgeEvent) -> String {
    match event {
        BridgeEvent::Sensor {
            accessory,
            state,
            at,
        } => format!(
            "{} {accessory}: {}",
            at.with_timezone(&Local).format("%H:%M:%S"),
            state.as_str()
        ),
        BridgeEvent::Scheduled {
            accessory,
            next_fire: Some(next),
        } => format!(
            "{accessory}: next event at {}",
            next.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S")
        ),
        BridgeEvent::Scheduled {
            accessory,
            next_fire: None,
        } => format!("{accessory}: idle"),
    }
}

/// Display help for the watch command.
pub fn display_help() {
    log_version!();
    log_block_start!("watch - Stream sensor and schedule events");
    log_block_start!("Usage: suncontact watch [OPTIONS]");
    log_block_start!("Options:");
    log_indented!("-j, --json            One JSON object per line");
    log_indented!("-c, --config <dir>    Configuration directory of the daemon");
    log_end!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::scheduler::SensorState;
    use chrono::Utc;

    #[test]
    fn test_describe_events() {
        let sensor = BridgeEvent::Sensor {
            accessory: "Porch".to_string(),
            state: SensorState::EventActive,
            at: Utc::now(),
        };
        assert!(describe(&sensor).ends_with("Porch: event active"));

        let idle = BridgeEvent::Scheduled {
            accessory: "Porch".to_string(),
            next_fire: None,
        };
        assert_eq!(describe(&idle), "Porch: idle");

        let armed = BridgeEvent::Scheduled {
            accessory: "Porch".to_string(),
            next_fire: Some(Utc::now()),
        };
        assert!(describe(&armed).starts_with("Porch: next event at "));
    }
}
