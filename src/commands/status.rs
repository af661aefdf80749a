//! Status command - display accessory state from the running daemon.
//!
//! The daemon answers with one [`AccessoryStatus`] per accessory. The
//! snapshot is taken inside the event loop, so it always matches the armed
//! timers exactly.

use anyhow::{Context, Result};
use chrono::{Local, Utc};

use crate::bridge::{BridgeRequest, BridgeResponse};
use crate::core::scheduler::AccessoryStatus;
use crate::time_source::{duration_until, format_delay};

/// Handle the status command.
///
/// # Arguments
/// * `config_dir` - Optional custom configuration directory (locates the socket)
/// * `accessory` - Only show this accessory
/// * `json` - Output in JSON format
pub fn handle_status_command(
    config_dir: Option<&str>,
    accessory: Option<&str>,
    json: bool,
) -> Result<()> {
    let mut client = super::connect(config_dir)?;

    let response = client
        .request(&BridgeRequest::Status {
            accessory: accessory.map(str::to_string),
        })
        .context("Failed to receive status from suncontact")?;

    let accessories = match response {
        BridgeResponse::Status { accessories } => accessories,
        BridgeResponse::Error { message } => anyhow::bail!("{message}"),
        other => anyhow::bail!("Unexpected reply from daemon: {other:?}"),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&accessories)?);
    } else {
        for (i, status) in accessories.iter().enumerate() {
            if i > 0 {
                println!();
            }
            display_human_readable(status);
        }
    }
    Ok(())
}

/// Display one accessory in human-readable format.
fn display_human_readable(status: &AccessoryStatus) {
    println!("     Accessory: {}", status.name);
    println!("      Location: {:.4}°, {:.4}°", status.latitude, status.longitude);
    println!(
        "        Period: {} (#{})",
        status.period, status.period_index
    );
    println!("        Offset: {} min", status.offset_minutes);
    println!(
        "       Trigger: {}",
        if status.enabled { "enabled" } else { "disabled" }
    );
    println!("        Sensor: {}", status.sensor.as_str());

    match status.next_fire {
        Some(next) => {
            let local = next.with_timezone(&Local);
            println!(
                "    Next event: {} (in {})",
                local.format("%Y-%m-%d %H:%M:%S"),
                format_delay(duration_until(Utc::now(), next))
            );
        }
        None => println!("    Next event: none"),
    }

    println!(
        "      Firmware: {} {} {}",
        status.model, status.serial_number, status.firmware_revision
    );
}

/// Display help for the status command.
pub fn display_help() {
    log_version!();
    log_block_start!("status - Show accessory state from the running daemon");
    log_block_start!("Usage: suncontact status [OPTIONS] [ACCESSORY]");
    log_block_start!("Arguments:");
    log_indented!("ACCESSORY  Only show this accessory");
    log_block_start!("Options:");
    log_indented!("-j, --json            Output as JSON");
    log_indented!("-c, --config <dir>    Configuration directory of the daemon");
    log_block_start!("Examples:");
    log_indented!("suncontact status");
    log_indented!("suncontact status Sunset --json");
    log_end!();
}
