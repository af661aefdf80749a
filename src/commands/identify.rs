//! Identify command - ask an accessory to announce itself in the daemon log.

use anyhow::{Context, Result};

use crate::bridge::BridgeRequest;

/// Handle the identify command.
pub fn handle_identify_command(config_dir: Option<&str>, accessory: &str) -> Result<()> {
    let mut client = super::connect(config_dir)?;
    let response = client.request(&BridgeRequest::Identify {
        accessory: accessory.to_string(),
    })?;

    super::expect_ok(response).with_context(|| format!("Failed to identify '{accessory}'"))?;

    log_version!();
    log_block_start!("Identify sent to '{accessory}'");
    log_end!();
    Ok(())
}

/// Display help for the identify command.
pub fn display_help() {
    log_version!();
    log_block_start!("identify - Ask an accessory to identify itself");
    log_block_start!("Usage: suncontact identify <ACCESSORY>");
    log_pipe!();
    log_info!("The daemon logs the request; the sensor state is not changed.");
    log_end!();
}
