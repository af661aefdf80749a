//! Periods command - list the solar period catalog.

use anyhow::Result;

use crate::geo::SolarPeriod;

/// Print every catalog entry with its index.
///
/// The index is what `set <accessory> period <index>` and the saved state
/// files refer to.
pub fn handle_periods_command() -> Result<()> {
    log_version!();
    log_block_start!("Solar periods:");
    for period in SolarPeriod::ALL {
        log_indented!(
            "{:>2}  {:<14} {}",
            period.index(),
            period.name(),
            period.description()
        );
    }
    log_end!();
    Ok(())
}

/// Display help for the periods command.
pub fn display_help() {
    log_version!();
    log_block_start!("periods - List the solar periods an accessory can follow");
    log_block_start!("Usage: suncontact periods");
    log_pipe!();
    log_info!("Names are matched case-insensitively in the configuration file.");
    log_end!();
}
