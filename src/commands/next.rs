//! Next command - compute upcoming events offline.
//!
//! Reads the configuration and each accessory's saved state, then runs the
//! same occurrence search the daemon uses. Nothing is armed and no daemon is
//! contacted, which makes this the quickest way to check a location or an
//! offset before enabling a trigger.

use anyhow::{Context, Result};
use chrono::{DateTime, Local, Utc};
use std::path::Path;

use crate::config::{AccessoryConfig, Config};
use crate::core::scheduler::compute_next_occurrence;
use crate::geo::{Location, SolarPeriod, SolarTimesProvider, SunriseProvider};
use crate::state::{JsonFileStore, SolarConfig, StateStore, state_file_name};
use crate::time_source::{format_delay, parse_datetime};

/// Handle the next command.
///
/// # Arguments
/// * `config_dir` - Optional custom configuration directory
/// * `accessory` - Only compute for this accessory
/// * `at` - Compute from this instant instead of now
pub fn handle_next_command(
    config_dir: Option<&str>,
    accessory: Option<&str>,
    at: Option<&str>,
) -> Result<()> {
    let now = match at {
        Some(text) => parse_datetime(text).map_err(anyhow::Error::msg)?,
        None => Utc::now(),
    };

    let config = Config::load(config_dir.map(Path::new))?;
    let state_dir = config.state_dir()?;

    let accessories: Vec<&AccessoryConfig> = match accessory {
        Some(name) => vec![
            config
                .find(name)
                .with_context(|| format!("No accessory named '{name}' in the configuration"))?,
        ],
        None => config.accessories.iter().collect(),
    };

    log_version!();
    log_block_start!(
        "Computing from {}",
        now.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S %Z")
    );

    let provider = SunriseProvider;
    for accessory in accessories {
        let store = JsonFileStore::new(state_dir.join(state_file_name(&accessory.name)));
        let solar = effective_config(accessory, &store);
        report_accessory(accessory, solar, now, &provider)?;
    }

    log_end!();
    Ok(())
}

/// Saved state if it is usable, otherwise the configured defaults.
fn effective_config(accessory: &AccessoryConfig, store: &dyn StateStore) -> SolarConfig {
    let defaults = SolarConfig {
        period: SolarPeriod::resolve_index(accessory.period_name()).0,
        offset_minutes: accessory.offset_minutes(),
        enabled: accessory.enabled(),
    };

    match store.retrieve(defaults) {
        Ok(saved) if saved.solar_period().is_some() => saved,
        Ok(saved) => {
            log_warning!(
                "Saved period index {} of '{}' is invalid, using configured defaults",
                saved.period,
                accessory.name
            );
            defaults
        }
        Err(e) => {
            log_warning!("Could not read saved state of '{}': {e}", accessory.name);
            defaults
        }
    }
}

fn report_accessory(
    accessory: &AccessoryConfig,
    solar: SolarConfig,
    now: DateTime<Utc>,
    provider: &dyn SolarTimesProvider,
) -> Result<()> {
    let location = Location::new(
        accessory.location.latitude(),
        accessory.location.longitude(),
    )?;
    let period = solar.solar_period().unwrap_or(SolarPeriod::ALL[0]);

    log_block_start!("Accessory '{}'", accessory.name);
    log_indented!(
        "Period: {period}, offset {} min{}",
        solar.offset_minutes,
        if solar.enabled { "" } else { " (trigger disabled)" }
    );

    match compute_next_occurrence(now, &location, period, solar.offset_minutes, provider) {
        Ok(occurrence) => log_indented!(
            "Next event: {} (in {})",
            occurrence.at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S"),
            format_delay(occurrence.delay)
        ),
        Err(e) => log_indented!("Next event: none ({e})"),
    }

    let today = location.solar_date(now);
    let times = provider.solar_times(today, &location);
    log_indented!("Solar times on {today}:");
    for candidate in SolarPeriod::ALL {
        let marker = if candidate == period { "*" } else { " " };
        match times.get(candidate) {
            Some(at) => log_indented!(
                "  {marker} {:<14} {}",
                candidate.name(),
                at.with_timezone(&Local).format("%H:%M:%S")
            ),
            None => log_indented!("  {marker} {:<14} does not occur", candidate.name()),
        }
    }
    Ok(())
}

/// Display help for the next command.
pub fn display_help() {
    log_version!();
    log_block_start!("next - Compute upcoming events without the daemon");
    log_block_start!("Usage: suncontact next [OPTIONS] [ACCESSORY]");
    log_block_start!("Arguments:");
    log_indented!("ACCESSORY  Only show this accessory");
    log_block_start!("Options:");
    log_indented!("--at <time>           Compute from \"YYYY-MM-DD HH:MM:SS\" (UTC) or RFC 3339");
    log_indented!("-c, --config <dir>    Configuration directory");
    log_block_start!("Examples:");
    log_indented!("suncontact next");
    log_indented!("suncontact next Sunset --at \"2024-12-21 12:00:00\"");
    log_end!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LocationConfig;
    use crate::state::MemoryStore;

    fn accessory() -> AccessoryConfig {
        AccessoryConfig {
            name: "Sunset".to_string(),
            version: None,
            location: LocationConfig::Pair([0.0, 0.0]),
            period: Some("dusk".to_string()),
            offset: Some(-10),
            enabled: Some(true),
        }
    }

    #[test]
    fn test_defaults_without_saved_state() {
        let solar = effective_config(&accessory(), &MemoryStore::new());
        assert_eq!(solar.period, SolarPeriod::Dusk.index());
        assert_eq!(solar.offset_minutes, -10);
        assert!(solar.enabled);
    }

    #[test]
    fn test_saved_state_wins_over_configuration() {
        let saved = SolarConfig {
            period: SolarPeriod::Sunrise.index(),
            offset_minutes: 5,
            enabled: false,
        };
        let solar = effective_config(&accessory(), &MemoryStore::with_saved(saved));
        assert_eq!(solar, saved);
    }

    #[test]
    fn test_invalid_saved_period_falls_back_to_defaults() {
        let saved = SolarConfig {
            period: 99,
            offset_minutes: 5,
            enabled: false,
        };
        let solar = effective_config(&accessory(), &MemoryStore::with_saved(saved));
        assert_eq!(solar.period, SolarPeriod::Dusk.index());
    }

    #[test]
    fn test_report_runs_with_the_real_provider() {
        let now = Utc::now();
        let solar = effective_config(&accessory(), &MemoryStore::new());
        assert!(report_accessory(&accessory(), solar, now, &SunriseProvider).is_ok());
    }
}
