//! Set command - write one characteristic of an accessory.
//!
//! The daemon acknowledges a write only after the new value has been saved,
//! so a successful return here means the change survives a restart.

use anyhow::{Context, Result};
use serde_json::Value;

use crate::bridge::{BridgeRequest, Characteristic};
use crate::geo::SolarPeriod;

/// Handle the set command.
pub fn handle_set_command(
    config_dir: Option<&str>,
    accessory: &str,
    characteristic: &str,
    value: &str,
) -> Result<()> {
    log_version!();

    let characteristic = Characteristic::from_name(characteristic).with_context(|| {
        format!("Unknown characteristic '{characteristic}'. Use period, offset or enabled")
    })?;
    let value = parse_cli_value(characteristic, value).map_err(anyhow::Error::msg)?;

    let mut client = super::connect(config_dir)?;
    let response = client.request(&BridgeRequest::Set {
        accessory: accessory.to_string(),
        characteristic,
        value: value.clone(),
    })?;

    super::expect_ok(response).with_context(|| {
        format!(
            "Failed to set {} of '{accessory}'",
            characteristic.as_str()
        )
    })?;

    log_block_start!("Updated '{accessory}'");
    log_indented!("{} = {value}", characteristic.as_str());
    log_end!();
    Ok(())
}

/// Convert a command-line word to the JSON value the bridge expects.
fn parse_cli_value(characteristic: Characteristic, value: &str) -> Result<Value, String> {
    let value = value.trim();
    match characteristic {
        Characteristic::Period => match value.parse::<u64>() {
            Ok(index) => Ok(Value::from(index)),
            Err(_) => SolarPeriod::from_name(value)
                .map(|period| Value::from(period.name()))
                .ok_or_else(|| {
                    format!("'{value}' is not a known period. See `suncontact periods`")
                }),
        },
        Characteristic::Offset => value
            .parse::<i64>()
            .map(Value::from)
            .map_err(|_| format!("offset must be a whole number of minutes, got '{value}'")),
        Characteristic::Enabled => match value.to_ascii_lowercase().as_str() {
            "true" | "on" | "yes" | "1" => Ok(Value::Bool(true)),
            "false" | "off" | "no" | "0" => Ok(Value::Bool(false)),
            _ => Err(format!("enabled must be true or false, got '{value}'")),
        },
    }
}

/// Display help for the set command.
pub fn display_help() {
    log_version!();
    log_block_start!("set - Write a characteristic of an accessory");
    log_block_start!("Usage: suncontact set <ACCESSORY> <CHARACTERISTIC> <VALUE>");
    log_block_start!("Characteristics:");
    log_indented!("period   Catalog index or name (see `suncontact periods`)");
    log_indented!("offset   Minutes relative to the period, negative fires earlier");
    log_indented!("enabled  true/false, on/off, yes/no");
    log_block_start!("Examples:");
    log_indented!("suncontact set Sunset period dusk");
    log_indented!("suncontact set Sunset offset -15");
    log_indented!("suncontact set Sunset enabled on");
    log_end!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_period_accepts_index_or_name() {
        assert_eq!(
            parse_cli_value(Characteristic::Period, "6"),
            Ok(Value::from(6u64))
        );
        assert_eq!(
            parse_cli_value(Characteristic::Period, "GoldenHour"),
            Ok(Value::from("goldenHour"))
        );
        assert!(parse_cli_value(Characteristic::Period, "teatime").is_err());
    }

    #[test]
    fn test_offset_accepts_negative_minutes() {
        assert_eq!(
            parse_cli_value(Characteristic::Offset, "-15"),
            Ok(Value::from(-15i64))
        );
        assert!(parse_cli_value(Characteristic::Offset, "1.5").is_err());
    }

    #[test]
    fn test_enabled_accepts_common_spellings() {
        for word in ["true", "On", "yes", "1"] {
            assert_eq!(
                parse_cli_value(Characteristic::Enabled, word),
                Ok(Value::Bool(true))
            );
        }
        for word in ["false", "OFF", "no", "0"] {
            assert_eq!(
                parse_cli_value(Characteristic::Enabled, word),
                Ok(Value::Bool(false))
            );
        }
        assert!(parse_cli_value(Characteristic::Enabled, "maybe").is_err());
    }

    #[test]
    fn test_parsed_values_are_accepted_by_the_bridge() {
        let value = parse_cli_value(Characteristic::Period, "dusk").unwrap();
        assert_eq!(
            Characteristic::Period.parse_value(&value),
            Ok(crate::bridge::Setting::Period(SolarPeriod::Dusk.index()))
        );
    }
}
