//! Default configuration generation.
//!
//! Writes a commented `suncontact.toml` with one disabled example accessory,
//! with each setting's comment aligned in one column.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use super::private_path;
use crate::constants::{DEFAULT_ENABLED, DEFAULT_OFFSET_MINUTES, DEFAULT_PERIOD_NAME};

/// Royal Observatory, Greenwich. Placeholder until the user sets a location.
const EXAMPLE_LOCATION: (f64, f64) = (51.4779, -0.0015);

/// Create a default configuration file at `path`.
pub fn create_default_config(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("Failed to create config directory")?;
    }

    let (latitude, longitude) = EXAMPLE_LOCATION;
    let content = ConfigBuilder::new()
        .add_section("Daemon")
        .add_commented_setting(
            "socket",
            "\"/run/user/1000/suncontact.sock\"",
            "Bridge socket (default: $XDG_RUNTIME_DIR/suncontact.sock)",
        )
        .add_commented_setting(
            "state_dir",
            "\"~/.local/state/suncontact\"",
            "Saved accessory state (default: $XDG_STATE_HOME/suncontact)",
        )
        .add_table("accessory")
        .add_setting("name", "\"Sunset\"", "Display label, must be unique")
        .add_setting(
            "location",
            &format!("[{latitude}, {longitude}]"),
            "[latitude, longitude] in degrees",
        )
        .add_setting(
            "period",
            &format!("\"{DEFAULT_PERIOD_NAME}\""),
            "Solar period, see `suncontact periods`",
        )
        .add_setting(
            "offset",
            &DEFAULT_OFFSET_MINUTES.to_string(),
            "Minutes relative to the period (negative = earlier)",
        )
        .add_setting(
            "enabled",
            &DEFAULT_ENABLED.to_string(),
            "Arm the trigger",
        )
        .build();

    fs::write(path, content)
        .with_context(|| format!("Failed to write default config to {}", private_path(path)))?;

    log_block_start!("Created default configuration");
    log_indented!("{}", private_path(path));
    log_indented!("Edit the accessory location before enabling it");

    Ok(())
}

struct ConfigBuilder {
    entries: Vec<ConfigEntry>,
}

enum ConfigEntry {
    Section(String),
    Table(String),
    Setting { line: String, comment: String },
}

impl ConfigBuilder {
    fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    fn add_section(mut self, title: &str) -> Self {
        self.entries.push(ConfigEntry::Section(format!("#[{title}]")));
        self
    }

    /// An array-of-tables header such as `[[accessory]]`.
    fn add_table(mut self, name: &str) -> Self {
        self.entries.push(ConfigEntry::Table(format!("[[{name}]]")));
        self
    }

    fn add_setting(mut self, key: &str, value: &str, comment: &str) -> Self {
        self.entries.push(ConfigEntry::Setting {
            line: format!("{key} = {value}"),
            comment: format!("# {comment}"),
        });
        self
    }

    /// A setting that is shown but left disabled.
    fn add_commented_setting(mut self, key: &str, value: &str, comment: &str) -> Self {
        self.entries.push(ConfigEntry::Setting {
            line: format!("# {key} = {value}"),
            comment: format!("# {comment}"),
        });
        self
    }

    fn build(self) -> String {
        let max_width = self
            .entries
            .iter()
            .filter_map(|entry| match entry {
                ConfigEntry::Setting { line, .. } => Some(line.len()),
                _ => None,
            })
            .max()
            .unwrap_or(0)
            + 1;

        let mut result = Vec::new();
        for (position, entry) in self.entries.into_iter().enumerate() {
            match entry {
                ConfigEntry::Section(header) | ConfigEntry::Table(header) => {
                    if position > 0 {
                        result.push(String::new());
                    }
                    result.push(header);
                }
                ConfigEntry::Setting { line, comment } => {
                    let padding = " ".repeat(max_width - line.len());
                    result.push(format!("{line}{padding}{comment}"));
                }
            }
        }

        result.push(String::new());
        result.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_aligns_comments() {
        let content = ConfigBuilder::new()
            .add_section("Test")
            .add_setting("a", "1", "short")
            .add_setting("longer_key", "\"value\"", "long")
            .build();

        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], "#[Test]");
        assert_eq!(lines[1].find('#'), lines[2].find('#'));
    }

    #[test]
    fn test_table_header_is_not_a_comment() {
        let content = ConfigBuilder::new()
            .add_table("accessory")
            .add_setting("name", "\"Porch\"", "label")
            .build();

        assert!(content.starts_with("[[accessory]]\n"));
    }
}
