//! Persistent accessory state, following XDG Base Directory standards.
//!
//! Each accessory keeps one small record, [`SolarConfig`], that survives
//! restarts: the selected period, the offset and whether the trigger is
//! enabled. The record is written through a [`StateStore`] and only committed
//! in memory after the store acknowledges the write.
//!
//! ## Stores
//!
//! - [`JsonFileStore`]: one JSON file per accessory under
//!   `$XDG_STATE_HOME/suncontact/`, replaced atomically on every write
//! - [`MemoryStore`]: volatile store for `--ephemeral` runs and tests

mod file;
mod memory;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::constants::{CONFIG_DIR_NAME, DEFAULT_ENABLED, DEFAULT_OFFSET_MINUTES};
use crate::error::StoreError;
use crate::geo::SolarPeriod;

pub use file::JsonFileStore;
pub use memory::MemoryStore;

/// The persisted, user-adjustable part of an accessory.
///
/// The scheduler treats this as an immutable snapshot: a change builds a new
/// value, persists it, and only then replaces the old one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolarConfig {
    /// Index into [`SolarPeriod::ALL`].
    pub period: usize,
    /// Minutes added to the raw event time; negative fires earlier.
    #[serde(rename = "offset")]
    pub offset_minutes: i64,
    /// Whether the trigger is armed at all.
    pub enabled: bool,
}

impl Default for SolarConfig {
    fn default() -> Self {
        Self {
            period: 0,
            offset_minutes: DEFAULT_OFFSET_MINUTES,
            enabled: DEFAULT_ENABLED,
        }
    }
}

impl SolarConfig {
    /// The selected catalog entry, if the index is valid.
    pub fn solar_period(&self) -> Option<SolarPeriod> {
        SolarPeriod::from_index(self.period)
    }

    pub fn with_period(self, period: usize) -> Self {
        Self { period, ..self }
    }

    pub fn with_offset(self, offset_minutes: i64) -> Self {
        Self {
            offset_minutes,
            ..self
        }
    }

    pub fn with_enabled(self, enabled: bool) -> Self {
        Self { enabled, ..self }
    }
}

/// Durable storage for one accessory's [`SolarConfig`].
#[cfg_attr(test, mockall::automock)]
pub trait StateStore {
    /// Last saved configuration, or `default` if nothing was saved yet.
    fn retrieve(&self, default: SolarConfig) -> Result<SolarConfig, StoreError>;

    /// Durably save a configuration snapshot.
    fn store(&mut self, config: &SolarConfig) -> Result<(), StoreError>;
}

/// Get the state directory.
///
/// Uses the explicit override when given, otherwise
/// `$XDG_STATE_HOME/suncontact` (falling back to `~/.local/state/suncontact`).
pub fn get_state_dir(override_dir: Option<&Path>) -> Result<PathBuf> {
    if let Some(dir) = override_dir {
        return Ok(dir.to_path_buf());
    }

    let state_home = std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("/tmp"))
                .join(".local/state")
        });

    Ok(state_home.join(CONFIG_DIR_NAME))
}

/// File name for an accessory's state record.
///
/// Display names may contain anything; the file name keeps ASCII letters and
/// digits and turns every other run of characters into a single dash.
pub fn state_file_name(accessory_name: &str) -> String {
    let mut slug = String::with_capacity(accessory_name.len());
    let mut pending_dash = false;

    for ch in accessory_name.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }

    if slug.is_empty() {
        slug.push_str("accessory");
    }
    format!("{slug}.json")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_persisted_layout_is_flat() {
        let config = SolarConfig {
            period: 6,
            offset_minutes: -15,
            enabled: true,
        };
        let json = serde_json::to_value(config).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "period": 6, "offset": -15, "enabled": true })
        );
    }

    #[test]
    fn test_with_methods_copy_instead_of_mutating() {
        let original = SolarConfig::default();
        let changed = original.with_offset(30).with_enabled(true).with_period(3);

        assert_eq!(original, SolarConfig::default());
        assert_eq!(changed.offset_minutes, 30);
        assert!(changed.enabled);
        assert_eq!(changed.solar_period(), Some(SolarPeriod::SolarNoon));
    }

    #[test]
    fn test_state_file_name_slugs() {
        assert_eq!(state_file_name("Sunset"), "sunset.json");
        assert_eq!(state_file_name("  Porch light / dusk!"), "porch-light-dusk.json");
        assert_eq!(state_file_name("Ünïcode"), "n-code.json");
        assert_eq!(state_file_name("???"), "accessory.json");
    }

    #[test]
    #[serial]
    fn test_state_dir_respects_xdg_state_home() {
        let original = std::env::var("XDG_STATE_HOME").ok();
        unsafe {
            std::env::set_var("XDG_STATE_HOME", "/tmp/suncontact-state-test");
        }

        let dir = get_state_dir(None).unwrap();
        assert_eq!(dir, PathBuf::from("/tmp/suncontact-state-test/suncontact"));

        let explicit = get_state_dir(Some(Path::new("/srv/state"))).unwrap();
        assert_eq!(explicit, PathBuf::from("/srv/state"));

        unsafe {
            match original {
                Some(value) => std::env::set_var("XDG_STATE_HOME", value),
                None => std::env::remove_var("XDG_STATE_HOME"),
            }
        }
    }
}
