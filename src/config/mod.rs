//! Configuration for suncontact.
//!
//! The daemon reads a single TOML file, by default
//! `$XDG_CONFIG_HOME/suncontact/suncontact.toml` (the directory can be moved
//! with `--config <dir>`). A commented default file is written on first run.
//!
//! ```toml
//! #[Daemon]
//! # socket = "/run/user/1000/suncontact.sock"   # Bridge socket (optional)
//! # state_dir = "~/.local/state/suncontact"      # Saved accessory state (optional)
//!
//! [[accessory]]
//! name = "Sunset"            # Display label, must be unique
//! version = "1.0.0"          # Firmware revision (optional)
//! location = [52.52, 13.40]  # Or { latitude = 52.52, longitude = 13.40 }
//! period = "sunset"          # Solar period, see `suncontact periods`
//! offset = -15               # Minutes relative to the period (optional)
//! enabled = true             # Arm the trigger (optional)
//! ```
//!
//! The `period`, `offset` and `enabled` values are only defaults: once an
//! accessory has been changed through the bridge, its saved state wins.

pub mod builder;
pub mod loading;
pub mod validation;

use anyhow::Result;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::constants::{DEFAULT_ENABLED, DEFAULT_OFFSET_MINUTES};
use crate::geo::SolarPeriod;

pub use builder::create_default_config;
pub use loading::{get_config_path, load, load_from_path};

/// Accessory location as written in the configuration.
///
/// Either a `[latitude, longitude]` pair or a table whose keys may be spelled
/// `latitude`/`lat` and `longitude`/`lon`/`lng`.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
#[serde(untagged)]
pub enum LocationConfig {
    Pair([f64; 2]),
    Table {
        #[serde(alias = "lat")]
        latitude: f64,
        #[serde(alias = "lon", alias = "lng")]
        longitude: f64,
    },
}

impl LocationConfig {
    pub fn latitude(&self) -> f64 {
        match self {
            LocationConfig::Pair([latitude, _]) => *latitude,
            LocationConfig::Table { latitude, .. } => *latitude,
        }
    }

    pub fn longitude(&self) -> f64 {
        match self {
            LocationConfig::Pair([_, longitude]) => *longitude,
            LocationConfig::Table { longitude, .. } => *longitude,
        }
    }
}

/// One `[[accessory]]` entry.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct AccessoryConfig {
    /// Display label; also names the state file and addresses bridge writes.
    pub name: String,
    /// Firmware revision reported in status; defaults to the crate version.
    pub version: Option<String>,
    pub location: LocationConfig,
    /// Solar period name, matched case-insensitively.
    pub period: Option<String>,
    /// Minutes added to the event time; negative fires earlier.
    pub offset: Option<i64>,
    /// Whether the trigger starts armed.
    pub enabled: Option<bool>,
}

impl AccessoryConfig {
    pub fn version(&self) -> String {
        self.version
            .clone()
            .unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string())
    }

    /// The configured period name, or the first catalog entry.
    pub fn period_name(&self) -> &str {
        self.period
            .as_deref()
            .unwrap_or_else(|| SolarPeriod::ALL[0].name())
    }

    pub fn offset_minutes(&self) -> i64 {
        self.offset.unwrap_or(DEFAULT_OFFSET_MINUTES)
    }

    pub fn enabled(&self) -> bool {
        self.enabled.unwrap_or(DEFAULT_ENABLED)
    }
}

/// Top-level configuration file.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Config {
    /// Bridge socket path; defaults to `$XDG_RUNTIME_DIR/suncontact.sock`.
    pub socket: Option<PathBuf>,
    /// Directory for saved accessory state; defaults to the XDG state dir.
    pub state_dir: Option<PathBuf>,
    #[serde(default, rename = "accessory")]
    pub accessories: Vec<AccessoryConfig>,
}

impl Config {
    /// Load from the default location (or `custom_dir`), creating a default
    /// file first if none exists.
    pub fn load(custom_dir: Option<&Path>) -> Result<Self> {
        loading::load(custom_dir)
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        loading::load_from_path(path)
    }

    /// Effective bridge socket path.
    pub fn socket_path(&self) -> PathBuf {
        self.socket
            .as_deref()
            .map(expand_tilde)
            .unwrap_or_else(crate::bridge::default_socket_path)
    }

    /// Effective state directory.
    pub fn state_dir(&self) -> Result<PathBuf> {
        let explicit = self.state_dir.as_deref().map(expand_tilde);
        crate::state::get_state_dir(explicit.as_deref())
    }

    pub fn find(&self, name: &str) -> Option<&AccessoryConfig> {
        self.accessories.iter().find(|a| a.name == name)
    }

    /// Log the loaded configuration in the pipe style.
    pub fn log_config(&self, path: &Path) {
        log_block_start!("Loaded configuration");
        log_indented!("File: {}", private_path(path));
        log_indented!("Socket: {}", private_path(&self.socket_path()));

        for accessory in &self.accessories {
            log_pipe!();
            log_decorated!("Accessory '{}'", accessory.name);
            log_indented!(
                "Location: {:.4}°, {:.4}°",
                accessory.location.latitude(),
                accessory.location.longitude()
            );
            log_indented!("Period: {}", accessory.period_name());
            log_indented!("Offset: {} min", accessory.offset_minutes());
            log_indented!("Enabled: {}", accessory.enabled());
        }
    }
}

/// Expand a leading `~/` to the home directory.
pub(crate) fn expand_tilde(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), dirs::home_dir()) {
        (Ok(rest), Some(home)) => home.join(rest),
        _ => path.to_path_buf(),
    }
}

/// Show paths under the home directory as `~/...` in logs.
pub(crate) fn private_path(path: &Path) -> String {
    if let Some(home) = dirs::home_dir()
        && let Ok(rest) = path.strip_prefix(&home)
    {
        return format!("~/{}", rest.display());
    }
    path.display().to_string()
}

#[cfg(test)]
mod tests;
