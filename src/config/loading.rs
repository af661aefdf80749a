//! Configuration loading functionality.
//!
//! Resolves the configuration path, creates the default file when missing,
//! parses the TOML and runs validation.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use super::validation::validate_config;
use super::{Config, private_path};
use crate::constants::{CONFIG_DIR_NAME, CONFIG_FILE_NAME};

/// Load configuration, creating a default file first if none exists.
pub fn load(custom_dir: Option<&Path>) -> Result<Config> {
    let config_path = get_config_path(custom_dir)?;

    if !config_path.exists() {
        super::builder::create_default_config(&config_path)
            .context("Failed to create default config during load")?;
    }

    load_from_path(&config_path).with_context(|| {
        format!(
            "Failed to load configuration from {}",
            private_path(&config_path)
        )
    })
}

/// Load configuration from a specific path.
///
/// Unlike [`load`], a missing file is an error here.
pub fn load_from_path(path: &Path) -> Result<Config> {
    if !path.exists() {
        anyhow::bail!("Configuration file not found: {}", private_path(path));
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config from {}", private_path(path)))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config from {}", private_path(path)))?;

    validate_config(&config)?;

    Ok(config)
}

/// Path of the configuration file.
///
/// `custom_dir` (from `--config`) replaces the XDG config directory.
pub fn get_config_path(custom_dir: Option<&Path>) -> Result<PathBuf> {
    if let Some(dir) = custom_dir {
        return Ok(super::expand_tilde(dir).join(CONFIG_FILE_NAME));
    }

    let config_dir = dirs::config_dir().context("Could not determine config directory")?;
    Ok(config_dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}
