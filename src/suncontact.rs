//! Application coordinator that manages the complete lifecycle of the daemon.
//!
//! This module handles resource acquisition, initialization, and orchestration
//! of the core event loop. It manages:
//! - Configuration loading
//! - Lock file management for single-instance enforcement
//! - Signal handler setup
//! - Accessory construction (state store and solar provider per accessory)
//! - The bridge socket server
//!
//! The `Suncontact` struct uses a builder pattern:
//! - Normal startup: `Suncontact::new(debug_enabled).run()`
//! - Volatile state: `Suncontact::new(debug_enabled).ephemeral().run()`

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::{Arc, mpsc};

use crate::{
    bridge::{BridgeNotifier, BridgeServer},
    config::{self, AccessoryConfig, Config},
    core::scheduler::{SchedulerParams, SolarScheduler},
    core::{Core, CoreParams},
    geo::SunriseProvider,
    io::lock::{ensure_single_instance, get_main_lock_path},
    io::signals::setup_signal_handler,
    logger::Log,
    state::{JsonFileStore, MemoryStore, StateStore, state_file_name},
    time_source::{RealTimeSource, TimeSource},
};

/// Builder for configuring and running the suncontact daemon.
///
/// # Examples
///
/// ```no_run
/// use suncontact::Suncontact;
///
/// # fn main() -> anyhow::Result<()> {
/// // Normal daemon startup
/// Suncontact::new(false).run()?;
///
/// // Custom configuration directory, state kept in memory
/// Suncontact::new(true)
///     .with_config_dir(Some("/etc/suncontact".into()))
///     .ephemeral()
///     .run()?;
/// # Ok(())
/// # }
/// ```
pub struct Suncontact {
    debug_enabled: bool,
    config_dir: Option<PathBuf>,
    ephemeral: bool,
    timestamps: bool,
}

impl Suncontact {
    /// Create a new runner with defaults matching normal run
    pub fn new(debug_enabled: bool) -> Self {
        Self {
            debug_enabled,
            config_dir: None,
            ephemeral: false,
            timestamps: false,
        }
    }

    /// Read configuration from this directory instead of the XDG default
    pub fn with_config_dir(mut self, config_dir: Option<PathBuf>) -> Self {
        self.config_dir = config_dir;
        self
    }

    /// Keep accessory state in memory; nothing is written to disk
    pub fn ephemeral(mut self) -> Self {
        self.ephemeral = true;
        self
    }

    /// Prefix every log line with the wall-clock time
    pub fn with_timestamps(mut self) -> Self {
        self.timestamps = true;
        self
    }

    /// Execute the daemon with the configured settings.
    ///
    /// Returns once a shutdown signal has been processed by the event loop.
    /// The socket and lock file are removed on the way out.
    pub fn run(self) -> Result<()> {
        Log::set_timestamps(self.timestamps);
        log_version!();

        if self.debug_enabled {
            log_pipe!();
            log_debug!("Debug mode enabled - showing timer and bridge activity");
        }

        let config_dir = self.config_dir.as_deref();
        let config = Config::load(config_dir).context("Configuration failed")?;
        config.log_config(&config::get_config_path(config_dir)?);

        let state_dir = config.state_dir()?;
        let _lock = ensure_single_instance(&get_main_lock_path(), &state_dir)?;

        if self.ephemeral {
            log_block_start!("Ephemeral mode: accessory state is kept in memory only");
        } else {
            std::fs::create_dir_all(&state_dir).with_context(|| {
                format!(
                    "Failed to create state directory {}",
                    config::private_path(&state_dir)
                )
            })?;
        }

        let (runtime_sender, runtime_receiver) = mpsc::channel();
        setup_signal_handler(runtime_sender.clone(), self.debug_enabled)?;

        let time_source: Arc<dyn TimeSource> = Arc::new(RealTimeSource);
        let now = time_source.now();

        let mut schedulers = Vec::with_capacity(config.accessories.len());
        for accessory in &config.accessories {
            let store = self.store_for(accessory, &state_dir);
            let scheduler = SolarScheduler::new(scheduler_params(accessory, store), now)
                .with_context(|| format!("Failed to create accessory '{}'", accessory.name))?;
            schedulers.push(scheduler);
        }

        let (notifier, event_receiver) = BridgeNotifier::new();
        let socket_path = config.socket_path();
        let server = BridgeServer::start(
            socket_path.clone(),
            event_receiver,
            runtime_sender,
            self.debug_enabled,
        )?;
        log_block_start!(
            "Bridge listening on {}",
            config::private_path(&socket_path)
        );

        let core = Core::new(CoreParams {
            schedulers,
            time_source,
            receiver: runtime_receiver,
            notifier: Some(notifier),
            debug_enabled: self.debug_enabled,
        });

        let result = core.execute();
        server.shutdown()?;
        log_end!();
        result
    }

    fn store_for(&self, accessory: &AccessoryConfig, state_dir: &Path) -> Box<dyn StateStore> {
        if self.ephemeral {
            Box::new(MemoryStore::new())
        } else {
            Box::new(JsonFileStore::new(
                state_dir.join(state_file_name(&accessory.name)),
            ))
        }
    }
}

/// Construction parameters for one configured accessory.
pub fn scheduler_params(accessory: &AccessoryConfig, store: Box<dyn StateStore>) -> SchedulerParams {
    SchedulerParams {
        name: accessory.name.clone(),
        version: accessory.version(),
        latitude: accessory.location.latitude(),
        longitude: accessory.location.longitude(),
        period_name: accessory.period_name().to_string(),
        offset_minutes: accessory.offset,
        enabled: accessory.enabled,
        store,
        provider: Box::new(SunriseProvider),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LocationConfig;
    use crate::geo::SolarPeriod;
    use chrono::Utc;

    #[test]
    fn test_scheduler_params_carry_the_configuration() {
        let accessory = AccessoryConfig {
            name: "Back Porch".to_string(),
            version: Some("2.0.1".to_string()),
            location: LocationConfig::Table {
                latitude: 48.85,
                longitude: 2.35,
            },
            period: Some("Dusk".to_string()),
            offset: Some(-20),
            enabled: Some(true),
        };

        let scheduler =
            SolarScheduler::new(scheduler_params(&accessory, Box::new(MemoryStore::new())), Utc::now())
                .unwrap();
        let status = scheduler.status();

        assert_eq!(status.name, "Back Porch");
        assert_eq!(status.firmware_revision, "2.0.1");
        assert_eq!(status.period, SolarPeriod::Dusk);
        assert_eq!(status.offset_minutes, -20);
        assert!(status.enabled);
        assert_eq!(status.serial_number, "back-porch");
    }
}
