//! # Suncontact Library
//!
//! Internal library for the suncontact binary: a daemon exposing virtual
//! contact sensors that pulse at a solar event (sunrise, sunset, dusk, ...)
//! plus a minute offset, every day, at a configured location.
//!
//! This library exists to enable testing of the scheduler and event loop and
//! to keep CLI dispatch (main.rs) separate from application logic.
//!
//! ## Architecture
//!
//! - **Entry Point**: `Suncontact` struct provides the daemon API with resource management
//! - **Core Logic**: `core` module with the per-accessory `SolarScheduler` and the
//!   single-threaded event loop that owns every accessory
//! - **Bridge**: `bridge` module, a line-delimited JSON socket standing in for the
//!   home-automation host
//! - **Configuration**: `config` module for TOML-based accessory definitions
//! - **Commands**: `commands` module for CLI subcommands (status, set, watch, next, ...)
//! - **Geographic**: `geo` module with the solar period catalog and the time provider
//! - **State**: `state` module persisting each accessory's period, offset and trigger
//! - **Infrastructure**: Signal handling, lock file, logging

// Import macros from logger module for use in all submodules
#[macro_use]
pub mod logger;

// Public API modules
pub mod args;
pub mod bridge;
pub mod commands;
pub mod config;
pub mod constants;
pub mod core;
pub mod error;
pub mod geo;
pub mod io;
pub mod state;
pub mod time_source;

mod suncontact;

// Re-export for binary
pub use suncontact::{Suncontact, scheduler_params};
