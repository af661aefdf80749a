//! Application-wide constants and defaults.
//!
//! Keeping these in one place makes the timing behavior of the accessory easy
//! to audit: how long a pulse lasts, how long the event loop may sleep, and
//! what an unconfigured accessory looks like.

use std::time::Duration;

// # Accessory defaults

/// Offset applied when the configuration does not name one (minutes).
pub const DEFAULT_OFFSET_MINUTES: i64 = 0;

/// Accessories start disabled unless the configuration says otherwise.
pub const DEFAULT_ENABLED: bool = false;

/// Catalog name used in generated configuration files.
pub const DEFAULT_PERIOD_NAME: &str = "sunset";

/// Accessory information reported alongside the sensor.
pub const ACCESSORY_MANUFACTURER: &str = "suncontact";
pub const ACCESSORY_MODEL: &str = "Solar Event Contact Sensor";

// # Timing

/// How long the sensor stays in the event state before it resets.
pub const PULSE_DURATION: Duration = Duration::from_secs(1);

/// Longest uninterrupted wait of the event loop.
///
/// Timers are wall-clock deadlines; waking at least this often means a
/// suspend/resume or clock step is noticed within a minute.
pub const MAX_LOOP_WAIT: Duration = Duration::from_secs(60);

/// How long a bridge connection waits for the event loop to answer.
pub const BRIDGE_REPLY_TIMEOUT: Duration = Duration::from_secs(5);

// # Validation limits

/// Offsets beyond one week are accepted but reported as likely mistakes.
pub const OFFSET_WARNING_MINUTES: i64 = 7 * 24 * 60;

// # File names

pub const CONFIG_DIR_NAME: &str = "suncontact";
pub const CONFIG_FILE_NAME: &str = "suncontact.toml";
pub const SOCKET_FILE_NAME: &str = "suncontact.sock";
pub const LOCK_FILE_NAME: &str = "suncontact.lock";

// # Exit codes

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;
