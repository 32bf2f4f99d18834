//! Application-wide constants: configuration defaults, validation limits, and
//! operational timings.

use crate::config::Backend;

// # Application Configuration Defaults

pub const DEFAULT_BACKEND: Backend = Backend::Auto;

// Brightness curve
pub const DEFAULT_MIN_LUX: f64 = 5.0;
pub const DEFAULT_MAX_LUX: f64 = 500.0;
pub const DEFAULT_GAMMA: f64 = 0.6;

// Transition ramp (milliseconds)
pub const DEFAULT_TRANSITION_DURATION: u64 = 5000;
pub const DEFAULT_TRANSITION_STEP: u64 = 100;

// Loop timing (milliseconds)
pub const DEFAULT_POLL_INTERVAL: u64 = 2000;
pub const DEFAULT_LOW_LIGHT_HOLD: u64 = 5000;
pub const DEFAULT_SETTLE_INTERVAL: u64 = 2000;

// Gate thresholds
pub const DEFAULT_LOW_LIGHT_FLOOR: f64 = 5.0; // lux, independent of min_lux
pub const DEFAULT_NOISE_THRESHOLD: f64 = 2.0; // lux
pub const DEFAULT_OVERRIDE_THRESHOLD: u8 = 2; // percentage points

// Lux filter
pub const DEFAULT_LUX_WINDOW: usize = 1; // 1 = pass-through

// # Validation Limits

pub const MAXIMUM_LUX: f64 = 200_000.0; // direct sunlight tops out near 120k lux

pub const MINIMUM_GAMMA: f64 = 0.1;
pub const MAXIMUM_GAMMA: f64 = 5.0;

pub const MINIMUM_TRANSITION_DURATION: u64 = 0;
pub const MAXIMUM_TRANSITION_DURATION: u64 = 60_000;

pub const MINIMUM_TRANSITION_STEP: u64 = 1;
pub const MAXIMUM_TRANSITION_STEP: u64 = 1000;

pub const MINIMUM_WAIT_INTERVAL: u64 = 100;
pub const MAXIMUM_WAIT_INTERVAL: u64 = 60_000;

pub const MAXIMUM_OVERRIDE_THRESHOLD: u8 = 100;

pub const MINIMUM_LUX_WINDOW: usize = 1;
pub const MAXIMUM_LUX_WINDOW: usize = 60;

// # Brightness Levels

pub const MINIMUM_BRIGHTNESS: u8 = 1; // the curve never blanks the panel
pub const MAXIMUM_BRIGHTNESS: u8 = 100;

// # Operational Timing

/// Minimum wall-clock time between two housekeeping passes of the control loop.
pub const HOUSEKEEPING_INTERVAL_SECS: u64 = 60;

/// Upper bound for one `recv_timeout` chunk while waiting between cycles.
pub const WAIT_CHUNK_MS: u64 = 250;

/// Debounce window for configuration file change events.
pub const CONFIG_WATCH_DEBOUNCE_MS: u64 = 500;

/// How long `luxr stop` waits for the daemon to exit.
pub const STOP_TIMEOUT_MS: u64 = 3000;
pub const STOP_POLL_MS: u64 = 100;

// # Paths

pub const CONFIG_DIR_NAME: &str = "luxr";
pub const CONFIG_FILE_NAME: &str = "luxr.toml";
pub const LOCK_FILE_NAME: &str = "luxr.lock";

pub const BACKLIGHT_CLASS_DIR: &str = "/sys/class/backlight";
pub const IIO_DEVICES_DIR: &str = "/sys/bus/iio/devices";

// # Exit Codes

pub const EXIT_FAILURE: i32 = 1;

// # Test Constants
