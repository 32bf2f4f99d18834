//! Configuration system for luxr.
//!
//! Settings live in a TOML file, `luxr.toml`, under `$XDG_CONFIG_HOME/luxr/` or under the
//! directory passed with `--config`. A commented default file is written on first run.
//!
//! ```toml
//! #[Devices]
//! backend = "auto"            # Brightness write path: "auto", "logind" or "sysfs"
//!
//! #[Brightness curve]
//! min_lux = 5.0               # Ambient light mapped to the lowest brightness (lux)
//! max_lux = 500.0             # Ambient light mapped to full brightness (lux)
//! gamma = 0.6                 # Curve exponent, below 1 favors brighter output (0.1-5.0)
//!
//! #[Transitions]
//! transition_duration = 5000  # Length of one brightness ramp (0-60000)ms
//! transition_step = 100       # Delay between ramp steps (1-1000)ms
//!
//! #[Timing]
//! poll_interval = 2000        # Delay between sensor samples (100-60000)ms
//! low_light_hold = 5000       # Delay after a reading below low_light_floor (100-60000)ms
//! settle_interval = 2000      # Delay after an override or a noise-floor skip (100-60000)ms
//!
//! #[Filtering]
//! low_light_floor = 5.0       # Readings below this are ignored (lux)
//! noise_threshold = 2.0       # Minimum lux change that triggers an adjustment
//! override_threshold = 2      # Brightness drift treated as a manual change (0-100)%
//! lux_window = 1              # Readings averaged before evaluation (1-60)
//! ```
//!
//! Every field is optional. Loading validates the raw file first, then fills missing
//! fields from `common::constants`, so the rest of the program can rely on `Some` values.

pub mod builder;
pub mod loading;
pub mod validation;
pub mod watcher;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::common::constants::*;
use crate::common::utils::format_millis;

// Re-export public API
pub use builder::create_default_config;
pub use loading::{
    get_config_path, get_custom_config_dir, load, load_from_path, load_with_overrides,
    set_config_dir,
};
pub use validation::validate_config;
pub use watcher::start_config_watcher;

/// Brightness write path.
///
/// Reads always come from sysfs. Writes either go through systemd-logind, which lets an
/// unprivileged session user change the backlight, or straight to the sysfs attribute.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// logind when the system bus is reachable, sysfs otherwise.
    Auto,
    /// `org.freedesktop.login1.Session.SetBrightness` over the system bus.
    Logind,
    /// Direct writes to `/sys/class/backlight/<device>/brightness`.
    Sysfs,
}

impl Backend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::Auto => "auto",
            Backend::Logind => "logind",
            Backend::Sysfs => "sysfs",
        }
    }
}

/// Configuration structure for luxr settings.
///
/// Field groups:
///
/// - **Devices**: `backend`, `backlight_device`, `sensor_device`
/// - **Brightness curve**: `min_lux`, `max_lux`, `gamma`
/// - **Transitions**: `transition_duration`, `transition_step` (milliseconds)
/// - **Timing**: `poll_interval`, `low_light_hold`, `settle_interval` (milliseconds)
/// - **Filtering**: `low_light_floor`, `noise_threshold`, `override_threshold`, `lux_window`
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub backend: Option<Backend>,
    pub backlight_device: Option<String>, // name under /sys/class/backlight
    pub sensor_device: Option<String>,    // name under /sys/bus/iio/devices

    pub min_lux: Option<f64>,
    pub max_lux: Option<f64>,
    pub gamma: Option<f64>,

    pub transition_duration: Option<u64>, // ms
    pub transition_step: Option<u64>,     // ms

    pub poll_interval: Option<u64>,   // ms
    pub low_light_hold: Option<u64>,  // ms
    pub settle_interval: Option<u64>, // ms

    pub low_light_floor: Option<f64>,
    pub noise_threshold: Option<f64>,
    pub override_threshold: Option<u8>,
    pub lux_window: Option<usize>,
}

impl Config {
    pub fn load() -> Result<Self> {
        load()
    }

    pub fn load_from_path(path: &PathBuf) -> Result<Self> {
        load_from_path(path)
    }

    pub fn get_config_path() -> Result<PathBuf> {
        get_config_path()
    }

    /// Replace the curve endpoints with values given on the command line.
    ///
    /// `None` keeps the configured value. The caller validates the merged result.
    pub fn apply_cli_overrides(&mut self, min_lux: Option<f64>, max_lux: Option<f64>) {
        if let Some(min) = min_lux {
            self.min_lux = Some(min);
        }
        if let Some(max) = max_lux {
            self.max_lux = Some(max);
        }
    }

    pub fn log_config(&self, resolved_backend: Option<&str>) {
        let source = match get_custom_config_dir() {
            Some(_) => "custom configuration",
            None => "default configuration",
        };
        log_block_start!("Loaded {}", source);

        let backend = self.backend.unwrap_or(DEFAULT_BACKEND);
        match (backend, resolved_backend) {
            (Backend::Auto, Some(resolved)) => log_indented!("Backend: Auto ({resolved})"),
            _ => log_indented!("Backend: {}", backend.as_str()),
        }

        if let Some(ref device) = self.backlight_device {
            log_indented!("Backlight device: {device}");
        }
        if let Some(ref device) = self.sensor_device {
            log_indented!("Sensor device: {device}");
        }

        log_indented!(
            "Curve: {} - {} lux @ gamma {}",
            self.min_lux.unwrap_or(DEFAULT_MIN_LUX),
            self.max_lux.unwrap_or(DEFAULT_MAX_LUX),
            self.gamma.unwrap_or(DEFAULT_GAMMA)
        );
        log_indented!(
            "Transition: {} in {} steps",
            format_millis(
                self.transition_duration
                    .unwrap_or(DEFAULT_TRANSITION_DURATION)
            ),
            format_millis(self.transition_step.unwrap_or(DEFAULT_TRANSITION_STEP))
        );
        log_indented!(
            "Poll interval: {}",
            format_millis(self.poll_interval.unwrap_or(DEFAULT_POLL_INTERVAL))
        );
        log_indented!(
            "Low light: below {} lux, hold {}",
            self.low_light_floor.unwrap_or(DEFAULT_LOW_LIGHT_FLOOR),
            format_millis(self.low_light_hold.unwrap_or(DEFAULT_LOW_LIGHT_HOLD))
        );
        log_indented!(
            "Noise threshold: {} lux, override threshold: {}%",
            self.noise_threshold.unwrap_or(DEFAULT_NOISE_THRESHOLD),
            self.override_threshold
                .unwrap_or(DEFAULT_OVERRIDE_THRESHOLD)
        );

        let window = self.lux_window.unwrap_or(DEFAULT_LUX_WINDOW);
        if window > 1 {
            log_indented!("Lux filter: mean of last {window} readings");
        }
    }
}
