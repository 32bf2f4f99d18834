//! Configuration loading functionality.
//!
//! Resolves the configuration path, creates a default file when none exists, and turns
//! the TOML text into a validated `Config` with defaults filled in.

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;
use std::sync::OnceLock;

use super::Config;
use super::validation::validate_config;
use crate::common::constants::*;
use crate::common::utils::private_path;

/// Global configuration directory, set once at startup
static CONFIG_DIR: OnceLock<Option<PathBuf>> = OnceLock::new();

/// Set the configuration directory for the current process.
/// This can only be called once, typically at startup.
/// Returns an error if already set.
pub fn set_config_dir(dir: Option<String>) -> Result<()> {
    CONFIG_DIR
        .set(dir.map(PathBuf::from))
        .map_err(|_| anyhow::anyhow!("Configuration directory already set"))
}

/// Get the custom configuration directory if one was set.
/// Returns None if using the default directory.
pub fn get_custom_config_dir() -> Option<PathBuf> {
    CONFIG_DIR.get().and_then(|d| d.clone())
}

/// Load configuration using automatic path detection.
///
/// This function will create a default configuration file if none exists.
pub fn load() -> Result<Config> {
    let config_path = get_config_path()?;

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

/// Load the configuration and merge positional lux overrides from the command line.
///
/// An override that leaves the curve invalid (out of range, or inverting it) is
/// dropped with a warning and the configured value is used instead.
pub fn load_with_overrides(min_lux: Option<f64>, max_lux: Option<f64>) -> Result<Config> {
    let config = load()?;
    if min_lux.is_none() && max_lux.is_none() {
        return Ok(config);
    }

    let (kept_min, kept_max) = [(min_lux, max_lux), (min_lux, None), (None, max_lux)]
        .into_iter()
        .find(|&(min, max)| {
            let mut merged = config.clone();
            merged.apply_cli_overrides(min, max);
            (min.is_some() || max.is_some()) && validate_config(&merged).is_ok()
        })
        .unwrap_or((None, None));

    if let Some(value) = min_lux.filter(|_| kept_min.is_none()) {
        log_pipe!();
        log_warning!(
            "Ignoring min_lux {value} from the command line: it leaves an invalid lux range"
        );
    }
    if let Some(value) = max_lux.filter(|_| kept_max.is_none()) {
        log_pipe!();
        log_warning!(
            "Ignoring max_lux {value} from the command line: it leaves an invalid lux range"
        );
    }

    let mut config = config;
    config.apply_cli_overrides(kept_min, kept_max);
    Ok(config)
}

/// Load configuration from a specific path.
///
/// This version does NOT create a default config if the path doesn't exist.
pub fn load_from_path(path: &PathBuf) -> Result<Config> {
    if !path.exists() {
        anyhow::bail!("Configuration file not found at {}", private_path(path));
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config from {}", private_path(path)))?;

    let mut config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config from {}", private_path(path)))?;

    validate_config(&config)?;
    apply_defaults(&mut config);

    Ok(config)
}

/// Get the configuration file path.
pub fn get_config_path() -> Result<PathBuf> {
    if let Some(custom_dir) = get_custom_config_dir() {
        return Ok(custom_dir.join(CONFIG_FILE_NAME));
    }

    let config_dir = dirs::config_dir().context("Could not determine config directory")?;
    Ok(config_dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

/// Apply default values to configuration fields.
pub(crate) fn apply_defaults(config: &mut Config) {
    config.backend.get_or_insert(DEFAULT_BACKEND);

    config.min_lux.get_or_insert(DEFAULT_MIN_LUX);
    config.max_lux.get_or_insert(DEFAULT_MAX_LUX);
    config.gamma.get_or_insert(DEFAULT_GAMMA);

    config
        .transition_duration
        .get_or_insert(DEFAULT_TRANSITION_DURATION);
    config.transition_step.get_or_insert(DEFAULT_TRANSITION_STEP);

    config.poll_interval.get_or_insert(DEFAULT_POLL_INTERVAL);
    config.low_light_hold.get_or_insert(DEFAULT_LOW_LIGHT_HOLD);
    config.settle_interval.get_or_insert(DEFAULT_SETTLE_INTERVAL);

    config.low_light_floor.get_or_insert(DEFAULT_LOW_LIGHT_FLOOR);
    config.noise_threshold.get_or_insert(DEFAULT_NOISE_THRESHOLD);
    config
        .override_threshold
        .get_or_insert(DEFAULT_OVERRIDE_THRESHOLD);
    config.lux_window.get_or_insert(DEFAULT_LUX_WINDOW);
}
