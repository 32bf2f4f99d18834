//! Configuration validation functionality.
//!
//! Rejects values that would make the control loop misbehave: inverted or degenerate
//! brightness curves, zero-length timings, and thresholds outside their units.

use anyhow::Result;

use super::Config;
use crate::common::constants::*;

/// Validate a configuration, including one merged with command-line overrides.
pub fn validate_config(config: &Config) -> Result<()> {
    validate_curve(config)?;

    if let Some(ms) = config.transition_duration
        && !(MINIMUM_TRANSITION_DURATION..=MAXIMUM_TRANSITION_DURATION).contains(&ms)
    {
        anyhow::bail!(
            "transition_duration ({} ms) must be between {} and {} milliseconds",
            ms,
            MINIMUM_TRANSITION_DURATION,
            MAXIMUM_TRANSITION_DURATION
        );
    }

    if let Some(ms) = config.transition_step
        && !(MINIMUM_TRANSITION_STEP..=MAXIMUM_TRANSITION_STEP).contains(&ms)
    {
        anyhow::bail!(
            "transition_step ({} ms) must be between {} and {} milliseconds",
            ms,
            MINIMUM_TRANSITION_STEP,
            MAXIMUM_TRANSITION_STEP
        );
    }

    validate_wait_interval(config.poll_interval, "poll_interval")?;
    validate_wait_interval(config.low_light_hold, "low_light_hold")?;
    validate_wait_interval(config.settle_interval, "settle_interval")?;

    validate_non_negative_lux(config.low_light_floor, "low_light_floor")?;
    validate_non_negative_lux(config.noise_threshold, "noise_threshold")?;

    if let Some(threshold) = config.override_threshold
        && threshold > MAXIMUM_OVERRIDE_THRESHOLD
    {
        anyhow::bail!(
            "override_threshold ({}%) must be between 0% and {}%",
            threshold,
            MAXIMUM_OVERRIDE_THRESHOLD
        );
    }

    if let Some(window) = config.lux_window
        && !(MINIMUM_LUX_WINDOW..=MAXIMUM_LUX_WINDOW).contains(&window)
    {
        anyhow::bail!(
            "lux_window ({}) must be between {} and {} readings",
            window,
            MINIMUM_LUX_WINDOW,
            MAXIMUM_LUX_WINDOW
        );
    }

    if let Some(ref device) = config.backlight_device {
        validate_device_name(device, "backlight_device")?;
    }
    if let Some(ref device) = config.sensor_device {
        validate_device_name(device, "sensor_device")?;
    }

    Ok(())
}

/// The curve is checked on effective values so a lone `max_lux` below the default
/// `min_lux` is caught too.
fn validate_curve(config: &Config) -> Result<()> {
    let min_lux = config.min_lux.unwrap_or(DEFAULT_MIN_LUX);
    let max_lux = config.max_lux.unwrap_or(DEFAULT_MAX_LUX);

    if !min_lux.is_finite() || !(0.0..MAXIMUM_LUX).contains(&min_lux) {
        anyhow::bail!(
            "min_lux ({}) must be between 0 and {} lux",
            min_lux,
            MAXIMUM_LUX
        );
    }

    if !max_lux.is_finite() || !(0.0..=MAXIMUM_LUX).contains(&max_lux) {
        anyhow::bail!(
            "max_lux ({}) must be between 0 and {} lux",
            max_lux,
            MAXIMUM_LUX
        );
    }

    if max_lux <= min_lux {
        anyhow::bail!(
            "max_lux ({}) must be greater than min_lux ({})",
            max_lux,
            min_lux
        );
    }

    if let Some(gamma) = config.gamma
        && (!gamma.is_finite() || !(MINIMUM_GAMMA..=MAXIMUM_GAMMA).contains(&gamma))
    {
        anyhow::bail!(
            "gamma ({}) must be between {} and {}",
            gamma,
            MINIMUM_GAMMA,
            MAXIMUM_GAMMA
        );
    }

    Ok(())
}

fn validate_wait_interval(value: Option<u64>, field_name: &str) -> Result<()> {
    if let Some(ms) = value
        && !(MINIMUM_WAIT_INTERVAL..=MAXIMUM_WAIT_INTERVAL).contains(&ms)
    {
        anyhow::bail!(
            "{} ({} ms) must be between {} and {} milliseconds",
            field_name,
            ms,
            MINIMUM_WAIT_INTERVAL,
            MAXIMUM_WAIT_INTERVAL
        );
    }
    Ok(())
}

fn validate_non_negative_lux(value: Option<f64>, field_name: &str) -> Result<()> {
    if let Some(lux) = value
        && (!lux.is_finite() || lux < 0.0)
    {
        anyhow::bail!("{} ({}) must be a non-negative number of lux", field_name, lux);
    }
    Ok(())
}

/// Device names are joined onto sysfs directories, so path separators are refused.
fn validate_device_name(name: &str, field_name: &str) -> Result<()> {
    if name.is_empty() || name.contains('/') || name == "." || name == ".." {
        anyhow::bail!(
            "{} ({:?}) must be a plain device name such as \"intel_backlight\"",
            field_name,
            name
        );
    }
    Ok(())
}
