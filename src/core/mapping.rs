//! Lux to brightness mapping.
//!
//! Ambient light is normalized into `[0, 1]` between `min_lux` and `max_lux`, then raised
//! to `gamma`. A gamma below 1 lifts the low and middle of the range, which matches how
//! eyes perceive brightness in dim rooms better than a linear ramp.

use crate::common::constants::{MAXIMUM_BRIGHTNESS, MINIMUM_BRIGHTNESS};

/// Map a lux reading to a brightness percentage in `1..=100`.
///
/// Callers guarantee `max_lux > min_lux`; configuration validation enforces it.
/// NaN maps to the minimum.
pub fn lux_to_brightness(lux: f64, min_lux: f64, max_lux: f64, gamma: f64) -> u8 {
    if lux.is_nan() || lux <= min_lux {
        return MINIMUM_BRIGHTNESS;
    }
    if lux >= max_lux {
        return MAXIMUM_BRIGHTNESS;
    }

    let normalized = (lux - min_lux) / (max_lux - min_lux);
    let corrected = normalized.powf(gamma);
    let percent = (corrected * 100.0).round();

    percent.clamp(f64::from(MINIMUM_BRIGHTNESS), f64::from(MAXIMUM_BRIGHTNESS)) as u8
}

/// Curve parameters bundled for repeated mapping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BrightnessCurve {
    pub min_lux: f64,
    pub max_lux: f64,
    pub gamma: f64,
}

impl BrightnessCurve {
    pub fn new(min_lux: f64, max_lux: f64, gamma: f64) -> Self {
        Self {
            min_lux,
            max_lux,
            gamma,
        }
    }

    pub fn brightness_for(&self, lux: f64) -> u8 {
        lux_to_brightness(lux, self.min_lux, self.max_lux, self.gamma)
    }
}
