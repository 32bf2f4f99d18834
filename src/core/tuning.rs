use std::time::Duration;

use super::mapping::BrightnessCurve;
use crate::common::constants::*;
use crate::config::Config;

/// Resolved control loop parameters.
///
/// `Config` keeps every field optional so the file can stay sparse; `Tuning` is the
/// concrete view the loop works with.
#[derive(Debug, Clone, PartialEq)]
pub struct Tuning {
    pub min_lux: f64,
    pub max_lux: f64,
    pub gamma: f64,
    pub transition_duration: Duration,
    pub transition_step: Duration,
    pub poll_interval: Duration,
    pub low_light_floor: f64,
    pub low_light_hold: Duration,
    pub settle_interval: Duration,
    pub noise_threshold: f64,
    pub override_threshold: u8,
    pub lux_window: usize,
}

impl Default for Tuning {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl Tuning {
    pub fn from_config(config: &Config) -> Self {
        let ms = |value: Option<u64>, default: u64| Duration::from_millis(value.unwrap_or(default));

        Self {
            min_lux: config.min_lux.unwrap_or(DEFAULT_MIN_LUX),
            max_lux: config.max_lux.unwrap_or(DEFAULT_MAX_LUX),
            gamma: config.gamma.unwrap_or(DEFAULT_GAMMA),
            transition_duration: ms(config.transition_duration, DEFAULT_TRANSITION_DURATION),
            transition_step: ms(config.transition_step, DEFAULT_TRANSITION_STEP),
            poll_interval: ms(config.poll_interval, DEFAULT_POLL_INTERVAL),
            low_light_floor: config.low_light_floor.unwrap_or(DEFAULT_LOW_LIGHT_FLOOR),
            low_light_hold: ms(config.low_light_hold, DEFAULT_LOW_LIGHT_HOLD),
            settle_interval: ms(config.settle_interval, DEFAULT_SETTLE_INTERVAL),
            noise_threshold: config.noise_threshold.unwrap_or(DEFAULT_NOISE_THRESHOLD),
            override_threshold: config
                .override_threshold
                .unwrap_or(DEFAULT_OVERRIDE_THRESHOLD),
            lux_window: config.lux_window.unwrap_or(DEFAULT_LUX_WINDOW),
        }
    }

    pub fn curve(&self) -> BrightnessCurve {
        BrightnessCurve::new(self.min_lux, self.max_lux, self.gamma)
    }
}
