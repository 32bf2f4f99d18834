//! Adjustment gate: decides whether a new reading should move the backlight.
//!
//! Checks run in a fixed order and the first match wins:
//!
//! 1. Low light: readings below `low_light_floor` are ignored without touching the
//!    backlight or the loop state.
//! 2. Manual override: the display drifted from the last known brightness by more than
//!    `override_threshold`, so someone else changed it. The loop adopts the new level.
//! 3. Noise floor: the reading moved less than `noise_threshold` lux since the last one.
//! 4. Otherwise the reading is mapped to a target brightness.

use std::time::Duration;

use super::mapping::BrightnessCurve;
use super::state::LoopState;
use super::tuning::Tuning;
use crate::backend::{BrightnessBackend, observed_brightness};

/// Outcome of one gate evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GateDecision {
    /// Ramp toward `target` percent.
    Proceed { target: u8 },
    /// Ambient light is below the low-light floor.
    SkipLowLight,
    /// The user changed the brightness; `observed` is the level now on the display.
    SkipManualOverride { observed: u8 },
    /// The reading is too close to the previous one to act on.
    SkipNoiseFloor,
}

impl GateDecision {
    pub fn is_skip(&self) -> bool {
        !matches!(self, GateDecision::Proceed { .. })
    }
}

impl std::fmt::Display for GateDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GateDecision::Proceed { target } => write!(f, "adjust to {target}%"),
            GateDecision::SkipLowLight => write!(f, "skip (low light)"),
            GateDecision::SkipManualOverride { observed } => {
                write!(f, "skip (manual override at {observed}%)")
            }
            GateDecision::SkipNoiseFloor => write!(f, "skip (below noise threshold)"),
        }
    }
}

/// Thresholds and holds used to evaluate readings.
#[derive(Debug, Clone)]
pub struct AdjustmentGate {
    curve: BrightnessCurve,
    low_light_floor: f64,
    noise_threshold: f64,
    override_threshold: u8,
    low_light_hold: Duration,
    settle_interval: Duration,
    debug_enabled: bool,
}

impl AdjustmentGate {
    pub fn from_tuning(tuning: &Tuning) -> Self {
        Self {
            curve: tuning.curve(),
            low_light_floor: tuning.low_light_floor,
            noise_threshold: tuning.noise_threshold,
            override_threshold: tuning.override_threshold,
            low_light_hold: tuning.low_light_hold,
            settle_interval: tuning.settle_interval,
            debug_enabled: false,
        }
    }

    /// Log degraded brightness queries.
    pub fn with_debug(mut self, debug_enabled: bool) -> Self {
        self.debug_enabled = debug_enabled;
        self
    }

    pub fn curve(&self) -> BrightnessCurve {
        self.curve
    }

    /// Evaluate a (filtered) reading against the current loop state.
    ///
    /// Skips caused by an override or the noise floor resynchronize `state` to the
    /// observed brightness and this reading. A low-light skip and `Proceed` leave it
    /// untouched.
    pub fn evaluate(
        &self,
        lux: f64,
        backend: &dyn BrightnessBackend,
        state: &mut LoopState,
    ) -> GateDecision {
        if lux < self.low_light_floor {
            return GateDecision::SkipLowLight;
        }

        let current = observed_brightness(backend, self.debug_enabled);

        if current.abs_diff(state.last_brightness) > self.override_threshold {
            state.resync(current, lux);
            return GateDecision::SkipManualOverride { observed: current };
        }

        if let Some(last_lux) = state.last_lux
            && (lux - last_lux).abs() < self.noise_threshold
        {
            state.resync(current, lux);
            return GateDecision::SkipNoiseFloor;
        }

        GateDecision::Proceed {
            target: self.curve.brightness_for(lux),
        }
    }

    /// How long the loop should wait after a skip. `None` for `Proceed`.
    pub fn hold_off(&self, decision: &GateDecision) -> Option<Duration> {
        match decision {
            GateDecision::Proceed { .. } => None,
            GateDecision::SkipLowLight => Some(self.low_light_hold),
            GateDecision::SkipManualOverride { .. } | GateDecision::SkipNoiseFloor => {
                Some(self.settle_interval)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MockBacklight;
    use crate::common::constants::test_constants::*;

    fn gate() -> AdjustmentGate {
        AdjustmentGate::from_tuning(&Tuning::default())
    }

    #[test]
    fn test_low_light_skips_without_query() {
        let backlight = MockBacklight::new(50);
        let mut state = LoopState::new(50, 1);

        let decision = gate().evaluate(TEST_DARK_LUX, &backlight, &mut state);

        assert_eq!(decision, GateDecision::SkipLowLight);
        assert_eq!(backlight.reads(), 0);
        assert!(state.last_lux.is_none());
        assert_eq!(gate().hold_off(&decision), Some(Duration::from_millis(5000)));
    }

    #[test]
    fn test_low_light_floor_is_independent_of_min_lux() {
        let tuning = Tuning {
            min_lux: 0.0,
            ..Tuning::default()
        };
        let backlight = MockBacklight::new(50);
        let mut state = LoopState::new(50, 1);

        let decision = AdjustmentGate::from_tuning(&tuning).evaluate(3.0, &backlight, &mut state);
        assert_eq!(decision, GateDecision::SkipLowLight);
    }

    #[test]
    fn test_first_reading_proceeds() {
        let backlight = MockBacklight::new(50);
        let mut state = LoopState::new(50, 1);

        let decision = gate().evaluate(TEST_MID_LUX, &backlight, &mut state);

        assert_eq!(
            decision,
            GateDecision::Proceed {
                target: TEST_MID_BRIGHTNESS
            }
        );
        assert_eq!(gate().hold_off(&decision), None);
        assert!(state.last_lux.is_none());
    }

    #[test]
    fn test_identical_reading_hits_noise_floor() {
        let backlight = MockBacklight::new(50);
        let mut state = LoopState::new(50, 1);
        state.last_lux = Some(120.0);

        let decision = gate().evaluate(120.0, &backlight, &mut state);

        assert_eq!(decision, GateDecision::SkipNoiseFloor);
        assert_eq!(state.last_lux, Some(120.0));
        assert_eq!(gate().hold_off(&decision), Some(Duration::from_millis(2000)));
    }

    #[test]
    fn test_noise_floor_resyncs_brightness_within_threshold() {
        let backlight = MockBacklight::new(52);
        let mut state = LoopState::new(50, 1);
        state.last_lux = Some(120.0);

        let decision = gate().evaluate(121.0, &backlight, &mut state);

        assert_eq!(decision, GateDecision::SkipNoiseFloor);
        assert_eq!(state.last_brightness, 52);
        assert_eq!(state.last_lux, Some(121.0));
    }

    #[test]
    fn test_change_at_noise_threshold_proceeds() {
        let backlight = MockBacklight::new(50);
        let mut state = LoopState::new(50, 1);
        state.last_lux = Some(100.0);

        let decision = gate().evaluate(102.0, &backlight, &mut state);
        assert!(matches!(decision, GateDecision::Proceed { .. }));
    }

    #[test]
    fn test_manual_override_detected() {
        let backlight = MockBacklight::new(80);
        let mut state = LoopState::new(50, 1);

        let decision = gate().evaluate(200.0, &backlight, &mut state);

        assert_eq!(decision, GateDecision::SkipManualOverride { observed: 80 });
        assert_eq!(state.last_brightness, 80);
        assert_eq!(state.last_lux, Some(200.0));
        assert_eq!(gate().hold_off(&decision), Some(Duration::from_millis(2000)));
    }

    #[test]
    fn test_override_threshold_is_exclusive() {
        let backlight = MockBacklight::new(52);
        let mut state = LoopState::new(50, 1);

        let decision = gate().evaluate(200.0, &backlight, &mut state);
        assert!(matches!(decision, GateDecision::Proceed { .. }));
    }

    #[test]
    fn test_override_wins_over_noise_floor() {
        let backlight = MockBacklight::new(10);
        let mut state = LoopState::new(60, 1);
        state.last_lux = Some(150.0);

        let decision = gate().evaluate(150.0, &backlight, &mut state);

        assert_eq!(decision, GateDecision::SkipManualOverride { observed: 10 });
    }

    #[test]
    fn test_failed_query_reads_as_zero() {
        let backlight = MockBacklight::new(50);
        backlight.fail_reads(true);
        let mut state = LoopState::new(50, 1);

        let decision = gate().evaluate(200.0, &backlight, &mut state);

        assert_eq!(decision, GateDecision::SkipManualOverride { observed: 0 });
        assert_eq!(state.last_brightness, 0);
    }

    #[test]
    fn test_decision_display() {
        assert_eq!(
            GateDecision::Proceed { target: 66 }.to_string(),
            "adjust to 66%"
        );
        assert!(GateDecision::SkipLowLight.is_skip());
        assert!(!GateDecision::Proceed { target: 1 }.is_skip());
    }
}
