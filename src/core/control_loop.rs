//! One iteration of the ambient light control loop.
//!
//! `ControlLoop::run_cycle` samples the sensor, runs the reading through the lux filter
//! and the adjustment gate, ramps toward the mapped target when the gate allows it, and
//! reports how long the caller should wait before the next cycle. The caller owns the
//! waiting so that it can stay responsive to signals.

use std::sync::atomic::AtomicBool;
use std::thread;
use std::time::{Duration, Instant};

use super::gate::{AdjustmentGate, GateDecision};
use super::smoothing::{SmoothTransition, TransitionOutcome};
use super::state::LoopState;
use super::tuning::Tuning;
use crate::backend::{BrightnessBackend, BrightnessError, observed_brightness};
use crate::common::constants::HOUSEKEEPING_INTERVAL_SECS;
use crate::sensor::LightSensor;

/// What happened during one cycle.
#[derive(Debug)]
pub struct CycleReport {
    /// Filtered reading, `None` when the sensor had nothing.
    pub lux: Option<f64>,
    pub decision: Option<GateDecision>,
    pub transition: Option<Result<TransitionOutcome, BrightnessError>>,
    pub housekeeping_ran: bool,
    /// Delay before the next cycle.
    pub wait: Duration,
}

/// Running totals reported during housekeeping.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CycleStats {
    pub cycles: u64,
    pub missing_readings: u64,
    pub low_light_skips: u64,
    pub overrides: u64,
    pub noise_skips: u64,
    pub transitions: u64,
    pub interrupted: u64,
    pub failures: u64,
}

/// Orchestrates sensor, gate, and transition. Owns the loop state.
pub struct ControlLoop<B: BrightnessBackend, S: LightSensor> {
    backend: B,
    sensor: S,
    tuning: Tuning,
    gate: AdjustmentGate,
    state: LoopState,
    stats: CycleStats,
    last_housekeeping: Instant,
    housekeeping_interval: Duration,
    sleeper: fn(Duration),
    debug_enabled: bool,
}

impl<B: BrightnessBackend, S: LightSensor> ControlLoop<B, S> {
    /// Build the loop, seeding the brightness baseline from the display.
    pub fn new(backend: B, sensor: S, tuning: Tuning, debug_enabled: bool) -> Self {
        let initial = observed_brightness(&backend, debug_enabled);
        let state = LoopState::new(initial, tuning.lux_window);
        let gate = AdjustmentGate::from_tuning(&tuning).with_debug(debug_enabled);

        Self {
            backend,
            sensor,
            tuning,
            gate,
            state,
            stats: CycleStats::default(),
            last_housekeeping: Instant::now(),
            housekeeping_interval: Duration::from_secs(HOUSEKEEPING_INTERVAL_SECS),
            sleeper: thread::sleep,
            debug_enabled,
        }
    }

    /// Replace the sleep used between transition steps.
    pub fn with_sleeper(mut self, sleeper: fn(Duration)) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn with_housekeeping_interval(mut self, interval: Duration) -> Self {
        self.housekeeping_interval = interval;
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn sensor(&self) -> &S {
        &self.sensor
    }

    pub fn state(&self) -> &LoopState {
        &self.state
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn stats(&self) -> CycleStats {
        self.stats
    }

    /// Switch to new parameters after a configuration reload. Loop state is kept.
    pub fn apply_tuning(&mut self, tuning: Tuning) {
        self.gate = AdjustmentGate::from_tuning(&tuning).with_debug(self.debug_enabled);
        self.state.filter.resize(tuning.lux_window);
        self.tuning = tuning;
    }

    /// Run one iteration. `running` is checked between transition steps.
    pub fn run_cycle(&mut self, running: &AtomicBool) -> CycleReport {
        self.stats.cycles += 1;

        let Some(raw_lux) = self.sensor.read_lux() else {
            self.stats.missing_readings += 1;
            if self.debug_enabled {
                log_debug!("No ambient light reading this cycle");
            }
            let housekeeping_ran = self.housekeeping();
            return CycleReport {
                lux: None,
                decision: None,
                transition: None,
                housekeeping_ran,
                wait: self.tuning.poll_interval,
            };
        };

        let lux = self.state.filter.push(raw_lux);
        let decision = self.gate.evaluate(lux, &self.backend, &mut self.state);

        if self.debug_enabled {
            log_debug!("{:.1} lux: {}", lux, decision);
        }

        if let Some(wait) = self.gate.hold_off(&decision) {
            self.record_skip(&decision);
            return CycleReport {
                lux: Some(lux),
                decision: Some(decision),
                transition: None,
                housekeeping_ran: false,
                wait,
            };
        }

        let transition = match decision {
            GateDecision::Proceed { target } => Some(self.transition_to(target, lux, running)),
            _ => None,
        };

        // The sink is the source of truth after a ramp, whatever its outcome
        let observed = observed_brightness(&self.backend, self.debug_enabled);
        self.state.resync(observed, lux);

        let housekeeping_ran = self.housekeeping();

        CycleReport {
            lux: Some(lux),
            decision: Some(decision),
            transition,
            housekeeping_ran,
            wait: self.tuning.poll_interval,
        }
    }

    fn transition_to(
        &mut self,
        target: u8,
        lux: f64,
        running: &AtomicBool,
    ) -> Result<TransitionOutcome, BrightnessError> {
        let start = self.state.last_brightness;
        let result = SmoothTransition::new(target, &self.tuning)
            .with_sleeper(self.sleeper)
            .with_debug(self.debug_enabled)
            .execute(&self.backend, &mut self.state.last_brightness, running);

        match &result {
            Ok(TransitionOutcome::Completed { .. }) => {
                self.stats.transitions += 1;
                log_decorated!("Brightness {}% → {}% ({:.1} lux)", start, target, lux);
            }
            Ok(TransitionOutcome::Interrupted { observed }) => {
                self.stats.interrupted += 1;
                log_pipe!();
                log_info!("Manual brightness change to {observed}% detected, transition stopped");
            }
            Ok(TransitionOutcome::AlreadyAtTarget) | Ok(TransitionOutcome::Cancelled) => {}
            Err(e) => {
                self.stats.failures += 1;
                log_pipe!();
                log_warning!("{e}");
            }
        }

        result
    }

    fn record_skip(&mut self, decision: &GateDecision) {
        match decision {
            GateDecision::SkipLowLight => self.stats.low_light_skips += 1,
            GateDecision::SkipManualOverride { observed } => {
                self.stats.overrides += 1;
                log_pipe!();
                log_info!("Manual brightness change to {observed}% detected");
            }
            GateDecision::SkipNoiseFloor => self.stats.noise_skips += 1,
            GateDecision::Proceed { .. } => {}
        }
    }

    /// Periodic backend health check and statistics, at most once per interval.
    fn housekeeping(&mut self) -> bool {
        if self.last_housekeeping.elapsed() < self.housekeeping_interval {
            return false;
        }
        self.last_housekeeping = Instant::now();

        if let Err(e) = self.backend.poll_health() {
            log_pipe!();
            log_warning!("Backlight health check failed: {e}");
        }

        if self.debug_enabled {
            let s = self.stats;
            log_pipe!();
            log_debug!("Control loop statistics:");
            log_indented!(
                "Cycles: {}, transitions: {}, interrupted: {}, failed: {}",
                s.cycles,
                s.transitions,
                s.interrupted,
                s.failures
            );
            log_indented!(
                "Skipped: {} low light, {} overrides, {} noise, {} without reading",
                s.low_light_skips,
                s.overrides,
                s.noise_skips,
                s.missing_readings
            );
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MockBacklight;
    use crate::common::constants::test_constants::*;
    use crate::sensor::MockLightSensor;

    fn no_sleep(_: Duration) {}

    fn sensor_reading(values: Vec<Option<f64>>) -> MockLightSensor {
        let mut sensor = MockLightSensor::new();
        let mut values = values.into_iter();
        sensor
            .expect_read_lux()
            .returning(move || values.next().flatten());
        sensor
            .expect_sensor_name()
            .returning(|| "mock".to_string());
        sensor
    }

    fn control_loop(
        level: u8,
        readings: Vec<Option<f64>>,
    ) -> ControlLoop<MockBacklight, MockLightSensor> {
        ControlLoop::new(
            MockBacklight::new(level),
            sensor_reading(readings),
            Tuning::default(),
            false,
        )
        .with_sleeper(no_sleep)
    }

    #[test]
    fn test_seeds_baseline_from_display() {
        let control = control_loop(42, vec![]);
        assert_eq!(control.state().last_brightness, 42);
        assert!(control.state().last_lux.is_none());
    }

    #[test]
    fn test_missing_reading_waits_poll_interval() {
        let mut control = control_loop(42, vec![None]);
        let report = control.run_cycle(&AtomicBool::new(true));

        assert!(report.lux.is_none());
        assert!(report.decision.is_none());
        assert_eq!(report.wait, Duration::from_millis(2000));
        assert_eq!(control.stats().missing_readings, 1);
    }

    #[test]
    fn test_low_light_waits_hold_and_keeps_state() {
        let mut control = control_loop(42, vec![Some(TEST_DARK_LUX)]);
        let report = control.run_cycle(&AtomicBool::new(true));

        assert_eq!(report.decision, Some(GateDecision::SkipLowLight));
        assert_eq!(report.wait, Duration::from_millis(5000));
        assert!(!report.housekeeping_ran);
        assert!(control.state().last_lux.is_none());
        assert!(control.backend().writes().is_empty());
    }

    #[test]
    fn test_proceed_ramps_and_resyncs() {
        let mut control = control_loop(30, vec![Some(TEST_MID_LUX)]);
        let report = control.run_cycle(&AtomicBool::new(true));

        assert_eq!(
            report.decision,
            Some(GateDecision::Proceed {
                target: TEST_MID_BRIGHTNESS
            })
        );
        assert!(matches!(
            report.transition,
            Some(Ok(TransitionOutcome::Completed { steps: 50 }))
        ));
        assert_eq!(report.wait, Duration::from_millis(2000));
        assert_eq!(control.backend().level(), TEST_MID_BRIGHTNESS);
        assert_eq!(control.state().last_brightness, TEST_MID_BRIGHTNESS);
        assert_eq!(control.state().last_lux, Some(TEST_MID_LUX));
        assert_eq!(control.backend().open_handles(), 0);
    }

    #[test]
    fn test_repeated_reading_hits_noise_floor() {
        let mut control = control_loop(30, vec![Some(TEST_MID_LUX), Some(TEST_MID_LUX)])
            .with_housekeeping_interval(Duration::ZERO);
        let running = AtomicBool::new(true);

        control.run_cycle(&running);
        let second = control.run_cycle(&running);

        assert_eq!(second.decision, Some(GateDecision::SkipNoiseFloor));
        assert_eq!(second.wait, Duration::from_millis(2000));
        assert!(!second.housekeeping_ran);
        assert_eq!(control.stats().noise_skips, 1);
    }

    #[test]
    fn test_manual_override_is_adopted() {
        let mut control = control_loop(30, vec![Some(TEST_MID_LUX), Some(400.0)])
            .with_housekeeping_interval(Duration::ZERO);
        let running = AtomicBool::new(true);

        control.run_cycle(&running);
        control.backend().set_external(15);
        let report = control.run_cycle(&running);

        assert_eq!(
            report.decision,
            Some(GateDecision::SkipManualOverride { observed: 15 })
        );
        assert!(!report.housekeeping_ran);
        assert_eq!(control.state().last_brightness, 15);
        assert_eq!(control.backend().level(), 15);
    }

    #[test]
    fn test_interrupted_transition_resyncs_to_observed() {
        let mut control = control_loop(30, vec![Some(TEST_MID_LUX)]);
        control.backend().interfere_after(5, 90);

        let report = control.run_cycle(&AtomicBool::new(true));

        assert!(matches!(
            report.transition,
            Some(Ok(TransitionOutcome::Interrupted { observed: 90 }))
        ));
        assert_eq!(control.backend().writes().len(), 5);
        assert_eq!(control.state().last_brightness, 90);
        assert_eq!(control.state().last_lux, Some(TEST_MID_LUX));
        assert_eq!(control.stats().interrupted, 1);
    }

    #[test]
    fn test_failed_transition_still_updates_lux() {
        let mut control = control_loop(30, vec![Some(TEST_MID_LUX)]);
        control.backend().fail_open(true);

        let report = control.run_cycle(&AtomicBool::new(true));

        assert!(matches!(
            report.transition,
            Some(Err(BrightnessError::SinkUnavailable(_)))
        ));
        assert_eq!(control.state().last_brightness, 30);
        assert_eq!(control.state().last_lux, Some(TEST_MID_LUX));
        assert_eq!(control.stats().failures, 1);
    }

    #[test]
    fn test_housekeeping_runs_after_interval() {
        let mut control = control_loop(30, vec![None, None])
            .with_housekeeping_interval(Duration::ZERO);
        control.backend().set_healthy(false);

        let report = control.run_cycle(&AtomicBool::new(true));
        assert!(report.housekeeping_ran);
    }

    #[test]
    fn test_housekeeping_rate_limited() {
        let mut control = control_loop(30, vec![None]);
        let report = control.run_cycle(&AtomicBool::new(true));
        assert!(!report.housekeeping_ran);
    }

    #[test]
    fn test_apply_tuning_keeps_state() {
        let mut control = control_loop(30, vec![Some(TEST_MID_LUX), Some(TEST_MID_LUX)]);
        let running = AtomicBool::new(true);
        control.run_cycle(&running);

        control.apply_tuning(Tuning {
            noise_threshold: 0.0,
            max_lux: 250.0,
            ..Tuning::default()
        });

        assert_eq!(control.state().last_brightness, TEST_MID_BRIGHTNESS);
        assert_eq!(control.state().last_lux, Some(TEST_MID_LUX));

        let report = control.run_cycle(&running);
        assert_eq!(report.decision, Some(GateDecision::Proceed { target: 100 }));
        assert_eq!(control.backend().level(), 100);
    }

    #[test]
    fn test_lux_window_averages_readings() {
        let tuning = Tuning {
            lux_window: 2,
            ..Tuning::default()
        };
        let mut control = ControlLoop::new(
            MockBacklight::new(30),
            sensor_reading(vec![Some(100.0), Some(300.0)]),
            tuning,
            false,
        )
        .with_sleeper(no_sleep);
        let running = AtomicBool::new(true);

        control.run_cycle(&running);
        let report = control.run_cycle(&running);

        assert_eq!(report.lux, Some(200.0));
    }
}
