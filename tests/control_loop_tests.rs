use std::collections::VecDeque;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use luxr::backend::{BrightnessError, MockBacklight};
use luxr::core::Tuning;
use luxr::core::control_loop::ControlLoop;
use luxr::core::gate::GateDecision;
use luxr::core::smoothing::TransitionOutcome;
use luxr::sensor::LightSensor;

/// Sensor that replays a fixed list of readings, then reports nothing.
struct ScriptedSensor {
    readings: VecDeque<Option<f64>>,
}

impl ScriptedSensor {
    fn new(readings: &[Option<f64>]) -> Self {
        Self {
            readings: readings.iter().copied().collect(),
        }
    }
}

impl LightSensor for ScriptedSensor {
    fn read_lux(&mut self) -> Option<f64> {
        self.readings.pop_front().flatten()
    }

    fn sensor_name(&self) -> String {
        "scripted".to_string()
    }
}

fn no_sleep(_: Duration) {}

fn short_ramps() -> Tuning {
    Tuning {
        transition_duration: Duration::from_millis(1000),
        transition_step: Duration::from_millis(100),
        ..Tuning::default()
    }
}

fn control_loop(
    level: u8,
    readings: &[Option<f64>],
    tuning: Tuning,
) -> ControlLoop<MockBacklight, ScriptedSensor> {
    ControlLoop::new(
        MockBacklight::new(level),
        ScriptedSensor::new(readings),
        tuning,
        false,
    )
    .with_sleeper(no_sleep)
}

#[test]
fn test_reading_ramps_to_mapped_brightness() {
    let mut control = control_loop(30, &[Some(250.0)], Tuning::default());
    let running = AtomicBool::new(true);

    let report = control.run_cycle(&running);

    assert_eq!(report.decision, Some(GateDecision::Proceed { target: 66 }));
    assert!(matches!(
        report.transition,
        Some(Ok(TransitionOutcome::Completed { steps: 50 }))
    ));
    assert_eq!(report.wait, Duration::from_millis(2000));

    let writes = control.backend().writes();
    assert_eq!(writes.len(), 50);
    assert_eq!(writes.last(), Some(&66));
    assert!(writes.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(control.state().last_brightness, 66);
    assert_eq!(control.state().last_lux, Some(250.0));
}

#[test]
fn test_repeated_reading_is_filtered_as_noise() {
    let mut control = control_loop(30, &[Some(250.0), Some(251.0)], short_ramps());
    let running = AtomicBool::new(true);

    control.run_cycle(&running);
    let writes_after_first = control.backend().writes().len();

    let report = control.run_cycle(&running);

    assert_eq!(report.decision, Some(GateDecision::SkipNoiseFloor));
    assert_eq!(report.wait, Duration::from_millis(2000));
    assert_eq!(control.backend().writes().len(), writes_after_first);
    assert_eq!(control.stats().noise_skips, 1);
}

#[test]
fn test_darkness_holds_off_without_touching_backlight() {
    let mut control = control_loop(40, &[Some(3.0)], short_ramps());
    let running = AtomicBool::new(true);
    let reads_at_start = control.backend().reads();

    let report = control.run_cycle(&running);

    assert_eq!(report.decision, Some(GateDecision::SkipLowLight));
    assert_eq!(report.wait, Duration::from_millis(5000));
    assert_eq!(control.backend().reads(), reads_at_start);
    assert!(control.backend().writes().is_empty());
    assert_eq!(control.state().last_lux, None);
}

#[test]
fn test_manual_change_is_adopted() {
    let mut control = control_loop(
        30,
        &[Some(250.0), Some(400.0), Some(400.0)],
        short_ramps(),
    );
    let running = AtomicBool::new(true);

    control.run_cycle(&running);
    control.backend().set_external(90);
    let writes_before = control.backend().writes().len();

    let report = control.run_cycle(&running);
    assert_eq!(
        report.decision,
        Some(GateDecision::SkipManualOverride { observed: 90 })
    );
    assert_eq!(control.state().last_brightness, 90);

    // Same light as when the user acted: leave their choice alone
    let report = control.run_cycle(&running);
    assert_eq!(report.decision, Some(GateDecision::SkipNoiseFloor));
    assert_eq!(control.backend().writes().len(), writes_before);
    assert_eq!(control.backend().level(), 90);
}

#[test]
fn test_manual_change_mid_ramp_stops_transition() {
    let mut control = control_loop(30, &[Some(250.0)], short_ramps());
    control.backend().interfere_after(3, 90);
    let running = AtomicBool::new(true);

    let report = control.run_cycle(&running);

    assert!(matches!(
        report.transition,
        Some(Ok(TransitionOutcome::Interrupted { observed: 90 }))
    ));
    assert_eq!(control.backend().writes(), vec![34, 37, 41]);
    assert_eq!(control.state().last_brightness, 90);
    assert_eq!(control.backend().open_handles(), 0);
}

#[test]
fn test_unavailable_sink_skips_transition() {
    let mut control = control_loop(30, &[Some(250.0)], short_ramps());
    control.backend().fail_open(true);
    let running = AtomicBool::new(true);

    let report = control.run_cycle(&running);

    assert!(matches!(
        report.transition,
        Some(Err(BrightnessError::SinkUnavailable(_)))
    ));
    assert!(control.backend().writes().is_empty());
    assert_eq!(report.wait, Duration::from_millis(2000));
    assert_eq!(control.stats().failures, 1);
}

#[test]
fn test_shutdown_cancels_pending_ramp() {
    let mut control = control_loop(30, &[Some(250.0)], short_ramps());
    let running = AtomicBool::new(false);

    let report = control.run_cycle(&running);

    assert!(matches!(
        report.transition,
        Some(Ok(TransitionOutcome::Cancelled))
    ));
    assert!(control.backend().writes().is_empty());
}

#[test]
fn test_missing_reading_polls_again() {
    let mut control = control_loop(30, &[None], short_ramps());
    let running = AtomicBool::new(true);

    let report = control.run_cycle(&running);

    assert_eq!(report.lux, None);
    assert_eq!(report.decision, None);
    assert_eq!(report.wait, Duration::from_millis(2000));
    assert_eq!(control.stats().missing_readings, 1);
}

#[test]
fn test_lux_window_averages_readings() {
    let tuning = Tuning {
        lux_window: 3,
        ..short_ramps()
    };
    let mut control = control_loop(
        30,
        &[Some(100.0), Some(200.0), Some(300.0), Some(400.0)],
        tuning,
    );
    let running = AtomicBool::new(true);

    let seen: Vec<Option<f64>> = (0..4).map(|_| control.run_cycle(&running).lux).collect();

    assert_eq!(
        seen,
        vec![Some(100.0), Some(150.0), Some(200.0), Some(300.0)]
    );
}

#[test]
fn test_reload_changes_curve_and_keeps_state() {
    let mut control = control_loop(30, &[Some(250.0), Some(260.0)], short_ramps());
    let running = AtomicBool::new(true);

    control.run_cycle(&running);
    assert_eq!(control.state().last_brightness, 66);

    control.apply_tuning(Tuning {
        max_lux: 250.0,
        ..short_ramps()
    });
    assert_eq!(control.state().last_brightness, 66);

    let report = control.run_cycle(&running);
    assert_eq!(report.decision, Some(GateDecision::Proceed { target: 100 }));
    assert_eq!(control.backend().level(), 100);
}
