//! Stepped brightness transitions.
//!
//! A transition moves the backlight from its current level to a target in evenly spaced
//! steps over `transition_duration`, one step every `transition_step`. Before each step
//! the actual brightness is read back; if it drifted from what the transition last wrote
//! by more than `override_threshold`, someone else is adjusting the display and the
//! transition stops immediately.

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use super::tuning::Tuning;
use crate::backend::{BrightnessBackend, BrightnessError, observed_brightness};
use crate::common::constants::MAXIMUM_BRIGHTNESS;

/// How a transition ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// All steps were applied.
    Completed { steps: u32 },
    /// The display was already at the target; nothing was written.
    AlreadyAtTarget,
    /// A manual change was detected mid-ramp.
    Interrupted { observed: u8 },
    /// Shutdown was requested mid-ramp.
    Cancelled,
}

/// A single ramp toward a target brightness.
pub struct SmoothTransition {
    target: u8,
    duration: Duration,
    step: Duration,
    override_threshold: u8,
    sleeper: fn(Duration),
    debug_enabled: bool,
}

impl SmoothTransition {
    pub fn new(target: u8, tuning: &Tuning) -> Self {
        Self {
            target: target.min(MAXIMUM_BRIGHTNESS),
            duration: tuning.transition_duration,
            step: tuning.transition_step,
            override_threshold: tuning.override_threshold,
            sleeper: thread::sleep,
            debug_enabled: false,
        }
    }

    /// Replace the step delay, e.g. with a no-op in tests.
    pub fn with_sleeper(mut self, sleeper: fn(Duration)) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn with_debug(mut self, debug_enabled: bool) -> Self {
        self.debug_enabled = debug_enabled;
        self
    }

    pub fn target(&self) -> u8 {
        self.target
    }

    /// Number of steps: `max(1, duration / step)`.
    pub fn step_count(&self) -> u32 {
        let step_ms = self.step.as_millis().max(1);
        let steps = self.duration.as_millis() / step_ms;
        u32::try_from(steps).unwrap_or(u32::MAX).max(1)
    }

    /// Run the transition.
    ///
    /// `last_brightness` is the loop's baseline. It is updated after every applied step,
    /// and set to the observed level when the ramp is interrupted. The control handle is
    /// held for the whole call and released on every exit path.
    pub fn execute(
        &self,
        backend: &dyn BrightnessBackend,
        last_brightness: &mut u8,
        running: &AtomicBool,
    ) -> Result<TransitionOutcome, BrightnessError> {
        let current = observed_brightness(backend, self.debug_enabled);
        if current == self.target {
            return Ok(TransitionOutcome::AlreadyAtTarget);
        }

        let mut control = backend.open_control()?;

        let steps = self.step_count();
        let delta = (f64::from(self.target) - f64::from(current)) / f64::from(steps);

        if self.debug_enabled {
            log_debug!(
                "Transition {}% → {}% in {} steps of {}ms",
                current,
                self.target,
                steps,
                self.step.as_millis()
            );
        }

        for i in 1..=steps {
            if !running.load(Ordering::SeqCst) {
                return Ok(TransitionOutcome::Cancelled);
            }

            let actual = observed_brightness(backend, self.debug_enabled);
            if actual.abs_diff(*last_brightness) > self.override_threshold {
                *last_brightness = actual;
                return Ok(TransitionOutcome::Interrupted { observed: actual });
            }

            let next = (f64::from(current) + delta * f64::from(i))
                .round()
                .clamp(0.0, f64::from(MAXIMUM_BRIGHTNESS)) as u8;

            control.set_brightness(next)?;
            *last_brightness = next;

            (self.sleeper)(self.step);
        }

        Ok(TransitionOutcome::Completed { steps })
    }
}
