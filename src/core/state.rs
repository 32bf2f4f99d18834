//! Per-process control loop state.

use std::collections::VecDeque;

/// State carried between control loop iterations.
///
/// Owned by the `ControlLoop` and mutated once per cycle. It survives configuration
/// reloads and is never persisted.
#[derive(Debug, Clone)]
pub struct LoopState {
    /// Brightness the loop believes the display is at. Resynchronized from the sink after
    /// every skip or transition.
    pub last_brightness: u8,
    /// Last reading the gate evaluated, absent until the first successful reading.
    pub last_lux: Option<f64>,
    pub filter: LuxFilter,
}

impl LoopState {
    pub fn new(initial_brightness: u8, lux_window: usize) -> Self {
        Self {
            last_brightness: initial_brightness,
            last_lux: None,
            filter: LuxFilter::new(lux_window),
        }
    }

    /// Record what the gate or a transition observed.
    pub fn resync(&mut self, brightness: u8, lux: f64) {
        self.last_brightness = brightness;
        self.last_lux = Some(lux);
    }
}

/// Moving average over the most recent raw readings.
///
/// A window of 1 passes readings through unchanged.
#[derive(Debug, Clone)]
pub struct LuxFilter {
    window: usize,
    samples: VecDeque<f64>,
}

impl LuxFilter {
    pub fn new(window: usize) -> Self {
        let window = window.max(1);
        Self {
            window,
            samples: VecDeque::with_capacity(window),
        }
    }

    /// Add a reading and return the value the gate should see.
    pub fn push(&mut self, lux: f64) -> f64 {
        if self.window == 1 {
            return lux;
        }

        if self.samples.len() == self.window {
            self.samples.pop_front();
        }
        self.samples.push_back(lux);

        self.samples.iter().sum::<f64>() / self.samples.len() as f64
    }

    /// Change the window size, keeping the newest samples that still fit.
    pub fn resize(&mut self, window: usize) {
        self.window = window.max(1);
        while self.samples.len() > self.window {
            self.samples.pop_front();
        }
        if self.window == 1 {
            self.samples.clear();
        }
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}
