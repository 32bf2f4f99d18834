//! In-memory backlight for testing.
//!
//! Lets the gate, transition, and control loop be exercised without a real backlight.
//! Every write is recorded, and scripted events can simulate a user moving the
//! brightness slider, a failing query, or a failing write.

use std::sync::{Mutex, MutexGuard, PoisonError};

use super::{BrightnessBackend, BrightnessControl, BrightnessError};

#[derive(Debug, Default)]
struct MockState {
    level: u8,
    writes: Vec<u8>,
    reads: usize,
    open_handles: usize,
    opened: usize,
    fail_reads: bool,
    fail_open: bool,
    fail_set_at: Option<usize>,
    interference: Option<(usize, u8)>,
    healthy: bool,
}

/// A brightness sink backed by memory.
///
/// # Example
///
/// ```
/// use luxr::backend::{BrightnessBackend, BrightnessControl, MockBacklight};
///
/// let backlight = MockBacklight::new(30);
/// backlight.open_control().unwrap().set_brightness(45).unwrap();
/// assert_eq!(backlight.read_brightness().unwrap(), 45);
/// assert_eq!(backlight.writes(), vec![45]);
/// ```
pub struct MockBacklight {
    state: Mutex<MockState>,
}

impl MockBacklight {
    pub fn new(level: u8) -> Self {
        Self {
            state: Mutex::new(MockState {
                level,
                healthy: true,
                ..MockState::default()
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Change the level as if the user pressed a brightness key.
    pub fn set_external(&self, level: u8) {
        self.lock().level = level;
    }

    /// After the `after_writes`-th write, jump to `level` as if the user intervened.
    pub fn interfere_after(&self, after_writes: usize, level: u8) {
        self.lock().interference = Some((after_writes, level));
    }

    /// Make every query fail until turned off again.
    pub fn fail_reads(&self, fail: bool) {
        self.lock().fail_reads = fail;
    }

    /// Make `open_control` report the sink as unavailable.
    pub fn fail_open(&self, fail: bool) {
        self.lock().fail_open = fail;
    }

    /// Make the write with this 1-based index fail.
    pub fn fail_set_at(&self, write_number: usize) {
        self.lock().fail_set_at = Some(write_number);
    }

    /// Make the health check fail, as if the device disappeared.
    pub fn set_healthy(&self, healthy: bool) {
        self.lock().healthy = healthy;
    }

    pub fn level(&self) -> u8 {
        self.lock().level
    }

    /// Every level written so far, in order.
    pub fn writes(&self) -> Vec<u8> {
        self.lock().writes.clone()
    }

    pub fn reads(&self) -> usize {
        self.lock().reads
    }

    /// Control handles currently alive.
    pub fn open_handles(&self) -> usize {
        self.lock().open_handles
    }

    /// Control handles acquired over the lifetime of this backlight.
    pub fn times_opened(&self) -> usize {
        self.lock().opened
    }
}

impl BrightnessBackend for MockBacklight {
    fn read_brightness(&self) -> Result<u8, BrightnessError> {
        let mut state = self.lock();
        state.reads += 1;
        if state.fail_reads {
            return Err(BrightnessError::QueryFailed(std::io::Error::other(
                "mock read failure",
            )));
        }
        Ok(state.level)
    }

    fn open_control(&self) -> Result<Box<dyn BrightnessControl + '_>, BrightnessError> {
        let mut state = self.lock();
        if state.fail_open {
            return Err(BrightnessError::SinkUnavailable(
                "mock sink unavailable".to_string(),
            ));
        }
        state.open_handles += 1;
        state.opened += 1;
        Ok(Box::new(MockControl { backlight: self }))
    }

    fn backend_name(&self) -> &'static str {
        "mock"
    }

    fn poll_health(&self) -> anyhow::Result<()> {
        if !self.lock().healthy {
            anyhow::bail!("mock backlight marked unhealthy");
        }
        Ok(())
    }
}

struct MockControl<'a> {
    backlight: &'a MockBacklight,
}

impl BrightnessControl for MockControl<'_> {
    fn set_brightness(&mut self, level: u8) -> Result<(), BrightnessError> {
        let mut state = self.backlight.lock();
        let write_number = state.writes.len() + 1;

        if state.fail_set_at == Some(write_number) {
            return Err(BrightnessError::SetFailed {
                level,
                reason: "mock write failure".to_string(),
            });
        }

        state.writes.push(level);
        state.level = level;

        if let Some((after, external)) = state.interference
            && after == write_number
        {
            state.level = external;
            state.interference = None;
        }

        Ok(())
    }
}

impl Drop for MockControl<'_> {
    fn drop(&mut self) {
        let mut state = self.backlight.lock();
        state.open_handles = state.open_handles.saturating_sub(1);
    }
}
