//! Core application logic and state management.
//!
//! This module owns the daemon's main loop: it drives `ControlLoop` cycles, waits
//! between them without missing signals, and applies configuration reloads. The
//! pieces it is built from live in submodules:
//!
//! - `mapping`: lux to brightness percentage
//! - `gate`: whether a reading may move the backlight
//! - `smoothing`: stepped transitions with override detection
//! - `control_loop`: one sample/decide/act iteration
//! - `state` and `tuning`: loop memory and effective parameters

pub mod control_loop;
pub mod gate;
pub mod mapping;
pub mod smoothing;
pub mod state;
pub mod tuning;

pub use tuning::Tuning;

use anyhow::Result;
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::sync::mpsc::RecvTimeoutError;
use std::time::{Duration, Instant};

use crate::{
    backend::BrightnessBackend,
    common::{constants::*, utils},
    config::{self, Config},
    core::control_loop::ControlLoop,
    io::{
        lock::LockFile,
        signals::{SignalMessage, SignalState},
    },
    sensor::LightSensor,
};

/// Parameters for creating a Core instance.
pub(crate) struct CoreParams {
    pub backend: Box<dyn BrightnessBackend>,
    pub sensor: Box<dyn LightSensor>,
    pub config: Config,
    pub signal_state: SignalState,
    pub debug_enabled: bool,
    pub lock_info: Option<(LockFile, PathBuf)>,
    /// Positional `min_lux`/`max_lux` from the command line, re-applied on reload.
    pub cli_overrides: (Option<f64>, Option<f64>),
}

/// The running daemon.
pub(crate) struct Core {
    control: ControlLoop<Box<dyn BrightnessBackend>, Box<dyn LightSensor>>,
    config: Config,
    signal_state: SignalState,
    debug_enabled: bool,
    lock_info: Option<(LockFile, PathBuf)>,
    cli_overrides: (Option<f64>, Option<f64>),
}

/// Why a wait between cycles ended.
enum WaitOutcome {
    Elapsed,
    Message(SignalMessage),
    Disconnected,
}

impl Core {
    pub fn new(params: CoreParams) -> Self {
        let tuning = Tuning::from_config(&params.config);
        let control = ControlLoop::new(
            params.backend,
            params.sensor,
            tuning,
            params.debug_enabled,
        );

        Self {
            control,
            config: params.config,
            signal_state: params.signal_state,
            debug_enabled: params.debug_enabled,
            lock_info: params.lock_info,
            cli_overrides: params.cli_overrides,
        }
    }

    /// Run until shutdown, then release the lock.
    pub fn execute(mut self) -> Result<()> {
        if let Some(custom_dir) = config::get_custom_config_dir() {
            log_block_start!("Base directory: {}", utils::private_path(&custom_dir));
        }

        let backend = self.control.backend();
        match backend.device_name() {
            Some(device) => log_block_start!(
                "Controlling backlight {} via {}",
                device,
                backend.backend_name()
            ),
            None => log_block_start!("Controlling backlight via {}", backend.backend_name()),
        }
        log_indented!("Ambient light sensor: {}", self.control.sensor().sensor_name());
        log_indented!(
            "Starting brightness: {}%",
            self.control.state().last_brightness
        );

        let result = self.main_loop();

        log_block_start!("Shutting down luxr...");
        if let Some((lock_file, lock_path)) = self.lock_info.take() {
            lock_file.release(&lock_path);
            if self.debug_enabled {
                log_decorated!("Lock file removed");
            }
        }
        log_end!();

        result
    }

    fn main_loop(&mut self) -> Result<()> {
        while self.signal_state.running.load(Ordering::SeqCst) {
            let report = self.control.run_cycle(&self.signal_state.running);

            if !self.signal_state.running.load(Ordering::SeqCst) {
                break;
            }

            if !self.wait_out(report.wait) {
                break;
            }
        }

        Ok(())
    }

    /// Sleep through the whole pause, applying reloads as they arrive. Returns false
    /// once shutdown has been requested.
    fn wait_out(&mut self, duration: Duration) -> bool {
        let deadline = Instant::now() + duration;

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.wait(remaining) {
                WaitOutcome::Elapsed => return true,
                WaitOutcome::Message(SignalMessage::Reload) => self.reload(),
                WaitOutcome::Message(SignalMessage::Shutdown) => return false,
                WaitOutcome::Disconnected => {
                    if self.signal_state.running.load(Ordering::SeqCst) {
                        log_pipe!();
                        log_critical!("Signal handler disconnected unexpectedly");
                        log_indented!("Signals will no longer be processed");
                        // Without a channel, fall back to plain sleeps
                        std::thread::sleep(remaining);
                    }
                    return true;
                }
            }
        }
    }

    /// Block for `duration` in short chunks, returning early on any message.
    fn wait(&self, duration: Duration) -> WaitOutcome {
        let chunk_limit = Duration::from_millis(WAIT_CHUNK_MS);
        let start = Instant::now();

        loop {
            let remaining = duration.saturating_sub(start.elapsed());
            if remaining.is_zero() {
                return WaitOutcome::Elapsed;
            }

            match self
                .signal_state
                .signal_receiver
                .recv_timeout(remaining.min(chunk_limit))
            {
                Ok(message) => return WaitOutcome::Message(message),
                Err(RecvTimeoutError::Timeout) => {
                    if !self.signal_state.running.load(Ordering::SeqCst) {
                        return WaitOutcome::Message(SignalMessage::Shutdown);
                    }
                }
                Err(RecvTimeoutError::Disconnected) => return WaitOutcome::Disconnected,
            }
        }
    }

    /// Reload the configuration. An invalid file keeps the current settings.
    fn reload(&mut self) {
        let (min_lux, max_lux) = self.cli_overrides;
        let new_config = match config::load_with_overrides(min_lux, max_lux) {
            Ok(config) => config,
            Err(e) => {
                log_pipe!();
                log_warning!("Configuration reload failed: {e:#}");
                log_indented!("Keeping the previous configuration");
                return;
            }
        };

        if new_config == self.config {
            if self.debug_enabled {
                log_pipe!();
                log_debug!("Configuration unchanged");
            }
            return;
        }

        if new_config.backend != self.config.backend
            || new_config.backlight_device != self.config.backlight_device
            || new_config.sensor_device != self.config.sensor_device
        {
            log_pipe!();
            log_warning!("Device and backend changes take effect after a restart");
        }

        new_config.log_config(Some(self.control.backend().backend_name()));
        self.control.apply_tuning(Tuning::from_config(&new_config));
        self.config = new_config;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MockBacklight;
    use crate::sensor::MockLightSensor;
    use serial_test::serial;

    fn quiet_sensor() -> Box<dyn LightSensor> {
        let mut sensor = MockLightSensor::new();
        sensor.expect_read_lux().returning(|| None);
        sensor
            .expect_sensor_name()
            .returning(|| "mock".to_string());
        Box::new(sensor)
    }

    fn core(signal_state: SignalState) -> Core {
        let mut config = Config::default();
        config.poll_interval = Some(10_000);
        crate::config::loading::apply_defaults(&mut config);

        Core::new(CoreParams {
            backend: Box::new(MockBacklight::new(50)),
            sensor: quiet_sensor(),
            config,
            signal_state,
            debug_enabled: false,
            lock_info: None,
            cli_overrides: (None, None),
        })
    }

    #[test]
    fn test_wait_returns_on_message() {
        let core = core(SignalState::detached());
        core.signal_state
            .signal_sender
            .send(SignalMessage::Reload)
            .unwrap();

        let started = Instant::now();
        let outcome = core.wait(Duration::from_secs(10));

        assert!(matches!(
            outcome,
            WaitOutcome::Message(SignalMessage::Reload)
        ));
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_wait_elapses() {
        let core = core(SignalState::detached());
        let outcome = core.wait(Duration::from_millis(20));
        assert!(matches!(outcome, WaitOutcome::Elapsed));
    }

    #[test]
    #[serial]
    fn test_reload_does_not_cut_pause_short() {
        let temp_dir = tempfile::tempdir().unwrap();
        let original = std::env::var("XDG_CONFIG_HOME").ok();
        unsafe {
            std::env::set_var("XDG_CONFIG_HOME", temp_dir.path());
        }

        let mut core = core(SignalState::detached());
        core.signal_state
            .signal_sender
            .send(SignalMessage::Reload)
            .unwrap();

        let started = Instant::now();
        let keep_running = core.wait_out(Duration::from_millis(300));
        let elapsed = started.elapsed();
        let reloaded_poll = core.config.poll_interval;

        unsafe {
            match original {
                Some(val) => std::env::set_var("XDG_CONFIG_HOME", val),
                None => std::env::remove_var("XDG_CONFIG_HOME"),
            }
        }

        assert!(keep_running);
        assert!(elapsed >= Duration::from_millis(300));
        assert_eq!(reloaded_poll, Some(DEFAULT_POLL_INTERVAL));
    }

    #[test]
    fn test_shutdown_during_pause_stops_waiting() {
        let mut core = core(SignalState::detached());
        core.signal_state
            .signal_sender
            .send(SignalMessage::Shutdown)
            .unwrap();

        assert!(!core.wait_out(Duration::from_secs(10)));
    }

    #[test]
    fn test_shutdown_message_ends_execute() {
        let state = SignalState::detached();
        state.signal_sender.send(SignalMessage::Shutdown).unwrap();

        let started = Instant::now();
        core(state).execute().unwrap();

        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_cleared_flag_skips_loop() {
        let state = SignalState::detached();
        state.running.store(false, Ordering::SeqCst);

        core(state).execute().unwrap();
    }
}
