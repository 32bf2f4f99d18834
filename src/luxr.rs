//! Application coordinator that manages the complete lifecycle of the luxr daemon.
//!
//! Resource acquisition happens here, in this order: configuration, sensor, backlight,
//! lock file, signal handler, configuration watcher. Any failure before the lock is
//! taken ends the process with a message and a failure exit code.

use anyhow::Result;

use crate::{
    backend::create_backend,
    common::constants::EXIT_FAILURE,
    config,
    core::{Core, CoreParams},
    io::{instance, signals::setup_signal_handler},
    sensor::detect_sensor,
};

/// Builder for configuring and running the luxr daemon.
///
/// ```no_run
/// use luxr::Luxr;
///
/// # fn main() -> anyhow::Result<()> {
/// // Follow the configured curve
/// Luxr::new(false).run()?;
///
/// // Map 10..800 lux instead of the configured range
/// Luxr::new(true).with_lux_overrides(Some(10.0), Some(800.0)).run()?;
/// # Ok(())
/// # }
/// ```
pub struct Luxr {
    debug_enabled: bool,
    min_lux: Option<f64>,
    max_lux: Option<f64>,
}

impl Luxr {
    pub fn new(debug_enabled: bool) -> Self {
        Self {
            debug_enabled,
            min_lux: None,
            max_lux: None,
        }
    }

    /// Curve endpoints given on the command line. `None` keeps the configured value.
    pub fn with_lux_overrides(mut self, min_lux: Option<f64>, max_lux: Option<f64>) -> Self {
        self.min_lux = min_lux;
        self.max_lux = max_lux;
        self
    }

    /// Run the daemon until it is told to stop.
    pub fn run(self) -> Result<()> {
        log_version!();
        if self.debug_enabled {
            log_pipe!();
            log_debug!("Debug mode enabled - showing per-cycle decisions");
        }

        let config = match config::load_with_overrides(self.min_lux, self.max_lux) {
            Ok(config) => config,
            Err(e) => {
                log_error_exit!("Configuration failed");
                eprintln!("{e:?}");
                std::process::exit(EXIT_FAILURE);
            }
        };

        let sensor = match detect_sensor(&config) {
            Ok(sensor) => sensor,
            Err(e) => {
                log_error_exit!("No usable ambient light sensor: {e:#}");
                std::process::exit(EXIT_FAILURE);
            }
        };

        let backend = match create_backend(&config) {
            Ok(backend) => backend,
            Err(e) => {
                log_error_exit!("No usable backlight: {e:#}");
                std::process::exit(EXIT_FAILURE);
            }
        };

        let (lock_file, lock_path) = match instance::ensure_single_instance() {
            Ok(lock) => lock,
            Err(e) => {
                log_error_exit!("Cannot start: {e:#}");
                std::process::exit(EXIT_FAILURE);
            }
        };

        let signal_state = setup_signal_handler(self.debug_enabled)?;

        if let Err(e) =
            config::start_config_watcher(signal_state.signal_sender.clone(), self.debug_enabled)
            && self.debug_enabled
        {
            log_pipe!();
            log_warning!("Config file watching unavailable: {}", e);
            log_indented!("Hot config reload disabled, use `luxr reload` instead");
        }

        config.log_config(Some(backend.backend_name()));
        log_block_start!("Lock acquired, starting luxr...");

        let core = Core::new(CoreParams {
            backend,
            sensor,
            config,
            signal_state,
            debug_enabled: self.debug_enabled,
            lock_info: Some((lock_file, lock_path)),
            cli_overrides: (self.min_lux, self.max_lux),
        });

        core.execute()
    }
}
