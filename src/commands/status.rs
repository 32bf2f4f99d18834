//! Status command: a one-shot look at the sensor, the backlight, and the curve.
//!
//! Works whether or not a daemon is running. Supports JSON and human-readable output.

use anyhow::Result;
use serde::Serialize;

use crate::backend::{self, BrightnessBackend};
use crate::common::constants::EXIT_FAILURE;
use crate::config::{self, Config};
use crate::core::Tuning;
use crate::sensor::{self, LightSensor};

/// Snapshot printed by `luxr status`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusReport {
    /// PID of the running daemon, if any.
    pub daemon_pid: Option<u32>,
    pub sensor: String,
    pub lux: Option<f64>,
    pub backend: String,
    pub device: Option<String>,
    /// `None` when the brightness query failed.
    pub brightness: Option<u8>,
    /// Brightness the curve maps the current reading to.
    pub target: Option<u8>,
    pub curve: CurveReport,
    /// True when the reading is below the low-light floor and would be ignored.
    pub low_light: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CurveReport {
    pub min_lux: f64,
    pub max_lux: f64,
    pub gamma: f64,
}

impl StatusReport {
    pub fn collect(
        backend: &dyn BrightnessBackend,
        sensor: &mut dyn LightSensor,
        tuning: &Tuning,
        daemon_pid: Option<u32>,
    ) -> Self {
        let curve = tuning.curve();
        let lux = sensor.read_lux();

        Self {
            daemon_pid,
            sensor: sensor.sensor_name(),
            lux,
            backend: backend.backend_name().to_string(),
            device: backend.device_name().map(str::to_string),
            brightness: backend.read_brightness().ok(),
            target: lux.map(|lux| curve.brightness_for(lux)),
            curve: CurveReport {
                min_lux: tuning.min_lux,
                max_lux: tuning.max_lux,
                gamma: tuning.gamma,
            },
            low_light: lux.is_some_and(|lux| lux < tuning.low_light_floor),
        }
    }
}

/// Handle `luxr status [--json]`.
pub fn handle_status_command(json: bool, cli_overrides: (Option<f64>, Option<f64>)) -> Result<()> {
    let daemon_pid = crate::io::instance::get_running_instance()
        .ok()
        .flatten()
        .map(|info| info.pid);

    let config: Config = config::load_with_overrides(cli_overrides.0, cli_overrides.1)?;
    let backend = match backend::create_backend(&config) {
        Ok(backend) => backend,
        Err(e) => {
            log_error_standalone!("No usable backlight: {e:#}");
            std::process::exit(EXIT_FAILURE);
        }
    };
    let mut sensor = match sensor::detect_sensor(&config) {
        Ok(sensor) => sensor,
        Err(e) => {
            log_error_standalone!("No usable ambient light sensor: {e:#}");
            std::process::exit(EXIT_FAILURE);
        }
    };

    let report = StatusReport::collect(
        backend.as_ref(),
        sensor.as_mut(),
        &Tuning::from_config(&config),
        daemon_pid,
    );

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        display_human_readable(&report);
    }
    Ok(())
}

fn display_human_readable(report: &StatusReport) {
    match report.daemon_pid {
        Some(pid) => println!("      Daemon: running (PID {pid})"),
        None => println!("      Daemon: not running"),
    }
    println!("      Sensor: {}", report.sensor);
    match report.lux {
        Some(lux) if report.low_light => println!("     Ambient: {lux:.1} lux (below floor)"),
        Some(lux) => println!("     Ambient: {lux:.1} lux"),
        None => println!("     Ambient: no reading"),
    }
    match report.device {
        Some(ref device) => println!("   Backlight: {} via {}", device, report.backend),
        None => println!("   Backlight: {}", report.backend),
    }
    match report.brightness {
        Some(level) => println!("  Brightness: {level}%"),
        None => println!("  Brightness: unavailable"),
    }
    if let Some(target) = report.target {
        println!("      Target: {target}%");
    }
    println!(
        "       Curve: {} - {} lux @ gamma {}",
        report.curve.min_lux, report.curve.max_lux, report.curve.gamma
    );
}

/// Display usage help for the status command (--help flag)
pub fn show_usage() {
    log_version!();
    log_block_start!("Usage: luxr status [--json]");
    log_block_start!("Description:");
    log_indented!("Read the ambient light sensor and backlight once");
    log_pipe!();
    log_info!("For detailed help with examples, try: luxr help status");
    log_end!();
}

/// Display detailed help for the status command (help subcommand)
pub fn display_help() {
    log_version!();
    log_block_start!("status - Show the current reading and brightness");
    log_block_start!("Usage: luxr status [--json]");
    log_block_start!("Options:");
    log_indented!("--json, -j  Print the report as JSON");
    log_block_start!("Description:");
    log_indented!("Reads the configured sensor and backlight once and shows the");
    log_indented!("brightness the curve maps the current reading to.");
    log_indented!("Positional min_lux/max_lux overrides are honored.");
    log_block_start!("Examples:");
    log_indented!("# Human-readable report");
    log_indented!("luxr status");
    log_pipe!();
    log_indented!("# Machine-readable report");
    log_indented!("luxr status --json");
    log_end!();
}
