//! Implementation of the stop command.
//!
//! Sends SIGTERM to the running daemon and waits for it to exit. The display keeps
//! whatever brightness it has at that moment.

use anyhow::Result;
use std::time::Duration;

use crate::common::constants::*;
use crate::io::instance;

/// Result of a stop command operation.
#[derive(Debug, PartialEq)]
pub enum StopResult {
    /// The process exited within the timeout
    Stopped,
    /// The signal was sent but the process is still alive
    StillRunning,
    /// No running instance found
    NoInstanceRunning,
}

/// Poll until `pid` is gone or the attempts run out.
fn wait_for_exit(pid: u32, attempts: u64, interval: Duration) -> bool {
    for _ in 0..attempts {
        if !instance::is_instance_running(pid) {
            return true;
        }
        std::thread::sleep(interval);
    }
    !instance::is_instance_running(pid)
}

/// Stop the running instance, if any.
pub fn stop_instance(debug_enabled: bool) -> Result<StopResult> {
    let Some(info) = instance::get_running_instance()? else {
        return Ok(StopResult::NoInstanceRunning);
    };

    log_block_start!("Stopping luxr instance (PID: {})...", info.pid);
    instance::terminate_instance(info.pid)?;

    if debug_enabled {
        log_pipe!();
        log_debug!("SIGTERM sent to process {}", info.pid);
    }

    let exited = wait_for_exit(
        info.pid,
        STOP_TIMEOUT_MS / STOP_POLL_MS,
        Duration::from_millis(STOP_POLL_MS),
    );

    Ok(if exited {
        StopResult::Stopped
    } else {
        StopResult::StillRunning
    })
}

/// Handle the stop command to terminate a running luxr instance.
pub fn handle_stop_command(debug_enabled: bool) -> Result<()> {
    log_version!();

    match stop_instance(debug_enabled) {
        Ok(StopResult::Stopped) => {
            log_pipe!();
            log_info!("Process terminated successfully");
            log_end!();
        }
        Ok(StopResult::StillRunning) => {
            log_pipe!();
            log_warning!("Process did not terminate within the expected time");
            log_indented!(
                "The termination signal was sent, but the process may still be shutting down"
            );
            log_end!();
        }
        Ok(StopResult::NoInstanceRunning) => {
            log_error_exit!("luxr isn't running");
            std::process::exit(EXIT_FAILURE);
        }
        Err(e) => {
            log_error_exit!("Failed to terminate instance: {}", e);
            std::process::exit(EXIT_FAILURE);
        }
    }
    Ok(())
}

/// Display usage help for the stop command (--help flag)
pub fn show_usage() {
    log_version!();
    log_block_start!("Usage: luxr stop");
    log_block_start!("Description:");
    log_indented!("Cleanly terminate the running luxr instance");
    log_pipe!();
    log_info!("For detailed help with examples, try: luxr help stop");
    log_end!();
}

/// Display detailed help for the stop command (help subcommand)
pub fn display_help() {
    log_version!();
    log_block_start!("stop - Cleanly terminate running luxr");
    log_block_start!("Usage: luxr stop");
    log_block_start!("Description:");
    log_indented!("Sends a termination signal to the running luxr instance.");
    log_indented!("A transition in progress stops at its next step and the");
    log_indented!("display keeps its current brightness.");
    log_indented!("Waits up to 3 seconds to confirm the process actually terminates.");
    log_block_start!("Examples:");
    log_indented!("# Stop running luxr");
    log_indented!("luxr stop");
    log_pipe!();
    log_indented!("# Stop with debug output");
    log_indented!("luxr --debug stop");
    log_end!();
}
