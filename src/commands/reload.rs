//! Implementation of the reload command.
//!
//! Validates the configuration file, then asks the running daemon to re-read it.

use anyhow::Result;

use crate::io::instance;

/// Handle the reload command by signaling the running daemon.
pub fn handle_reload_command(debug_enabled: bool) -> Result<()> {
    log_version!();

    let Some(info) = instance::get_running_instance()? else {
        log_error_exit!("luxr isn't running");
        std::process::exit(crate::common::constants::EXIT_FAILURE);
    };

    // Pick up the daemon's config directory so the file checked is the one it will load
    if let Some(ref dir) = info.config_dir {
        let _ = crate::config::set_config_dir(Some(dir.display().to_string()));
    }

    // Fail fast here rather than leave the daemon to reject the file silently
    crate::config::Config::load()?;

    log_block_start!("Signaling luxr to reload (PID: {})...", info.pid);
    instance::send_reload_signal(info.pid)?;

    if debug_enabled {
        log_pipe!();
        log_debug!("SIGUSR2 sent to process {}", info.pid);
    }

    log_decorated!("Reload signal sent");
    log_end!();
    Ok(())
}

/// Display usage help for the reload command (--help flag)
pub fn show_usage() {
    log_version!();
    log_block_start!("Usage: luxr reload");
    log_block_start!("Description:");
    log_indented!("Make the running daemon re-read its configuration");
    log_pipe!();
    log_info!("For detailed help with examples, try: luxr help reload");
    log_end!();
}

/// Display detailed help for the reload command (help subcommand)
pub fn display_help() {
    log_version!();
    log_block_start!("reload - Reload the running daemon's configuration");
    log_block_start!("Usage: luxr reload");
    log_block_start!("Description:");
    log_indented!("Checks the configuration file, then sends SIGUSR2 to the");
    log_indented!("running luxr instance. Curve, timing and filter settings apply");
    log_indented!("from the next cycle. Device changes need a restart.");
    log_block_start!("Examples:");
    log_indented!("# Reload after editing luxr.toml");
    log_indented!("luxr reload");
    log_end!();
}
