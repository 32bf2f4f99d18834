//! Help command implementation for luxr.
//!
//! Dispatches `luxr help [COMMAND]` to command-specific help or the general overview.

use anyhow::Result;

/// Show brief usage for a command (used for error messages)
pub fn show_command_usage(command: &str) {
    match command {
        "reload" | "r" => log_block_start!("Usage: luxr reload"),
        "status" | "s" => log_block_start!("Usage: luxr status [--json]"),
        "stop" => log_block_start!("Usage: luxr stop"),
        _ => log_block_start!("Usage: luxr [OPTIONS] [min_lux] [max_lux] [COMMAND]"),
    }
}

/// Run the help command (dispatcher)
pub fn run_help_command(command: Option<&str>) -> Result<()> {
    match command {
        None => display_general_help(),
        Some("help") | Some("h") => display_help_help(),
        Some("reload") | Some("r") => super::reload::display_help(),
        Some("status") | Some("s") => super::status::display_help(),
        Some("stop") => super::stop::display_help(),
        Some(unknown) => {
            log_warning!("Unknown command: {}", unknown);
            display_general_help();
        }
    }
    Ok(())
}

/// Display general help focused on commands (for the help command)
fn display_general_help() {
    log_version!();
    log_block_start!("Available Commands:");
    log_indented!("help, h [COMMAND]   Show detailed help for a command");
    log_indented!("reload, r           Reload the running daemon's configuration");
    log_indented!("status, s [--json]  Show the current reading and brightness");
    log_indented!("stop                Cleanly terminate the running daemon");
    log_pipe!();
    log_info!("Use 'luxr help <command>' to see detailed help for a specific command.");
    log_indented!("Use 'luxr --help' to see all options and general usage.");
    log_end!();
}

/// Display help for the help command itself
fn display_help_help() {
    log_version!();
    log_block_start!("help - Display help information");
    log_block_start!("Usage: luxr help [COMMAND]");
    log_block_start!("Arguments:");
    log_indented!("COMMAND  Optional command to get help for");
    log_indented!("         If omitted, shows general help");
    log_block_start!("Examples:");
    log_indented!("# Show general help");
    log_indented!("luxr help");
    log_pipe!();
    log_indented!("# Show help for specific commands");
    log_indented!("luxr help status");
    log_indented!("luxr help reload");
    log_end!();
}
