//! Main application entry point.
//!
//! Parses the command line and dispatches to the daemon or a one-shot command.

use anyhow::Result;

use luxr::args::{self, CliAction, ParsedArgs};
use luxr::commands;
use luxr::common::constants::EXIT_FAILURE;
use luxr::common::logger::Log;
use luxr::config;
use luxr::{log_end, log_error_exit};

fn set_config_dir(config_dir: Option<String>) -> Result<()> {
    if config_dir.is_some() {
        config::set_config_dir(config_dir)?;
    }
    Ok(())
}

fn main() -> Result<()> {
    let parsed = ParsedArgs::from_env();

    match parsed.action {
        CliAction::Run {
            debug_enabled,
            config_dir,
            log_file,
            min_lux,
            max_lux,
        } => {
            set_config_dir(config_dir)?;

            // Held until exit so buffered lines reach the file
            let _log_guard = match log_file {
                Some(path) => Some(Log::start_file_logging(path)?),
                None => None,
            };

            luxr::Luxr::new(debug_enabled)
                .with_lux_overrides(min_lux, max_lux)
                .run()
        }
        CliAction::StatusCommand {
            debug_enabled: _,
            config_dir,
            json,
            min_lux,
            max_lux,
        } => {
            set_config_dir(config_dir)?;
            commands::status::handle_status_command(json, (min_lux, max_lux))
        }
        CliAction::ReloadCommand {
            debug_enabled,
            config_dir,
        } => {
            set_config_dir(config_dir)?;
            commands::reload::handle_reload_command(debug_enabled)
        }
        CliAction::StopCommand {
            debug_enabled,
            config_dir,
        } => {
            set_config_dir(config_dir)?;
            commands::stop::handle_stop_command(debug_enabled)
        }
        CliAction::HelpCommand { command } => commands::help::run_help_command(command.as_deref()),
        CliAction::ShowCommandUsage { command } => {
            match command.as_str() {
                "status" => commands::status::show_usage(),
                "reload" => commands::reload::show_usage(),
                "stop" => commands::stop::show_usage(),
                other => {
                    commands::help::show_command_usage(other);
                    log_end!();
                }
            }
            Ok(())
        }
        CliAction::ShowHelp => {
            args::display_help();
            Ok(())
        }
        CliAction::ShowVersion => {
            args::display_version_info();
            Ok(())
        }
        CliAction::ShowHelpDueToError => {
            args::display_help();
            log_error_exit!("Invalid arguments");
            std::process::exit(EXIT_FAILURE);
        }
    }
}
