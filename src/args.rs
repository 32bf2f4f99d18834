//! Command-line argument parsing and processing.
//!
//! `luxr [OPTIONS] [min_lux] [max_lux] [COMMAND]`
//!
//! The two positional numbers override the configured curve endpoints. A value that does
//! not parse as a finite number is ignored and the configured value is used instead.
//! Unknown flags show help and exit with failure.

/// Represents the parsed command-line arguments and their intended actions.
#[derive(Debug, PartialEq)]
pub enum CliAction {
    /// Run the daemon
    Run {
        debug_enabled: bool,
        config_dir: Option<String>,
        log_file: Option<String>,
        min_lux: Option<f64>,
        max_lux: Option<f64>,
    },
    /// One-shot sensor and backlight report
    StatusCommand {
        debug_enabled: bool,
        config_dir: Option<String>,
        json: bool,
        min_lux: Option<f64>,
        max_lux: Option<f64>,
    },
    /// Signal the running daemon to reload
    ReloadCommand {
        debug_enabled: bool,
        config_dir: Option<String>,
    },
    /// Terminate the running daemon
    StopCommand {
        debug_enabled: bool,
        config_dir: Option<String>,
    },
    /// `luxr help [COMMAND]`
    HelpCommand { command: Option<String> },
    /// `luxr <COMMAND> --help`
    ShowCommandUsage { command: String },

    /// Display help information and exit
    ShowHelp,
    /// Display version information and exit
    ShowVersion,
    /// Show help due to unknown arguments and exit
    ShowHelpDueToError,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Command {
    Status,
    Reload,
    Stop,
    Help,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "status" | "s" => Some(Command::Status),
            "reload" | "r" => Some(Command::Reload),
            "stop" => Some(Command::Stop),
            "help" | "h" => Some(Command::Help),
            _ => None,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Command::Status => "status",
            Command::Reload => "reload",
            Command::Stop => "stop",
            Command::Help => "help",
        }
    }
}

/// Parse a positional lux override. Unparseable and non-finite values are dropped.
pub fn parse_lux_override(arg: &str) -> Option<f64> {
    arg.trim().parse::<f64>().ok().filter(|value| value.is_finite())
}

fn looks_numeric(arg: &str) -> bool {
    arg.starts_with('-') && arg.len() > 1 && arg[1..].starts_with(|c: char| c.is_ascii_digit() || c == '.')
}

/// Result of parsing command-line arguments.
pub struct ParsedArgs {
    pub action: CliAction,
}

impl ParsedArgs {
    /// Parse command-line arguments into a structured result.
    ///
    /// # Arguments
    /// * `args` - Iterator over command-line arguments (typically from std::env::args())
    pub fn parse<I, S>(args: I) -> ParsedArgs
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut debug_enabled = false;
        let mut display_help = false;
        let mut display_version = false;
        let mut json = false;
        let mut unknown_arg_found = false;
        let mut config_dir: Option<String> = None;
        let mut log_file: Option<String> = None;
        let mut command: Option<Command> = None;
        let mut help_topic: Option<String> = None;
        let mut positionals: Vec<String> = Vec::new();

        let mut args_iter = args.into_iter().skip(1).map(|s| s.as_ref().to_string());

        while let Some(arg) = args_iter.next() {
            match arg.as_str() {
                "--debug" | "-d" => debug_enabled = true,
                "--help" | "-h" => display_help = true,
                "--version" | "-V" | "-v" => display_version = true,
                "--json" | "-j" => json = true,
                "--config" | "-c" => match args_iter.next() {
                    Some(dir) => config_dir = Some(dir),
                    None => unknown_arg_found = true,
                },
                "--log" => match args_iter.next() {
                    Some(file) => log_file = Some(file),
                    None => unknown_arg_found = true,
                },
                flag if flag.starts_with('-') && !looks_numeric(flag) => {
                    log_warning!("Unknown argument: {}", flag);
                    unknown_arg_found = true;
                }
                other => match (command, Command::from_arg(other)) {
                    (None, Some(cmd)) => command = Some(cmd),
                    (Some(Command::Help), _) if help_topic.is_none() => {
                        help_topic = Some(other.to_string())
                    }
                    (None, None) | (Some(Command::Status), None) => {
                        positionals.push(other.to_string())
                    }
                    _ => unknown_arg_found = true,
                },
            }
        }

        let action = if display_version {
            CliAction::ShowVersion
        } else if unknown_arg_found || positionals.len() > 2 {
            CliAction::ShowHelpDueToError
        } else if display_help {
            match command {
                Some(Command::Help) | None => CliAction::ShowHelp,
                Some(cmd) => CliAction::ShowCommandUsage {
                    command: cmd.name().to_string(),
                },
            }
        } else if json && command != Some(Command::Status) {
            CliAction::ShowHelpDueToError
        } else {
            let min_lux = positionals.first().and_then(|v| parse_lux_override(v));
            let max_lux = positionals.get(1).and_then(|v| parse_lux_override(v));

            match command {
                None => CliAction::Run {
                    debug_enabled,
                    config_dir,
                    log_file,
                    min_lux,
                    max_lux,
                },
                Some(Command::Status) => CliAction::StatusCommand {
                    debug_enabled,
                    config_dir,
                    json,
                    min_lux,
                    max_lux,
                },
                Some(_) if !positionals.is_empty() => CliAction::ShowHelpDueToError,
                Some(Command::Reload) => CliAction::ReloadCommand {
                    debug_enabled,
                    config_dir,
                },
                Some(Command::Stop) => CliAction::StopCommand {
                    debug_enabled,
                    config_dir,
                },
                Some(Command::Help) => CliAction::HelpCommand {
                    command: help_topic,
                },
            }
        };

        ParsedArgs { action }
    }

    /// Parse the arguments of the current process.
    pub fn from_env() -> ParsedArgs {
        Self::parse(std::env::args())
    }
}

/// Display version information
pub fn display_version_info() {
    log_version!();
    log_pipe!();
    println!("┗ {}", env!("CARGO_PKG_DESCRIPTION"));
}

/// Display general usage
pub fn display_help() {
    log_version!();
    log_block_start!(env!("CARGO_PKG_DESCRIPTION"));
    log_block_start!("Usage:");
    log_indented!("luxr [OPTIONS] [min_lux] [max_lux] [COMMAND]");
    log_block_start!("Arguments:");
    log_indented!("min_lux                Lux mapped to the lowest brightness");
    log_indented!("max_lux                Lux mapped to full brightness");
    log_indented!("                       Invalid values fall back to the configuration");
    log_block_start!("Options:");
    log_indented!("-c, --config <dir>     Use custom configuration directory");
    log_indented!("-d, --debug            Enable detailed debug output");
    log_indented!("    --log <file>       Also write output to a log file");
    log_indented!("-h, --help             Print help information");
    log_indented!("-V, --version          Print version information");
    log_block_start!("Commands:");
    log_indented!("help, h [COMMAND]      Show detailed help for a command");
    log_indented!("reload, r              Reload the running daemon's configuration");
    log_indented!("status, s [--json]     Show the current reading and brightness");
    log_indented!("stop                   Cleanly terminate the running daemon");
    log_end!();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(min_lux: Option<f64>, max_lux: Option<f64>) -> CliAction {
        CliAction::Run {
            debug_enabled: false,
            config_dir: None,
            log_file: None,
            min_lux,
            max_lux,
        }
    }

    #[test]
    fn test_parse_no_args() {
        let parsed = ParsedArgs::parse(vec!["luxr"]);
        assert_eq!(parsed.action, run(None, None));
    }

    #[test]
    fn test_parse_lux_overrides() {
        let parsed = ParsedArgs::parse(vec!["luxr", "10", "800"]);
        assert_eq!(parsed.action, run(Some(10.0), Some(800.0)));

        let parsed = ParsedArgs::parse(vec!["luxr", "2.5"]);
        assert_eq!(parsed.action, run(Some(2.5), None));
    }

    #[test]
    fn test_invalid_lux_override_is_ignored() {
        let parsed = ParsedArgs::parse(vec!["luxr", "bright", "800"]);
        assert_eq!(parsed.action, run(None, Some(800.0)));

        let parsed = ParsedArgs::parse(vec!["luxr", "NaN", "inf"]);
        assert_eq!(parsed.action, run(None, None));
    }

    #[test]
    fn test_negative_lux_is_positional() {
        let parsed = ParsedArgs::parse(vec!["luxr", "-5", "100"]);
        assert_eq!(parsed.action, run(Some(-5.0), Some(100.0)));
    }

    #[test]
    fn test_too_many_positionals() {
        let parsed = ParsedArgs::parse(vec!["luxr", "1", "2", "3"]);
        assert_eq!(parsed.action, CliAction::ShowHelpDueToError);
    }

    #[test]
    fn test_parse_debug_flag() {
        let parsed = ParsedArgs::parse(vec!["luxr", "-d", "--config", "/tmp/alt"]);
        assert_eq!(
            parsed.action,
            CliAction::Run {
                debug_enabled: true,
                config_dir: Some("/tmp/alt".to_string()),
                log_file: None,
                min_lux: None,
                max_lux: None,
            }
        );
    }

    #[test]
    fn test_parse_log_file() {
        let parsed = ParsedArgs::parse(vec!["luxr", "--log", "/tmp/luxr.log", "20"]);
        assert_eq!(
            parsed.action,
            CliAction::Run {
                debug_enabled: false,
                config_dir: None,
                log_file: Some("/tmp/luxr.log".to_string()),
                min_lux: Some(20.0),
                max_lux: None,
            }
        );
    }

    #[test]
    fn test_missing_option_value() {
        assert_eq!(
            ParsedArgs::parse(vec!["luxr", "--config"]).action,
            CliAction::ShowHelpDueToError
        );
        assert_eq!(
            ParsedArgs::parse(vec!["luxr", "--log"]).action,
            CliAction::ShowHelpDueToError
        );
    }

    #[test]
    fn test_parse_help_and_version() {
        assert_eq!(
            ParsedArgs::parse(vec!["luxr", "--help"]).action,
            CliAction::ShowHelp
        );
        assert_eq!(
            ParsedArgs::parse(vec!["luxr", "-h"]).action,
            CliAction::ShowHelp
        );
        assert_eq!(
            ParsedArgs::parse(vec!["luxr", "-V"]).action,
            CliAction::ShowVersion
        );
    }

    #[test]
    fn test_version_takes_precedence() {
        let parsed = ParsedArgs::parse(vec!["luxr", "--help", "--version", "--bogus"]);
        assert_eq!(parsed.action, CliAction::ShowVersion);
    }

    #[test]
    fn test_parse_unknown_flag() {
        let parsed = ParsedArgs::parse(vec!["luxr", "--brightness"]);
        assert_eq!(parsed.action, CliAction::ShowHelpDueToError);
    }

    #[test]
    fn test_parse_status_command() {
        let parsed = ParsedArgs::parse(vec!["luxr", "status", "--json"]);
        assert_eq!(
            parsed.action,
            CliAction::StatusCommand {
                debug_enabled: false,
                config_dir: None,
                json: true,
                min_lux: None,
                max_lux: None,
            }
        );

        let parsed = ParsedArgs::parse(vec!["luxr", "10", "300", "s"]);
        assert_eq!(
            parsed.action,
            CliAction::StatusCommand {
                debug_enabled: false,
                config_dir: None,
                json: false,
                min_lux: Some(10.0),
                max_lux: Some(300.0),
            }
        );
    }

    #[test]
    fn test_json_requires_status() {
        let parsed = ParsedArgs::parse(vec!["luxr", "--json"]);
        assert_eq!(parsed.action, CliAction::ShowHelpDueToError);
    }

    #[test]
    fn test_parse_reload_and_stop() {
        assert_eq!(
            ParsedArgs::parse(vec!["luxr", "-d", "reload"]).action,
            CliAction::ReloadCommand {
                debug_enabled: true,
                config_dir: None,
            }
        );
        assert_eq!(
            ParsedArgs::parse(vec!["luxr", "stop"]).action,
            CliAction::StopCommand {
                debug_enabled: false,
                config_dir: None,
            }
        );
        assert_eq!(
            ParsedArgs::parse(vec!["luxr", "stop", "now"]).action,
            CliAction::ShowHelpDueToError
        );
    }

    #[test]
    fn test_parse_help_command() {
        assert_eq!(
            ParsedArgs::parse(vec!["luxr", "help"]).action,
            CliAction::HelpCommand { command: None }
        );
        assert_eq!(
            ParsedArgs::parse(vec!["luxr", "help", "status"]).action,
            CliAction::HelpCommand {
                command: Some("status".to_string())
            }
        );
    }

    #[test]
    fn test_command_usage_flag() {
        assert_eq!(
            ParsedArgs::parse(vec!["luxr", "reload", "--help"]).action,
            CliAction::ShowCommandUsage {
                command: "reload".to_string()
            }
        );
    }

    #[test]
    fn test_parse_lux_override_values() {
        assert_eq!(parse_lux_override(" 42 "), Some(42.0));
        assert_eq!(parse_lux_override("1e3"), Some(1000.0));
        assert_eq!(parse_lux_override("-inf"), None);
        assert_eq!(parse_lux_override(""), None);
    }
}
