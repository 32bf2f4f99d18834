//! Configuration file building and default config creation.
//!
//! The default file is assembled with `ConfigBuilder` so every setting carries an
//! aligned comment describing its unit and range.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::common::constants::*;
use crate::common::utils::private_path;

/// Write a commented default configuration to `path`, creating parent directories.
pub fn create_default_config(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("Failed to create config directory")?;
    }

    fs::write(path, default_config_content())
        .with_context(|| format!("Failed to write default config to {}", private_path(path)))?;

    log_block_start!("Created default configuration");
    log_indented!("{}", private_path(path));

    Ok(())
}

/// Text of the default configuration file.
pub(crate) fn default_config_content() -> String {
    let mut content = ConfigBuilder::new()
        .add_section("Devices")
        .add_setting(
            "backend",
            &format!("\"{}\"", DEFAULT_BACKEND.as_str()),
            "Brightness write path: \"auto\", \"logind\" or \"sysfs\"",
        )
        .add_section("Brightness curve")
        .add_setting(
            "min_lux",
            &format_float(DEFAULT_MIN_LUX),
            "Ambient light mapped to the lowest brightness (lux)",
        )
        .add_setting(
            "max_lux",
            &format_float(DEFAULT_MAX_LUX),
            &format!("Ambient light mapped to full brightness (up to {MAXIMUM_LUX} lux)"),
        )
        .add_setting(
            "gamma",
            &format_float(DEFAULT_GAMMA),
            &format!(
                "Curve exponent, below 1 favors brighter output ({MINIMUM_GAMMA}-{MAXIMUM_GAMMA})"
            ),
        )
        .add_section("Transitions")
        .add_setting(
            "transition_duration",
            &DEFAULT_TRANSITION_DURATION.to_string(),
            &format!(
                "Length of one brightness ramp ({MINIMUM_TRANSITION_DURATION}-{MAXIMUM_TRANSITION_DURATION})ms"
            ),
        )
        .add_setting(
            "transition_step",
            &DEFAULT_TRANSITION_STEP.to_string(),
            &format!(
                "Delay between ramp steps ({MINIMUM_TRANSITION_STEP}-{MAXIMUM_TRANSITION_STEP})ms"
            ),
        )
        .add_section("Timing")
        .add_setting(
            "poll_interval",
            &DEFAULT_POLL_INTERVAL.to_string(),
            &format!(
                "Delay between sensor samples ({MINIMUM_WAIT_INTERVAL}-{MAXIMUM_WAIT_INTERVAL})ms"
            ),
        )
        .add_setting(
            "low_light_hold",
            &DEFAULT_LOW_LIGHT_HOLD.to_string(),
            &format!(
                "Delay after a reading below low_light_floor ({MINIMUM_WAIT_INTERVAL}-{MAXIMUM_WAIT_INTERVAL})ms"
            ),
        )
        .add_setting(
            "settle_interval",
            &DEFAULT_SETTLE_INTERVAL.to_string(),
            &format!(
                "Delay after an override or noise-floor skip ({MINIMUM_WAIT_INTERVAL}-{MAXIMUM_WAIT_INTERVAL})ms"
            ),
        )
        .add_section("Filtering")
        .add_setting(
            "low_light_floor",
            &format_float(DEFAULT_LOW_LIGHT_FLOOR),
            "Readings below this are ignored (lux)",
        )
        .add_setting(
            "noise_threshold",
            &format_float(DEFAULT_NOISE_THRESHOLD),
            "Minimum lux change that triggers an adjustment",
        )
        .add_setting(
            "override_threshold",
            &DEFAULT_OVERRIDE_THRESHOLD.to_string(),
            &format!("Brightness drift treated as a manual change (0-{MAXIMUM_OVERRIDE_THRESHOLD})%"),
        )
        .add_setting(
            "lux_window",
            &DEFAULT_LUX_WINDOW.to_string(),
            &format!("Readings averaged before evaluation ({MINIMUM_LUX_WINDOW}-{MAXIMUM_LUX_WINDOW})"),
        )
        .build();

    content.push('\n');
    content
}

/// TOML needs a decimal point to keep a float a float.
fn format_float(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        value.to_string()
    }
}

struct ConfigBuilder {
    entries: Vec<ConfigEntry>,
}

struct ConfigEntry {
    content: String,
    entry_type: EntryType,
}

enum EntryType {
    Section,
    Setting { comment: String },
}

impl ConfigBuilder {
    fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    fn add_section(mut self, title: &str) -> Self {
        self.entries.push(ConfigEntry {
            content: format!("#[{title}]"),
            entry_type: EntryType::Section,
        });
        self
    }

    fn add_setting(mut self, key: &str, value: &str, comment: &str) -> Self {
        self.entries.push(ConfigEntry {
            content: format!("{key} = {value}"),
            entry_type: EntryType::Setting {
                comment: format!("# {comment}"),
            },
        });
        self
    }

    fn build(self) -> String {
        // Comments line up one column past the longest setting
        let comment_column = self
            .entries
            .iter()
            .filter(|entry| matches!(entry.entry_type, EntryType::Setting { .. }))
            .map(|entry| entry.content.len())
            .max()
            .unwrap_or(0)
            + 1;

        let mut lines = Vec::with_capacity(self.entries.len() * 2);

        for (index, entry) in self.entries.into_iter().enumerate() {
            match entry.entry_type {
                EntryType::Section => {
                    if index > 0 {
                        lines.push(String::new());
                    }
                    lines.push(entry.content);
                }
                EntryType::Setting { comment } => {
                    let padding = " ".repeat(comment_column - entry.content.len());
                    lines.push(format!("{}{padding}{comment}", entry.content));
                }
            }
        }

        lines.join("\n")
    }
}
