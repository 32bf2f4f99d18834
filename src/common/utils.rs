//! Shared helpers used by the configuration, sensor, and backlight modules.

use std::fs;
use std::io;
use std::path::Path;
use std::str::FromStr;

/// Render a path for display with the home directory replaced by `~`.
///
/// Keeps user names out of logs that people paste into bug reports.
pub fn private_path(path: &Path) -> String {
    if let Some(home) = dirs::home_dir()
        && let Ok(stripped) = path.strip_prefix(&home)
    {
        return format!("~/{}", stripped.display());
    }
    path.display().to_string()
}

/// Read a sysfs attribute and parse its trimmed contents.
///
/// Parse failures are reported as `InvalidData` so callers only deal with `io::Error`.
pub fn read_sysfs_value<T>(path: &Path) -> io::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let content = fs::read_to_string(path)?;
    let trimmed = content.trim();
    trimmed.parse::<T>().map_err(|e| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("{}: cannot parse {trimmed:?}: {e}", path.display()),
        )
    })
}

/// Format a millisecond duration the way the config file and logs show it.
pub fn format_millis(ms: u64) -> String {
    if ms >= 1000 && ms % 1000 == 0 {
        format!("{}s", ms / 1000)
    } else if ms >= 1000 {
        format!("{:.1}s", ms as f64 / 1000.0)
    } else {
        format!("{ms}ms")
    }
}
