//! Backlight device under `/sys/class/backlight`.
//!
//! Reads come from `actual_brightness` (or `brightness` when the driver lacks it) and are
//! scaled against `max_brightness`. Writes go either through logind or straight to the
//! `brightness` attribute, depending on the resolved write path.

use anyhow::{Context, Result};
use std::cell::Cell;
use std::fs::{self, File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use super::{BrightnessBackend, BrightnessControl, BrightnessError};
use crate::common::constants::MAXIMUM_BRIGHTNESS;
use crate::common::utils::{private_path, read_sysfs_value};
use crate::config::Backend;
use crate::io::dbus::{LogindSessionProxyBlocking, connect_session};

/// A backlight device resolved at startup.
pub struct SysfsBacklight {
    name: String,
    path: PathBuf,
    max_brightness: u32,
    write_path: Backend,
    /// Last value this process wrote, as `(raw, percent)`.
    ///
    /// Devices with few raw steps cannot represent every percentage, so reading back
    /// a value we just wrote would otherwise look like a manual change.
    last_written: Cell<Option<(u32, u8)>>,
}

impl SysfsBacklight {
    /// Open a device under `class_dir`, either the named one or the preferred one.
    ///
    /// `write_path` must already be resolved (`Logind` or `Sysfs`); `Auto` is treated as
    /// `Sysfs`.
    pub fn open(class_dir: &Path, device: Option<&str>, write_path: Backend) -> Result<Self> {
        let name = match device {
            Some(name) => name.to_string(),
            None => find_preferred_device(class_dir)?,
        };
        let path = class_dir.join(&name);

        if !path.is_dir() {
            anyhow::bail!("Backlight device not found: {}", private_path(&path));
        }

        let max_brightness: u32 = read_sysfs_value(&path.join("max_brightness"))
            .with_context(|| format!("Failed to read max_brightness of {name}"))?;
        if max_brightness == 0 {
            anyhow::bail!("Backlight device {name} reports max_brightness 0");
        }

        let write_path = match write_path {
            Backend::Logind => Backend::Logind,
            Backend::Auto | Backend::Sysfs => Backend::Sysfs,
        };

        Ok(Self {
            name,
            path,
            max_brightness,
            write_path,
            last_written: Cell::new(None),
        })
    }

    pub fn max_brightness(&self) -> u32 {
        self.max_brightness
    }

    fn read_raw(&self) -> Result<u32, BrightnessError> {
        let actual = self.path.join("actual_brightness");
        let source = if actual.exists() {
            actual
        } else {
            self.path.join("brightness")
        };

        read_sysfs_value(&source).map_err(BrightnessError::QueryFailed)
    }

    fn record_write(&self, raw: u32, level: u8) {
        self.last_written.set(Some((raw, level)));
    }
}

impl BrightnessBackend for SysfsBacklight {
    fn read_brightness(&self) -> Result<u8, BrightnessError> {
        let raw = self.read_raw()?;

        if raw > self.max_brightness {
            return Err(BrightnessError::InvalidValue(format!(
                "{} above max_brightness {}",
                raw, self.max_brightness
            )));
        }

        if let Some((written_raw, written_level)) = self.last_written.get()
            && written_raw == raw
        {
            return Ok(written_level);
        }

        Ok(raw_to_percent(raw, self.max_brightness))
    }

    fn open_control(&self) -> Result<Box<dyn BrightnessControl + '_>, BrightnessError> {
        match self.write_path {
            Backend::Logind => {
                let proxy = connect_session().map_err(|e| {
                    BrightnessError::SinkUnavailable(format!("logind session: {e}"))
                })?;
                Ok(Box::new(LogindControl {
                    backlight: self,
                    proxy,
                }))
            }
            Backend::Auto | Backend::Sysfs => {
                let attribute = self.path.join("brightness");
                let file = OpenOptions::new()
                    .write(true)
                    .open(&attribute)
                    .map_err(|e| {
                        BrightnessError::SinkUnavailable(format!(
                            "{}: {e}",
                            private_path(&attribute)
                        ))
                    })?;
                Ok(Box::new(SysfsControl {
                    backlight: self,
                    file,
                }))
            }
        }
    }

    fn backend_name(&self) -> &'static str {
        self.write_path.as_str()
    }

    fn device_name(&self) -> Option<&str> {
        Some(&self.name)
    }

    fn poll_health(&self) -> Result<()> {
        if !self.path.is_dir() {
            anyhow::bail!(
                "Backlight device {} disappeared from {}",
                self.name,
                private_path(&self.path)
            );
        }
        Ok(())
    }
}

/// Writes through logind. Owns the bus connection for the duration of one transition.
struct LogindControl<'a> {
    backlight: &'a SysfsBacklight,
    proxy: LogindSessionProxyBlocking<'static>,
}

impl BrightnessControl for LogindControl<'_> {
    fn set_brightness(&mut self, level: u8) -> Result<(), BrightnessError> {
        let raw = percent_to_raw(level, self.backlight.max_brightness);
        self.proxy
            .set_brightness("backlight", &self.backlight.name, raw)
            .map_err(|e| BrightnessError::SetFailed {
                level,
                reason: e.to_string(),
            })?;
        self.backlight.record_write(raw, level);
        Ok(())
    }
}

/// Writes straight to the `brightness` attribute, kept open for one transition.
struct SysfsControl<'a> {
    backlight: &'a SysfsBacklight,
    file: File,
}

impl BrightnessControl for SysfsControl<'_> {
    fn set_brightness(&mut self, level: u8) -> Result<(), BrightnessError> {
        let raw = percent_to_raw(level, self.backlight.max_brightness);
        let write = |file: &mut File| -> std::io::Result<()> {
            file.seek(SeekFrom::Start(0))?;
            file.write_all(raw.to_string().as_bytes())?;
            file.flush()
        };
        write(&mut self.file).map_err(|e| BrightnessError::SetFailed {
            level,
            reason: e.to_string(),
        })?;
        self.backlight.record_write(raw, level);
        Ok(())
    }
}

/// `round(raw * 100 / max)`, capped at 100.
pub fn raw_to_percent(raw: u32, max: u32) -> u8 {
    if max == 0 {
        return 0;
    }
    let percent = (f64::from(raw) * 100.0 / f64::from(max)).round();
    percent.min(f64::from(MAXIMUM_BRIGHTNESS)) as u8
}

/// `round(percent * max / 100)`. A non-zero percentage never maps to raw 0, which
/// would switch the panel off on coarse devices.
pub fn percent_to_raw(level: u8, max: u32) -> u32 {
    let level = level.min(MAXIMUM_BRIGHTNESS);
    let raw = (f64::from(level) * f64::from(max) / 100.0).round() as u32;
    raw.max(u32::from(level > 0)).min(max)
}

/// Pick the device a desktop would use: `firmware` drivers first (ACPI), then
/// `platform`, then `raw` (GPU drivers), then anything else, each group by name.
fn find_preferred_device(class_dir: &Path) -> Result<String> {
    let entries = fs::read_dir(class_dir)
        .with_context(|| format!("Failed to list {}", private_path(class_dir)))?;

    let mut candidates: Vec<(u8, String)> = entries
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| {
            let name = entry.file_name().into_string().ok()?;
            let kind = fs::read_to_string(entry.path().join("type")).unwrap_or_default();
            Some((type_rank(kind.trim()), name))
        })
        .collect();

    candidates.sort();

    candidates
        .into_iter()
        .next()
        .map(|(_, name)| name)
        .ok_or_else(|| anyhow::anyhow!("No backlight device found in {}", class_dir.display()))
}

fn type_rank(kind: &str) -> u8 {
    match kind {
        "firmware" => 0,
        "platform" => 1,
        "raw" => 2,
        _ => 3,
    }
}
