//! Industrial I/O (IIO) ambient light sensors under `/sys/bus/iio/devices`.
//!
//! Drivers expose illuminance either already processed (`in_illuminance_input`, in lux)
//! or as a raw count with an optional scale and offset:
//! `lux = (raw + offset) * scale`.

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};

use super::LightSensor;
use crate::common::utils::{private_path, read_sysfs_value};

const PROCESSED_CHANNELS: [&str; 2] = ["in_illuminance_input", "in_illuminance0_input"];
const RAW_CHANNELS: [&str; 2] = ["in_illuminance_raw", "in_illuminance0_raw"];

#[derive(Debug, Clone, PartialEq)]
enum Channel {
    Processed(PathBuf),
    Raw {
        raw: PathBuf,
        scale: Option<PathBuf>,
        offset: Option<PathBuf>,
    },
}

/// An IIO device with an illuminance channel.
#[derive(Debug)]
pub struct IioLightSensor {
    device: String,
    label: Option<String>,
    channel: Channel,
}

impl IioLightSensor {
    /// Find a sensor in `devices_dir`, either the named device or the first one (by name)
    /// exposing an illuminance channel.
    pub fn discover(devices_dir: &Path, device: Option<&str>) -> Result<Self> {
        if let Some(name) = device {
            let path = devices_dir.join(name);
            return Self::from_device_dir(&path).ok_or_else(|| {
                anyhow::anyhow!(
                    "Sensor device {} has no illuminance channel",
                    private_path(&path)
                )
            });
        }

        let mut entries: Vec<PathBuf> = fs::read_dir(devices_dir)
            .map(|dir| dir.filter_map(|e| e.ok()).map(|e| e.path()).collect())
            .unwrap_or_default();
        entries.sort();

        entries
            .iter()
            .find_map(|path| Self::from_device_dir(path))
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "No ambient light sensor found in {}",
                    private_path(devices_dir)
                )
            })
    }

    fn from_device_dir(path: &Path) -> Option<Self> {
        let device = path.file_name()?.to_str()?.to_string();
        let channel = find_channel(path)?;
        let label = fs::read_to_string(path.join("name"))
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        Some(Self {
            device,
            label,
            channel,
        })
    }

    fn read_channel(&self) -> Option<f64> {
        match &self.channel {
            Channel::Processed(path) => read_sysfs_value::<f64>(path).ok(),
            Channel::Raw { raw, scale, offset } => {
                let raw: f64 = read_sysfs_value(raw).ok()?;
                let scale = match scale {
                    Some(path) => read_sysfs_value(path).ok()?,
                    None => 1.0,
                };
                let offset = match offset {
                    Some(path) => read_sysfs_value(path).ok()?,
                    None => 0.0,
                };
                Some((raw + offset) * scale)
            }
        }
    }
}

impl LightSensor for IioLightSensor {
    fn read_lux(&mut self) -> Option<f64> {
        self.read_channel().filter(|lux| lux.is_finite())
    }

    fn sensor_name(&self) -> String {
        match &self.label {
            Some(label) => format!("{} ({label})", self.device),
            None => self.device.clone(),
        }
    }
}

fn find_channel(device_dir: &Path) -> Option<Channel> {
    if let Some(path) = PROCESSED_CHANNELS
        .iter()
        .map(|name| device_dir.join(name))
        .find(|p| p.is_file())
    {
        return Some(Channel::Processed(path));
    }

    let raw = RAW_CHANNELS
        .iter()
        .map(|name| device_dir.join(name))
        .find(|p| p.is_file())?;

    // in_illuminance_raw pairs with in_illuminance_scale, and so on
    let sibling = |suffix: &str| {
        let name = raw.file_name()?.to_str()?.replace("_raw", suffix);
        let path = device_dir.join(name);
        path.is_file().then_some(path)
    };

    Some(Channel::Raw {
        scale: sibling("_scale"),
        offset: sibling("_offset"),
        raw,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write_attr(dir: &Path, name: &str, value: &str) {
        fs::create_dir_all(dir).unwrap();
        fs::write(dir.join(name), format!("{value}\n")).unwrap();
    }

    #[test]
    fn test_processed_channel_reads_lux() {
        let root = tempdir().unwrap();
        let device = root.path().join("iio:device0");
        write_attr(&device, "in_illuminance_input", "123.5");
        write_attr(&device, "name", "als");

        let mut sensor = IioLightSensor::discover(root.path(), None).unwrap();
        assert_eq!(sensor.read_lux(), Some(123.5));
        assert_eq!(sensor.sensor_name(), "iio:device0 (als)");
    }

    #[test]
    fn test_raw_channel_applies_scale_and_offset() {
        let root = tempdir().unwrap();
        let device = root.path().join("iio:device1");
        write_attr(&device, "in_illuminance_raw", "100");
        write_attr(&device, "in_illuminance_scale", "0.5");
        write_attr(&device, "in_illuminance_offset", "10");

        let mut sensor = IioLightSensor::discover(root.path(), None).unwrap();
        assert_eq!(sensor.read_lux(), Some(55.0));
    }

    #[test]
    fn test_raw_channel_defaults_scale_and_offset() {
        let root = tempdir().unwrap();
        let device = root.path().join("iio:device0");
        write_attr(&device, "in_illuminance0_raw", "42");

        let mut sensor = IioLightSensor::discover(root.path(), None).unwrap();
        assert_eq!(sensor.read_lux(), Some(42.0));
        assert_eq!(sensor.sensor_name(), "iio:device0");
    }

    #[test]
    fn test_unreadable_value_yields_none() {
        let root = tempdir().unwrap();
        let device = root.path().join("iio:device0");
        write_attr(&device, "in_illuminance_input", "garbage");

        let mut sensor = IioLightSensor::discover(root.path(), None).unwrap();
        assert_eq!(sensor.read_lux(), None);

        fs::remove_file(device.join("in_illuminance_input")).unwrap();
        assert_eq!(sensor.read_lux(), None);
    }

    #[test]
    fn test_non_finite_value_yields_none() {
        let root = tempdir().unwrap();
        let device = root.path().join("iio:device0");
        write_attr(&device, "in_illuminance_input", "inf");

        let mut sensor = IioLightSensor::discover(root.path(), None).unwrap();
        assert_eq!(sensor.read_lux(), None);
    }

    #[test]
    fn test_discover_skips_devices_without_illuminance() {
        let root = tempdir().unwrap();
        write_attr(&root.path().join("iio:device0"), "in_accel_x_raw", "12");
        write_attr(&root.path().join("iio:device1"), "in_illuminance_input", "7");

        let sensor = IioLightSensor::discover(root.path(), None).unwrap();
        assert_eq!(sensor.sensor_name(), "iio:device1");
    }

    #[test]
    fn test_discover_named_device() {
        let root = tempdir().unwrap();
        write_attr(&root.path().join("iio:device0"), "in_illuminance_input", "1");
        write_attr(&root.path().join("iio:device3"), "in_illuminance_input", "2");

        let mut sensor = IioLightSensor::discover(root.path(), Some("iio:device3")).unwrap();
        assert_eq!(sensor.read_lux(), Some(2.0));

        assert!(IioLightSensor::discover(root.path(), Some("iio:device9")).is_err());
    }

    #[test]
    fn test_discover_without_sensor_fails() {
        let root = tempdir().unwrap();
        assert!(IioLightSensor::discover(root.path(), None).is_err());
        assert!(IioLightSensor::discover(&root.path().join("missing"), None).is_err());
    }
}
