//! Ambient light sensing.
//!
//! The control loop only needs one capability from a sensor: the current illuminance in
//! lux, or nothing when no reading is available this cycle.

use anyhow::Result;
use std::path::Path;

use crate::common::constants::IIO_DEVICES_DIR;
use crate::config::Config;

pub mod iio;

pub use iio::IioLightSensor;

/// Source of ambient light readings.
#[cfg_attr(test, mockall::automock)]
pub trait LightSensor {
    /// Current illuminance in lux, or `None` when no usable reading exists.
    fn read_lux(&mut self) -> Option<f64>;

    /// Human-readable sensor identification for logs.
    fn sensor_name(&self) -> String;
}

impl<T: LightSensor + ?Sized> LightSensor for Box<T> {
    fn read_lux(&mut self) -> Option<f64> {
        (**self).read_lux()
    }

    fn sensor_name(&self) -> String {
        (**self).sensor_name()
    }
}

/// Find the ambient light sensor described by the configuration.
///
/// An error here is fatal: the daemon has nothing to follow without a sensor.
pub fn detect_sensor(config: &Config) -> Result<Box<dyn LightSensor>> {
    let sensor = IioLightSensor::discover(
        Path::new(IIO_DEVICES_DIR),
        config.sensor_device.as_deref(),
    )?;
    Ok(Box::new(sensor))
}
