//! Backlight abstraction for reading and writing display brightness.
//!
//! The control loop talks to the display through two traits:
//!
//! - [`BrightnessBackend`] reads the current brightness and hands out a control handle.
//! - [`BrightnessControl`] is that handle. It is acquired once per transition and
//!   released when dropped, on every exit path.
//!
//! Brightness is always expressed as a percentage in `0..=100`. The sysfs implementation
//! converts to and from the device's raw scale.
//!
//! ## Write paths
//!
//! - **logind**: `org.freedesktop.login1.Session.SetBrightness` over the system bus,
//!   which works for an unprivileged user owning the active session
//! - **sysfs**: direct writes to the device's `brightness` attribute (needs write
//!   permission, typically via a udev rule)
//! - **auto**: logind when the system bus is reachable, sysfs otherwise

use anyhow::Result;
use std::path::Path;

use crate::common::constants::{BACKLIGHT_CLASS_DIR, DEFAULT_BACKEND};
use crate::config::{Backend, Config};

pub mod error;
pub mod mock;
pub mod sysfs;

pub use error::BrightnessError;
pub use mock::MockBacklight;
pub use sysfs::SysfsBacklight;

/// Read side of a brightness sink.
pub trait BrightnessBackend {
    /// Current brightness as a percentage.
    fn read_brightness(&self) -> Result<u8, BrightnessError>;

    /// Acquire the write handle for one transition.
    ///
    /// Failure means the sink cannot be written right now and the transition must not
    /// start.
    fn open_control(&self) -> Result<Box<dyn BrightnessControl + '_>, BrightnessError>;

    /// Human-readable name of the write path (e.g. "logind", "sysfs").
    fn backend_name(&self) -> &'static str;

    /// Name of the underlying device, when there is one.
    fn device_name(&self) -> Option<&str> {
        None
    }

    /// Periodic health check run from the control loop's housekeeping pass.
    /// Default no-op; backends whose device can disappear override this.
    fn poll_health(&self) -> Result<()> {
        Ok(())
    }
}

impl<T: BrightnessBackend + ?Sized> BrightnessBackend for Box<T> {
    fn read_brightness(&self) -> Result<u8, BrightnessError> {
        (**self).read_brightness()
    }

    fn open_control(&self) -> Result<Box<dyn BrightnessControl + '_>, BrightnessError> {
        (**self).open_control()
    }

    fn backend_name(&self) -> &'static str {
        (**self).backend_name()
    }

    fn device_name(&self) -> Option<&str> {
        (**self).device_name()
    }

    fn poll_health(&self) -> Result<()> {
        (**self).poll_health()
    }
}

/// Write handle for a brightness sink. Dropping it releases the underlying resource.
#[cfg_attr(test, mockall::automock)]
pub trait BrightnessControl {
    fn set_brightness(&mut self, level: u8) -> Result<(), BrightnessError>;
}

/// Brightness as the control loop sees it: a failed query reads as 0.
///
/// This is the single place where a query failure is degraded. A 0 baseline makes the
/// next comparison register as a large divergence, so the loop resynchronizes instead of
/// ramping from a stale value.
pub fn observed_brightness(backend: &dyn BrightnessBackend, debug_enabled: bool) -> u8 {
    match backend.read_brightness() {
        Ok(level) => level,
        Err(e) => {
            if debug_enabled {
                log_debug!("{e}, treating brightness as 0");
            }
            0
        }
    }
}

/// Create the brightness backend described by the configuration.
pub fn create_backend(config: &Config) -> Result<Box<dyn BrightnessBackend>> {
    let requested = config.backend.unwrap_or(DEFAULT_BACKEND);
    let backlight = SysfsBacklight::open(
        Path::new(BACKLIGHT_CLASS_DIR),
        config.backlight_device.as_deref(),
        resolve_write_path(requested),
    )?;
    Ok(Box::new(backlight))
}

/// Pick the concrete write path for a configured backend.
pub fn resolve_write_path(requested: Backend) -> Backend {
    match requested {
        Backend::Auto => {
            if crate::io::dbus::system_bus_available() {
                Backend::Logind
            } else {
                Backend::Sysfs
            }
        }
        explicit => explicit,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    struct FailingBackend;

    impl BrightnessBackend for FailingBackend {
        fn read_brightness(&self) -> Result<u8, BrightnessError> {
            Err(BrightnessError::QueryFailed(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "denied",
            )))
        }

        fn open_control(&self) -> Result<Box<dyn BrightnessControl + '_>, BrightnessError> {
            Err(BrightnessError::SinkUnavailable("test".to_string()))
        }

        fn backend_name(&self) -> &'static str {
            "failing"
        }
    }

    struct FixedBackend(u8);

    impl BrightnessBackend for FixedBackend {
        fn read_brightness(&self) -> Result<u8, BrightnessError> {
            Ok(self.0)
        }

        fn open_control(&self) -> Result<Box<dyn BrightnessControl + '_>, BrightnessError> {
            Ok(Box::new(MockBrightnessControl::new()))
        }

        fn backend_name(&self) -> &'static str {
            "fixed"
        }
    }

    #[test]
    fn test_observed_brightness_degrades_failure_to_zero() {
        assert_eq!(observed_brightness(&FailingBackend, false), 0);
    }

    #[test]
    fn test_observed_brightness_passes_value_through() {
        assert_eq!(observed_brightness(&FixedBackend(42), false), 42);
    }

    #[test]
    fn test_default_poll_health_is_ok() {
        assert!(FixedBackend(10).poll_health().is_ok());
        assert!(FixedBackend(10).device_name().is_none());
    }

    #[test]
    fn test_explicit_write_path_is_kept() {
        assert_eq!(resolve_write_path(Backend::Sysfs), Backend::Sysfs);
        assert_eq!(resolve_write_path(Backend::Logind), Backend::Logind);
    }
}
