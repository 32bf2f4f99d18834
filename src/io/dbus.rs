//! systemd-logind access over the system bus.
//!
//! logind's `Session.SetBrightness` lets the user owning the active session change a
//! backlight without write access to sysfs. zbus's blocking API is used since every
//! call happens on the control thread.

use zbus::blocking::Connection;

/// D-Bus proxy for the caller's own logind session.
#[zbus::proxy(
    interface = "org.freedesktop.login1.Session",
    default_service = "org.freedesktop.login1",
    default_path = "/org/freedesktop/login1/session/auto"
)]
pub trait LogindSession {
    /// Set the raw brightness of a device in the `backlight` or `leds` subsystem.
    fn set_brightness(&self, subsystem: &str, name: &str, brightness: u32) -> zbus::Result<()>;
}

/// Connect to the system bus and build a session proxy.
///
/// The proxy keeps its own handle on the connection, so it stays usable for as long as
/// it lives.
pub fn connect_session() -> zbus::Result<LogindSessionProxyBlocking<'static>> {
    let connection = Connection::system()?;
    LogindSessionProxyBlocking::new(&connection)
}

/// Whether a system bus connection can be established right now.
pub fn system_bus_available() -> bool {
    Connection::system().is_ok()
}
