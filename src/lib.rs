//! # luxr library
//!
//! Internal library for the luxr binary: ambient light in, backlight brightness out.
//!
//! This library exists to enable testing of the control logic and provide clean
//! separation between CLI dispatch (main.rs) and application logic.
//!
//! ## Architecture
//!
//! - **Entry Point**: `Luxr` acquires resources and hands them to the core
//! - **Core Logic**: `core` holds the lux mapping, the adjustment gate, smooth
//!   transitions, and the control loop that ties them together
//! - **Backends**: `backend` reads and writes the backlight (sysfs or logind)
//! - **Sensors**: `sensor` reads ambient light from IIO devices
//! - **Configuration**: `config` for TOML-based settings with hot-reload
//! - **Commands**: `commands` for one-shot CLI subcommands (status, reload, stop)
//! - **Infrastructure**: `io` for signals, lock files and D-Bus; `common` for logging

// Import macros from logger module for use in all submodules
#[macro_use]
pub mod common;

// Public API modules
pub mod args;
pub mod backend;
pub mod commands;
pub mod config;
pub mod core;
pub mod io;
pub mod sensor;

// Internal modules
mod luxr;

pub use luxr::Luxr;
