//! Command-line command handlers for luxr.
//!
//! One-shot commands that inspect the hardware or talk to a running daemon. Each command
//! lives in its own submodule.

pub mod help;
pub mod reload;
pub mod status;
pub mod stop;
