use std::io;
use thiserror::Error;

/// Failures at the brightness sink.
///
/// The control loop branches on the kind: query failures degrade to a reading of 0,
/// an unavailable sink means a transition never starts, and a failed set aborts the
/// transition in progress.
#[derive(Debug, Error)]
pub enum BrightnessError {
    #[error("failed to query backlight brightness: {0}")]
    QueryFailed(#[source] io::Error),

    #[error("backlight reported an unusable value: {0}")]
    InvalidValue(String),

    #[error("brightness control unavailable: {0}")]
    SinkUnavailable(String),

    #[error("failed to set brightness to {level}%: {reason}")]
    SetFailed { level: u8, reason: String },
}
