//! Signal handling for the luxr daemon.
//!
//! A dedicated thread translates Unix signals into `SignalMessage`s on the channel the
//! main loop waits on:
//!
//! - `SIGUSR2`: reload the configuration
//! - `SIGINT`, `SIGTERM`, `SIGHUP`: shut down

use anyhow::{Context, Result};
use signal_hook::{
    consts::signal::{SIGHUP, SIGINT, SIGTERM, SIGUSR2},
    iterator::Signals,
};
use std::{
    sync::Arc,
    sync::atomic::{AtomicBool, Ordering},
    sync::mpsc::{Receiver, Sender},
    thread,
};

/// Messages delivered to the main loop by auxiliary threads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalMessage {
    /// Configuration reload (SIGUSR2 or a file change).
    Reload,
    /// Shutdown (SIGTERM, SIGINT, SIGHUP).
    Shutdown,
}

/// Signal handling state shared between threads.
pub struct SignalState {
    /// Cleared when the process should stop; checked between transition steps.
    pub running: Arc<AtomicBool>,
    pub signal_receiver: Receiver<SignalMessage>,
    /// Kept so other producers (the config watcher) can be attached.
    pub signal_sender: Sender<SignalMessage>,
}

impl SignalState {
    /// State with no OS signal thread attached.
    pub fn detached() -> Self {
        let (signal_sender, signal_receiver) = std::sync::mpsc::channel();
        Self {
            running: Arc::new(AtomicBool::new(true)),
            signal_receiver,
            signal_sender,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

/// Register the signal handlers and spawn the thread that forwards them.
pub fn setup_signal_handler(debug_enabled: bool) -> Result<SignalState> {
    let state = SignalState::detached();

    let mut signals = Signals::new([SIGINT, SIGTERM, SIGHUP, SIGUSR2])
        .context("failed to register signal handlers")?;

    let running = state.running.clone();
    let sender = state.signal_sender.clone();

    thread::spawn(move || {
        for sig in signals.forever() {
            match sig {
                SIGUSR2 => {
                    log_pipe!();
                    log_info!("Received configuration reload signal");
                    if sender.send(SignalMessage::Reload).is_err() {
                        break;
                    }
                }
                _ => {
                    let message = match sig {
                        SIGINT if debug_enabled => {
                            "Received SIGINT (Ctrl+C), initiating graceful shutdown..."
                        }
                        SIGINT => "Received interrupt signal, initiating graceful shutdown...",
                        SIGTERM => "Received termination request, initiating graceful shutdown...",
                        _ => "Received hangup signal, initiating graceful shutdown...",
                    };
                    log_pipe!();
                    log_info!("{}", message);

                    // Clear the flag first so a ramp in progress stops at its next step
                    running.store(false, Ordering::SeqCst);

                    if sender.send(SignalMessage::Shutdown).is_err() {
                        // Main loop is already gone
                        break;
                    }
                }
            }
        }
    });

    Ok(state)
}
