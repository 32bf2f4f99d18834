//! File watching for hot config reloading.
//!
//! Watches the directory holding `luxr.toml` and sends `SignalMessage::Reload` to the
//! main loop when the file is written, replaced, or removed.

use anyhow::{Context, Result};
use notify::{
    Config as NotifyConfig, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher,
};
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use std::thread;
use std::time::{Duration, Instant};

use super::get_config_path;
use crate::common::constants::{CONFIG_FILE_NAME, CONFIG_WATCH_DEBOUNCE_MS};
use crate::common::utils::private_path;
use crate::io::signals::SignalMessage;

/// Configuration file watcher that monitors for changes and triggers reloads.
pub struct ConfigWatcher {
    signal_sender: Sender<SignalMessage>,
    debug_enabled: bool,
    config_path: PathBuf,
}

impl ConfigWatcher {
    pub fn new(
        signal_sender: Sender<SignalMessage>,
        config_path: PathBuf,
        debug_enabled: bool,
    ) -> Self {
        Self {
            signal_sender,
            debug_enabled,
            config_path,
        }
    }

    /// Spawn the watcher thread.
    ///
    /// The parent directory is watched rather than the file because editors commonly
    /// save by writing a temporary file and renaming it over the original.
    pub fn start(self) -> Result<()> {
        let Some(config_dir) = self.config_path.parent().map(Path::to_path_buf) else {
            return Ok(());
        };

        if !config_dir.is_dir() {
            if self.debug_enabled {
                log_pipe!();
                log_debug!("No configuration directory to watch for hot reload");
            }
            return Ok(());
        }

        let (tx, rx) = std::sync::mpsc::channel();

        let mut watcher = RecommendedWatcher::new(
            move |res: Result<Event, notify::Error>| {
                if let Ok(event) = res
                    && matches!(
                        event.kind,
                        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
                    )
                {
                    let _ = tx.send(event);
                }
            },
            NotifyConfig::default(),
        )
        .context("Failed to create file watcher")?;

        watcher
            .watch(&config_dir, RecursiveMode::NonRecursive)
            .with_context(|| format!("Failed to watch directory: {}", config_dir.display()))?;

        if self.debug_enabled {
            log_pipe!();
            log_debug!("Starting config file watcher for hot reload:");
            log_indented!("Watching: {}", private_path(&self.config_path));
        }

        thread::spawn(move || {
            // The watcher stops delivering events once dropped
            let _watcher = watcher;
            let mut last_reload: Option<Instant> = None;

            for event in rx {
                if !event.paths.iter().any(|p| is_config_event_path(p)) {
                    continue;
                }

                if let Some(last) = last_reload
                    && last.elapsed() < Duration::from_millis(CONFIG_WATCH_DEBOUNCE_MS)
                {
                    continue;
                }

                if self.debug_enabled {
                    log_pipe!();
                    log_info!("Configuration file change detected");
                }

                if self.signal_sender.send(SignalMessage::Reload).is_err() {
                    // Main loop is gone
                    break;
                }
                last_reload = Some(Instant::now());
            }
        });

        Ok(())
    }
}

/// Matches `luxr.toml` and the editor temp files that are renamed over it.
fn is_config_event_path(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|name| name.starts_with(CONFIG_FILE_NAME) || name.ends_with(CONFIG_FILE_NAME))
}

/// Start the configuration file watcher for the active configuration path.
pub fn start_config_watcher(
    signal_sender: Sender<SignalMessage>,
    debug_enabled: bool,
) -> Result<()> {
    let config_path = get_config_path()?;
    ConfigWatcher::new(signal_sender, config_path, debug_enabled).start()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_event_path_matching() {
        assert!(is_config_event_path(Path::new("/home/u/.config/luxr/luxr.toml")));
        assert!(is_config_event_path(Path::new("/home/u/.config/luxr/luxr.toml~")));
        assert!(is_config_event_path(Path::new("/home/u/.config/luxr/.luxr.toml")));
        assert!(!is_config_event_path(Path::new("/home/u/.config/luxr/notes.txt")));
    }
}
