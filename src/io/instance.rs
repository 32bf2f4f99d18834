//! High-level instance management for luxr processes.
//!
//! Builds on the lock file primitives in `io::lock` to enforce a single running daemon
//! and to let one-shot commands find and signal it.

use anyhow::{Context, Result};
use nix::sys::signal::{Signal, kill};
use nix::unistd::Pid;
use std::path::{Path, PathBuf};

use crate::io::lock::{self, LockFile};

/// Information about a running luxr instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceInfo {
    pub pid: u32,
    /// Custom config directory if set
    pub config_dir: Option<PathBuf>,
}

impl InstanceInfo {
    /// Info describing the current process.
    pub fn current() -> Self {
        Self {
            pid: std::process::id(),
            config_dir: crate::config::get_custom_config_dir(),
        }
    }

    /// Parse instance info from lock file contents.
    ///
    /// Lock file format:
    /// - Line 1: PID
    /// - Line 2: Config directory (optional, empty if default)
    pub fn from_lock_contents(contents: &str) -> Result<Self> {
        let mut lines = contents.lines();

        let pid_line = lines
            .next()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .ok_or_else(|| anyhow::anyhow!("Lock file is empty"))?;

        let pid = pid_line
            .parse::<u32>()
            .context("Invalid PID format in lock file")?;

        let config_dir = lines
            .next()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(PathBuf::from);

        if lines.any(|line| !line.trim().is_empty()) {
            anyhow::bail!("Invalid lock file format (expected 1-2 lines)");
        }

        Ok(InstanceInfo { pid, config_dir })
    }

    pub fn to_lock_contents(&self) -> String {
        match self.config_dir {
            Some(ref dir) => format!("{}\n{}\n", self.pid, dir.display()),
            None => format!("{}\n\n", self.pid),
        }
    }
}

/// Get information about the running daemon, if any.
///
/// A lock file whose process is gone counts as no instance.
pub fn get_running_instance() -> Result<Option<InstanceInfo>> {
    let lock_path = lock::get_main_lock_path();

    let lock_content = match std::fs::read_to_string(&lock_path) {
        Ok(content) => content,
        Err(_) => return Ok(None),
    };

    let info = InstanceInfo::from_lock_contents(&lock_content)?;

    if is_instance_running(info.pid) {
        Ok(Some(info))
    } else {
        Ok(None)
    }
}

/// Check if a process with the given PID is still running.
pub fn is_instance_running(pid: u32) -> bool {
    Path::new(&format!("/proc/{pid}")).exists()
}

fn pid_of(pid: u32) -> Result<Pid> {
    let raw = i32::try_from(pid).context("PID out of range")?;
    Ok(Pid::from_raw(raw))
}

/// Ask an instance to shut down (SIGTERM).
pub fn terminate_instance(pid: u32) -> Result<()> {
    kill(pid_of(pid)?, Signal::SIGTERM)
        .map_err(|e| anyhow::anyhow!("Failed to send SIGTERM to process: {}", e))
}

/// Ask an instance to reload its configuration (SIGUSR2).
pub fn send_reload_signal(pid: u32) -> Result<()> {
    kill(pid_of(pid)?, Signal::SIGUSR2)
        .map_err(|e| anyhow::anyhow!("Failed to send reload signal: {}", e))
}

/// Acquire the daemon lock, clearing a stale one if needed.
///
/// Fails when a live instance already holds it.
pub fn ensure_single_instance() -> Result<(LockFile, PathBuf)> {
    let lock_path = lock::get_main_lock_path();

    if let Some(lock) = LockFile::try_acquire(&lock_path)? {
        return claim(lock, lock_path);
    }

    handle_instance_conflict(&lock_path)?;

    match LockFile::try_acquire(&lock_path)? {
        Some(lock) => claim(lock, lock_path),
        None => anyhow::bail!("Failed to acquire lock after conflict resolution"),
    }
}

fn claim(mut lock: LockFile, lock_path: PathBuf) -> Result<(LockFile, PathBuf)> {
    lock.write(&InstanceInfo::current().to_lock_contents())?;
    Ok((lock, lock_path))
}

/// Resolve a held lock: stale or unreadable locks are removed, a live owner is an error.
pub fn handle_instance_conflict(lock_path: &Path) -> Result<()> {
    let lock_content = match std::fs::read_to_string(lock_path) {
        Ok(content) => content,
        Err(_) => return Ok(()),
    };

    let info = match InstanceInfo::from_lock_contents(&lock_content) {
        Ok(info) => info,
        Err(_) => {
            log_warning!("Lock file format invalid, removing");
            let _ = std::fs::remove_file(lock_path);
            return Ok(());
        }
    };

    if !is_instance_running(info.pid) {
        log_warning!(
            "Removing stale lock file (process {} no longer running)",
            info.pid
        );
        let _ = std::fs::remove_file(lock_path);
        return Ok(());
    }

    log_pipe!();
    log_error!("luxr is already running (PID: {})", info.pid);
    log_block_start!("Did you mean to:");
    log_indented!("• Reload configuration: luxr reload");
    log_indented!("• Inspect the current reading: luxr status");
    log_indented!("• Stop the running daemon: luxr stop");
    anyhow::bail!("another luxr instance is running")
}
