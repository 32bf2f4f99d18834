//! Low-level lock file operations.
//!
//! The daemon holds an exclusive `fs2` lock on `$XDG_RUNTIME_DIR/luxr.lock` for its whole
//! lifetime. The file body identifies the owner (see `io::instance::InstanceInfo`).

use anyhow::{Context, Result};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::common::constants::LOCK_FILE_NAME;

/// Path of the daemon lock file.
pub fn get_main_lock_path() -> PathBuf {
    let runtime_dir = std::env::var("XDG_RUNTIME_DIR").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(runtime_dir).join(LOCK_FILE_NAME)
}

/// An exclusively locked file. The lock is released when the value is dropped.
#[derive(Debug)]
pub struct LockFile {
    pub(crate) file: File,
}

impl LockFile {
    /// Try to take the lock without blocking.
    ///
    /// Returns `Ok(None)` when another process holds it.
    pub fn try_acquire(path: &Path) -> Result<Option<Self>> {
        // Open without truncating so a live owner's contents survive a failed attempt
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .with_context(|| format!("failed to open lock file {}", path.display()))?;

        match file.try_lock_exclusive() {
            Ok(()) => Ok(Some(Self { file })),
            Err(_) => Ok(None),
        }
    }

    /// Replace the file contents.
    pub fn write(&mut self, contents: &str) -> Result<()> {
        self.file.set_len(0)?;
        self.file.seek(SeekFrom::Start(0))?;
        self.file.write_all(contents.as_bytes())?;
        self.file.flush()?;
        Ok(())
    }

    /// Unlock and delete the lock file.
    pub fn release(self, path: &Path) {
        let _ = fs2::FileExt::unlock(&self.file);
        drop(self.file);
        let _ = std::fs::remove_file(path);
    }
}
