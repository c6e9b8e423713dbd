//! Cross-process advisory lock
//!
//! A sync cycle holds [`ProcessLockGuard`] for its whole duration. The lock is
//! an `flock`-style advisory lock obtained through `fs2`, so the operating
//! system drops it when the holding process exits, even on a crash. The guard
//! releases it explicitly on drop.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;

use crate::{Error, Result};

/// A named lock file used to serialize sync cycles across processes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessLock {
    path: PathBuf,
}

impl ProcessLock {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the underlying lock file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Try to take the lock without blocking.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LockHeld`] immediately if another holder owns the lock,
    /// or an I/O error if the lock file cannot be opened.
    pub fn try_acquire(&self) -> Result<ProcessLockGuard> {
        let mut file = self.open()?;

        if file.try_lock_exclusive().is_err() {
            let mut holder = String::new();
            let _ = file.read_to_string(&mut holder);
            let holder = holder.trim();
            return Err(Error::LockHeld {
                path: self.path.clone(),
                holder: if holder.is_empty() {
                    "unknown".to_string()
                } else {
                    holder.to_string()
                },
            });
        }

        self.stamp(&mut file)?;
        tracing::debug!(path = %self.path.display(), "Acquired process lock");
        Ok(ProcessLockGuard {
            file: Some(file),
            path: self.path.clone(),
        })
    }

    /// Take the lock, blocking until the current holder releases it.
    pub fn acquire(&self) -> Result<ProcessLockGuard> {
        let mut file = self.open()?;
        file.lock_exclusive().map_err(|_| Error::LockFailed {
            path: self.path.clone(),
        })?;

        self.stamp(&mut file)?;
        Ok(ProcessLockGuard {
            file: Some(file),
            path: self.path.clone(),
        })
    }

    /// Check whether some holder currently owns the lock.
    pub fn is_held(&self) -> Result<bool> {
        let file = self.open()?;
        match file.try_lock_exclusive() {
            Ok(()) => {
                let _ = FileExt::unlock(&file);
                Ok(false)
            }
            Err(_) => Ok(true),
        }
    }

    fn open(&self) -> Result<File> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }

        // Never truncate on open: that would erase the holder's pid
        OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.path)
            .map_err(|e| Error::io(&self.path, e))
    }

    fn stamp(&self, file: &mut File) -> Result<()> {
        file.set_len(0).map_err(|e| Error::io(&self.path, e))?;
        file.seek(SeekFrom::Start(0))
            .map_err(|e| Error::io(&self.path, e))?;
        write!(file, "{}", std::process::id()).map_err(|e| Error::io(&self.path, e))?;
        file.flush().map_err(|e| Error::io(&self.path, e))
    }
}

/// Scoped ownership of a [`ProcessLock`]. Dropping the guard releases the lock.
#[derive(Debug)]
pub struct ProcessLockGuard {
    file: Option<File>,
    path: PathBuf,
}

impl ProcessLockGuard {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Release the lock now instead of at drop.
    pub fn release(mut self) -> Result<()> {
        self.unlock()
    }

    fn unlock(&mut self) -> Result<()> {
        if let Some(file) = self.file.take() {
            let _ = file.set_len(0);
            FileExt::unlock(&file).map_err(|_| Error::LockFailed {
                path: self.path.clone(),
            })?;
            tracing::debug!(path = %self.path.display(), "Released process lock");
        }
        Ok(())
    }
}

impl Drop for ProcessLockGuard {
    fn drop(&mut self) {
        if let Err(e) = self.unlock() {
            tracing::warn!("Failed to release process lock: {}", e);
        }
    }
}
