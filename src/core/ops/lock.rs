//! core::ops::lock
//!
//! Exclusive run lock.
//!
//! Only one gotw run may touch the wiki, sidebar and journal at a time. The
//! lock is an OS-level exclusive lock on `<root>/lock`, taken without
//! blocking and released when the guard drops.
//!
//! # Example
//!
//! ```no_run
//! use gotw::core::ops::lock::RunLock;
//! use gotw::core::paths::GotwPaths;
//!
//! let paths = GotwPaths::from_env().unwrap();
//! let lock = RunLock::acquire(&paths)?;
//! // ... run the pipeline ...
//! drop(lock);
//! # Ok::<(), gotw::core::ops::lock::LockError>(())
//! ```

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use thiserror::Error;

use crate::core::paths::GotwPaths;

/// Errors from locking operations.
#[derive(Debug, Error)]
pub enum LockError {
    /// Another process already holds the lock.
    #[error("another gotw run is in progress")]
    AlreadyLocked,

    /// Failed to create lock file or directory.
    #[error("failed to create lock: {0}")]
    CreateFailed(String),

    /// Failed to acquire the OS lock.
    #[error("failed to acquire lock: {0}")]
    AcquireFailed(String),

    /// Failed to release the lock.
    #[error("failed to release lock: {0}")]
    ReleaseFailed(String),
}

/// Guard holding the run lock.
#[derive(Debug)]
pub struct RunLock {
    path: PathBuf,
    /// `Some` while the lock is held.
    file: Option<File>,
}

impl RunLock {
    /// Acquire the run lock without blocking.
    ///
    /// # Errors
    ///
    /// - [`LockError::AlreadyLocked`] if another process holds the lock
    /// - [`LockError::CreateFailed`] if the lock file cannot be created
    /// - [`LockError::AcquireFailed`] if the OS lock cannot be acquired
    pub fn acquire(paths: &GotwPaths) -> Result<Self, LockError> {
        let root = paths.root();
        fs::create_dir_all(root).map_err(|e| {
            LockError::CreateFailed(format!("cannot create {}: {}", root.display(), e))
        })?;

        let path = paths.lock_path();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| {
                LockError::CreateFailed(format!("cannot open {}: {}", path.display(), e))
            })?;

        match file.try_lock_exclusive() {
            Ok(()) => {
                tracing::debug!(path = %path.display(), "acquired run lock");
                Ok(Self {
                    path,
                    file: Some(file),
                })
            }
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => Err(LockError::AlreadyLocked),
            Err(e) => Err(LockError::AcquireFailed(e.to_string())),
        }
    }

    /// Like [`RunLock::acquire`], but `None` when another run holds it.
    pub fn try_acquire(paths: &GotwPaths) -> Result<Option<Self>, LockError> {
        match Self::acquire(paths) {
            Ok(lock) => Ok(Some(lock)),
            Err(LockError::AlreadyLocked) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub fn is_held(&self) -> bool {
        self.file.is_some()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Release the lock before the guard drops.
    pub fn release(&mut self) -> Result<(), LockError> {
        if let Some(file) = self.file.take() {
            file.unlock()
                .map_err(|e| LockError::ReleaseFailed(e.to_string()))?;
        }
        Ok(())
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        if let Some(file) = self.file.take() {
            let _ = file.unlock();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn paths(temp: &TempDir) -> GotwPaths {
        GotwPaths::new(temp.path().join("gotw"))
    }

    #[test]
    fn acquire_creates_root() {
        let temp = TempDir::new().unwrap();
        let paths = paths(&temp);
        assert!(!paths.root().exists());

        let lock = RunLock::acquire(&paths).expect("acquire lock");
        assert!(lock.is_held());
        assert_eq!(lock.path(), paths.lock_path());
        assert!(paths.root().exists());
    }

    #[test]
    fn second_acquire_fails() {
        let temp = TempDir::new().unwrap();
        let paths = paths(&temp);

        let _lock = RunLock::acquire(&paths).expect("first acquire");
        assert!(matches!(
            RunLock::acquire(&paths),
            Err(LockError::AlreadyLocked)
        ));
        assert!(RunLock::try_acquire(&paths).unwrap().is_none());
    }

    #[test]
    fn released_on_drop() {
        let temp = TempDir::new().unwrap();
        let paths = paths(&temp);

        {
            let _lock = RunLock::acquire(&paths).expect("first acquire");
        }
        assert!(RunLock::acquire(&paths).unwrap().is_held());
    }

    #[test]
    fn explicit_release_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let paths = paths(&temp);

        let mut lock = RunLock::acquire(&paths).expect("acquire");
        lock.release().expect("first release");
        lock.release().expect("second release");
        assert!(!lock.is_held());

        assert!(RunLock::try_acquire(&paths).unwrap().is_some());
    }
}
