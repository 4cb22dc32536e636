//! core::lock
//!
//! Exclusive per-package lock for registry mutations.
//!
//! # Architecture
//!
//! Publishing checks that a version is new and later pushes its tag. Without
//! mutual exclusion two publishers of the same package can both pass the
//! check. The package lock covers the whole window, from repository
//! resolution to the visibility flip, and is also held by deletion.
//!
//! # Storage
//!
//! - `<root>/.locks/<name>.lock` - Lock file with OS-level exclusive lock
//!
//! Lock files are created on first use and never removed, not even when the
//! package is deleted. A waiter blocks on the file it opened; unlinking that
//! file would let a later caller lock a fresh file at the same path while
//! the waiter still proceeds on the old one.
//!
//! # Invariants
//!
//! - Lock is automatically released on drop (RAII pattern)
//! - Locks on different packages never contend
//! - The OS lock is per open file, so it excludes other threads of the
//!   same process as well as other processes
//!
//! # Example
//!
//! ```ignore
//! use tagvault::core::lock::PackageLock;
//! use std::time::Duration;
//!
//! let lock = PackageLock::acquire_timeout(&paths.lock_path(&name), Duration::from_secs(5))?;
//!
//! // Mutate the package repository while holding the lock
//! // ...
//!
//! drop(lock);
//! ```

use std::fs::{self, File, OpenOptions};
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

use fs2::FileExt;
use thiserror::Error;

const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Errors from locking operations.
#[derive(Debug, Error)]
pub enum LockError {
    /// Another holder has the lock.
    #[error("package is locked by another operation")]
    AlreadyLocked,

    /// The lock stayed held for the whole timeout.
    #[error("timed out after {0:?} waiting for package lock")]
    Timeout(Duration),

    /// Failed to create lock file or directory.
    #[error("failed to create lock: {0}")]
    CreateFailed(String),

    /// Failed to acquire the OS lock.
    #[error("failed to acquire lock: {0}")]
    AcquireFailed(String),
}

/// An exclusive lock on one package.
///
/// The lock is automatically released when this guard is dropped (RAII pattern).
#[derive(Debug)]
pub struct PackageLock {
    file: File,
}

impl PackageLock {
    /// Attempt to acquire the lock without waiting.
    ///
    /// # Errors
    ///
    /// - [`LockError::AlreadyLocked`] if the lock is held elsewhere
    /// - [`LockError::CreateFailed`] if the lock file cannot be created
    /// - [`LockError::AcquireFailed`] if the OS lock cannot be acquired
    pub fn acquire(path: &Path) -> Result<Self, LockError> {
        let file = open_lock_file(path)?;

        match file.try_lock_exclusive() {
            Ok(()) => Ok(Self { file }),
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => Err(LockError::AlreadyLocked),
            Err(e) => Err(LockError::AcquireFailed(e.to_string())),
        }
    }

    /// Acquire the lock, polling until `timeout` elapses.
    ///
    /// # Errors
    ///
    /// Returns [`LockError::Timeout`] if the lock is still held elsewhere
    /// after `timeout`, or any error [`PackageLock::acquire`] can return.
    pub fn acquire_timeout(path: &Path, timeout: Duration) -> Result<Self, LockError> {
        let deadline = Instant::now() + timeout;
        loop {
            match Self::acquire(path) {
                Err(LockError::AlreadyLocked) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return Err(LockError::Timeout(timeout));
                    }
                    thread::sleep(POLL_INTERVAL.min(deadline - now));
                }
                other => return other,
            }
        }
    }
}

impl Drop for PackageLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}

fn open_lock_file(path: &Path) -> Result<File, LockError> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).map_err(|e| {
            LockError::CreateFailed(format!("cannot create {}: {}", dir.display(), e))
        })?;
    }

    OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)
        .map_err(|e| LockError::CreateFailed(format!("cannot open {}: {}", path.display(), e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn lock_path(temp: &TempDir, name: &str) -> PathBuf {
        temp.path().join(".locks").join(format!("{name}.lock"))
    }

    #[test]
    fn acquire_creates_lock_dir() {
        let temp = TempDir::new().unwrap();
        let path = lock_path(&temp, "foo");

        let _lock = PackageLock::acquire(&path).expect("acquire");
        assert!(path.is_file());
    }

    #[test]
    fn second_acquire_fails() {
        let temp = TempDir::new().unwrap();
        let path = lock_path(&temp, "foo");

        let _lock = PackageLock::acquire(&path).expect("first acquire");
        let result = PackageLock::acquire(&path);
        assert!(matches!(result, Err(LockError::AlreadyLocked)));
    }

    #[test]
    fn different_packages_do_not_contend() {
        let temp = TempDir::new().unwrap();

        let _foo = PackageLock::acquire(&lock_path(&temp, "foo")).expect("foo");
        assert!(PackageLock::acquire(&lock_path(&temp, "bar")).is_ok());
    }

    #[test]
    fn released_on_drop() {
        let temp = TempDir::new().unwrap();
        let path = lock_path(&temp, "foo");

        {
            let _lock = PackageLock::acquire(&path).expect("first acquire");
        }

        assert!(PackageLock::acquire(&path).is_ok());
    }

    #[test]
    fn timeout_when_held() {
        let temp = TempDir::new().unwrap();
        let path = lock_path(&temp, "foo");

        let _lock = PackageLock::acquire(&path).expect("acquire");
        let start = Instant::now();
        let result = PackageLock::acquire_timeout(&path, Duration::from_millis(100));

        assert!(matches!(result, Err(LockError::Timeout(_))));
        assert!(start.elapsed() >= Duration::from_millis(100));
    }

    #[test]
    fn waits_for_release_from_other_thread() {
        let temp = TempDir::new().unwrap();
        let path = lock_path(&temp, "foo");

        let lock = PackageLock::acquire(&path).expect("acquire");
        let holder = thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            drop(lock);
        });

        let _lock = PackageLock::acquire_timeout(&path, Duration::from_secs(5)).expect("wait");
        holder.join().unwrap();
        assert!(matches!(
            PackageLock::acquire(&path),
            Err(LockError::AlreadyLocked)
        ));
    }

    #[test]
    fn error_display_formatting() {
        assert!(LockError::AlreadyLocked.to_string().contains("locked"));
        assert!(LockError::Timeout(Duration::from_secs(1))
            .to_string()
            .contains("timed out"));
        assert!(LockError::CreateFailed("x".into())
            .to_string()
            .contains("create"));
    }
}
