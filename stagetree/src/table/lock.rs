//! Advisory exclusive lock based on the presence of a sentinel file.
//!
//! The lock only serializes participants that use the same protocol on
//! the same path; it does not stop other writers from touching the
//! guarded file.

use crate::errors::LockError;
use crate::utils::sentinel_path;
use chrono::Utc;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

/// Default delay between acquisition attempts.
pub const DEFAULT_LOCK_DELAY: Duration = Duration::from_millis(1);

/// Default number of acquisition attempts.
pub const DEFAULT_LOCK_ATTEMPTS: u32 = 3;

/// A held lock on `path`, materialized as the sentinel file `path.lock`.
///
/// The sentinel is removed when the lock is dropped or released.
#[derive(Debug)]
#[must_use = "the lock is released as soon as it is dropped"]
pub struct ScopedLock {
    sentinel: PathBuf,
    held: bool,
}

impl ScopedLock {
    /// Acquires the lock with the default delay and attempt budget.
    pub fn acquire_default(path: &Path) -> Result<Self, LockError> {
        Self::acquire(path, DEFAULT_LOCK_DELAY, DEFAULT_LOCK_ATTEMPTS)
    }

    /// Acquires the lock, waiting `delay` between attempts while another
    /// holder's sentinel exists.
    ///
    /// # Errors
    ///
    /// Returns [`LockError::Unavailable`] if the sentinel still exists after
    /// `attempts` waits, or [`LockError::Io`] if it cannot be created.
    pub fn acquire(path: &Path, delay: Duration, attempts: u32) -> Result<Self, LockError> {
        let sentinel = sentinel_path(path);
        let mut remaining = attempts;

        loop {
            while sentinel.exists() && remaining > 0 {
                thread::sleep(delay);
                remaining -= 1;
            }

            if sentinel.exists() {
                return Err(LockError::Unavailable {
                    path: sentinel,
                    attempts,
                });
            }

            match OpenOptions::new().write(true).create_new(true).open(&sentinel) {
                Ok(mut file) => {
                    let payload = format!(
                        "{{\"pid\":{},\"acquired_at\":\"{}\"}}\n",
                        std::process::id(),
                        Utc::now().to_rfc3339()
                    );
                    if let Err(err) = file.write_all(payload.as_bytes()) {
                        warn!(path = %sentinel.display(), "Failed to write lock owner: {err}");
                    }
                    debug!(path = %sentinel.display(), "Lock acquired");
                    return Ok(Self {
                        sentinel,
                        held: true,
                    });
                }
                // Another holder created the sentinel between the check and the create.
                Err(err) if err.kind() == ErrorKind::AlreadyExists => {
                    if remaining == 0 {
                        return Err(LockError::Unavailable {
                            path: sentinel,
                            attempts,
                        });
                    }
                    remaining -= 1;
                    thread::sleep(delay);
                }
                Err(source) => {
                    return Err(LockError::Io {
                        path: sentinel,
                        source,
                    })
                }
            }
        }
    }

    /// Returns the sentinel file path.
    #[must_use]
    pub fn sentinel(&self) -> &Path {
        &self.sentinel
    }

    /// Returns true until the lock is released.
    #[must_use]
    pub const fn is_held(&self) -> bool {
        self.held
    }

    /// Releases the lock now, reporting failures to remove the sentinel.
    pub fn release(mut self) -> Result<(), LockError> {
        self.remove_sentinel()
    }

    fn remove_sentinel(&mut self) -> Result<(), LockError> {
        if !self.held {
            return Ok(());
        }
        self.held = false;

        match fs::remove_file(&self.sentinel) {
            Ok(()) => {
                debug!(path = %self.sentinel.display(), "Lock released");
                Ok(())
            }
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(LockError::Io {
                path: self.sentinel.clone(),
                source,
            }),
        }
    }
}

impl Drop for ScopedLock {
    fn drop(&mut self) {
        if let Err(err) = self.remove_sentinel() {
            warn!("{err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;
    use tempfile::TempDir;

    #[test]
    fn test_acquire_creates_sentinel_with_owner() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("summary.txt");

        let lock = ScopedLock::acquire_default(&target).unwrap();
        assert!(lock.is_held());
        assert_eq!(lock.sentinel(), dir.path().join("summary.txt.lock"));

        let owner = fs::read_to_string(lock.sentinel()).unwrap();
        assert!(owner.contains(&format!("\"pid\":{}", std::process::id())));
    }

    #[test]
    fn test_drop_removes_sentinel() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("summary.txt");
        let sentinel = sentinel_path(&target);

        {
            let _lock = ScopedLock::acquire_default(&target).unwrap();
            assert!(sentinel.exists());
        }
        assert!(!sentinel.exists());
    }

    #[test]
    fn test_sequential_acquisitions_succeed() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("summary.txt");

        let first = ScopedLock::acquire_default(&target).unwrap();
        first.release().unwrap();

        let second = ScopedLock::acquire_default(&target).unwrap();
        assert!(second.is_held());
    }

    #[test]
    fn test_stuck_sentinel_fails_after_budget() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("summary.txt");
        fs::write(sentinel_path(&target), "someone else").unwrap();

        let start = Instant::now();
        let err = ScopedLock::acquire(&target, Duration::from_millis(5), 3).unwrap_err();

        assert!(matches!(err, LockError::Unavailable { attempts: 3, .. }));
        assert!(start.elapsed() >= Duration::from_millis(15));
        assert!(sentinel_path(&target).exists());
    }

    #[test]
    fn test_held_lock_blocks_second_holder() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("summary.txt");

        let _held = ScopedLock::acquire_default(&target).unwrap();
        let err = ScopedLock::acquire_default(&target).unwrap_err();
        assert!(err.to_string().contains("exclusively"));
    }

    #[test]
    fn test_waits_for_release_within_budget() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("summary.txt");
        let held = ScopedLock::acquire_default(&target).unwrap();

        let releaser = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            drop(held);
        });

        let lock = ScopedLock::acquire(&target, Duration::from_millis(10), 50).unwrap();
        assert!(lock.is_held());
        releaser.join().unwrap();
    }

    #[test]
    fn test_release_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("summary.txt");

        let mut lock = ScopedLock::acquire_default(&target).unwrap();
        fs::remove_file(lock.sentinel()).unwrap();
        assert!(lock.remove_sentinel().is_ok());
        assert!(lock.remove_sentinel().is_ok());
        assert!(!lock.is_held());
    }

    #[test]
    fn test_zero_attempts_without_contention() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("summary.txt");

        let lock = ScopedLock::acquire(&target, DEFAULT_LOCK_DELAY, 0).unwrap();
        assert!(lock.is_held());
        drop(lock);

        fs::write(sentinel_path(&target), "").unwrap();
        assert!(ScopedLock::acquire(&target, DEFAULT_LOCK_DELAY, 0).is_err());
    }
}
