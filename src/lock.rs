//! Advisory file lock that keeps fetch-merge cycles from overlapping.
//!
//! Uses flock() on `<base>/fetch.lock`. A `watch` loop and a one-off
//! `refresh` from another terminal take the same lock per cycle.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;

#[cfg(unix)]
use std::os::unix::io::AsRawFd;

/// Lock file name placed in the base directory
const LOCK_FILE_NAME: &str = "fetch.lock";

/// A held file lock that releases on drop
pub struct FetchLock {
    #[allow(dead_code)]
    file: File,
}

impl FetchLock {
    /// Attempt to acquire the fetch lock without waiting.
    /// Returns `Ok(None)` when another process holds it.
    pub fn try_acquire(base_path: &Path) -> io::Result<Option<Self>> {
        std::fs::create_dir_all(base_path)?;
        let lock_path = base_path.join(LOCK_FILE_NAME);
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)?;

        match Self::try_lock_exclusive(&file) {
            Ok(()) => Ok(Some(FetchLock { file })),
            Err(err) if err.kind() == io::ErrorKind::WouldBlock => Ok(None),
            Err(err) => Err(err),
        }
    }

    #[cfg(unix)]
    fn try_lock_exclusive(file: &File) -> io::Result<()> {
        let fd = file.as_raw_fd();
        let result = unsafe { libc::flock(fd, libc::LOCK_EX | libc::LOCK_NB) };
        if result != 0 {
            let err = io::Error::last_os_error();
            if err.kind() == io::ErrorKind::WouldBlock
                || err.raw_os_error() == Some(libc::EWOULDBLOCK)
                || err.raw_os_error() == Some(libc::EAGAIN)
            {
                return Err(io::Error::new(
                    io::ErrorKind::WouldBlock,
                    "fetch already in progress",
                ));
            }
            return Err(err);
        }
        Ok(())
    }

    #[cfg(not(unix))]
    fn try_lock_exclusive(_file: &File) -> io::Result<()> {
        // no cross-process protection off unix
        Ok(())
    }
}

#[cfg(unix)]
impl Drop for FetchLock {
    fn drop(&mut self) {
        let fd = self.file.as_raw_fd();
        // Release the lock - ignore errors on drop
        unsafe { libc::flock(fd, libc::LOCK_UN) };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(unix)]
    fn test_acquire_and_release() {
        let dir = tempfile::tempdir().unwrap();

        let lock1 = FetchLock::try_acquire(dir.path()).unwrap();
        assert!(lock1.is_some(), "First lock should succeed");

        // flock locks are per open file description, so a second open
        // in the same process contends like another process would
        let lock2 = FetchLock::try_acquire(dir.path()).unwrap();
        assert!(lock2.is_none(), "Second lock should be refused");

        drop(lock1);

        let lock3 = FetchLock::try_acquire(dir.path()).unwrap();
        assert!(lock3.is_some(), "Third lock should succeed after release");
    }

    #[test]
    fn creates_missing_base_dir() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a/b");
        let lock = FetchLock::try_acquire(&nested).unwrap();
        assert!(lock.is_some());
        assert!(nested.join(LOCK_FILE_NAME).exists());
    }
}
