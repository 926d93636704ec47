//! Advisory lock guard shared by all segment stores.

use crate::error::{StorageError, StorageResult};
use fs2::FileExt;
use parking_lot::{Mutex, MutexGuard};
use std::fs::File;
use std::io;
use std::thread;
use std::time::{Duration, Instant};

/// Poll interval while waiting for a contended lock file.
const FILE_LOCK_POLL: Duration = Duration::from_millis(1);

/// Guard for a store's advisory lock.
///
/// Holds an in-process mutex and, for file-backed stores, an exclusive
/// `flock` on the store's lock file. Both are released on drop.
#[derive(Debug)]
pub struct StoreLock<'a> {
    file: Option<&'a File>,
    _guard: MutexGuard<'a, ()>,
}

impl<'a> StoreLock<'a> {
    /// Acquires only the in-process mutex.
    pub(crate) fn acquire(mutex: &'a Mutex<()>, timeout: Duration) -> StorageResult<Self> {
        let guard = mutex
            .try_lock_for(timeout)
            .ok_or(StorageError::LockTimeout { waited: timeout })?;
        Ok(Self {
            file: None,
            _guard: guard,
        })
    }

    /// Acquires the in-process mutex, then an exclusive lock on `file`.
    ///
    /// The mutex comes first because `flock` does not exclude threads
    /// that share one file descriptor.
    pub(crate) fn acquire_with_file(
        mutex: &'a Mutex<()>,
        file: &'a File,
        timeout: Duration,
    ) -> StorageResult<Self> {
        let start = Instant::now();
        let guard = mutex
            .try_lock_for(timeout)
            .ok_or(StorageError::LockTimeout { waited: timeout })?;

        let contended = fs2::lock_contended_error().kind();
        loop {
            match file.try_lock_exclusive() {
                Ok(()) => break,
                Err(e) if e.kind() == contended || e.kind() == io::ErrorKind::WouldBlock => {
                    if start.elapsed() >= timeout {
                        return Err(StorageError::LockTimeout { waited: timeout });
                    }
                    thread::sleep(FILE_LOCK_POLL);
                }
                Err(e) => return Err(StorageError::Io(e)),
            }
        }

        Ok(Self {
            file: Some(file),
            _guard: guard,
        })
    }
}

impl Drop for StoreLock<'_> {
    fn drop(&mut self) {
        if let Some(file) = self.file.take() {
            // Closing the descriptor would also release it; the file stays
            // open for the store's lifetime, so unlock explicitly.
            let _ = file.unlock();
        }
    }
}
