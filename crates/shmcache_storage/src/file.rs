//! File-per-segment store for cross-process caches.
//!
//! Layout of a store directory:
//!
//! ```text
//! <dir>/
//! ├─ LOCK              # Advisory lock file
//! ├─ seg-000001.shm    # Segment 1
//! ├─ seg-000042.shm    # Segment 42
//! └─ .staging-XXXXXX   # A segment being created, not yet visible
//! ```
//!
//! Placed under `/dev/shm` the files live in RAM, which gives the same
//! visibility and lifetime as System V segments: shared by every process
//! that opens the directory, gone at reboot.

use crate::error::{StorageError, StorageResult};
use crate::lock::StoreLock;
use crate::store::{check_id, SegmentStore};
use crate::types::{Permissions, SegmentId};
use parking_lot::Mutex;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

const LOCK_FILE: &str = "LOCK";
const SEGMENT_PREFIX: &str = "seg-";
const SEGMENT_SUFFIX: &str = ".shm";
const STAGING_PREFIX: &str = ".staging-";

/// A segment store keeping one file per segment in a directory.
///
/// # Permissions
///
/// On Unix the segment's mode bits are applied to its file, so the
/// operating system enforces them between users. Elsewhere they are
/// recorded as [`Permissions::DEFAULT`].
///
/// # Thread Safety
///
/// This store is thread-safe. The advisory lock combines an in-process
/// mutex with an exclusive `flock` on `LOCK`, so it serialises both
/// threads and processes.
///
/// # Example
///
/// ```no_run
/// use shmcache_storage::{FileSegmentStore, Permissions, SegmentId, SegmentStore};
///
/// let store = FileSegmentStore::open_default().unwrap();
/// store.write(SegmentId::new(9), b"shared", Permissions::DEFAULT).unwrap();
/// ```
#[derive(Debug)]
pub struct FileSegmentStore {
    dir: PathBuf,
    lock_file: File,
    lock: Mutex<()>,
}

impl FileSegmentStore {
    /// Opens a store in `dir`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or its lock file cannot be
    /// created, or if `dir` exists but is not a directory.
    pub fn open(dir: &Path) -> StorageResult<Self> {
        fs::create_dir_all(dir)?;
        if !dir.is_dir() {
            return Err(StorageError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("not a directory: {}", dir.display()),
            )));
        }

        let lock_file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(dir.join(LOCK_FILE))?;

        Ok(Self {
            dir: dir.to_path_buf(),
            lock_file,
            lock: Mutex::new(()),
        })
    }

    /// Opens a store in [`FileSegmentStore::default_dir`].
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be prepared.
    pub fn open_default() -> StorageResult<Self> {
        Self::open(&Self::default_dir())
    }

    /// Returns the default store directory.
    ///
    /// `/dev/shm/shmcache` when a RAM-backed `/dev/shm` exists, otherwise
    /// `shmcache` under the system temp directory.
    #[must_use]
    pub fn default_dir() -> PathBuf {
        let shm = Path::new("/dev/shm");
        if shm.is_dir() {
            shm.join("shmcache")
        } else {
            std::env::temp_dir().join("shmcache")
        }
    }

    /// Returns the store directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.dir
    }

    /// Returns the file path backing segment `id`.
    #[must_use]
    pub fn segment_path(&self, id: SegmentId) -> PathBuf {
        self.dir
            .join(format!("{SEGMENT_PREFIX}{:06}{SEGMENT_SUFFIX}", id.as_u64()))
    }

    fn parse_segment_name(name: &str) -> Option<SegmentId> {
        let digits = name
            .strip_prefix(SEGMENT_PREFIX)?
            .strip_suffix(SEGMENT_SUFFIX)?;
        digits.parse::<u64>().ok().map(SegmentId::new)
    }

    #[cfg(unix)]
    fn apply_mode(file: &File, permissions: Permissions) -> std::io::Result<()> {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(fs::Permissions::from_mode(permissions.mode()))
    }

    #[cfg(not(unix))]
    fn apply_mode(_file: &File, _permissions: Permissions) -> std::io::Result<()> {
        Ok(())
    }

    #[cfg(unix)]
    fn mode_of(metadata: &fs::Metadata) -> Permissions {
        use std::os::unix::fs::PermissionsExt;
        Permissions::from_mode(metadata.permissions().mode() & 0o777).unwrap_or_default()
    }

    #[cfg(not(unix))]
    fn mode_of(_metadata: &fs::Metadata) -> Permissions {
        Permissions::DEFAULT
    }
}

impl SegmentStore for FileSegmentStore {
    fn exists(&self, id: SegmentId) -> StorageResult<bool> {
        check_id(id)?;
        self.segment_path(id)
            .try_exists()
            .map_err(|e| StorageError::from_io(id, e))
    }

    fn create(&self, id: SegmentId, data: &[u8], permissions: Permissions) -> StorageResult<()> {
        check_id(id)?;
        let path = self.segment_path(id);
        if path.try_exists().map_err(|e| StorageError::from_io(id, e))? {
            return Err(StorageError::AlreadyExists { id });
        }

        // Staged under a name `list` ignores, then linked into place, so
        // readers see either no segment or the whole of it.
        let mut staged = tempfile::Builder::new()
            .prefix(STAGING_PREFIX)
            .tempfile_in(&self.dir)?;
        if let Err(e) = staged.write_all(data) {
            return Err(match e.raw_os_error() {
                // ENOSPC
                Some(28) => StorageError::CapacityExceeded {
                    requested: data.len(),
                    available: 0,
                },
                _ => StorageError::Io(e),
            });
        }
        Self::apply_mode(staged.as_file(), permissions)?;

        staged
            .persist_noclobber(&path)
            .map_err(|e| StorageError::from_io(id, e.error))?;
        Ok(())
    }

    fn read(&self, id: SegmentId) -> StorageResult<Vec<u8>> {
        check_id(id)?;
        fs::read(self.segment_path(id)).map_err(|e| StorageError::from_io(id, e))
    }

    fn delete(&self, id: SegmentId) -> StorageResult<()> {
        check_id(id)?;
        let path = self.segment_path(id);
        let metadata = fs::metadata(&path).map_err(|e| StorageError::from_io(id, e))?;
        if !Self::mode_of(&metadata).owner_can_write() {
            return Err(StorageError::PermissionDenied { id });
        }
        fs::remove_file(&path).map_err(|e| StorageError::from_io(id, e))
    }

    fn permissions(&self, id: SegmentId) -> StorageResult<Permissions> {
        check_id(id)?;
        let metadata = fs::metadata(self.segment_path(id)).map_err(|e| StorageError::from_io(id, e))?;
        Ok(Self::mode_of(&metadata))
    }

    fn list(&self) -> StorageResult<Vec<SegmentId>> {
        let mut ids = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            if let Some(id) = entry
                .file_name()
                .to_str()
                .and_then(Self::parse_segment_name)
            {
                ids.push(id);
            }
        }
        ids.sort_unstable();
        Ok(ids)
    }

    fn lock(&self, timeout: Duration) -> StorageResult<StoreLock<'_>> {
        StoreLock::acquire_with_file(&self.lock, &self.lock_file, timeout)
    }
}
