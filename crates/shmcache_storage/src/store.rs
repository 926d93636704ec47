//! Segment store trait definition.

use crate::error::{StorageError, StorageResult};
use crate::lock::StoreLock;
use crate::types::{Permissions, SegmentId};
use std::time::Duration;

/// A flat space of whole-value segments addressed by integer id.
///
/// Segment stores are **opaque byte stores**. The cache owns every
/// interpretation of the bytes: directory tables, envelopes, values.
///
/// # Invariants
///
/// - `read` returns exactly the bytes of the last successful `create`
/// - `create` fails with [`StorageError::AlreadyExists`] if the id is taken
/// - `delete` fails with [`StorageError::NotFound`] if the id is free
/// - Each call is atomic on its own; sequences of calls are not
/// - Stores must be `Send + Sync`; all methods take `&self`
///
/// # Implementors
///
/// - [`super::InMemorySegmentStore`] - For testing
/// - [`super::FileSegmentStore`] - For cross-process caches
pub trait SegmentStore: Send + Sync {
    /// Returns true if a segment with this id exists.
    ///
    /// # Errors
    ///
    /// Returns an error if existence cannot be determined, for example
    /// because the caller may not inspect the segment.
    fn exists(&self, id: SegmentId) -> StorageResult<bool>;

    /// Creates a new segment holding `data`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - A segment with this id already exists
    /// - The store lacks capacity
    /// - An I/O error occurs
    fn create(&self, id: SegmentId, data: &[u8], permissions: Permissions) -> StorageResult<()>;

    /// Reads the full contents of a segment.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NotFound`] if the segment does not exist,
    /// or another error if it cannot be read.
    fn read(&self, id: SegmentId) -> StorageResult<Vec<u8>>;

    /// Removes a segment.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NotFound`] if the segment does not exist,
    /// or [`StorageError::PermissionDenied`] if it is write-protected.
    fn delete(&self, id: SegmentId) -> StorageResult<()>;

    /// Returns the permission bits of a segment.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NotFound`] if the segment does not exist.
    fn permissions(&self, id: SegmentId) -> StorageResult<Permissions>;

    /// Lists the ids of all segments in ascending order.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be enumerated.
    fn list(&self) -> StorageResult<Vec<SegmentId>>;

    /// Acquires the store-wide advisory lock.
    ///
    /// The lock is released when the returned guard is dropped. It only
    /// excludes other callers that also take the lock; plain `read` and
    /// `write` calls are never blocked by it.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::LockTimeout`] if the lock is still held
    /// by someone else after `timeout`.
    fn lock(&self, timeout: Duration) -> StorageResult<StoreLock<'_>>;

    /// Replaces the contents of a segment.
    ///
    /// There is no in-place update: any existing segment is deleted and
    /// recreated with the new size. A concurrent reader may observe the
    /// segment as absent between the two steps.
    ///
    /// # Errors
    ///
    /// Returns an error if the old segment cannot be removed or the new
    /// one cannot be created.
    fn write(&self, id: SegmentId, data: &[u8], permissions: Permissions) -> StorageResult<()> {
        match self.delete(id) {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e),
        }
        self.create(id, data, permissions)
    }

    /// Reads a segment, mapping "does not exist" to `None`.
    ///
    /// # Errors
    ///
    /// Returns any error other than [`StorageError::NotFound`].
    fn read_optional(&self, id: SegmentId) -> StorageResult<Option<Vec<u8>>> {
        match self.read(id) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Removes a segment, returning `false` if it did not exist.
    ///
    /// # Errors
    ///
    /// Returns any error other than [`StorageError::NotFound`].
    fn delete_if_exists(&self, id: SegmentId) -> StorageResult<bool> {
        match self.delete(id) {
            Ok(()) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }
}

impl<S: SegmentStore + ?Sized> SegmentStore for Box<S> {
    fn exists(&self, id: SegmentId) -> StorageResult<bool> {
        (**self).exists(id)
    }

    fn create(&self, id: SegmentId, data: &[u8], permissions: Permissions) -> StorageResult<()> {
        (**self).create(id, data, permissions)
    }

    fn read(&self, id: SegmentId) -> StorageResult<Vec<u8>> {
        (**self).read(id)
    }

    fn delete(&self, id: SegmentId) -> StorageResult<()> {
        (**self).delete(id)
    }

    fn permissions(&self, id: SegmentId) -> StorageResult<Permissions> {
        (**self).permissions(id)
    }

    fn list(&self) -> StorageResult<Vec<SegmentId>> {
        (**self).list()
    }

    fn lock(&self, timeout: Duration) -> StorageResult<StoreLock<'_>> {
        (**self).lock(timeout)
    }

    fn write(&self, id: SegmentId, data: &[u8], permissions: Permissions) -> StorageResult<()> {
        (**self).write(id, data, permissions)
    }
}

/// Rejects id `0`, which no store can address.
pub(crate) fn check_id(id: SegmentId) -> StorageResult<()> {
    if id.as_u64() == 0 {
        return Err(StorageError::InvalidId { id });
    }
    Ok(())
}
