//! In-memory segment store for testing.

use crate::error::{StorageError, StorageResult};
use crate::lock::StoreLock;
use crate::store::{check_id, SegmentStore};
use crate::types::{Permissions, SegmentId};
use parking_lot::{Mutex, RwLock};
use std::collections::BTreeMap;
use std::time::Duration;

#[derive(Debug, Clone)]
struct Segment {
    data: Vec<u8>,
    permissions: Permissions,
}

/// An in-memory segment store.
///
/// This store keeps every segment in a map and is suitable for:
/// - Unit tests
/// - Integration tests
/// - Caches shared only between threads of one process
///
/// Permission bits are enforced against the owner: a segment without
/// the owner-write bit cannot be removed or overwritten, and one without
/// the owner-read bit cannot be read.
///
/// # Thread Safety
///
/// This store is thread-safe and can be shared across threads.
///
/// # Example
///
/// ```rust
/// use shmcache_storage::{InMemorySegmentStore, Permissions, SegmentId, SegmentStore};
///
/// let store = InMemorySegmentStore::new();
/// store.create(SegmentId::new(3), b"data", Permissions::DEFAULT).unwrap();
/// assert!(store.exists(SegmentId::new(3)).unwrap());
/// assert_eq!(store.used_bytes(), 4);
/// ```
#[derive(Debug, Default)]
pub struct InMemorySegmentStore {
    segments: RwLock<BTreeMap<SegmentId, Segment>>,
    capacity: Option<usize>,
    lock: Mutex<()>,
}

impl InMemorySegmentStore {
    /// Creates a new empty store with unbounded capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new empty store holding at most `capacity` bytes in total.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: Some(capacity),
            ..Self::default()
        }
    }

    /// Returns the total number of bytes held by all segments.
    #[must_use]
    pub fn used_bytes(&self) -> usize {
        self.segments.read().values().map(|s| s.data.len()).sum()
    }

    /// Returns the number of segments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.segments.read().len()
    }

    /// Returns true if the store holds no segments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.read().is_empty()
    }

    /// Removes every segment regardless of permissions.
    pub fn clear(&self) {
        self.segments.write().clear();
    }
}

impl SegmentStore for InMemorySegmentStore {
    fn exists(&self, id: SegmentId) -> StorageResult<bool> {
        check_id(id)?;
        Ok(self.segments.read().contains_key(&id))
    }

    fn create(&self, id: SegmentId, data: &[u8], permissions: Permissions) -> StorageResult<()> {
        check_id(id)?;
        let mut segments = self.segments.write();

        if segments.contains_key(&id) {
            return Err(StorageError::AlreadyExists { id });
        }

        if let Some(capacity) = self.capacity {
            let used: usize = segments.values().map(|s| s.data.len()).sum();
            let available = capacity.saturating_sub(used);
            if data.len() > available {
                return Err(StorageError::CapacityExceeded {
                    requested: data.len(),
                    available,
                });
            }
        }

        segments.insert(
            id,
            Segment {
                data: data.to_vec(),
                permissions,
            },
        );
        Ok(())
    }

    fn read(&self, id: SegmentId) -> StorageResult<Vec<u8>> {
        check_id(id)?;
        let segments = self.segments.read();
        let segment = segments.get(&id).ok_or(StorageError::NotFound { id })?;
        if !segment.permissions.owner_can_read() {
            return Err(StorageError::PermissionDenied { id });
        }
        Ok(segment.data.clone())
    }

    fn delete(&self, id: SegmentId) -> StorageResult<()> {
        check_id(id)?;
        let mut segments = self.segments.write();
        let segment = segments.get(&id).ok_or(StorageError::NotFound { id })?;
        if !segment.permissions.owner_can_write() {
            return Err(StorageError::PermissionDenied { id });
        }
        segments.remove(&id);
        Ok(())
    }

    fn permissions(&self, id: SegmentId) -> StorageResult<Permissions> {
        check_id(id)?;
        self.segments
            .read()
            .get(&id)
            .map(|s| s.permissions)
            .ok_or(StorageError::NotFound { id })
    }

    fn list(&self) -> StorageResult<Vec<SegmentId>> {
        Ok(self.segments.read().keys().copied().collect())
    }

    fn lock(&self, timeout: Duration) -> StorageResult<StoreLock<'_>> {
        StoreLock::acquire(&self.lock, timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: u64) -> SegmentId {
        SegmentId::new(n)
    }

    #[test]
    fn memory_new_is_empty() {
        let store = InMemorySegmentStore::new();
        assert!(store.is_empty());
        assert_eq!(store.used_bytes(), 0);
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn memory_create_and_read() {
        let store = InMemorySegmentStore::new();
        store.create(id(2), b"hello", Permissions::DEFAULT).unwrap();

        assert!(store.exists(id(2)).unwrap());
        assert_eq!(store.read(id(2)).unwrap(), b"hello");
        assert_eq!(store.permissions(id(2)).unwrap(), Permissions::DEFAULT);
    }

    #[test]
    fn memory_create_twice_fails() {
        let store = InMemorySegmentStore::new();
        store.create(id(2), b"a", Permissions::DEFAULT).unwrap();

        let result = store.create(id(2), b"b", Permissions::DEFAULT);
        assert!(matches!(result, Err(StorageError::AlreadyExists { .. })));
        assert_eq!(store.read(id(2)).unwrap(), b"a");
    }

    #[test]
    fn memory_read_missing_is_not_found() {
        let store = InMemorySegmentStore::new();
        assert!(store.read(id(5)).unwrap_err().is_not_found());
        assert_eq!(store.read_optional(id(5)).unwrap(), None);
    }

    #[test]
    fn memory_write_replaces_contents() {
        let store = InMemorySegmentStore::new();
        store.write(id(4), b"short", Permissions::DEFAULT).unwrap();
        store.write(id(4), b"much longer value", Permissions::PRIVATE).unwrap();

        assert_eq!(store.read(id(4)).unwrap(), b"much longer value");
        assert_eq!(store.permissions(id(4)).unwrap(), Permissions::PRIVATE);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn memory_delete() {
        let store = InMemorySegmentStore::new();
        store.create(id(3), b"x", Permissions::DEFAULT).unwrap();

        store.delete(id(3)).unwrap();
        assert!(!store.exists(id(3)).unwrap());
        assert!(store.delete(id(3)).unwrap_err().is_not_found());
        assert!(!store.delete_if_exists(id(3)).unwrap());
    }

    #[test]
    fn memory_read_only_segment_resists_delete() {
        let store = InMemorySegmentStore::new();
        store.create(id(6), b"pinned", Permissions::READ_ONLY).unwrap();

        let result = store.delete(id(6));
        assert!(matches!(result, Err(StorageError::PermissionDenied { .. })));

        let result = store.write(id(6), b"other", Permissions::DEFAULT);
        assert!(matches!(result, Err(StorageError::PermissionDenied { .. })));
        assert_eq!(store.read(id(6)).unwrap(), b"pinned");
    }

    #[test]
    fn memory_unreadable_segment() {
        let store = InMemorySegmentStore::new();
        let write_only = Permissions::from_mode(0o222).unwrap();
        store.create(id(7), b"secret", write_only).unwrap();

        assert!(matches!(
            store.read(id(7)),
            Err(StorageError::PermissionDenied { .. })
        ));
        assert!(store.read_optional(id(7)).is_err());
    }

    #[test]
    fn memory_capacity_enforced() {
        let store = InMemorySegmentStore::with_capacity(8);
        store.create(id(2), b"12345", Permissions::DEFAULT).unwrap();

        let result = store.create(id(3), b"6789", Permissions::DEFAULT);
        assert!(matches!(
            result,
            Err(StorageError::CapacityExceeded {
                requested: 4,
                available: 3
            })
        ));

        store.create(id(3), b"678", Permissions::DEFAULT).unwrap();
        assert_eq!(store.used_bytes(), 8);
    }

    #[test]
    fn memory_id_zero_rejected() {
        let store = InMemorySegmentStore::new();
        let result = store.create(id(0), b"x", Permissions::DEFAULT);
        assert!(matches!(result, Err(StorageError::InvalidId { .. })));
        assert!(store.exists(id(0)).is_err());
    }

    #[test]
    fn memory_list_is_sorted() {
        let store = InMemorySegmentStore::new();
        for n in [9, 2, 5] {
            store.create(id(n), b"", Permissions::DEFAULT).unwrap();
        }
        assert_eq!(store.list().unwrap(), vec![id(2), id(5), id(9)]);
    }

    #[test]
    fn memory_clear_ignores_permissions() {
        let store = InMemorySegmentStore::new();
        store.create(id(2), b"x", Permissions::READ_ONLY).unwrap();
        store.clear();
        assert!(store.is_empty());
    }

    #[test]
    fn memory_lock_is_exclusive() {
        let store = InMemorySegmentStore::new();
        let _guard = store.lock(Duration::from_millis(10)).unwrap();
        assert!(matches!(
            store.lock(Duration::from_millis(10)),
            Err(StorageError::LockTimeout { .. })
        ));
    }

    proptest::proptest! {
        #[test]
        fn used_bytes_tracks_live_segments(
            writes in proptest::collection::vec((1u64..16, proptest::collection::vec(0u8..=255, 0..64)), 1..32),
        ) {
            let store = InMemorySegmentStore::new();
            let mut expected = std::collections::BTreeMap::new();
            for (n, data) in &writes {
                store.write(id(*n), data, Permissions::DEFAULT).unwrap();
                expected.insert(*n, data.len());
            }
            proptest::prop_assert_eq!(store.used_bytes(), expected.values().sum::<usize>());
            proptest::prop_assert_eq!(store.len(), expected.len());
        }
    }
}
