//! Directory table access.
//!
//! Tables are read and written whole through the value codec. A missing
//! table segment reads as an empty table. Every mutation is a
//! read-modify-write of the entire table followed by a delete-then-create
//! of its segment, so callers that share a store must hold the store lock
//! around each mutation.

use crate::allocator::Allocator;
use crate::error::{CacheError, CacheResult};
use crate::namespace::Namespace;
use crate::table::{DirectoryTable, NamespaceEntry, NamespaceTable, RootTable, TableRef, ROOT_TABLE_ID};
use shmcache_storage::{Permissions, SegmentId, SegmentStore};
use tracing::{debug, warn};

/// Reads and mutates the directory tables of one store.
pub struct Directory<'a> {
    store: &'a dyn SegmentStore,
    permissions: Permissions,
    max_probe: u64,
    verify: bool,
}

impl<'a> Directory<'a> {
    /// Creates a directory view over `store`.
    pub fn new(store: &'a dyn SegmentStore, permissions: Permissions, max_probe: u64, verify: bool) -> Self {
        Self {
            store,
            permissions,
            max_probe,
            verify,
        }
    }

    /// Returns the underlying segment store.
    pub(crate) fn segments(&self) -> &'a dyn SegmentStore {
        self.store
    }

    /// Loads a table, returning `None` if its segment does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the segment exists but cannot be read or does
    /// not decode as a table of kind `T`.
    pub fn load<T: DirectoryTable>(&self, id: SegmentId) -> CacheResult<Option<T>> {
        match self.store.read_optional(id)? {
            Some(bytes) => Ok(Some(shmcache_codec::decode(T::KIND, &bytes)?)),
            None => Ok(None),
        }
    }

    /// Loads a table, treating a missing segment as an empty table.
    ///
    /// # Errors
    ///
    /// Same as [`Directory::load`].
    pub fn load_or_default<T: DirectoryTable>(&self, id: SegmentId) -> CacheResult<T> {
        Ok(self.load(id)?.unwrap_or_default())
    }

    /// Loads the root table, if the cache has been initialised.
    ///
    /// # Errors
    ///
    /// Same as [`Directory::load`].
    pub fn load_root(&self) -> CacheResult<Option<RootTable>> {
        self.load(ROOT_TABLE_ID)
    }

    /// Persists a table, replacing its segment.
    ///
    /// # Errors
    ///
    /// Returns an error if the table cannot be encoded or written.
    pub fn save<T: DirectoryTable>(&self, id: SegmentId, table: &T) -> CacheResult<()> {
        let bytes = shmcache_codec::encode(T::KIND, table)?;
        self.store.write(id, &bytes, self.permissions)?;
        debug!(%id, kind = %T::KIND, entries = table.entry_count(), "wrote directory table");
        Ok(())
    }

    /// Returns the id mapped to `name` in `table`.
    ///
    /// # Errors
    ///
    /// Returns an error if the table cannot be loaded.
    pub fn lookup(&self, table: TableRef, name: &str) -> CacheResult<Option<SegmentId>> {
        match table {
            TableRef::Root => Ok(self.load_or_default::<RootTable>(ROOT_TABLE_ID)?.lookup(name)),
            TableRef::Namespace(id) => Ok(self.load_or_default::<NamespaceTable>(id)?.lookup(name)),
        }
    }

    /// Returns every name in `table`, sorted.
    ///
    /// # Errors
    ///
    /// Returns an error if the table cannot be loaded.
    pub fn names(&self, table: TableRef) -> CacheResult<Vec<String>> {
        match table {
            TableRef::Root => Ok(Self::keys(&self.load_or_default::<RootTable>(ROOT_TABLE_ID)?)),
            TableRef::Namespace(id) => Ok(Self::keys(&self.load_or_default::<NamespaceTable>(id)?)),
        }
    }

    fn keys<T: DirectoryTable>(table: &T) -> Vec<String> {
        table.names().keys().cloned().collect()
    }

    /// Maps `name` to `id` in `table`.
    ///
    /// # Errors
    ///
    /// Returns an error if the table cannot be loaded or written.
    pub fn upsert(&self, table: TableRef, name: &str, id: SegmentId) -> CacheResult<()> {
        match table {
            TableRef::Root => self.mutate::<RootTable, _>(ROOT_TABLE_ID, |t| {
                t.names_mut().insert(name.to_string(), id.as_u64());
            }),
            TableRef::Namespace(tid) => self.mutate::<NamespaceTable, _>(tid, |t| {
                t.names_mut().insert(name.to_string(), id.as_u64());
            }),
        }
    }

    /// Removes `name` from `table`, returning the id it mapped to.
    ///
    /// The table is only rewritten if the name was present.
    ///
    /// # Errors
    ///
    /// Returns an error if the table cannot be loaded or written.
    pub fn remove(&self, table: TableRef, name: &str) -> CacheResult<Option<SegmentId>> {
        match table {
            TableRef::Root => self.remove_from::<RootTable>(ROOT_TABLE_ID, name),
            TableRef::Namespace(tid) => self.remove_from::<NamespaceTable>(tid, name),
        }
    }

    /// Returns the id for `name`, allocating and recording a fresh one if
    /// the name is new.
    ///
    /// The second element is `true` when the id was freshly allocated.
    ///
    /// # Errors
    ///
    /// Returns an error if allocation fails or the table cannot be
    /// loaded or written.
    pub fn resolve_or_allocate(&self, table: TableRef, name: &str) -> CacheResult<(SegmentId, bool)> {
        match table {
            TableRef::Root => self.resolve_or_allocate_in::<RootTable>(table, name),
            TableRef::Namespace(_) => self.resolve_or_allocate_in::<NamespaceTable>(table, name),
        }
    }

    fn resolve_or_allocate_in<T: DirectoryTable>(&self, table: TableRef, name: &str) -> CacheResult<(SegmentId, bool)> {
        let mut contents: T = self.load_or_default(table.segment())?;
        if let Some(id) = contents.lookup(name) {
            return Ok((id, false));
        }

        let id = Allocator::new(self.store, self.max_probe).allocate(table, &contents)?;
        contents.names_mut().insert(name.to_string(), id.as_u64());
        self.save(table.segment(), &contents)?;
        Ok((id, true))
    }

    fn mutate<T: DirectoryTable, F: FnOnce(&mut T)>(&self, id: SegmentId, f: F) -> CacheResult<()> {
        let mut table: T = self.load_or_default(id)?;
        f(&mut table);
        self.save(id, &table)
    }

    fn remove_from<T: DirectoryTable>(&self, id: SegmentId, name: &str) -> CacheResult<Option<SegmentId>> {
        let mut table: T = self.load_or_default(id)?;
        match table.names_mut().remove(name) {
            Some(raw) => {
                self.save(id, &table)?;
                Ok(Some(SegmentId::new(raw)))
            }
            None => Ok(None),
        }
    }

    /// Returns the namespace table id for `ns`, if the namespace exists.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::NamespaceCollision`] if verification is on
    /// and the stored verifier belongs to another password.
    pub fn resolve_namespace(&self, ns: &Namespace) -> CacheResult<Option<SegmentId>> {
        let root: RootTable = self.load_or_default(ROOT_TABLE_ID)?;
        match root.namespace(ns.token()) {
            Some(entry) => {
                self.check_verifier(ns, entry)?;
                Ok(Some(entry.table_id()))
            }
            None => Ok(None),
        }
    }

    /// Returns the namespace table id for `ns`, creating an empty
    /// namespace table and registering it in the root table if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the namespace belongs to another password,
    /// allocation fails, or a table cannot be written.
    pub fn resolve_or_create_namespace(&self, ns: &Namespace) -> CacheResult<SegmentId> {
        let mut root: RootTable = self.load_or_default(ROOT_TABLE_ID)?;
        if let Some(entry) = root.namespace(ns.token()) {
            self.check_verifier(ns, entry)?;
            return Ok(entry.table_id());
        }

        let id = Allocator::new(self.store, self.max_probe).allocate(TableRef::Root, &root)?;
        // The empty table claims the id before the root table publishes it.
        self.save(id, &NamespaceTable::default())?;

        let verifier = self.verify.then(|| ns.new_verifier());
        root.insert_namespace(
            ns.token(),
            NamespaceEntry {
                table: id.as_u64(),
                verifier,
            },
        );
        if let Err(e) = self.save(ROOT_TABLE_ID, &root) {
            if let Err(undo) = self.store.delete_if_exists(id) {
                warn!(%id, error = %undo, "failed to remove unpublished namespace table");
            }
            return Err(e);
        }

        debug!(token = ns.token(), %id, "created namespace");
        Ok(id)
    }

    /// Drops the root table entry for `ns`.
    ///
    /// # Errors
    ///
    /// Returns an error if the root table cannot be loaded or written.
    pub fn unregister_namespace(&self, ns: &Namespace) -> CacheResult<Option<NamespaceEntry>> {
        let Some(mut root) = self.load_root()? else {
            return Ok(None);
        };
        let removed = root.remove_namespace(ns.token());
        if removed.is_some() {
            self.save(ROOT_TABLE_ID, &root)?;
        }
        Ok(removed)
    }

    fn check_verifier(&self, ns: &Namespace, entry: &NamespaceEntry) -> CacheResult<()> {
        if !self.verify {
            return Ok(());
        }
        match &entry.verifier {
            Some(verifier) if !ns.matches(verifier) => {
                warn!(token = ns.token(), "namespace verifier mismatch");
                Err(CacheError::NamespaceCollision {
                    token: ns.token().to_string(),
                })
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::{Crc32Hasher, NamespaceHasher, Sha256Hasher};
    use shmcache_codec::SegmentKind;
    use shmcache_storage::InMemorySegmentStore;

    fn directory(store: &InMemorySegmentStore) -> Directory<'_> {
        Directory::new(store, Permissions::DEFAULT, 1024, true)
    }

    #[test]
    fn missing_root_is_empty() {
        let store = InMemorySegmentStore::new();
        let dir = directory(&store);
        assert!(dir.load_root().unwrap().is_none());
        assert_eq!(dir.lookup(TableRef::Root, "x").unwrap(), None);
        assert!(store.is_empty());
    }

    #[test]
    fn upsert_lookup_remove() {
        let store = InMemorySegmentStore::new();
        let dir = directory(&store);

        dir.upsert(TableRef::Root, "a", SegmentId::new(5)).unwrap();
        assert_eq!(dir.lookup(TableRef::Root, "a").unwrap(), Some(SegmentId::new(5)));
        assert!(store.exists(ROOT_TABLE_ID).unwrap());

        assert_eq!(dir.remove(TableRef::Root, "a").unwrap(), Some(SegmentId::new(5)));
        assert_eq!(dir.remove(TableRef::Root, "a").unwrap(), None);
        assert_eq!(dir.lookup(TableRef::Root, "a").unwrap(), None);
    }

    #[test]
    fn resolve_or_allocate_is_stable() {
        let store = InMemorySegmentStore::new();
        let dir = directory(&store);

        let (first, fresh) = dir.resolve_or_allocate(TableRef::Root, "a").unwrap();
        assert!(fresh);
        assert_eq!(first, SegmentId::new(2));

        let (again, fresh) = dir.resolve_or_allocate(TableRef::Root, "a").unwrap();
        assert!(!fresh);
        assert_eq!(again, first);

        // "a" has no value segment yet, but the table already references 2
        let (second, _) = dir.resolve_or_allocate(TableRef::Root, "b").unwrap();
        assert_eq!(second, SegmentId::new(3));
    }

    #[test]
    fn namespace_created_once() {
        let store = InMemorySegmentStore::new();
        let dir = directory(&store);
        let ns = Namespace::new("pw", &Sha256Hasher).unwrap();

        assert_eq!(dir.resolve_namespace(&ns).unwrap(), None);
        let id = dir.resolve_or_create_namespace(&ns).unwrap();
        assert_eq!(id, SegmentId::new(2));
        assert_eq!(dir.resolve_or_create_namespace(&ns).unwrap(), id);
        assert_eq!(dir.resolve_namespace(&ns).unwrap(), Some(id));

        let bytes = store.read(id).unwrap();
        assert_eq!(shmcache_codec::peek_kind(&bytes).unwrap(), SegmentKind::NamespaceTable);
    }

    #[test]
    fn namespace_entries_allocate_above_table() {
        let store = InMemorySegmentStore::new();
        let dir = directory(&store);
        let ns = Namespace::new("pw", &Sha256Hasher).unwrap();

        let table_id = dir.resolve_or_create_namespace(&ns).unwrap();
        let (value_id, _) = dir
            .resolve_or_allocate(TableRef::Namespace(table_id), "x")
            .unwrap();
        assert_eq!(value_id, SegmentId::new(table_id.as_u64() + 1));
    }

    #[derive(Debug)]
    struct ConstantHasher;

    impl NamespaceHasher for ConstantHasher {
        fn name(&self) -> &str {
            "const"
        }
        fn digest(&self, _password: &[u8]) -> Vec<u8> {
            vec![0xab]
        }
    }

    #[test]
    fn colliding_password_rejected_with_verification() {
        let store = InMemorySegmentStore::new();
        let dir = directory(&store);
        let owner = Namespace::new("first", &ConstantHasher).unwrap();
        let intruder = Namespace::new("second", &ConstantHasher).unwrap();
        assert_eq!(owner.token(), intruder.token());

        dir.resolve_or_create_namespace(&owner).unwrap();
        assert!(matches!(
            dir.resolve_namespace(&intruder),
            Err(CacheError::NamespaceCollision { .. })
        ));
        assert!(matches!(
            dir.resolve_or_create_namespace(&intruder),
            Err(CacheError::NamespaceCollision { .. })
        ));
    }

    #[test]
    fn colliding_password_shares_table_without_verification() {
        let store = InMemorySegmentStore::new();
        let dir = Directory::new(&store, Permissions::DEFAULT, 1024, false);
        let owner = Namespace::new("first", &ConstantHasher).unwrap();
        let intruder = Namespace::new("second", &ConstantHasher).unwrap();

        let id = dir.resolve_or_create_namespace(&owner).unwrap();
        assert_eq!(dir.resolve_namespace(&intruder).unwrap(), Some(id));
    }

    #[test]
    fn unregister_namespace() {
        let store = InMemorySegmentStore::new();
        let dir = directory(&store);
        let ns = Namespace::new("pw", &Crc32Hasher).unwrap();

        assert!(dir.unregister_namespace(&ns).unwrap().is_none());
        let id = dir.resolve_or_create_namespace(&ns).unwrap();
        let entry = dir.unregister_namespace(&ns).unwrap().unwrap();
        assert_eq!(entry.table_id(), id);
        assert_eq!(dir.resolve_namespace(&ns).unwrap(), None);
    }

    #[test]
    fn value_segment_is_not_a_table() {
        let store = InMemorySegmentStore::new();
        let dir = directory(&store);
        let bytes = shmcache_codec::encode(SegmentKind::Value, "not a table").unwrap();
        store.write(SegmentId::new(4), &bytes, Permissions::DEFAULT).unwrap();

        let result = dir.lookup(TableRef::Namespace(SegmentId::new(4)), "x");
        assert!(matches!(result, Err(CacheError::Codec(_))));
    }
}
