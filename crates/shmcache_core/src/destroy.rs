//! Namespace and whole-cache teardown.
//!
//! Teardown is best-effort: a segment that cannot be deleted is logged,
//! recorded in the [`DestroyReport`] and skipped, and the pass carries on.
//! Callers that need a guarantee should check [`DestroyReport::is_complete`].

use crate::directory::Directory;
use crate::error::{CacheError, CacheResult};
use crate::namespace::Namespace;
use crate::table::{NamespaceTable, ROOT_TABLE_ID};
use shmcache_storage::SegmentId;
use tracing::{info, warn};

/// Result of a destroy call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DestroyOutcome {
    /// The target was already absent. Not an error.
    NothingToDestroy,
    /// The target existed and teardown ran.
    Destroyed(DestroyReport),
}

impl DestroyOutcome {
    /// Returns true if there was nothing to destroy.
    #[must_use]
    pub const fn is_nothing(&self) -> bool {
        matches!(self, Self::NothingToDestroy)
    }

    /// Returns the teardown report, if teardown ran.
    #[must_use]
    pub const fn report(&self) -> Option<&DestroyReport> {
        match self {
            Self::NothingToDestroy => None,
            Self::Destroyed(report) => Some(report),
        }
    }
}

/// What a teardown pass removed and what it could not.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DestroyReport {
    /// Number of segments deleted.
    pub removed: usize,
    /// Segments whose deletion failed.
    pub failed: Vec<SegmentId>,
}

impl DestroyReport {
    /// Returns true if every targeted segment was deleted.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

struct Teardown<'d, 'a> {
    dir: &'d Directory<'a>,
    report: DestroyReport,
}

impl<'d, 'a> Teardown<'d, 'a> {
    fn new(dir: &'d Directory<'a>) -> Self {
        Self {
            dir,
            report: DestroyReport::default(),
        }
    }

    fn remove(&mut self, id: SegmentId) {
        match self.dir.segments().delete_if_exists(id) {
            Ok(true) => self.report.removed += 1,
            Ok(false) => {}
            Err(e) => {
                warn!(%id, error = %e, "failed to delete segment during teardown");
                self.report.failed.push(id);
            }
        }
    }

    /// Deletes every value listed in a namespace table, but not the table.
    fn sweep_values(&mut self, table: SegmentId) {
        match self.dir.load::<NamespaceTable>(table) {
            Ok(Some(contents)) => {
                for id in contents.value_segments() {
                    self.remove(id);
                }
            }
            Ok(None) => {}
            Err(e) => warn!(%table, error = %e, "namespace table unreadable, values left in place"),
        }
    }

    fn finish(self) -> DestroyOutcome {
        DestroyOutcome::Destroyed(self.report)
    }
}

/// Removes one namespace: its values, its table, then its root entry.
pub(crate) fn destroy_namespace(dir: &Directory<'_>, ns: &Namespace) -> CacheResult<DestroyOutcome> {
    let Some(table) = dir.resolve_namespace(ns)? else {
        return Ok(DestroyOutcome::NothingToDestroy);
    };

    let mut teardown = Teardown::new(dir);
    teardown.sweep_values(table);
    teardown.remove(table);
    dir.unregister_namespace(ns)?;

    info!(
        token = ns.token(),
        removed = teardown.report.removed,
        failed = teardown.report.failed.len(),
        "destroyed namespace"
    );
    Ok(teardown.finish())
}

/// Removes everything the root table lists, then the root table itself.
///
/// With `deep` set, the values inside each namespace table are swept
/// before the table. Without it, only segments listed directly in the
/// root table are deleted.
pub(crate) fn destroy_all(dir: &Directory<'_>, deep: bool) -> CacheResult<DestroyOutcome> {
    let root = match dir.load_root() {
        Ok(root) => root,
        Err(CacheError::Codec(e)) => {
            warn!(error = %e, "root table unreadable, deleting it alone");
            None
        }
        Err(e) => return Err(e),
    };

    if root.is_none() && !dir.segments().exists(ROOT_TABLE_ID)? {
        return Ok(DestroyOutcome::NothingToDestroy);
    }

    let root = root.unwrap_or_default();
    let mut teardown = Teardown::new(dir);
    if deep {
        for (_, entry) in root.namespaces() {
            teardown.sweep_values(entry.table_id());
        }
    }
    for id in root.referenced_segments() {
        teardown.remove(id);
    }
    teardown.remove(ROOT_TABLE_ID);

    info!(
        deep,
        namespaces = root.namespaces().count(),
        removed = teardown.report.removed,
        failed = teardown.report.failed.len(),
        "destroyed cache"
    );
    Ok(teardown.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::Sha256Hasher;
    use crate::table::TableRef;
    use shmcache_storage::{InMemorySegmentStore, Permissions, SegmentStore};

    fn directory(store: &InMemorySegmentStore) -> Directory<'_> {
        Directory::new(store, Permissions::DEFAULT, 1024, true)
    }

    fn put(dir: &Directory<'_>, table: TableRef, name: &str) -> SegmentId {
        let (id, _) = dir.resolve_or_allocate(table, name).unwrap();
        let bytes = shmcache_codec::encode(shmcache_codec::SegmentKind::Value, name).unwrap();
        dir.segments().write(id, &bytes, Permissions::DEFAULT).unwrap();
        id
    }

    #[test]
    fn empty_cache_has_nothing_to_destroy() {
        let store = InMemorySegmentStore::new();
        let dir = directory(&store);
        assert!(destroy_all(&dir, false).unwrap().is_nothing());

        let ns = Namespace::new("pw", &Sha256Hasher).unwrap();
        assert!(destroy_namespace(&dir, &ns).unwrap().is_nothing());
    }

    #[test]
    fn namespace_teardown_removes_values_and_table() {
        let store = InMemorySegmentStore::new();
        let dir = directory(&store);
        let ns = Namespace::new("pw", &Sha256Hasher).unwrap();
        let table = dir.resolve_or_create_namespace(&ns).unwrap();
        put(&dir, TableRef::Namespace(table), "a");
        put(&dir, TableRef::Namespace(table), "b");
        let plain = put(&dir, TableRef::Root, "plain");

        let outcome = destroy_namespace(&dir, &ns).unwrap();
        let report = outcome.report().unwrap();
        assert_eq!(report.removed, 3);
        assert!(report.is_complete());

        assert!(!store.exists(table).unwrap());
        assert!(store.exists(plain).unwrap());
        assert_eq!(dir.resolve_namespace(&ns).unwrap(), None);
        assert!(destroy_namespace(&dir, &ns).unwrap().is_nothing());
    }

    #[test]
    fn shallow_wipe_leaves_nested_values() {
        let store = InMemorySegmentStore::new();
        let dir = directory(&store);
        let ns = Namespace::new("pw", &Sha256Hasher).unwrap();
        let table = dir.resolve_or_create_namespace(&ns).unwrap();
        let nested = put(&dir, TableRef::Namespace(table), "a");
        put(&dir, TableRef::Root, "plain");

        let report = destroy_all(&dir, false).unwrap().report().cloned().unwrap();
        // plain value, namespace table, root table
        assert_eq!(report.removed, 3);
        assert_eq!(store.list().unwrap(), vec![nested]);
        assert!(destroy_all(&dir, false).unwrap().is_nothing());
    }

    #[test]
    fn deep_wipe_sweeps_nested_values() {
        let store = InMemorySegmentStore::new();
        let dir = directory(&store);
        let ns = Namespace::new("pw", &Sha256Hasher).unwrap();
        let table = dir.resolve_or_create_namespace(&ns).unwrap();
        put(&dir, TableRef::Namespace(table), "a");
        put(&dir, TableRef::Root, "plain");

        let report = destroy_all(&dir, true).unwrap().report().cloned().unwrap();
        assert_eq!(report.removed, 4);
        assert!(store.is_empty());
    }

    #[test]
    fn teardown_continues_past_failures() {
        let store = InMemorySegmentStore::new();
        let dir = directory(&store);
        let (locked, _) = dir.resolve_or_allocate(TableRef::Root, "locked").unwrap();
        store.write(locked, b"x", Permissions::READ_ONLY).unwrap();
        let other = put(&dir, TableRef::Root, "other");

        let report = destroy_all(&dir, false).unwrap().report().cloned().unwrap();
        assert_eq!(report.failed, vec![locked]);
        assert!(!report.is_complete());
        assert!(!store.exists(other).unwrap());
        assert!(!store.exists(ROOT_TABLE_ID).unwrap());
    }

    #[test]
    fn corrupt_root_is_still_removed() {
        let store = InMemorySegmentStore::new();
        let dir = directory(&store);
        store.write(ROOT_TABLE_ID, b"garbage", Permissions::DEFAULT).unwrap();

        let report = destroy_all(&dir, false).unwrap().report().cloned().unwrap();
        assert_eq!(report.removed, 1);
        assert!(store.is_empty());
    }
}
