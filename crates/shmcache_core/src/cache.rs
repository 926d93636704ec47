//! The cache handle.

use crate::config::Config;
use crate::destroy::{self, DestroyOutcome};
use crate::directory::Directory;
use crate::error::CacheResult;
use crate::hash::NamespaceHasher;
use crate::metrics::{CacheMetrics, MetricsSnapshot};
use crate::namespace::{Namespace, Scope};
use crate::scoped::ScopedCache;
use crate::table::TableRef;
use serde::de::DeserializeOwned;
use serde::Serialize;
use shmcache_codec::SegmentKind;
use shmcache_storage::{
    FileSegmentStore, InMemorySegmentStore, Permissions, SegmentId, SegmentStore, StoreLock,
};
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

/// A named, password-scoped cache over a segment store.
///
/// Every public operation holds the store's advisory lock from its first
/// directory read to its last write, unless [`Config::locking`] is off.
/// Several handles, in one process or many, may share a store.
///
/// # Example
///
/// ```rust
/// use shmcache_core::SharedCache;
///
/// let cache = SharedCache::open_in_memory()?;
/// cache.save("greeting", &"hello", None)?;
/// cache.save("greeting", &"secret hello", Some("pw"))?;
///
/// assert_eq!(cache.read::<String>("greeting", None)?.as_deref(), Some("hello"));
/// assert_eq!(
///     cache.read::<String>("greeting", Some("pw"))?.as_deref(),
///     Some("secret hello")
/// );
/// # Ok::<(), shmcache_core::CacheError>(())
/// ```
pub struct SharedCache {
    store: Box<dyn SegmentStore>,
    hasher: Arc<dyn NamespaceHasher>,
    config: Config,
    metrics: CacheMetrics,
}

impl SharedCache {
    /// Opens a file-backed cache in `path` with default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or opened.
    pub fn open(path: &Path) -> CacheResult<Self> {
        Self::open_with_config(path, Config::default())
    }

    /// Opens a file-backed cache in `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the directory
    /// cannot be created or opened.
    pub fn open_with_config(path: &Path, config: Config) -> CacheResult<Self> {
        config.validate()?;
        let store = FileSegmentStore::open(path)?;
        Self::with_store(store, config)
    }

    /// Opens the file-backed cache in the platform default directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or opened.
    pub fn open_default() -> CacheResult<Self> {
        Self::with_store(FileSegmentStore::open_default()?, Config::default())
    }

    /// Creates a cache over a fresh in-memory store.
    ///
    /// # Errors
    ///
    /// Never fails with the default configuration; the signature matches
    /// the other constructors.
    pub fn open_in_memory() -> CacheResult<Self> {
        Self::with_store(InMemorySegmentStore::new(), Config::default())
    }

    /// Creates a cache over any segment store.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CacheError::Config`] if the configuration is invalid.
    pub fn with_store<S: SegmentStore + 'static>(store: S, config: Config) -> CacheResult<Self> {
        config.validate()?;
        Ok(Self {
            store: Box::new(store),
            hasher: config.hash.hasher(),
            config,
            metrics: CacheMetrics::new(),
        })
    }

    /// Replaces the namespace hash function.
    ///
    /// Every handle sharing a store must use the same hasher, or the same
    /// password resolves to different namespaces.
    #[must_use]
    pub fn with_hasher(mut self, hasher: Arc<dyn NamespaceHasher>) -> Self {
        self.hasher = hasher;
        self
    }

    /// Returns the configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the namespace hash function.
    pub fn hasher(&self) -> &dyn NamespaceHasher {
        &*self.hasher
    }

    /// Returns the underlying segment store.
    pub fn store(&self) -> &dyn SegmentStore {
        &*self.store
    }

    /// Returns a snapshot of this handle's operation counters.
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Returns a handle bound to one scope.
    ///
    /// `None` binds to the unprotected names. The password is hashed once
    /// here and not stored anywhere but the returned value.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CacheError::Config`] for an empty password.
    pub fn scoped(&self, password: Option<&str>) -> CacheResult<ScopedCache<'_>> {
        Ok(ScopedCache::new(self, self.scope(password)?))
    }

    /// Stores `value` under `name`, replacing any previous value.
    ///
    /// Uses [`Config::default_permissions`] for the value segment.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be encoded, the password is
    /// empty, or the store refuses a write.
    pub fn save<T: Serialize + ?Sized>(&self, name: &str, value: &T, password: Option<&str>) -> CacheResult<SegmentId> {
        let scope = self.scope(password)?;
        self.save_in(&scope, name, value, self.config.default_permissions)
    }

    /// Stores `value` under `name` with explicit segment permissions.
    ///
    /// # Errors
    ///
    /// Same as [`SharedCache::save`].
    pub fn save_with_permissions<T: Serialize + ?Sized>(
        &self,
        name: &str,
        value: &T,
        password: Option<&str>,
        permissions: Permissions,
    ) -> CacheResult<SegmentId> {
        let scope = self.scope(password)?;
        self.save_in(&scope, name, value, permissions)
    }

    /// Reads the value stored under `name`.
    ///
    /// Returns `Ok(None)` if the name or the namespace does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the store refuses a read or the value does not
    /// decode as `T`.
    pub fn read<T: DeserializeOwned>(&self, name: &str, password: Option<&str>) -> CacheResult<Option<T>> {
        let scope = self.scope(password)?;
        self.read_in(&scope, name)
    }

    /// Returns true if a value is stored under `name`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be queried.
    pub fn contains(&self, name: &str, password: Option<&str>) -> CacheResult<bool> {
        let scope = self.scope(password)?;
        self.contains_in(&scope, name)
    }

    /// Deletes the value stored under `name`.
    ///
    /// Returns `Ok(false)` if there was nothing to delete.
    ///
    /// # Errors
    ///
    /// Returns an error if the store refuses the delete.
    pub fn delete(&self, name: &str, password: Option<&str>) -> CacheResult<bool> {
        let scope = self.scope(password)?;
        self.delete_in(&scope, name)
    }

    /// Lists the names in one scope, sorted.
    ///
    /// # Errors
    ///
    /// Returns an error if a directory table cannot be read.
    pub fn names(&self, password: Option<&str>) -> CacheResult<Vec<String>> {
        let scope = self.scope(password)?;
        self.names_in(&scope)
    }

    /// Destroys one namespace, or the whole cache when `password` is
    /// `None` or empty.
    ///
    /// # Errors
    ///
    /// Same as [`SharedCache::destroy_namespace`] and
    /// [`SharedCache::destroy_all`].
    pub fn destroy(&self, password: Option<&str>) -> CacheResult<DestroyOutcome> {
        match password {
            None | Some("") => self.destroy_all(),
            Some(password) => self.destroy_namespace(password),
        }
    }

    /// Removes a namespace's values, its table and its root entry.
    ///
    /// An empty password destroys the whole cache.
    ///
    /// # Errors
    ///
    /// Returns an error if the namespace belongs to another password or
    /// the root table cannot be rewritten. Failed segment deletes do not
    /// abort the pass; they are listed in the report.
    pub fn destroy_namespace(&self, password: &str) -> CacheResult<DestroyOutcome> {
        if password.is_empty() {
            return self.destroy_all();
        }
        let ns = Namespace::new(password, &*self.hasher)?;
        self.destroy_in(&Scope::Namespace(ns))
    }

    /// Removes every segment the root table lists, then the root table.
    ///
    /// Values inside namespace tables are left in place unless
    /// [`Config::deep_destroy`] is set.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock cannot be taken or the root table
    /// cannot be read. Failed segment deletes do not abort the pass.
    pub fn destroy_all(&self) -> CacheResult<DestroyOutcome> {
        self.destroy_in(&Scope::Global)
    }

    pub(crate) fn scope(&self, password: Option<&str>) -> CacheResult<Scope> {
        Scope::from_password(password, &*self.hasher)
    }

    pub(crate) fn save_in<T: Serialize + ?Sized>(
        &self,
        scope: &Scope,
        name: &str,
        value: &T,
        permissions: Permissions,
    ) -> CacheResult<SegmentId> {
        let bytes = shmcache_codec::encode(SegmentKind::Value, value)?;

        self.locked(|dir| {
            let table = match scope {
                Scope::Global => TableRef::Root,
                Scope::Namespace(ns) => TableRef::Namespace(dir.resolve_or_create_namespace(ns)?),
            };
            let (id, fresh) = dir.resolve_or_allocate(table, name)?;

            if let Err(e) = self.store.write(id, &bytes, permissions) {
                if fresh {
                    if let Err(undo) = dir.remove(table, name) {
                        warn!(key = name, %id, error = %undo, "failed to roll back new entry");
                    }
                }
                return Err(e.into());
            }

            debug!(key = name, %id, fresh, bytes = bytes.len(), "saved value");
            self.metrics.record_save(bytes.len());
            Ok(id)
        })
    }

    pub(crate) fn read_in<T: DeserializeOwned>(&self, scope: &Scope, name: &str) -> CacheResult<Option<T>> {
        self.locked(|dir| {
            let bytes = match Self::locate(dir, scope, name)? {
                Some(id) => self.store.read_optional(id)?,
                None => None,
            };
            self.metrics.record_read(bytes.as_ref().map(Vec::len));
            match bytes {
                Some(bytes) => Ok(Some(shmcache_codec::decode(SegmentKind::Value, &bytes)?)),
                None => Ok(None),
            }
        })
    }

    pub(crate) fn contains_in(&self, scope: &Scope, name: &str) -> CacheResult<bool> {
        self.locked(|dir| match Self::locate(dir, scope, name)? {
            Some(id) => Ok(self.store.exists(id)?),
            None => Ok(false),
        })
    }

    pub(crate) fn delete_in(&self, scope: &Scope, name: &str) -> CacheResult<bool> {
        self.locked(|dir| {
            let Some(table) = Self::existing_table(dir, scope)? else {
                return Ok(false);
            };
            let Some(id) = dir.lookup(table, name)? else {
                return Ok(false);
            };

            // Segment first: a failure leaves a dangling entry, never an
            // orphaned segment.
            self.store.delete_if_exists(id)?;
            dir.remove(table, name)?;

            debug!(key = name, %id, "deleted value");
            self.metrics.record_delete();
            Ok(true)
        })
    }

    pub(crate) fn names_in(&self, scope: &Scope) -> CacheResult<Vec<String>> {
        self.locked(|dir| match Self::existing_table(dir, scope)? {
            Some(table) => dir.names(table),
            None => Ok(Vec::new()),
        })
    }

    pub(crate) fn destroy_in(&self, scope: &Scope) -> CacheResult<DestroyOutcome> {
        self.locked(|dir| {
            let outcome = match scope {
                Scope::Global => destroy::destroy_all(dir, self.config.deep_destroy)?,
                Scope::Namespace(ns) => destroy::destroy_namespace(dir, ns)?,
            };
            if let Some(report) = outcome.report() {
                self.metrics.record_destroy(report.removed, report.failed.len());
            }
            Ok(outcome)
        })
    }

    /// Returns the table `scope` addresses, without creating a namespace.
    fn existing_table(dir: &Directory<'_>, scope: &Scope) -> CacheResult<Option<TableRef>> {
        match scope {
            Scope::Global => Ok(Some(TableRef::Root)),
            Scope::Namespace(ns) => Ok(dir.resolve_namespace(ns)?.map(TableRef::Namespace)),
        }
    }

    fn locate(dir: &Directory<'_>, scope: &Scope, name: &str) -> CacheResult<Option<SegmentId>> {
        match Self::existing_table(dir, scope)? {
            Some(table) => dir.lookup(table, name),
            None => Ok(None),
        }
    }

    pub(crate) fn directory(&self) -> Directory<'_> {
        Directory::new(
            &*self.store,
            self.config.table_permissions,
            self.config.max_probe,
            self.config.verify_namespaces,
        )
    }

    fn acquire(&self) -> CacheResult<Option<StoreLock<'_>>> {
        if !self.config.locking {
            return Ok(None);
        }
        Ok(Some(self.store.lock(self.config.lock_timeout)?))
    }

    /// Runs `op` under the store lock. The lock is not reentrant, so `op`
    /// must not call back into a public operation.
    pub(crate) fn locked<T, F>(&self, op: F) -> CacheResult<T>
    where
        F: FnOnce(&Directory<'_>) -> CacheResult<T>,
    {
        let result = self.acquire().and_then(|guard| {
            let out = op(&self.directory());
            drop(guard);
            out
        });
        if result.is_err() {
            self.metrics.record_error();
        }
        result
    }
}

impl fmt::Debug for SharedCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedCache")
            .field("hasher", &self.hasher.name())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
