//! Scope-bound cache handles.

use crate::cache::SharedCache;
use crate::destroy::DestroyOutcome;
use crate::error::CacheResult;
use crate::namespace::Scope;
use serde::de::DeserializeOwned;
use serde::Serialize;
use shmcache_storage::{Permissions, SegmentId};

/// A [`SharedCache`] bound to one scope.
///
/// Holds the resolved namespace so the password is neither repeated on
/// every call nor kept in shared state. Two scoped handles over the same
/// cache are independent.
///
/// ```rust
/// use shmcache_core::SharedCache;
///
/// let cache = SharedCache::open_in_memory()?;
/// let session = cache.scoped(Some("pw"))?;
/// session.save("token", &42u32)?;
///
/// assert_eq!(session.read::<u32>("token")?, Some(42));
/// assert_eq!(cache.read::<u32>("token", None)?, None);
/// # Ok::<(), shmcache_core::CacheError>(())
/// ```
#[derive(Debug)]
pub struct ScopedCache<'c> {
    cache: &'c SharedCache,
    scope: Scope,
}

impl<'c> ScopedCache<'c> {
    pub(crate) fn new(cache: &'c SharedCache, scope: Scope) -> Self {
        Self { cache, scope }
    }

    /// Returns the scope this handle is bound to.
    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Returns the namespace token, or `None` for the unprotected scope.
    pub fn token(&self) -> Option<&str> {
        self.scope.namespace().map(|ns| ns.token())
    }

    /// See [`SharedCache::save`].
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be encoded or stored.
    pub fn save<T: Serialize + ?Sized>(&self, name: &str, value: &T) -> CacheResult<SegmentId> {
        self.cache
            .save_in(&self.scope, name, value, self.cache.config().default_permissions)
    }

    /// See [`SharedCache::save_with_permissions`].
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be encoded or stored.
    pub fn save_with_permissions<T: Serialize + ?Sized>(
        &self,
        name: &str,
        value: &T,
        permissions: Permissions,
    ) -> CacheResult<SegmentId> {
        self.cache.save_in(&self.scope, name, value, permissions)
    }

    /// See [`SharedCache::read`].
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be read or decoded.
    pub fn read<T: DeserializeOwned>(&self, name: &str) -> CacheResult<Option<T>> {
        self.cache.read_in(&self.scope, name)
    }

    /// See [`SharedCache::contains`].
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be queried.
    pub fn contains(&self, name: &str) -> CacheResult<bool> {
        self.cache.contains_in(&self.scope, name)
    }

    /// See [`SharedCache::delete`].
    ///
    /// # Errors
    ///
    /// Returns an error if the store refuses the delete.
    pub fn delete(&self, name: &str) -> CacheResult<bool> {
        self.cache.delete_in(&self.scope, name)
    }

    /// See [`SharedCache::names`].
    ///
    /// # Errors
    ///
    /// Returns an error if a directory table cannot be read.
    pub fn names(&self) -> CacheResult<Vec<String>> {
        self.cache.names_in(&self.scope)
    }

    /// Destroys this handle's namespace.
    ///
    /// On the unprotected scope this destroys the whole cache, like
    /// [`SharedCache::destroy`] with no password.
    ///
    /// # Errors
    ///
    /// See [`SharedCache::destroy`].
    pub fn destroy(&self) -> CacheResult<DestroyOutcome> {
        self.cache.destroy_in(&self.scope)
    }
}
