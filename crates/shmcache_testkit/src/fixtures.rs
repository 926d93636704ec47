//! Test fixtures and cache helpers.
//!
//! Provides ready-made caches over an in-memory store or a temporary
//! segment directory, plus hashers for forcing namespace collisions.

use shmcache_core::{Config, NamespaceHasher, SharedCache};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

/// A test cache with automatic cleanup.
pub struct TestCache {
    /// The cache handle.
    pub cache: SharedCache,
    config: Config,
    temp_dir: Option<TempDir>,
}

impl TestCache {
    /// Creates a cache over a fresh in-memory store.
    pub fn memory() -> Self {
        Self::memory_with_config(Config::default())
    }

    /// Creates an in-memory cache with custom configuration.
    pub fn memory_with_config(config: Config) -> Self {
        let store = shmcache_storage::InMemorySegmentStore::new();
        Self {
            cache: SharedCache::with_store(store, config.clone()).expect("Failed to open in-memory cache"),
            config,
            temp_dir: None,
        }
    }

    /// Creates a cache over a fresh temporary segment directory.
    pub fn file() -> Self {
        Self::file_with_config(Config::default())
    }

    /// Creates a file-backed cache with custom configuration.
    pub fn file_with_config(config: Config) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let cache = SharedCache::open_with_config(temp_dir.path(), config.clone())
            .expect("Failed to open file cache");
        Self {
            cache,
            config,
            temp_dir: Some(temp_dir),
        }
    }

    /// Returns the segment directory if file-backed, `None` if in-memory.
    pub fn path(&self) -> Option<&Path> {
        self.temp_dir.as_ref().map(TempDir::path)
    }

    /// Opens another handle on the same segment directory.
    ///
    /// # Panics
    ///
    /// Panics for in-memory caches, which cannot be shared.
    pub fn reopen(&self) -> SharedCache {
        let path = self.path().expect("Only file caches can be reopened");
        SharedCache::open_with_config(path, self.config.clone()).expect("Failed to reopen cache")
    }

    /// Replaces the namespace hasher on this handle.
    #[must_use]
    pub fn with_hasher(self, hasher: Arc<dyn NamespaceHasher>) -> Self {
        let Self {
            cache,
            config,
            temp_dir,
        } = self;
        Self {
            cache: cache.with_hasher(hasher),
            config,
            temp_dir,
        }
    }
}

impl std::ops::Deref for TestCache {
    type Target = SharedCache;

    fn deref(&self) -> &Self::Target {
        &self.cache
    }
}

/// Runs a test with a temporary in-memory cache.
///
/// # Example
///
/// ```rust
/// use shmcache_testkit::with_temp_cache;
///
/// with_temp_cache(|cache| {
///     cache.save("k", &1u32, None).unwrap();
///     assert_eq!(cache.read::<u32>("k", None).unwrap(), Some(1));
/// });
/// ```
pub fn with_temp_cache<F, R>(f: F) -> R
where
    F: FnOnce(&SharedCache) -> R,
{
    let test_cache = TestCache::memory();
    f(&test_cache.cache)
}

/// Runs a test with a cache over a temporary segment directory.
pub fn with_file_cache<F, R>(f: F) -> R
where
    F: FnOnce(&SharedCache, &Path) -> R,
{
    let test_cache = TestCache::file();
    let path = test_cache.path().expect("File cache should have a path");
    f(&test_cache.cache, path)
}

/// A hasher that maps every password to the same digest.
///
/// Any two passwords collide, which makes the verifier observable.
#[derive(Debug, Clone, Copy, Default)]
pub struct CollidingHasher;

impl NamespaceHasher for CollidingHasher {
    fn name(&self) -> &str {
        "colliding"
    }

    fn digest(&self, _password: &[u8]) -> Vec<u8> {
        vec![0x42]
    }
}

/// Test scenario helpers.
pub mod scenarios {
    use super::*;

    /// Creates a cache with `count` plain names `key-0..` holding their index.
    pub fn populated_cache(count: usize) -> TestCache {
        let test_cache = TestCache::memory();
        for i in 0..count {
            test_cache
                .save(&format!("key-{i}"), &i, None)
                .expect("Failed to save value");
        }
        test_cache
    }

    /// Creates a cache with one name `"value"` in each of `passwords`.
    pub fn multi_namespace_cache(passwords: &[&str]) -> TestCache {
        let test_cache = TestCache::memory();
        for (i, password) in passwords.iter().copied().enumerate() {
            test_cache
                .save("value", &i, Some(password))
                .expect("Failed to save value");
        }
        test_cache
    }
}
