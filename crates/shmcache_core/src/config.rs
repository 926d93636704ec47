//! Cache configuration.

use crate::error::{CacheError, CacheResult};
use crate::hash::HashAlgorithm;
use shmcache_storage::Permissions;
use std::time::Duration;

/// Configuration for opening a cache.
#[derive(Debug, Clone)]
pub struct Config {
    /// Permission bits for value segments when a save does not give any.
    pub default_permissions: Permissions,

    /// Permission bits for directory table segments.
    pub table_permissions: Permissions,

    /// Whether to hold the store's advisory lock around every operation.
    ///
    /// Turning this off exposes directory tables to lost updates when
    /// several processes write concurrently.
    pub locking: bool,

    /// How long to wait for the advisory lock.
    pub lock_timeout: Duration,

    /// Maximum number of ids the allocator probes before giving up.
    pub max_probe: u64,

    /// Whether to store and check a salted password verifier per namespace.
    pub verify_namespaces: bool,

    /// Whether `destroy()` also sweeps values inside namespace tables.
    ///
    /// Off by default: only segments listed directly in the root table
    /// are removed.
    pub deep_destroy: bool,

    /// Hash function turning passwords into namespace tokens.
    pub hash: HashAlgorithm,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_permissions: Permissions::DEFAULT,
            table_permissions: Permissions::DEFAULT,
            locking: true,
            lock_timeout: Duration::from_secs(5),
            max_probe: 1 << 20,
            verify_namespaces: true,
            deep_destroy: false,
            hash: HashAlgorithm::Sha256,
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the default value permissions.
    #[must_use]
    pub const fn default_permissions(mut self, permissions: Permissions) -> Self {
        self.default_permissions = permissions;
        self
    }

    /// Sets the directory table permissions.
    #[must_use]
    pub const fn table_permissions(mut self, permissions: Permissions) -> Self {
        self.table_permissions = permissions;
        self
    }

    /// Sets whether operations take the advisory lock.
    #[must_use]
    pub const fn locking(mut self, value: bool) -> Self {
        self.locking = value;
        self
    }

    /// Sets the advisory lock timeout.
    #[must_use]
    pub const fn lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    /// Sets the allocator probe limit.
    #[must_use]
    pub const fn max_probe(mut self, limit: u64) -> Self {
        self.max_probe = limit;
        self
    }

    /// Sets whether namespaces carry a password verifier.
    #[must_use]
    pub const fn verify_namespaces(mut self, value: bool) -> Self {
        self.verify_namespaces = value;
        self
    }

    /// Sets whether `destroy()` sweeps namespace contents too.
    #[must_use]
    pub const fn deep_destroy(mut self, value: bool) -> Self {
        self.deep_destroy = value;
        self
    }

    /// Sets the namespace hash function.
    #[must_use]
    pub const fn hash(mut self, hash: HashAlgorithm) -> Self {
        self.hash = hash;
        self
    }

    /// Checks the configuration for unusable values.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Config`] if the probe limit is zero, or if
    /// locking is on with a zero timeout.
    pub fn validate(&self) -> CacheResult<()> {
        if self.max_probe == 0 {
            return Err(CacheError::config("max_probe must be at least 1"));
        }
        if self.locking && self.lock_timeout.is_zero() {
            return Err(CacheError::config(
                "lock_timeout must be non-zero when locking is enabled",
            ));
        }
        if !self.table_permissions.owner_can_read() || !self.table_permissions.owner_can_write() {
            return Err(CacheError::config(format!(
                "table permissions {} must let the owner read and write",
                self.table_permissions
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert!(config.locking);
        assert!(config.verify_namespaces);
        assert!(!config.deep_destroy);
        assert_eq!(config.default_permissions, Permissions::DEFAULT);
        assert_eq!(config.hash, HashAlgorithm::Sha256);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn builder_pattern() {
        let config = Config::new()
            .locking(false)
            .max_probe(16)
            .deep_destroy(true)
            .hash(HashAlgorithm::Crc32);

        assert!(!config.locking);
        assert_eq!(config.max_probe, 16);
        assert!(config.deep_destroy);
        assert_eq!(config.hash, HashAlgorithm::Crc32);
    }

    #[test]
    fn zero_probe_rejected() {
        let result = Config::new().max_probe(0).validate();
        assert!(matches!(result, Err(CacheError::Config { .. })));
    }

    #[test]
    fn zero_timeout_only_matters_with_locking() {
        let config = Config::new().lock_timeout(Duration::ZERO);
        assert!(config.validate().is_err());
        assert!(config.locking(false).validate().is_ok());
    }

    #[test]
    fn read_only_tables_rejected() {
        let config = Config::new().table_permissions(Permissions::READ_ONLY);
        assert!(matches!(config.validate(), Err(CacheError::Config { .. })));
    }
}
