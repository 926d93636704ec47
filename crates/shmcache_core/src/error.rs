//! Error types for shmcache core.

use shmcache_storage::{SegmentId, StorageError};
use std::time::Duration;
use thiserror::Error;

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Errors that can occur in cache operations.
///
/// Absent names and namespaces are not errors: reads return `Ok(None)`,
/// deletes return `Ok(false)` and destroys report
/// [`crate::DestroyOutcome::NothingToDestroy`].
#[derive(Debug, Error)]
pub enum CacheError {
    /// Segment store error.
    #[error("storage error: {0}")]
    Storage(#[source] StorageError),

    /// Value codec error.
    #[error("codec error: {0}")]
    Codec(#[from] shmcache_codec::CodecError),

    /// Invalid configuration or argument, raised before any segment I/O.
    #[error("configuration error: {message}")]
    Config {
        /// Description of the problem.
        message: String,
    },

    /// The store lock could not be acquired in time.
    #[error("cache locked: gave up after {waited:?}")]
    LockTimeout {
        /// How long the caller waited.
        waited: Duration,
    },

    /// The allocator found no free segment id within its probe limit.
    #[error("no free segment id within {probed} ids of {start}")]
    AllocationExhausted {
        /// Where the probe started.
        start: SegmentId,
        /// How many ids were probed.
        probed: u64,
    },

    /// A different password owns the namespace this password hashes to.
    #[error("namespace {token} belongs to a different password")]
    NamespaceCollision {
        /// The colliding namespace token.
        token: String,
    },
}

impl From<StorageError> for CacheError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::LockTimeout { waited } => Self::LockTimeout { waited },
            other => Self::Storage(other),
        }
    }
}

impl CacheError {
    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Returns true if the underlying segment store refused the operation.
    #[must_use]
    pub fn is_storage(&self) -> bool {
        matches!(self, Self::Storage(_))
    }
}
