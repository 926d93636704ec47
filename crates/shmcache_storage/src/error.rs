//! Error types for segment store operations.

use crate::types::SegmentId;
use std::io;
use std::time::Duration;
use thiserror::Error;

/// Result type for segment store operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during segment store operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The segment does not exist.
    #[error("segment {id} does not exist")]
    NotFound {
        /// The requested segment.
        id: SegmentId,
    },

    /// A segment with this id already exists.
    #[error("segment {id} already exists")]
    AlreadyExists {
        /// The conflicting segment.
        id: SegmentId,
    },

    /// The segment's permission bits forbid the operation.
    #[error("permission denied on segment {id}")]
    PermissionDenied {
        /// The protected segment.
        id: SegmentId,
    },

    /// The store has no room for the requested segment.
    #[error("capacity exceeded: requested {requested} bytes, {available} available")]
    CapacityExceeded {
        /// Bytes the caller tried to store.
        requested: usize,
        /// Bytes still free in the store.
        available: usize,
    },

    /// The segment id cannot be addressed by this store.
    #[error("invalid segment id {id}")]
    InvalidId {
        /// The rejected id.
        id: SegmentId,
    },

    /// The advisory lock could not be acquired in time.
    #[error("timed out after {waited:?} waiting for the store lock")]
    LockTimeout {
        /// How long the caller waited.
        waited: Duration,
    },
}

impl StorageError {
    /// Returns true if this error means the segment is absent.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Maps an I/O error on a specific segment to the matching variant.
    pub(crate) fn from_io(id: SegmentId, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Self::NotFound { id },
            io::ErrorKind::AlreadyExists => Self::AlreadyExists { id },
            io::ErrorKind::PermissionDenied => Self::PermissionDenied { id },
            _ => Self::Io(err),
        }
    }
}
