//! Per-handle operation counters.
//!
//! Counters are local to one [`crate::SharedCache`] handle, not shared
//! through the segment store. They are atomic and may be read while
//! operations are running.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Operation counters for one cache handle.
#[derive(Debug, Default)]
pub struct CacheMetrics {
    saves: AtomicU64,
    reads: AtomicU64,
    hits: AtomicU64,
    deletes: AtomicU64,
    destroys: AtomicU64,
    bytes_written: AtomicU64,
    bytes_read: AtomicU64,
    segments_removed: AtomicU64,
    teardown_failures: AtomicU64,
    errors: AtomicU64,
}

impl CacheMetrics {
    /// Creates zeroed counters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_save(&self, bytes: usize) {
        self.saves.fetch_add(1, Ordering::Relaxed);
        self.bytes_written.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    /// Records a read; `bytes` is `None` on a miss.
    pub(crate) fn record_read(&self, bytes: Option<usize>) {
        self.reads.fetch_add(1, Ordering::Relaxed);
        if let Some(bytes) = bytes {
            self.hits.fetch_add(1, Ordering::Relaxed);
            self.bytes_read.fetch_add(bytes as u64, Ordering::Relaxed);
        }
    }

    pub(crate) fn record_delete(&self) {
        self.deletes.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_destroy(&self, removed: usize, failed: usize) {
        self.destroys.fetch_add(1, Ordering::Relaxed);
        self.segments_removed.fetch_add(removed as u64, Ordering::Relaxed);
        self.teardown_failures.fetch_add(failed as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns the number of successful saves.
    pub fn saves(&self) -> u64 {
        self.saves.load(Ordering::Relaxed)
    }

    /// Returns the number of reads, hits and misses alike.
    pub fn reads(&self) -> u64 {
        self.reads.load(Ordering::Relaxed)
    }

    /// Returns the number of reads that found a value.
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Returns the number of deletes that removed a name.
    pub fn deletes(&self) -> u64 {
        self.deletes.load(Ordering::Relaxed)
    }

    /// Returns the number of destroys that found something to remove.
    pub fn destroys(&self) -> u64 {
        self.destroys.load(Ordering::Relaxed)
    }

    /// Returns the encoded bytes written by saves.
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written.load(Ordering::Relaxed)
    }

    /// Returns the encoded bytes returned by reads.
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read.load(Ordering::Relaxed)
    }

    /// Returns the segments removed by destroys.
    pub fn segments_removed(&self) -> u64 {
        self.segments_removed.load(Ordering::Relaxed)
    }

    /// Returns the segments a destroy failed to remove.
    pub fn teardown_failures(&self) -> u64 {
        self.teardown_failures.load(Ordering::Relaxed)
    }

    /// Returns the number of operations that returned an error.
    pub fn errors(&self) -> u64 {
        self.errors.load(Ordering::Relaxed)
    }

    /// Returns a snapshot of all counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            saves: self.saves(),
            reads: self.reads(),
            hits: self.hits(),
            deletes: self.deletes(),
            destroys: self.destroys(),
            bytes_written: self.bytes_written(),
            bytes_read: self.bytes_read(),
            segments_removed: self.segments_removed(),
            teardown_failures: self.teardown_failures(),
            errors: self.errors(),
        }
    }
}

/// Plain copy of [`CacheMetrics`] at one point in time.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct MetricsSnapshot {
    /// Successful saves.
    pub saves: u64,
    /// Reads, hits and misses alike.
    pub reads: u64,
    /// Reads that found a value.
    pub hits: u64,
    /// Deletes that removed a name.
    pub deletes: u64,
    /// Destroys that found something to remove.
    pub destroys: u64,
    /// Encoded bytes written.
    pub bytes_written: u64,
    /// Encoded bytes read.
    pub bytes_read: u64,
    /// Segments removed by destroys.
    pub segments_removed: u64,
    /// Segments destroys failed to remove.
    pub teardown_failures: u64,
    /// Operations that returned an error.
    pub errors: u64,
}

impl MetricsSnapshot {
    /// Returns reads that found nothing.
    #[must_use]
    pub const fn misses(&self) -> u64 {
        self.reads.saturating_sub(self.hits)
    }
}
