//! Segment id allocation.
//!
//! New ids are found by probing upward from a cursor derived from the
//! table being extended:
//!
//! ```text
//! start = entry_count + allocation_base + 1
//! ```
//!
//! where `allocation_base` is `1` for the root table and the namespace
//! table's own id otherwise. The first id that is not reserved, not
//! already referenced by the table, and absent from the store wins.
//! There is no persisted counter.

use crate::error::{CacheError, CacheResult};
use crate::table::{DirectoryTable, TableRef, ROOT_TABLE_ID};
use shmcache_storage::{SegmentId, SegmentStore};
use tracing::debug;

/// Probes a segment store for unused ids.
pub struct Allocator<'a> {
    store: &'a dyn SegmentStore,
    max_probe: u64,
}

impl<'a> Allocator<'a> {
    /// Creates an allocator over `store` probing at most `max_probe` ids.
    pub fn new(store: &'a dyn SegmentStore, max_probe: u64) -> Self {
        Self { store, max_probe }
    }

    /// Returns the first id to probe for a new entry of `table`.
    #[must_use]
    pub fn cursor(table: TableRef, entry_count: usize) -> SegmentId {
        let count = u64::try_from(entry_count).unwrap_or(u64::MAX);
        SegmentId::new(
            count
                .saturating_add(table.allocation_base())
                .saturating_add(1),
        )
    }

    /// Finds a fresh id for a new entry of `table`.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::AllocationExhausted`] if no id within the
    /// probe limit is free, or a storage error if the store cannot say
    /// whether an id is taken. Storage errors are never skipped over.
    pub fn allocate<T: DirectoryTable>(&self, table: TableRef, contents: &T) -> CacheResult<SegmentId> {
        let start = Self::cursor(table, contents.entry_count());
        let mut id = start;

        for probed in 0..self.max_probe {
            if id != ROOT_TABLE_ID && !contents.references(id) && !self.store.exists(id)? {
                debug!(%id, %start, probed, "allocated segment id");
                return Ok(id);
            }
            if id.as_u64() == u64::MAX {
                break;
            }
            id = id.next();
        }

        Err(CacheError::AllocationExhausted {
            start,
            probed: self.max_probe,
        })
    }
}
