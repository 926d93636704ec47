//! Read-only summary of what a cache holds.

use crate::cache::SharedCache;
use crate::error::CacheResult;
use crate::table::{DirectoryTable, NamespaceTable};
use serde::Serialize;

/// Summary of a cache's directory tables and segments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheInventory {
    /// Whether the root table segment exists.
    pub initialized: bool,
    /// Unprotected names in the root table.
    pub root_names: usize,
    /// One summary per registered namespace, ordered by token.
    pub namespaces: Vec<NamespaceSummary>,
    /// Segments present in the store, referenced or not.
    pub segments: usize,
}

impl CacheInventory {
    /// Returns the number of names across the root table and every namespace.
    #[must_use]
    pub fn total_names(&self) -> usize {
        self.root_names + self.namespaces.iter().map(|ns| ns.names).sum::<usize>()
    }
}

/// One namespace as seen from the root table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NamespaceSummary {
    /// Namespace token.
    pub token: String,
    /// Segment id of the namespace table.
    pub table: u64,
    /// Names in the namespace table.
    pub names: usize,
    /// Whether the entry carries a password verifier.
    pub verified: bool,
}

impl SharedCache {
    /// Summarises the directory tables under the store lock.
    ///
    /// # Errors
    ///
    /// Returns an error if a table cannot be read or decoded.
    pub fn inventory(&self) -> CacheResult<CacheInventory> {
        self.locked(|dir| {
            let Some(root) = dir.load_root()? else {
                return Ok(CacheInventory {
                    segments: dir.segments().list()?.len(),
                    ..CacheInventory::default()
                });
            };

            let mut namespaces = Vec::new();
            for (token, entry) in root.namespaces() {
                let table: NamespaceTable = dir.load_or_default(entry.table_id())?;
                namespaces.push(NamespaceSummary {
                    token: token.to_string(),
                    table: entry.table,
                    names: table.entry_count(),
                    verified: entry.verifier.is_some(),
                });
            }

            Ok(CacheInventory {
                initialized: true,
                root_names: root.names().len(),
                namespaces,
                segments: dir.segments().list()?.len(),
            })
        })
    }
}
