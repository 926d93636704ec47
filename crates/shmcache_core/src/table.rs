//! Directory tables.
//!
//! A directory table maps names to segment ids and is itself stored in a
//! segment. There are two kinds:
//!
//! - the [`RootTable`] at [`ROOT_TABLE_ID`], holding unprotected names
//!   and one [`NamespaceEntry`] per password namespace
//! - one [`NamespaceTable`] per namespace, holding that namespace's names
//!
//! Names and namespace tokens live in separate maps of the root table, so
//! a value id is never mistaken for a table id.

use crate::namespace::Verifier;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use shmcache_codec::SegmentKind;
use shmcache_storage::SegmentId;
use std::collections::BTreeMap;

/// Segment id of the root directory table. Never handed out for anything else.
pub const ROOT_TABLE_ID: SegmentId = SegmentId::new(1);

/// Which directory table an operation addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableRef {
    /// The root table.
    Root,
    /// The namespace table stored at this id.
    Namespace(SegmentId),
}

impl TableRef {
    /// Returns the segment holding this table.
    #[must_use]
    pub const fn segment(self) -> SegmentId {
        match self {
            Self::Root => ROOT_TABLE_ID,
            Self::Namespace(id) => id,
        }
    }

    /// Returns the base the allocation cursor is computed from.
    ///
    /// `1` for the root table, the table's own id for a namespace.
    #[must_use]
    pub const fn allocation_base(self) -> u64 {
        self.segment().as_u64()
    }
}

/// Behaviour shared by both kinds of directory table.
pub trait DirectoryTable: Serialize + DeserializeOwned + Default {
    /// Envelope kind of segments holding this table.
    const KIND: SegmentKind;

    /// Name -> value segment id.
    fn names(&self) -> &BTreeMap<String, u64>;

    /// Mutable access to the name map.
    fn names_mut(&mut self) -> &mut BTreeMap<String, u64>;

    /// Number of entries of any kind, as used by the allocation cursor.
    fn entry_count(&self) -> usize {
        self.names().len()
    }

    /// Returns true if any entry points at `id`.
    fn references(&self, id: SegmentId) -> bool {
        self.names().values().any(|&v| v == id.as_u64())
    }

    /// Looks up a name.
    fn lookup(&self, name: &str) -> Option<SegmentId> {
        self.names().get(name).copied().map(SegmentId::new)
    }
}

/// The namespace table registered under one password token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamespaceEntry {
    /// Segment holding the namespace table.
    pub table: u64,
    /// Salted password verifier, absent if written with verification off.
    #[serde(default)]
    pub verifier: Option<Verifier>,
}

impl NamespaceEntry {
    /// Returns the namespace table's segment id.
    #[must_use]
    pub const fn table_id(&self) -> SegmentId {
        SegmentId::new(self.table)
    }
}

/// The root directory table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootTable {
    #[serde(default)]
    names: BTreeMap<String, u64>,
    #[serde(default)]
    namespaces: BTreeMap<String, NamespaceEntry>,
}

impl RootTable {
    /// Returns the namespace registered under `token`.
    #[must_use]
    pub fn namespace(&self, token: &str) -> Option<&NamespaceEntry> {
        self.namespaces.get(token)
    }

    /// Iterates over all namespaces as `(token, entry)`.
    pub fn namespaces(&self) -> impl Iterator<Item = (&str, &NamespaceEntry)> {
        self.namespaces.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Registers a namespace.
    pub fn insert_namespace(&mut self, token: impl Into<String>, entry: NamespaceEntry) {
        self.namespaces.insert(token.into(), entry);
    }

    /// Unregisters a namespace.
    pub fn remove_namespace(&mut self, token: &str) -> Option<NamespaceEntry> {
        self.namespaces.remove(token)
    }

    /// Every segment the root table references directly, values first.
    #[must_use]
    pub fn referenced_segments(&self) -> Vec<SegmentId> {
        self.names
            .values()
            .copied()
            .chain(self.namespaces.values().map(|e| e.table))
            .map(SegmentId::new)
            .collect()
    }

    /// Returns true if the table has no entries of either kind.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty() && self.namespaces.is_empty()
    }
}

impl DirectoryTable for RootTable {
    const KIND: SegmentKind = SegmentKind::RootTable;

    fn names(&self) -> &BTreeMap<String, u64> {
        &self.names
    }

    fn names_mut(&mut self) -> &mut BTreeMap<String, u64> {
        &mut self.names
    }

    fn entry_count(&self) -> usize {
        self.names.len() + self.namespaces.len()
    }

    fn references(&self, id: SegmentId) -> bool {
        let raw = id.as_u64();
        self.names.values().any(|&v| v == raw) || self.namespaces.values().any(|e| e.table == raw)
    }
}

/// A password namespace's directory table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamespaceTable {
    #[serde(default)]
    names: BTreeMap<String, u64>,
}

impl NamespaceTable {
    /// Every value segment listed in the table.
    #[must_use]
    pub fn value_segments(&self) -> Vec<SegmentId> {
        self.names.values().copied().map(SegmentId::new).collect()
    }
}

impl DirectoryTable for NamespaceTable {
    const KIND: SegmentKind = SegmentKind::NamespaceTable;

    fn names(&self) -> &BTreeMap<String, u64> {
        &self.names
    }

    fn names_mut(&mut self) -> &mut BTreeMap<String, u64> {
        &mut self.names
    }
}
