//! # shmcache core
//!
//! A named key-value cache whose values, and whose index of names, live
//! in segments of a shared [`SegmentStore`].
//!
//! This crate provides:
//! - [`SharedCache`]: save, read, delete and destroy by name
//! - password namespaces, resolved to tokens by a [`NamespaceHasher`]
//!   and guarded by a salted verifier
//! - directory tables (a [`RootTable`] at segment `1` and one
//!   [`NamespaceTable`] per namespace) and the id [`Allocator`]
//! - best-effort teardown reported through [`DestroyOutcome`]
//! - [`SharedCache::inventory`] and [`SharedCache::verify`] for tooling
//!
//! Values are encoded as CBOR inside a tagged segment envelope, see
//! `shmcache_codec`.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod allocator;
mod cache;
mod config;
mod destroy;
mod directory;
mod error;
mod hash;
mod inventory;
mod metrics;
mod namespace;
mod scoped;
mod table;
mod verify;

pub use allocator::Allocator;
pub use cache::SharedCache;
pub use config::Config;
pub use destroy::{DestroyOutcome, DestroyReport};
pub use directory::Directory;
pub use error::{CacheError, CacheResult};
pub use hash::{Crc32Hasher, HashAlgorithm, NamespaceHasher, Sha256Hasher};
pub use inventory::{CacheInventory, NamespaceSummary};
pub use metrics::{CacheMetrics, MetricsSnapshot};
pub use namespace::{Namespace, Scope, Verifier};
pub use scoped::ScopedCache;
pub use table::{DirectoryTable, NamespaceEntry, NamespaceTable, RootTable, TableRef, ROOT_TABLE_ID};
pub use verify::{Finding, VerifyReport};

pub use shmcache_storage::{Permissions, SegmentId, SegmentStore};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
