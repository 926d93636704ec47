//! # shmcache Storage
//!
//! Segment store trait and implementations for shmcache.
//!
//! This crate provides the lowest-level abstraction the cache sits on:
//! a flat space of **segments** addressed by non-negative integer ids.
//! A segment store does not interpret the bytes it holds.
//!
//! ## Design Principles
//!
//! - A segment is read and written whole; there is no in-place resize
//! - Writing an existing id is delete-then-recreate
//! - Atomicity holds per call only, never across calls
//! - Stores expose an advisory lock so callers can serialise
//!   read-modify-write sequences across threads and processes
//!
//! ## Available Stores
//!
//! - [`InMemorySegmentStore`] - For testing and single-process caches
//! - [`FileSegmentStore`] - One file per segment, normally under `/dev/shm`
//!
//! ## Example
//!
//! ```rust
//! use shmcache_storage::{InMemorySegmentStore, Permissions, SegmentId, SegmentStore};
//!
//! let store = InMemorySegmentStore::new();
//! let id = SegmentId::new(7);
//! store.write(id, b"hello world", Permissions::DEFAULT).unwrap();
//! assert_eq!(store.read(id).unwrap(), b"hello world");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod file;
mod lock;
mod memory;
mod store;
mod types;

pub use error::{StorageError, StorageResult};
pub use file::FileSegmentStore;
pub use lock::StoreLock;
pub use memory::InMemorySegmentStore;
pub use store::SegmentStore;
pub use types::{Permissions, SegmentId};
