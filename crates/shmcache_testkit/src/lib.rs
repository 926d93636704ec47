//! # shmcache testkit
//!
//! Test utilities for shmcache.
//!
//! This crate provides:
//! - Test fixtures over in-memory stores and temporary segment directories
//! - Property-based test generators using proptest
//! - A model-checking harness that runs operations against a cache and a
//!   plain map in lockstep
//! - Stress helpers for many handles sharing one segment directory
//!
//! ## Usage
//!
//! ```rust
//! use shmcache_testkit::prelude::*;
//!
//! with_temp_cache(|cache| {
//!     cache.save("k", &"v", Some("pw")).unwrap();
//!     assert!(cache.contains("k", Some("pw")).unwrap());
//! });
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod integration;
pub mod stress;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::integration::*;
    pub use crate::stress::*;
}

pub use fixtures::*;
pub use generators::*;
pub use integration::*;
pub use stress::*;
