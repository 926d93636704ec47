//! # shmcache Codec
//!
//! Value codec for shmcache.
//!
//! Cached values and directory tables are both serialized with serde
//! into CBOR and wrapped in a small envelope that records what the
//! segment holds:
//!
//! - Any `Serialize` value can be stored; any `DeserializeOwned` type
//!   can be read back
//! - Round-trips are exact for every type serde can represent in CBOR
//! - The envelope rejects foreign segments and kind confusion
//!
//! ## Usage
//!
//! ```
//! use shmcache_codec::{decode, encode, SegmentKind};
//! use std::collections::BTreeMap;
//!
//! let mut table = BTreeMap::new();
//! table.insert("answer".to_string(), 42u64);
//!
//! let bytes = encode(SegmentKind::Value, &table).unwrap();
//! let decoded: BTreeMap<String, u64> = decode(SegmentKind::Value, &bytes).unwrap();
//! assert_eq!(table, decoded);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod decoder;
mod encoder;
mod envelope;
mod error;

pub use decoder::{decode, from_cbor};
pub use encoder::{encode, to_cbor};
pub use envelope::{peek_kind, split_envelope, SegmentKind, FORMAT_VERSION, HEADER_LEN, MAGIC};
pub use error::{CodecError, CodecResult};
