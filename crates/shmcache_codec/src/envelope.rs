//! Segment envelope.
//!
//! Every segment written by the cache starts with a fixed header:
//!
//! ```text
//! | magic "SHMC" (4) | version (1) | kind (1) | CBOR payload (N) |
//! ```
//!
//! The kind tag keeps directory tables and user values apart, so a
//! value segment is never decoded as a table or the other way round.

use crate::error::{CodecError, CodecResult};
use std::fmt;

/// Magic bytes at the start of every segment.
pub const MAGIC: [u8; 4] = *b"SHMC";

/// Current envelope format version.
pub const FORMAT_VERSION: u8 = 1;

/// Length of the envelope header in bytes.
pub const HEADER_LEN: usize = 6;

/// What a segment holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SegmentKind {
    /// A user value.
    Value = 1,
    /// The root directory table.
    RootTable = 2,
    /// A password namespace's directory table.
    NamespaceTable = 3,
}

impl SegmentKind {
    /// Returns the tag byte stored in the header.
    #[must_use]
    pub const fn tag(self) -> u8 {
        self as u8
    }

    /// Parses a tag byte.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::UnknownKind`] for unassigned tags.
    pub fn from_tag(tag: u8) -> CodecResult<Self> {
        match tag {
            1 => Ok(Self::Value),
            2 => Ok(Self::RootTable),
            3 => Ok(Self::NamespaceTable),
            _ => Err(CodecError::UnknownKind { tag }),
        }
    }

    /// Returns true for both kinds of directory table.
    #[must_use]
    pub const fn is_table(self) -> bool {
        matches!(self, Self::RootTable | Self::NamespaceTable)
    }
}

impl fmt::Display for SegmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Value => "value",
            Self::RootTable => "root table",
            Self::NamespaceTable => "namespace table",
        };
        f.write_str(name)
    }
}

/// Writes the envelope header for `kind` into `buf`.
pub(crate) fn write_header(buf: &mut Vec<u8>, kind: SegmentKind) {
    buf.extend_from_slice(&MAGIC);
    buf.push(FORMAT_VERSION);
    buf.push(kind.tag());
}

/// Validates the header and splits off the payload.
///
/// # Errors
///
/// Returns an error if the bytes are too short, carry the wrong magic,
/// a newer version, or an unknown kind.
pub fn split_envelope(bytes: &[u8]) -> CodecResult<(SegmentKind, &[u8])> {
    if bytes.len() < HEADER_LEN {
        return Err(CodecError::Truncated { len: bytes.len() });
    }

    let mut magic = [0u8; 4];
    magic.copy_from_slice(&bytes[0..4]);
    if magic != MAGIC {
        return Err(CodecError::BadMagic { found: magic });
    }

    let version = bytes[4];
    if version > FORMAT_VERSION {
        return Err(CodecError::UnsupportedVersion { version });
    }

    let kind = SegmentKind::from_tag(bytes[5])?;
    Ok((kind, &bytes[HEADER_LEN..]))
}

/// Returns the kind recorded in a segment's header.
///
/// # Errors
///
/// Returns an error if the header is invalid.
pub fn peek_kind(bytes: &[u8]) -> CodecResult<SegmentKind> {
    split_envelope(bytes).map(|(kind, _)| kind)
}
