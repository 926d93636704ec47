//! Error types for the codec crate.

use crate::envelope::SegmentKind;
use thiserror::Error;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors that can occur during encoding or decoding.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Failed to encode value to CBOR.
    #[error("encoding failed: {message}")]
    EncodingFailed {
        /// Description of the encoding error.
        message: String,
    },

    /// Failed to decode CBOR bytes.
    #[error("decoding failed: {message}")]
    DecodingFailed {
        /// Description of the decoding error.
        message: String,
    },

    /// The segment is shorter than the envelope header.
    #[error("segment truncated: {len} bytes")]
    Truncated {
        /// Actual length of the segment.
        len: usize,
    },

    /// The segment was not written by shmcache.
    #[error("bad segment magic: {found:02x?}")]
    BadMagic {
        /// The first four bytes found.
        found: [u8; 4],
    },

    /// The envelope format version is newer than this build understands.
    #[error("unsupported segment format version: {version}")]
    UnsupportedVersion {
        /// The version byte found.
        version: u8,
    },

    /// The envelope carries an unknown kind tag.
    #[error("unknown segment kind tag: {tag}")]
    UnknownKind {
        /// The tag byte found.
        tag: u8,
    },

    /// The segment holds a different kind of entity than expected.
    #[error("expected {expected} segment, found {found}")]
    KindMismatch {
        /// The kind the caller asked for.
        expected: SegmentKind,
        /// The kind stored in the segment.
        found: SegmentKind,
    },
}

impl CodecError {
    /// Create an encoding failed error.
    pub fn encoding_failed(message: impl Into<String>) -> Self {
        Self::EncodingFailed {
            message: message.into(),
        }
    }

    /// Create a decoding failed error.
    pub fn decoding_failed(message: impl Into<String>) -> Self {
        Self::DecodingFailed {
            message: message.into(),
        }
    }
}
