//! Value decoder.

use crate::envelope::{split_envelope, SegmentKind};
use crate::error::{CodecError, CodecResult};
use serde::de::DeserializeOwned;

/// Decode a value from bare CBOR bytes.
///
/// # Errors
///
/// Returns an error if the bytes are not valid CBOR for `T`, or if
/// anything follows the first CBOR item.
pub fn from_cbor<T: DeserializeOwned>(bytes: &[u8]) -> CodecResult<T> {
    let mut rest = bytes;
    let value = ciborium::from_reader(&mut rest).map_err(|e| CodecError::decoding_failed(e.to_string()))?;
    if !rest.is_empty() {
        return Err(CodecError::decoding_failed(format!(
            "{} trailing bytes after value",
            rest.len()
        )));
    }
    Ok(value)
}

/// Decode a complete segment, checking that it holds `expected`.
///
/// # Errors
///
/// Returns an error if the envelope is invalid, the kind differs from
/// `expected`, or the payload does not decode as `T`.
pub fn decode<T: DeserializeOwned>(expected: SegmentKind, bytes: &[u8]) -> CodecResult<T> {
    let (found, payload) = split_envelope(bytes)?;
    if found != expected {
        return Err(CodecError::KindMismatch { expected, found });
    }
    from_cbor(payload)
}
