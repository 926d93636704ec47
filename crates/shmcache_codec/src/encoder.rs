//! Value encoder.

use crate::envelope::{write_header, SegmentKind, HEADER_LEN};
use crate::error::{CodecError, CodecResult};
use serde::Serialize;

/// Encode any serde value to bare CBOR bytes.
///
/// # Errors
///
/// Returns an error if the value's `Serialize` implementation fails.
pub fn to_cbor<T: Serialize + ?Sized>(value: &T) -> CodecResult<Vec<u8>> {
    let mut buf = Vec::new();
    ciborium::into_writer(value, &mut buf).map_err(|e| CodecError::encoding_failed(e.to_string()))?;
    Ok(buf)
}

/// Encode a value as a complete segment: envelope header plus CBOR.
///
/// # Errors
///
/// Returns an error if the value cannot be serialized.
///
/// # Example
///
/// ```
/// use shmcache_codec::{decode, encode, SegmentKind};
///
/// let bytes = encode(SegmentKind::Value, &vec![1u32, 2, 3]).unwrap();
/// let back: Vec<u32> = decode(SegmentKind::Value, &bytes).unwrap();
/// assert_eq!(back, vec![1, 2, 3]);
/// ```
pub fn encode<T: Serialize + ?Sized>(kind: SegmentKind, value: &T) -> CodecResult<Vec<u8>> {
    let mut buf = Vec::with_capacity(HEADER_LEN + 32);
    write_header(&mut buf, kind);
    ciborium::into_writer(value, &mut buf).map_err(|e| CodecError::encoding_failed(e.to_string()))?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::ser::{Error as _, Serializer};

    struct Unserializable;

    impl Serialize for Unserializable {
        fn serialize<S: Serializer>(&self, _serializer: S) -> Result<S::Ok, S::Error> {
            Err(S::Error::custom("refused"))
        }
    }

    #[test]
    fn encode_prefixes_header() {
        let bytes = encode(SegmentKind::Value, &0u8).unwrap();
        assert_eq!(&bytes[..6], b"SHMC\x01\x01");
        assert_eq!(&bytes[6..], &[0x00]);
    }

    #[test]
    fn to_cbor_small_integer() {
        assert_eq!(to_cbor(&23u32).unwrap(), vec![0x17]);
        assert_eq!(to_cbor(&24u32).unwrap(), vec![0x18, 0x18]);
    }

    #[test]
    fn to_cbor_text() {
        assert_eq!(to_cbor("abc").unwrap(), vec![0x63, b'a', b'b', b'c']);
    }

    #[test]
    fn serializer_failure_surfaces() {
        let result = encode(SegmentKind::Value, &Unserializable);
        assert!(matches!(result, Err(CodecError::EncodingFailed { .. })));
    }
}
