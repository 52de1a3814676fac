//! Conversion between user values and the canonical bytes the storage engine
//! hashes.
//!
//! The map stores and hashes opaque byte strings; what those bytes mean is up
//! to the user. A [`ValueSerializer`] is injected into the validator so that
//! a proof carrying value bytes can hand the caller a typed value. The
//! standard implementations below cover the common codecs; anything else
//! plugs in by implementing the trait.

use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt;

/// Error returned when stored bytes do not decode to a value of the expected
/// type.
///
/// Proof producers only emit bytes they themselves serialized, so hitting
/// this during validation of a hash-checked proof means the producer and the
/// consumer disagree on the value type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidValueBytes(pub String);

impl fmt::Display for InvalidValueBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid value bytes: {}", self.0)
    }
}

/// A two-way codec between a user value type and canonical bytes.
pub trait ValueSerializer {
    /// The user value type.
    type Value;

    /// Serialize a value to the canonical bytes the storage engine hashes.
    fn to_bytes(&self, value: &Self::Value) -> Vec<u8>;

    /// Decode a value from stored bytes.
    fn from_bytes(&self, bytes: &[u8]) -> Result<Self::Value, InvalidValueBytes>;
}

/// UTF-8 string codec.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringSerializer;

impl ValueSerializer for StringSerializer {
    type Value = String;

    fn to_bytes(&self, value: &String) -> Vec<u8> {
        value.as_bytes().to_vec()
    }

    fn from_bytes(&self, bytes: &[u8]) -> Result<String, InvalidValueBytes> {
        core::str::from_utf8(bytes)
            .map(ToString::to_string)
            .map_err(|e| InvalidValueBytes(e.to_string()))
    }
}

/// Identity codec for raw byte values.
#[derive(Debug, Clone, Copy, Default)]
pub struct BytesSerializer;

impl ValueSerializer for BytesSerializer {
    type Value = Vec<u8>;

    fn to_bytes(&self, value: &Vec<u8>) -> Vec<u8> {
        value.clone()
    }

    fn from_bytes(&self, bytes: &[u8]) -> Result<Vec<u8>, InvalidValueBytes> {
        Ok(bytes.to_vec())
    }
}

/// Fixed-width little-endian codec for `u64` values.
#[derive(Debug, Clone, Copy, Default)]
pub struct U64Serializer;

impl ValueSerializer for U64Serializer {
    type Value = u64;

    fn to_bytes(&self, value: &u64) -> Vec<u8> {
        value.to_le_bytes().to_vec()
    }

    fn from_bytes(&self, bytes: &[u8]) -> Result<u64, InvalidValueBytes> {
        let bytes: [u8; 8] = bytes
            .try_into()
            .map_err(|_| InvalidValueBytes("expected exactly 8 bytes".to_string()))?;
        Ok(u64::from_le_bytes(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn string_codec_round_trips() {
        let s = StringSerializer;
        let bytes = s.to_bytes(&"v1".to_string());
        assert_eq!(bytes, b"v1");
        assert_eq!(s.from_bytes(&bytes).unwrap(), "v1");
    }

    #[test]
    fn string_codec_rejects_invalid_utf8() {
        assert!(StringSerializer.from_bytes(&[0xC0, 0x80]).is_err());
    }

    #[test]
    fn u64_codec_is_fixed_width_little_endian() {
        let s = U64Serializer;
        assert_eq!(s.to_bytes(&0x0102), vec![0x02, 0x01, 0, 0, 0, 0, 0, 0]);
        assert_eq!(s.from_bytes(&[0x02, 0x01, 0, 0, 0, 0, 0, 0]).unwrap(), 0x0102);
        assert!(s.from_bytes(&[1, 2, 3]).is_err());
    }
}
