//! Encoding and decoding traits for the wire boundary.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::CoreError;

/// Format version for serialized data.
///
/// This version number is the first byte of every encoded payload so that
/// readers can reject data written by an incompatible peer.
pub const FORMAT_VERSION: u8 = 1;

/// A trait for types that can be encoded to bytes.
pub trait Encoder: Sized {
    /// Encode this value to bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails (e.g., due to invalid data).
    fn encode(&self) -> Result<Vec<u8>, CoreError> {
        let mut buf = Vec::new();
        self.encode_to(&mut buf)?;
        Ok(buf)
    }

    /// Encode this value into a pre-allocated buffer.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails.
    fn encode_to(&self, buf: &mut Vec<u8>) -> Result<(), CoreError>;
}

/// A trait for types that can be decoded from bytes.
pub trait Decoder: Sized {
    /// Decode a value from bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if decoding fails (e.g., invalid data, truncated input).
    fn decode(bytes: &[u8]) -> Result<Self, CoreError>;
}

/// Writes `FORMAT_VERSION` followed by the JSON form of `value`.
///
/// # Errors
///
/// Returns [`CoreError::Encoding`] if the value cannot be serialized.
pub fn encode_json<T: Serialize>(value: &T, buf: &mut Vec<u8>) -> Result<(), CoreError> {
    buf.push(FORMAT_VERSION);
    serde_json::to_writer(&mut *buf, value)?;
    Ok(())
}

/// Reads a payload written by [`encode_json`].
///
/// # Errors
///
/// Returns [`CoreError::Encoding`] on an empty buffer, a version mismatch,
/// or malformed JSON.
pub fn decode_json<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, CoreError> {
    let (&version, payload) =
        bytes.split_first().ok_or_else(|| CoreError::Encoding("empty payload".to_owned()))?;
    if version != FORMAT_VERSION {
        return Err(CoreError::Encoding(format!(
            "unsupported format version {version}, expected {FORMAT_VERSION}"
        )));
    }
    Ok(serde_json::from_slice(payload)?)
}
