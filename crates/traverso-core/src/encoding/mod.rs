//! Versioned wire encoding.
//!
//! Traversal definitions and traversers that cross a process or partition
//! boundary are encoded as JSON behind a one-byte format version.
//!
//! # Encoding Traits
//!
//! - [`Encoder`] - Serialize types to bytes
//! - [`Decoder`] - Deserialize types from bytes
//!
//! Implementations for serde types are one-liners on top of
//! [`encode_json`] and [`decode_json`].
//!
//! # Example
//!
//! ```
//! use traverso_core::encoding::{decode_json, encode_json};
//! use traverso_core::Value;
//!
//! let mut buf = Vec::new();
//! encode_json(&Value::Int(42), &mut buf).unwrap();
//!
//! let decoded: Value = decode_json(&buf).unwrap();
//! assert_eq!(decoded, Value::Int(42));
//! ```

mod traits;


pub use traits::{decode_json, encode_json, Decoder, Encoder, FORMAT_VERSION};
