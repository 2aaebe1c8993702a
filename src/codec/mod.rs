//! Codec module - serialization/deserialization for envelopes and payloads.
//!
//! The codec is implemented as a marker struct with static methods rather
//! than a trait object. There is exactly one wire format (JSON), and the
//! static form keeps call sites monomorphic.
//!
//! # Example
//!
//! ```
//! use wirecall::codec::JsonCodec;
//!
//! let encoded = JsonCodec::encode(&"hello").unwrap();
//! let decoded: String = JsonCodec::decode(&encoded).unwrap();
//! assert_eq!(decoded, "hello");
//! ```

mod json;

pub use json::JsonCodec;
