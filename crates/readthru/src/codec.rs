// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Serialization of query results for storage in a cache store.
//!
//! The coordinator never looks inside a result. It hands the value to a [`Codec`] before
//! writing it to the store and after reading it back, so any serde-compatible result shape
//! (a count, a document, a collection) can be cached.

use bytes::Bytes;
use serde::{Serialize, de::DeserializeOwned};

/// An error from encoding or decoding a cached value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{codec} codec: {message}")]
pub struct CodecError {
    codec: &'static str,
    message: String,
}

impl CodecError {
    /// Creates a codec error for the codec named `codec`.
    pub fn new(codec: &'static str, message: impl Into<String>) -> Self {
        Self {
            codec,
            message: message.into(),
        }
    }
}

/// Converts query results to and from the bytes kept in a cache store.
///
/// Implementations must round-trip: decoding the output of `encode` yields an equal value.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError`] if the value cannot be represented in this format.
    fn encode<V>(&self, value: &V) -> Result<Bytes, CodecError>
    where
        V: Serialize;

    /// Deserializes a value.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError`] if the bytes are not a valid encoding of `V`.
    fn decode<V>(&self, bytes: &[u8]) -> Result<V, CodecError>
    where
        V: DeserializeOwned;
}

/// Stores results as JSON. Human-readable in the store; the default codec.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode<V>(&self, value: &V) -> Result<Bytes, CodecError>
    where
        V: Serialize,
    {
        serde_json::to_vec(value)
            .map(Bytes::from)
            .map_err(|e| CodecError::new("json", e.to_string()))
    }

    fn decode<V>(&self, bytes: &[u8]) -> Result<V, CodecError>
    where
        V: DeserializeOwned,
    {
        serde_json::from_slice(bytes).map_err(|e| CodecError::new("json", e.to_string()))
    }
}

/// Stores results in bincode's compact binary format.
#[derive(Debug, Clone, Copy, Default)]
pub struct BincodeCodec;

impl Codec for BincodeCodec {
    fn encode<V>(&self, value: &V) -> Result<Bytes, CodecError>
    where
        V: Serialize,
    {
        bincode::serialize(value)
            .map(Bytes::from)
            .map_err(|e| CodecError::new("bincode", e.to_string()))
    }

    fn decode<V>(&self, bytes: &[u8]) -> Result<V, CodecError>
    where
        V: DeserializeOwned,
    {
        bincode::deserialize(bytes).map_err(|e| CodecError::new("bincode", e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    #[test]
    fn json_stores_counts_as_plain_numbers() {
        let bytes = JsonCodec.encode(&42_u64).unwrap();
        assert_eq!(bytes.as_ref(), b"42");
        assert_eq!(JsonCodec.decode::<u64>(b"45").unwrap(), 45);
    }

    #[test]
    fn json_decodes_documents() {
        let mut doc = BTreeMap::new();
        doc.insert("Primary Type".to_owned(), "ROBBERY".to_owned());

        let bytes = JsonCodec.encode(&doc).unwrap();
        let decoded: BTreeMap<String, String> = JsonCodec.decode(&bytes).unwrap();
        assert_eq!(decoded, doc);
    }

    #[test]
    fn json_rejects_mismatched_shape() {
        let err = JsonCodec.decode::<u64>(b"\"not a count\"").unwrap_err();
        assert!(err.to_string().starts_with("json codec: "));
    }

    #[test]
    fn bincode_decodes_collections() {
        let ids = vec![3_u32, 1, 4, 1, 5];
        let bytes = BincodeCodec.encode(&ids).unwrap();
        assert_eq!(BincodeCodec.decode::<Vec<u32>>(&bytes).unwrap(), ids);
    }

    #[test]
    fn bincode_rejects_truncated_input() {
        let bytes = BincodeCodec.encode(&u64::MAX).unwrap();
        let err = BincodeCodec.decode::<u64>(&bytes[..3]).unwrap_err();
        assert!(err.to_string().starts_with("bincode codec: "));
    }
}
