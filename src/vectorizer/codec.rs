// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Wire encoding for embedding vectors
//!
//! Each vector is serialized as the concatenation of its elements, every
//! element being a 4-byte IEEE-754 single-precision value in little-endian
//! order. The byte string is then base64-encoded with the standard alphabet
//! and padding. There is no header, version byte or compression: changing any
//! of this breaks every consumer.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Size in bytes of one encoded vector element
pub const BYTES_PER_ELEMENT: usize = std::mem::size_of::<f32>();

/// One embedding as it appears on the wire
///
/// # Example
/// ```json
/// { "embedding": "AACAPwAAAEA=", "dimension": 2 }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedEmbedding {
    /// Base64 of the little-endian f32 bytes
    pub embedding: String,

    /// Number of f32 elements in the payload
    pub dimension: usize,
}

/// Errors raised when reading an `EncodedEmbedding` back into floats
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("invalid base64 payload: {0}")]
    InvalidBase64(String),

    #[error("payload is {actual} bytes, expected {expected} for dimension {dimension}")]
    LengthMismatch {
        dimension: usize,
        expected: usize,
        actual: usize,
    },
}

/// Little-endian byte image of a vector
pub fn vector_to_bytes(vector: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(vector.len() * BYTES_PER_ELEMENT);
    for value in vector {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}

/// Encodes one vector for the response body
pub fn encode_embedding(vector: &[f32]) -> EncodedEmbedding {
    EncodedEmbedding {
        embedding: STANDARD.encode(vector_to_bytes(vector)),
        dimension: vector.len(),
    }
}

/// Encodes a batch, preserving order
pub fn encode_batch(vectors: &[Vec<f32>]) -> Vec<EncodedEmbedding> {
    vectors.iter().map(|v| encode_embedding(v)).collect()
}

/// Decodes a base64 payload into its raw bytes
pub fn decode_bytes(payload: &str) -> Result<Vec<u8>, DecodeError> {
    STANDARD
        .decode(payload)
        .map_err(|e| DecodeError::InvalidBase64(e.to_string()))
}

/// Reads an `EncodedEmbedding` back into the exact floats that produced it
pub fn decode_embedding(encoded: &EncodedEmbedding) -> Result<Vec<f32>, DecodeError> {
    let bytes = decode_bytes(&encoded.embedding)?;

    let expected = encoded.dimension * BYTES_PER_ELEMENT;
    if bytes.len() != expected {
        return Err(DecodeError::LengthMismatch {
            dimension: encoded.dimension,
            expected,
            actual: bytes.len(),
        });
    }

    Ok(bytes
        .chunks_exact(BYTES_PER_ELEMENT)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect())
}
