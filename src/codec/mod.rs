//! Binary wire encoding for document vectors.
//!
//! A vector is a headerless run of big-endian IEEE754 `f32` values, optionally
//! followed by one more `f32` holding the precomputed magnitude. The dimension is
//! not stored: writer and reader share it out of band, and [`decode`] infers whether
//! a trailing magnitude is present from the byte length alone.

pub mod error;


pub use error::{CodecError, CodecResult};

use crate::constants::FLOAT_BYTES;
use crate::similarity;

/// A decoded document vector.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedVector {
    values: Vec<f32>,
    trailing_magnitude: Option<f32>,
}

impl DecodedVector {
    pub fn new(values: Vec<f32>, trailing_magnitude: Option<f32>) -> Self {
        Self {
            values,
            trailing_magnitude,
        }
    }

    /// Builds a vector and precomputes its magnitude, as a writer would.
    pub fn with_computed_magnitude(values: Vec<f32>) -> Self {
        let magnitude = similarity::magnitude(&values) as f32;
        Self::new(values, Some(magnitude))
    }

    #[inline]
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    #[inline]
    pub fn dim(&self) -> usize {
        self.values.len()
    }

    /// The magnitude stored on the wire, if any.
    #[inline]
    pub fn trailing_magnitude(&self) -> Option<f32> {
        self.trailing_magnitude
    }

    /// The stored magnitude, or `sqrt(Σv²)` when none was encoded.
    #[inline]
    pub fn magnitude(&self) -> f64 {
        match self.trailing_magnitude {
            Some(m) => m as f64,
            None => similarity::magnitude(&self.values),
        }
    }

    /// Values followed by the magnitude (the layout external engines consume).
    pub fn to_vec_with_magnitude(&self) -> Vec<f32> {
        let mut out = Vec::with_capacity(self.values.len() + 1);
        out.extend_from_slice(&self.values);
        out.push(self.magnitude() as f32);
        out
    }

    pub fn into_values(self) -> Vec<f32> {
        self.values
    }
}

/// Encodes `vector`, appending `sqrt(Σv²)` when `include_magnitude` is set.
pub fn encode(vector: &[f32], include_magnitude: bool) -> Vec<u8> {
    let floats = vector.len() + usize::from(include_magnitude);
    let mut bytes = Vec::with_capacity(floats * FLOAT_BYTES);
    for value in vector {
        bytes.extend_from_slice(&value.to_be_bytes());
    }
    if include_magnitude {
        let magnitude = similarity::magnitude(vector) as f32;
        bytes.extend_from_slice(&magnitude.to_be_bytes());
    }
    bytes
}

/// Decodes `bytes` holding `expected_dim` values and an optional trailing magnitude.
pub fn decode(bytes: &[u8], expected_dim: usize) -> CodecResult<DecodedVector> {
    if !bytes.len().is_multiple_of(FLOAT_BYTES) {
        return Err(CodecError::NotFloatAligned { len: bytes.len() });
    }

    let floats = bytes.len() / FLOAT_BYTES;
    let has_magnitude = if floats == expected_dim {
        false
    } else if floats == expected_dim + 1 {
        true
    } else {
        return Err(CodecError::DimensionMismatch {
            expected: expected_dim,
            actual: floats,
        });
    };

    let mut values: Vec<f32> = bytes
        .chunks_exact(FLOAT_BYTES)
        .map(|chunk| f32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect();

    let trailing_magnitude = if has_magnitude { values.pop() } else { None };

    Ok(DecodedVector::new(values, trailing_magnitude))
}

/// Codec bound to one field's dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VectorCodec {
    dim: usize,
}

impl VectorCodec {
    pub fn new(dim: usize) -> Self {
        Self { dim }
    }

    #[inline]
    pub fn dim(&self) -> usize {
        self.dim
    }

    #[inline]
    pub fn encode(&self, vector: &[f32], include_magnitude: bool) -> Vec<u8> {
        encode(vector, include_magnitude)
    }

    #[inline]
    pub fn decode(&self, bytes: &[u8]) -> CodecResult<DecodedVector> {
        decode(bytes, self.dim)
    }
}
