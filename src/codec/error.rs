use thiserror::Error;

/// Malformed encoded vector. Fatal for the document being scored.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("encoded vector length {len} is not a multiple of 4 bytes")]
    NotFloatAligned { len: usize },

    #[error("encoded vector holds {actual} floats, expected {expected} (plus optional trailing magnitude)")]
    DimensionMismatch { expected: usize, actual: usize },
}

pub type CodecResult<T> = Result<T, CodecError>;
