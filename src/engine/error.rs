use thiserror::Error;

use super::{FactoryHandle, ScorerHandle};
use crate::codec::CodecError;

/// Failure of an external engine call. Fatal for the scoring pass; never retried.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("unknown or released factory handle {handle}")]
    UnknownFactory { handle: FactoryHandle },

    #[error("unknown or released scorer handle {handle}")]
    UnknownScorer { handle: ScorerHandle },

    #[error("vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("document vector supplier failed: {0}")]
    Supplier(#[from] CodecError),

    #[error("engine call failed: {reason}")]
    Failed { reason: String },
}

pub type EngineResult<T> = Result<T, EngineError>;
