use thiserror::Error;

use crate::codec::CodecError;
use crate::engine::EngineError;

/// Double-close, use-after-close, or a failed release. Reported, never a crash.
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("scoring cursor for segment {segment} is closed")]
    CursorClosed { segment: usize },

    #[error("scorer handle {handle} was already released")]
    HandleReleased { handle: String },

    #[error("execution context {context} is closed")]
    ContextClosed { context: String },

    #[error("query on field '{field}' is closed")]
    QueryClosed { field: String },

    #[error("scorer factory is closed")]
    FactoryClosed,

    #[error("failed to release {resource}: {source}")]
    Release {
        resource: String,
        #[source]
        source: EngineError,
    },
}

#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("malformed document vector: {0}")]
    Format(#[from] CodecError),

    #[error("external engine error: {0}")]
    Engine(EngineError),

    #[error("lifecycle error: {0}")]
    Lifecycle(#[from] LifecycleError),

    #[error("cursor for segment {segment} is not positioned on a document")]
    Unpositioned { segment: usize },

    #[error("invalid query: {reason}")]
    InvalidQuery { reason: String },
}

impl From<EngineError> for ScoringError {
    /// Supplier failures are decode failures and surface as [`ScoringError::Format`].
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Supplier(codec) => ScoringError::Format(codec),
            other => ScoringError::Engine(other),
        }
    }
}

pub type ScoringResult<T> = Result<T, ScoringError>;
