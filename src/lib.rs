//! vscore: cosine-similarity scoring cursors for pull-based search pipelines.
//!
//! # Public API Surface
//!
//! ## Query Lifecycle
//! - [`VectorQuery`] - query vector plus strategy; spawns execution contexts
//! - [`ExecutionContext`] - one execution; creates a [`ScoringCursor`] per segment
//! - [`DisposalReport`] - outcome of closing a context or query
//!
//! ## Scoring
//! - [`ScoringStrategy`], [`ScorerFactory`] - `default`, `cached`, `external`
//! - [`VectorCache`] - decoded vectors shared by cached cursors
//! - [`ScoringError`], [`LifecycleError`]
//!
//! ## External Engine
//! - [`SimilarityEngine`] - handle-based engine protocol
//! - [`LocalEngine`] - in-process implementation
//!
//! ## Index & Codec
//! - [`SegmentReader`], [`DocValues`] - consumed document value store
//! - [`MemoryIndex`] - in-memory store for tests and demos
//! - [`VectorCodec`], [`encode`], [`decode`] - big-endian vector wire format
//!
//! ## Test/Mock Support
//! Mock implementations are available behind `#[cfg(any(test, feature = "mock"))]`.

pub mod codec;
pub mod config;
pub mod constants;
pub mod engine;
pub mod hashing;
pub mod index;
pub mod query;
pub mod scoring;
pub mod search;
pub mod similarity;

pub use codec::{CodecError, CodecResult, DecodedVector, VectorCodec, decode, encode};
pub use config::{Config, ConfigError};
pub use constants::{
    DEFAULT_VECTOR_DIM, DEFAULT_VECTOR_FIELD, DimConfig, DimValidationError, MAX_COSINE_SCORE,
};
#[cfg(any(test, feature = "mock"))]
pub use engine::MockSimilarityEngine;
pub use engine::{
    EngineError, EngineResult, EngineStats, FactoryHandle, LocalEngine, ScorerHandle,
    SimilarityEngine, VectorSupplier,
};
pub use hashing::query_fingerprint;
pub use index::{
    DocValues, GlobalDocId, LocalDocId, MemoryIndex, MemoryIndexBuilder, MemorySegment,
    SegmentReader,
};
pub use query::{DisposalReport, ExecutionContext, VectorQuery};
pub use scoring::{
    CursorState, ExternalFactory, LifecycleError, ScorerFactory, ScoringCursor, ScoringError,
    ScoringResult, ScoringStrategy, VectorCache,
};
pub use search::{ScoredDoc, top_k};
pub use similarity::{cosine_similarity, dot, magnitude};
