//! External similarity engine protocol.
//!
//! The engine is reached only through opaque handles: one factory handle per
//! external [`ScorerFactory`](crate::scoring::ScorerFactory) and one scorer handle
//! per query vector per execution context. The engine never sees encoded bytes; it
//! pulls already-decoded document vectors through a [`VectorSupplier`], at most once
//! per `score` call, synchronously.
//!
//! Vectors crossing this boundary carry their magnitude as the last element.

pub mod error;
pub mod local;
#[cfg(any(test, feature = "mock"))]
pub mod mock;


pub use error::{EngineError, EngineResult};
pub use local::{EngineStats, LocalEngine};
#[cfg(any(test, feature = "mock"))]
pub use mock::MockSimilarityEngine;

use crate::codec::{CodecResult, DecodedVector};
use crate::index::GlobalDocId;

/// Opaque token for an engine-side scorer factory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FactoryHandle(pub u64);

/// Opaque token for an engine-side scorer bound to one query vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScorerHandle(pub u64);

impl std::fmt::Display for FactoryHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "factory#{}", self.0)
    }
}

impl std::fmt::Display for ScorerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "scorer#{}", self.0)
    }
}

/// Callback decoding the current document's vector on demand.
pub type VectorSupplier<'a> = dyn FnMut() -> CodecResult<DecodedVector> + 'a;

/// The consumed engine contract.
///
/// Implementations must tolerate concurrent `create_scorer` calls on one factory
/// handle. Destroying a handle twice is undefined on the engine side; callers
/// guarantee single destruction.
pub trait SimilarityEngine: Send + Sync + std::fmt::Debug {
    fn create_factory(&self) -> EngineResult<FactoryHandle>;

    /// Releases the factory; every scorer it issued becomes invalid.
    fn destroy_factory(&self, factory: FactoryHandle) -> EngineResult<()>;

    /// Registers a query vector (magnitude appended) and returns its scorer.
    fn create_scorer(
        &self,
        factory: FactoryHandle,
        query_with_magnitude: &[f32],
    ) -> EngineResult<ScorerHandle>;

    fn destroy_scorer(&self, scorer: ScorerHandle) -> EngineResult<()>;

    /// Scores one document. `supplier` is invoked zero or one time.
    fn score(
        &self,
        scorer: ScorerHandle,
        doc: GlobalDocId,
        supplier: &mut VectorSupplier<'_>,
    ) -> EngineResult<f32>;

    /// Stateless parity check over two vectors with trailing magnitudes.
    fn similarity(&self, a: &[f32], b: &[f32]) -> EngineResult<f32>;
}
