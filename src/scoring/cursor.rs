//! Per-segment scoring cursors and the shared state that outlives them.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use tracing::{debug, warn};

use super::cache::VectorCache;
use super::error::{LifecycleError, ScoringError, ScoringResult};
use super::strategy::ScoringStrategy;
use crate::codec::{CodecError, DecodedVector, VectorCodec};
use crate::constants::MAX_COSINE_SCORE;
use crate::engine::{ScorerHandle, SimilarityEngine, VectorSupplier};
use crate::index::{DocValues, GlobalDocId, LocalDocId};
use crate::similarity;

/// Ownership state of a cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CursorState {
    /// Owns its resources; `close` releases them.
    Active = 0,
    /// Its scorer lease moved to a newer cursor; `close` releases nothing.
    Donated = 1,
    Closed = 2,
}

impl CursorState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => CursorState::Active,
            1 => CursorState::Donated,
            _ => CursorState::Closed,
        }
    }
}

/// An engine scorer handle plus the flag that makes its destruction happen once.
pub struct ScorerLease {
    engine: Arc<dyn SimilarityEngine>,
    handle: ScorerHandle,
    released: AtomicBool,
}

impl ScorerLease {
    pub(crate) fn new(engine: Arc<dyn SimilarityEngine>, handle: ScorerHandle) -> Self {
        Self {
            engine,
            handle,
            released: AtomicBool::new(false),
        }
    }

    #[inline]
    pub fn handle(&self) -> ScorerHandle {
        self.handle
    }

    #[inline]
    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::Acquire)
    }

    /// Scores `doc` through the engine.
    pub fn score(&self, doc: GlobalDocId, supplier: &mut VectorSupplier<'_>) -> ScoringResult<f32> {
        if self.is_released() {
            return Err(LifecycleError::HandleReleased {
                handle: self.handle.to_string(),
            }
            .into());
        }
        Ok(self.engine.score(self.handle, doc, supplier)?)
    }

    /// Destroys the engine handle. `Ok(false)` if it was already released.
    ///
    /// A failed destroy still counts as released; it is reported, not retried.
    pub fn release(&self) -> Result<bool, LifecycleError> {
        if self.released.swap(true, Ordering::AcqRel) {
            return Ok(false);
        }
        self.engine
            .destroy_scorer(self.handle)
            .map_err(|source| LifecycleError::Release {
                resource: self.handle.to_string(),
                source,
            })?;
        debug!(scorer = %self.handle, "scorer handle released");
        Ok(true)
    }
}

impl std::fmt::Debug for ScorerLease {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScorerLease")
            .field("handle", &self.handle)
            .field("released", &self.is_released())
            .finish_non_exhaustive()
    }
}

/// Lifecycle record of one cursor, shared between the cursor and its context.
#[derive(Debug)]
pub struct CursorLifecycle {
    segment: usize,
    state: AtomicU8,
    lease: Option<Arc<ScorerLease>>,
}

impl CursorLifecycle {
    pub(crate) fn new(segment: usize, lease: Option<Arc<ScorerLease>>) -> Self {
        Self {
            segment,
            state: AtomicU8::new(CursorState::Active as u8),
            lease,
        }
    }

    #[inline]
    pub fn segment(&self) -> usize {
        self.segment
    }

    #[inline]
    pub fn state(&self) -> CursorState {
        CursorState::from_u8(self.state.load(Ordering::Acquire))
    }

    #[inline]
    pub fn lease(&self) -> Option<&Arc<ScorerLease>> {
        self.lease.as_ref()
    }

    /// Hands this cursor's lease to a successor. Fails unless the cursor is active.
    pub(crate) fn try_donate(&self) -> Option<Arc<ScorerLease>> {
        let lease = self.lease.as_ref()?;
        if lease.is_released() {
            return None;
        }
        self.state
            .compare_exchange(
                CursorState::Active as u8,
                CursorState::Donated as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .ok()
            .map(|_| Arc::clone(lease))
    }

    /// Closes the cursor, releasing its lease if it still owns one.
    ///
    /// Returns whether an engine handle was released by this call. Idempotent.
    pub fn close(&self) -> Result<bool, LifecycleError> {
        let previous = CursorState::from_u8(
            self.state
                .swap(CursorState::Closed as u8, Ordering::AcqRel),
        );
        match (previous, &self.lease) {
            (CursorState::Active, Some(lease)) => lease.release(),
            _ => Ok(false),
        }
    }
}

/// Strategy-specific scoring state carried by a cursor.
#[derive(Debug)]
pub(crate) enum CursorBackend {
    Default,
    Cached(VectorCache),
    External(Arc<ScorerLease>),
}

impl CursorBackend {
    fn strategy(&self) -> ScoringStrategy {
        match self {
            CursorBackend::Default => ScoringStrategy::Default,
            CursorBackend::Cached(_) => ScoringStrategy::Cached,
            CursorBackend::External(_) => ScoringStrategy::External,
        }
    }
}

/// Scores the documents of one segment against one query vector, on demand.
///
/// Moves with its document iterator; `score` applies to the current document.
/// Not shareable across threads while scoring; one cursor per segment pass.
pub struct ScoringCursor {
    doc_base: u64,
    values: Box<dyn DocValues>,
    codec: VectorCodec,
    query: Arc<[f32]>,
    query_magnitude: f64,
    backend: CursorBackend,
    lifecycle: Arc<CursorLifecycle>,
}

impl ScoringCursor {
    pub(crate) fn new(
        values: Box<dyn DocValues>,
        doc_base: u64,
        codec: VectorCodec,
        query: Arc<[f32]>,
        query_magnitude: f64,
        backend: CursorBackend,
        lifecycle: Arc<CursorLifecycle>,
    ) -> Self {
        Self {
            doc_base,
            values,
            codec,
            query,
            query_magnitude,
            backend,
            lifecycle,
        }
    }

    #[inline]
    pub fn next_doc(&mut self) -> Option<LocalDocId> {
        self.values.next_doc()
    }

    #[inline]
    pub fn advance(&mut self, target: LocalDocId) -> Option<LocalDocId> {
        self.values.advance(target)
    }

    #[inline]
    pub fn doc_id(&self) -> Option<LocalDocId> {
        self.values.doc_id()
    }

    #[inline]
    pub fn global_doc_id(&self) -> Option<GlobalDocId> {
        self.doc_id()
            .map(|local| GlobalDocId::from_parts(self.doc_base, local))
    }

    /// Cosine similarity between the query and the current document.
    pub fn score(&self) -> ScoringResult<f32> {
        if self.lifecycle.state() == CursorState::Closed {
            return Err(LifecycleError::CursorClosed {
                segment: self.segment_ord(),
            }
            .into());
        }

        let unpositioned = || ScoringError::Unpositioned {
            segment: self.segment_ord(),
        };
        let local = self.values.doc_id().ok_or_else(unpositioned)?;
        let bytes = self.values.binary_value().ok_or_else(unpositioned)?;
        let doc = GlobalDocId::from_parts(self.doc_base, local);

        match &self.backend {
            CursorBackend::Default => {
                let vector = self.codec.decode(bytes)?;
                Ok(self.cosine(&vector))
            }
            CursorBackend::Cached(cache) => {
                let vector = cache.get_or_decode(doc, || self.codec.decode(bytes))?;
                // entries decoded for a query of another dimension
                if vector.dim() != self.codec.dim() {
                    return Err(CodecError::DimensionMismatch {
                        expected: self.codec.dim(),
                        actual: vector.dim(),
                    }
                    .into());
                }
                Ok(self.cosine(&vector))
            }
            CursorBackend::External(lease) => {
                let codec = self.codec;
                lease.score(doc, &mut || codec.decode(bytes))
            }
        }
    }

    #[inline]
    fn cosine(&self, vector: &DecodedVector) -> f32 {
        similarity::cosine_similarity(
            &self.query,
            vector.values(),
            Some(self.query_magnitude),
            Some(vector.magnitude()),
        )
    }

    /// Upper bound of any score this cursor returns.
    #[inline]
    pub fn max_score(&self) -> f32 {
        MAX_COSINE_SCORE
    }

    #[inline]
    pub fn cost(&self) -> usize {
        self.values.cost()
    }

    #[inline]
    pub fn segment_ord(&self) -> usize {
        self.lifecycle.segment()
    }

    #[inline]
    pub fn doc_base(&self) -> u64 {
        self.doc_base
    }

    #[inline]
    pub fn strategy(&self) -> ScoringStrategy {
        self.backend.strategy()
    }

    #[inline]
    pub fn state(&self) -> CursorState {
        self.lifecycle.state()
    }

    /// Scorer handle backing this cursor, for the external strategy.
    pub fn scorer_handle(&self) -> Option<ScorerHandle> {
        match &self.backend {
            CursorBackend::External(lease) => Some(lease.handle()),
            _ => None,
        }
    }

    /// Closes this cursor. Donated cursors release nothing.
    pub fn close(&self) -> Result<bool, LifecycleError> {
        let released = self.lifecycle.close();
        if let Err(e) = &released {
            warn!(segment = self.segment_ord(), error = %e, "cursor close failed");
        }
        released
    }
}

impl std::fmt::Debug for ScoringCursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScoringCursor")
            .field("segment", &self.segment_ord())
            .field("doc_base", &self.doc_base)
            .field("dim", &self.query.len())
            .field("strategy", &self.strategy())
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}
