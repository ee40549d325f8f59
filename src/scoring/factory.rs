use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, info, warn};

use super::cache::VectorCache;
use super::cursor::{CursorBackend, ScorerLease, ScoringCursor};
use super::error::{LifecycleError, ScoringResult};
use super::strategy::ScoringStrategy;
use crate::engine::{FactoryHandle, LocalEngine, SimilarityEngine};
use crate::index::DocValues;
use crate::query::ExecutionContext;

/// Engine-side factory handle owned by an external [`ScorerFactory`].
///
/// Destroyed exactly once, on the first `close` or on drop.
pub struct ExternalFactory {
    engine: Arc<dyn SimilarityEngine>,
    handle: FactoryHandle,
    closed: AtomicBool,
}

impl ExternalFactory {
    /// Obtains a factory handle from `engine`.
    pub fn open(engine: Arc<dyn SimilarityEngine>) -> ScoringResult<Self> {
        let handle = engine.create_factory()?;
        info!(factory = %handle, "external scorer factory opened");
        Ok(Self {
            engine,
            handle,
            closed: AtomicBool::new(false),
        })
    }

    #[inline]
    pub fn handle(&self) -> FactoryHandle {
        self.handle
    }

    #[inline]
    pub fn engine(&self) -> &Arc<dyn SimilarityEngine> {
        &self.engine
    }

    #[inline]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Registers `query` (with `magnitude` appended) and leases the new scorer handle.
    pub fn create_scorer(&self, query: &[f32], magnitude: f64) -> ScoringResult<Arc<ScorerLease>> {
        if self.is_closed() {
            return Err(LifecycleError::FactoryClosed.into());
        }

        let mut packed = Vec::with_capacity(query.len() + 1);
        packed.extend_from_slice(query);
        packed.push(magnitude as f32);

        let scorer = self.engine.create_scorer(self.handle, &packed)?;
        debug!(factory = %self.handle, scorer = %scorer, dim = query.len(), "scorer handle allocated");
        Ok(Arc::new(ScorerLease::new(Arc::clone(&self.engine), scorer)))
    }

    /// Destroys the factory handle. `Ok(false)` when already closed.
    pub fn close(&self) -> Result<bool, LifecycleError> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(false);
        }
        self.engine
            .destroy_factory(self.handle)
            .map_err(|source| LifecycleError::Release {
                resource: self.handle.to_string(),
                source,
            })?;
        info!(factory = %self.handle, "external scorer factory closed");
        Ok(true)
    }
}

impl Drop for ExternalFactory {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!(factory = %self.handle, error = %e, "failed to close external factory on drop");
        }
    }
}

impl std::fmt::Debug for ExternalFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExternalFactory")
            .field("handle", &self.handle)
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

/// Strategy state shared by every cursor of the queries built on it.
///
/// One per query execution, or deliberately shared across queries to share the
/// decoded-vector cache or the engine factory handle. Not closed by queries.
#[derive(Debug)]
pub enum ScorerFactory {
    Default,
    Cached(VectorCache),
    External(ExternalFactory),
}

impl ScorerFactory {
    pub fn default_strategy() -> Self {
        ScorerFactory::Default
    }

    pub fn cached() -> Self {
        ScorerFactory::Cached(VectorCache::new())
    }

    pub fn cached_with_capacity(capacity: u64) -> Self {
        ScorerFactory::Cached(VectorCache::with_capacity(capacity))
    }

    pub fn external(engine: Arc<dyn SimilarityEngine>) -> ScoringResult<Self> {
        Ok(ScorerFactory::External(ExternalFactory::open(engine)?))
    }

    /// Builds a factory for `strategy`; the external strategy runs on a [`LocalEngine`].
    pub fn from_strategy(strategy: ScoringStrategy) -> ScoringResult<Self> {
        match strategy {
            ScoringStrategy::Default => Ok(Self::default_strategy()),
            ScoringStrategy::Cached => Ok(Self::cached()),
            ScoringStrategy::External => Self::external(Arc::new(LocalEngine::new())),
        }
    }

    pub fn strategy(&self) -> ScoringStrategy {
        match self {
            ScorerFactory::Default => ScoringStrategy::Default,
            ScorerFactory::Cached(_) => ScoringStrategy::Cached,
            ScorerFactory::External(_) => ScoringStrategy::External,
        }
    }

    /// The shared vector cache, for the cached strategy.
    pub fn cache(&self) -> Option<&VectorCache> {
        match self {
            ScorerFactory::Cached(cache) => Some(cache),
            _ => None,
        }
    }

    pub fn external_factory(&self) -> Option<&ExternalFactory> {
        match self {
            ScorerFactory::External(external) => Some(external),
            _ => None,
        }
    }

    /// Creates the cursor for one segment of `context`'s execution.
    pub fn create(
        &self,
        context: &ExecutionContext,
        values: Box<dyn DocValues>,
        segment: usize,
        doc_base: u64,
    ) -> ScoringResult<ScoringCursor> {
        let query = context.query_vector();
        let magnitude = context.query_magnitude();

        let (backend, lifecycle) = match self {
            ScorerFactory::Default => (CursorBackend::Default, context.register_cursor(segment)?),
            ScorerFactory::Cached(cache) => (
                CursorBackend::Cached(cache.clone()),
                context.register_cursor(segment)?,
            ),
            ScorerFactory::External(external) => {
                let (lifecycle, lease) = context
                    .register_external_cursor(segment, || external.create_scorer(&query, magnitude))?;
                (CursorBackend::External(lease), lifecycle)
            }
        };

        debug!(
            context = %context.id(),
            segment,
            doc_base,
            strategy = %self.strategy(),
            "scoring cursor created"
        );

        Ok(ScoringCursor::new(
            values,
            doc_base,
            context.codec(),
            query,
            magnitude,
            backend,
            lifecycle,
        ))
    }

    /// Releases strategy-owned resources. Idempotent.
    pub fn close(&self) -> Result<bool, LifecycleError> {
        match self {
            ScorerFactory::External(external) => external.close(),
            _ => Ok(false),
        }
    }
}

impl Default for ScorerFactory {
    fn default() -> Self {
        Self::default_strategy()
    }
}
