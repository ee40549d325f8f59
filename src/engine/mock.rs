use std::sync::atomic::{AtomicBool, Ordering};

use super::error::{EngineError, EngineResult};
use super::local::{EngineStats, LocalEngine};
use super::{FactoryHandle, ScorerHandle, SimilarityEngine, VectorSupplier};
use crate::index::GlobalDocId;

/// [`LocalEngine`] with switchable failures for exercising error paths.
#[derive(Debug, Default)]
pub struct MockSimilarityEngine {
    inner: LocalEngine,
    fail_create_scorer: AtomicBool,
    fail_destroy_scorer: AtomicBool,
    fail_destroy_factory: AtomicBool,
    fail_score: AtomicBool,
}

impl MockSimilarityEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> &EngineStats {
        self.inner.stats()
    }

    pub fn live_scorers(&self) -> usize {
        self.inner.live_scorers()
    }

    pub fn live_factories(&self) -> usize {
        self.inner.live_factories()
    }

    pub fn set_fail_create_scorer(&self, fail: bool) {
        self.fail_create_scorer.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_destroy_scorer(&self, fail: bool) {
        self.fail_destroy_scorer.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_destroy_factory(&self, fail: bool) {
        self.fail_destroy_factory.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_score(&self, fail: bool) {
        self.fail_score.store(fail, Ordering::SeqCst);
    }

    fn injected(flag: &AtomicBool, call: &str) -> EngineResult<()> {
        if flag.load(Ordering::SeqCst) {
            return Err(EngineError::Failed {
                reason: format!("injected {} failure", call),
            });
        }
        Ok(())
    }
}

impl SimilarityEngine for MockSimilarityEngine {
    fn create_factory(&self) -> EngineResult<FactoryHandle> {
        self.inner.create_factory()
    }

    fn destroy_factory(&self, factory: FactoryHandle) -> EngineResult<()> {
        Self::injected(&self.fail_destroy_factory, "destroy_factory")?;
        self.inner.destroy_factory(factory)
    }

    fn create_scorer(
        &self,
        factory: FactoryHandle,
        query_with_magnitude: &[f32],
    ) -> EngineResult<ScorerHandle> {
        Self::injected(&self.fail_create_scorer, "create_scorer")?;
        self.inner.create_scorer(factory, query_with_magnitude)
    }

    fn destroy_scorer(&self, scorer: ScorerHandle) -> EngineResult<()> {
        Self::injected(&self.fail_destroy_scorer, "destroy_scorer")?;
        self.inner.destroy_scorer(scorer)
    }

    fn score(
        &self,
        scorer: ScorerHandle,
        doc: GlobalDocId,
        supplier: &mut VectorSupplier<'_>,
    ) -> EngineResult<f32> {
        Self::injected(&self.fail_score, "score")?;
        self.inner.score(scorer, doc, supplier)
    }

    fn similarity(&self, a: &[f32], b: &[f32]) -> EngineResult<f32> {
        self.inner.similarity(a, b)
    }
}
