//! In-process [`SimilarityEngine`] backed by handle tables.
//!
//! Each factory owns a document-vector cache shared by every scorer it issues, so a
//! document is pulled through the supplier once per factory, not once per query.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::{Mutex, RwLock};
use tracing::debug;

use super::error::{EngineError, EngineResult};
use super::{FactoryHandle, ScorerHandle, SimilarityEngine, VectorSupplier};
use crate::index::GlobalDocId;
use crate::similarity::cosine_similarity_packed;

type DocCache = Arc<RwLock<HashMap<GlobalDocId, Arc<[f32]>>>>;

/// Token-addressed table of live engine objects.
#[derive(Debug)]
struct HandleTable<T> {
    entries: Mutex<HashMap<u64, T>>,
    next: AtomicU64,
}

impl<T> HandleTable<T> {
    fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            next: AtomicU64::new(1),
        }
    }

    fn insert(&self, value: T) -> u64 {
        let id = self.next.fetch_add(1, Ordering::Relaxed);
        self.entries.lock().insert(id, value);
        id
    }

    fn remove(&self, id: u64) -> Option<T> {
        self.entries.lock().remove(&id)
    }

    fn contains(&self, id: u64) -> bool {
        self.entries.lock().contains_key(&id)
    }

    fn len(&self) -> usize {
        self.entries.lock().len()
    }

    fn retain(&self, keep: impl FnMut(&u64, &mut T) -> bool) {
        self.entries.lock().retain(keep);
    }
}

impl<T: Clone> HandleTable<T> {
    fn get(&self, id: u64) -> Option<T> {
        self.entries.lock().get(&id).cloned()
    }
}

#[derive(Debug)]
struct FactoryState {
    cache: DocCache,
}

#[derive(Debug, Clone)]
struct ScorerState {
    factory: FactoryHandle,
    query: Arc<[f32]>,
    cache: DocCache,
}

/// Call counters, readable while the engine is in use.
#[derive(Debug, Default)]
pub struct EngineStats {
    factories_created: AtomicU64,
    factories_destroyed: AtomicU64,
    scorers_created: AtomicU64,
    scorers_destroyed: AtomicU64,
    score_calls: AtomicU64,
    supplier_calls: AtomicU64,
}

impl EngineStats {
    pub fn factories_created(&self) -> u64 {
        self.factories_created.load(Ordering::Relaxed)
    }

    pub fn factories_destroyed(&self) -> u64 {
        self.factories_destroyed.load(Ordering::Relaxed)
    }

    pub fn scorers_created(&self) -> u64 {
        self.scorers_created.load(Ordering::Relaxed)
    }

    pub fn scorers_destroyed(&self) -> u64 {
        self.scorers_destroyed.load(Ordering::Relaxed)
    }

    pub fn score_calls(&self) -> u64 {
        self.score_calls.load(Ordering::Relaxed)
    }

    pub fn supplier_calls(&self) -> u64 {
        self.supplier_calls.load(Ordering::Relaxed)
    }
}

/// Reference engine living in the same process.
#[derive(Debug)]
pub struct LocalEngine {
    factories: HandleTable<FactoryState>,
    scorers: HandleTable<ScorerState>,
    stats: EngineStats,
}

impl LocalEngine {
    pub fn new() -> Self {
        Self {
            factories: HandleTable::new(),
            scorers: HandleTable::new(),
            stats: EngineStats::default(),
        }
    }

    pub fn stats(&self) -> &EngineStats {
        &self.stats
    }

    pub fn live_factories(&self) -> usize {
        self.factories.len()
    }

    pub fn live_scorers(&self) -> usize {
        self.scorers.len()
    }
}

impl Default for LocalEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl SimilarityEngine for LocalEngine {
    fn create_factory(&self) -> EngineResult<FactoryHandle> {
        let handle = FactoryHandle(self.factories.insert(FactoryState {
            cache: Arc::new(RwLock::new(HashMap::new())),
        }));
        self.stats.factories_created.fetch_add(1, Ordering::Relaxed);
        debug!(factory = %handle, "engine factory created");
        Ok(handle)
    }

    fn destroy_factory(&self, factory: FactoryHandle) -> EngineResult<()> {
        self.factories
            .remove(factory.0)
            .ok_or(EngineError::UnknownFactory { handle: factory })?;
        self.scorers.retain(|_, scorer| scorer.factory != factory);
        self.stats
            .factories_destroyed
            .fetch_add(1, Ordering::Relaxed);
        debug!(factory = %factory, "engine factory destroyed");
        Ok(())
    }

    fn create_scorer(
        &self,
        factory: FactoryHandle,
        query_with_magnitude: &[f32],
    ) -> EngineResult<ScorerHandle> {
        if query_with_magnitude.len() < 2 {
            return Err(EngineError::DimensionMismatch {
                expected: 2,
                actual: query_with_magnitude.len(),
            });
        }

        let cache = {
            let factories = self.factories.entries.lock();
            let state = factories
                .get(&factory.0)
                .ok_or(EngineError::UnknownFactory { handle: factory })?;
            Arc::clone(&state.cache)
        };

        let handle = ScorerHandle(self.scorers.insert(ScorerState {
            factory,
            query: Arc::from(query_with_magnitude),
            cache,
        }));
        self.stats.scorers_created.fetch_add(1, Ordering::Relaxed);
        Ok(handle)
    }

    fn destroy_scorer(&self, scorer: ScorerHandle) -> EngineResult<()> {
        self.scorers
            .remove(scorer.0)
            .ok_or(EngineError::UnknownScorer { handle: scorer })?;
        self.stats.scorers_destroyed.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn score(
        &self,
        scorer: ScorerHandle,
        doc: GlobalDocId,
        supplier: &mut VectorSupplier<'_>,
    ) -> EngineResult<f32> {
        let state = self
            .scorers
            .get(scorer.0)
            .ok_or(EngineError::UnknownScorer { handle: scorer })?;
        if !self.factories.contains(state.factory.0) {
            return Err(EngineError::UnknownFactory {
                handle: state.factory,
            });
        }
        self.stats.score_calls.fetch_add(1, Ordering::Relaxed);

        let cached = state.cache.read().get(&doc).cloned();
        let document = match cached {
            Some(document) => document,
            None => {
                self.stats.supplier_calls.fetch_add(1, Ordering::Relaxed);
                let decoded = supplier()?;
                let packed: Arc<[f32]> = Arc::from(decoded.to_vec_with_magnitude());
                state.cache.write().insert(doc, Arc::clone(&packed));
                packed
            }
        };

        if document.len() != state.query.len() {
            return Err(EngineError::DimensionMismatch {
                expected: state.query.len(),
                actual: document.len(),
            });
        }

        Ok(cosine_similarity_packed(&state.query, &document))
    }

    fn similarity(&self, a: &[f32], b: &[f32]) -> EngineResult<f32> {
        if a.len() != b.len() || a.is_empty() {
            return Err(EngineError::DimensionMismatch {
                expected: a.len(),
                actual: b.len(),
            });
        }
        Ok(cosine_similarity_packed(a, b))
    }
}
