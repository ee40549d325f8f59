use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;
use tracing::{debug, warn};

use super::context::ExecutionContext;
use super::disposal::DisposalReport;
use crate::codec::VectorCodec;
use crate::hashing::query_fingerprint;
use crate::scoring::{LifecycleError, ScorerFactory, ScoringError, ScoringResult, ScoringStrategy};
use crate::similarity;

/// Query state read by every context and cursor.
#[derive(Debug)]
pub(crate) struct QueryShared {
    pub(crate) field: String,
    pub(crate) vector: Arc<[f32]>,
    pub(crate) fingerprint: u64,
    pub(crate) codec: VectorCodec,
    pub(crate) factory: Arc<ScorerFactory>,
    magnitude: OnceLock<f64>,
}

impl QueryShared {
    pub(crate) fn magnitude(&self) -> f64 {
        *self
            .magnitude
            .get_or_init(|| similarity::magnitude(&self.vector))
    }
}

/// A cosine-similarity query over one vector field.
///
/// Identity is the field, the vector's bit patterns and the strategy; contexts
/// spawned from it are not part of it. Closing the query closes every context
/// it created. The [`ScorerFactory`] is left open since it may be shared.
pub struct VectorQuery {
    shared: Arc<QueryShared>,
    contexts: Mutex<Vec<Arc<ExecutionContext>>>,
    closed: AtomicBool,
}

impl VectorQuery {
    /// Creates a query scoring `field` against `vector` with `factory`'s strategy.
    pub fn new(
        field: impl Into<String>,
        vector: Vec<f32>,
        factory: Arc<ScorerFactory>,
    ) -> ScoringResult<Self> {
        let field = field.into();
        if field.is_empty() {
            return Err(ScoringError::InvalidQuery {
                reason: "field name is empty".to_string(),
            });
        }
        if vector.is_empty() {
            return Err(ScoringError::InvalidQuery {
                reason: "query vector is empty".to_string(),
            });
        }

        let fingerprint = query_fingerprint(&field, &vector);
        let codec = VectorCodec::new(vector.len());
        Ok(Self {
            shared: Arc::new(QueryShared {
                field,
                vector: Arc::from(vector),
                fingerprint,
                codec,
                factory,
                magnitude: OnceLock::new(),
            }),
            contexts: Mutex::new(Vec::new()),
            closed: AtomicBool::new(false),
        })
    }

    /// Creates a query with its own factory for `strategy`.
    pub fn with_strategy(
        field: impl Into<String>,
        vector: Vec<f32>,
        strategy: ScoringStrategy,
    ) -> ScoringResult<Self> {
        let factory = Arc::new(ScorerFactory::from_strategy(strategy)?);
        Self::new(field, vector, factory)
    }

    #[inline]
    pub fn field(&self) -> &str {
        &self.shared.field
    }

    #[inline]
    pub fn vector(&self) -> &[f32] {
        &self.shared.vector
    }

    #[inline]
    pub fn dim(&self) -> usize {
        self.shared.vector.len()
    }

    #[inline]
    pub fn strategy(&self) -> ScoringStrategy {
        self.shared.factory.strategy()
    }

    #[inline]
    pub fn factory(&self) -> &Arc<ScorerFactory> {
        &self.shared.factory
    }

    /// Content fingerprint of (field, vector).
    #[inline]
    pub fn fingerprint(&self) -> u64 {
        self.shared.fingerprint
    }

    #[inline]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    pub fn context_count(&self) -> usize {
        self.contexts.lock().len()
    }

    /// Starts one execution of this query.
    pub fn new_execution_context(&self) -> ScoringResult<Arc<ExecutionContext>> {
        let mut contexts = self.contexts.lock();
        if self.is_closed() {
            return Err(LifecycleError::QueryClosed {
                field: self.shared.field.clone(),
            }
            .into());
        }

        let context = Arc::new(ExecutionContext::new(Arc::clone(&self.shared)));
        debug!(
            context = %context.id(),
            field = %self.shared.field,
            strategy = %self.strategy(),
            "execution context created"
        );
        contexts.push(Arc::clone(&context));
        Ok(context)
    }

    /// Closes every context of this query. Idempotent.
    pub fn close(&self) -> DisposalReport {
        if self.closed.swap(true, Ordering::AcqRel) {
            return DisposalReport::default();
        }

        let contexts = std::mem::take(&mut *self.contexts.lock());
        let mut report = DisposalReport::default();
        for context in contexts {
            report.merge(context.close());
        }

        if !report.is_clean() {
            warn!(
                field = %self.shared.field,
                failures = report.failures.len(),
                "query closed with disposal failures"
            );
        }
        debug!(
            field = %self.shared.field,
            contexts = report.contexts_closed,
            cursors = report.cursors_closed,
            "query closed"
        );
        report
    }
}

impl Drop for VectorQuery {
    fn drop(&mut self) {
        self.close();
    }
}

impl PartialEq for VectorQuery {
    fn eq(&self, other: &Self) -> bool {
        self.shared.field == other.shared.field
            && self.strategy() == other.strategy()
            && self.shared.vector.len() == other.shared.vector.len()
            && self
                .shared
                .vector
                .iter()
                .zip(other.shared.vector.iter())
                .all(|(a, b)| a.to_bits() == b.to_bits())
    }
}

impl Eq for VectorQuery {}

impl Hash for VectorQuery {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.shared.fingerprint.hash(state);
        self.strategy().hash(state);
    }
}

impl std::fmt::Display for VectorQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "cosine({}, dim={}, strategy={})",
            self.shared.field,
            self.shared.vector.len(),
            self.strategy()
        )
    }
}

impl std::fmt::Debug for VectorQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VectorQuery")
            .field("field", &self.shared.field)
            .field("dim", &self.shared.vector.len())
            .field("strategy", &self.strategy())
            .field("contexts", &self.context_count())
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}
