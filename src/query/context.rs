use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

use super::disposal::DisposalReport;
use super::handle::QueryShared;
use crate::codec::VectorCodec;
use crate::index::SegmentReader;
use crate::scoring::{
    CursorLifecycle, LifecycleError, ScorerLease, ScoringCursor, ScoringResult,
};

/// Everything one execution of a [`VectorQuery`](super::VectorQuery) creates.
///
/// Owns the lifecycle records of its cursors and the scorer donation registry.
/// Closing it closes every cursor, continuing past failures.
pub struct ExecutionContext {
    id: Uuid,
    query: Arc<QueryShared>,
    cursors: Mutex<Vec<Arc<CursorLifecycle>>>,
    /// Current owner of the scorer handle, per query fingerprint. Only the owning
    /// query's fingerprint is ever inserted.
    donors: Mutex<HashMap<u64, Arc<CursorLifecycle>>>,
    closed: AtomicBool,
}

impl ExecutionContext {
    pub(crate) fn new(query: Arc<QueryShared>) -> Self {
        Self {
            id: Uuid::new_v4(),
            query,
            cursors: Mutex::new(Vec::new()),
            donors: Mutex::new(HashMap::new()),
            closed: AtomicBool::new(false),
        }
    }

    #[inline]
    pub fn id(&self) -> Uuid {
        self.id
    }

    #[inline]
    pub fn field(&self) -> &str {
        &self.query.field
    }

    #[inline]
    pub fn query_vector(&self) -> Arc<[f32]> {
        Arc::clone(&self.query.vector)
    }

    /// Query magnitude, computed on first use and reused for every later cursor.
    #[inline]
    pub fn query_magnitude(&self) -> f64 {
        self.query.magnitude()
    }

    #[inline]
    pub fn codec(&self) -> VectorCodec {
        self.query.codec
    }

    #[inline]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Number of cursors created so far and not yet disposed.
    pub fn cursor_count(&self) -> usize {
        self.cursors.lock().len()
    }

    /// Creates the scoring cursor for `segment`.
    ///
    /// `Ok(None)` when no document in the segment carries the query's field. May be
    /// called any number of times per segment.
    pub fn scoring_cursor_for(
        &self,
        segment: &dyn SegmentReader,
    ) -> ScoringResult<Option<ScoringCursor>> {
        self.ensure_open()?;

        let Some(values) = segment.binary_doc_values(&self.query.field) else {
            debug!(
                context = %self.id,
                segment = segment.segment_ord(),
                field = %self.query.field,
                "segment has no values for field"
            );
            return Ok(None);
        };

        self.query
            .factory
            .create(self, values, segment.segment_ord(), segment.doc_base())
            .map(Some)
    }

    /// Records a cursor that owns no engine handle.
    pub(crate) fn register_cursor(&self, segment: usize) -> ScoringResult<Arc<CursorLifecycle>> {
        let lifecycle = Arc::new(CursorLifecycle::new(segment, None));
        self.track(Arc::clone(&lifecycle))?;
        Ok(lifecycle)
    }

    /// Records an external-engine cursor, taking over the scorer lease of the live
    /// cursor for the same query vector or allocating one with `allocate`.
    ///
    /// The claim and the allocation happen under the registry lock, so concurrent
    /// requests never claim one donor twice nor allocate two handles.
    pub(crate) fn register_external_cursor<F>(
        &self,
        segment: usize,
        allocate: F,
    ) -> ScoringResult<(Arc<CursorLifecycle>, Arc<ScorerLease>)>
    where
        F: FnOnce() -> ScoringResult<Arc<ScorerLease>>,
    {
        let fingerprint = self.query.fingerprint;
        let mut donors = self.donors.lock();
        self.ensure_open()?;

        let (lease, donor) = match donors.get(&fingerprint) {
            Some(holder) => match holder.try_donate() {
                Some(lease) => (lease, Some(holder.segment())),
                None => (allocate()?, None),
            },
            None => (allocate()?, None),
        };

        let lifecycle = Arc::new(CursorLifecycle::new(segment, Some(Arc::clone(&lease))));
        if let Err(e) = self.track(Arc::clone(&lifecycle)) {
            if let Err(release) = lease.release() {
                warn!(context = %self.id, error = %release, "failed to release orphaned scorer handle");
            }
            return Err(e);
        }
        donors.insert(fingerprint, Arc::clone(&lifecycle));

        match donor {
            Some(from) => debug!(
                context = %self.id,
                scorer = %lease.handle(),
                from_segment = from,
                to_segment = segment,
                "scorer handle donated"
            ),
            None => debug!(
                context = %self.id,
                scorer = %lease.handle(),
                segment,
                "scorer handle registered"
            ),
        }

        Ok((lifecycle, lease))
    }

    fn track(&self, lifecycle: Arc<CursorLifecycle>) -> ScoringResult<()> {
        let mut cursors = self.cursors.lock();
        self.ensure_open()?;
        cursors.push(lifecycle);
        Ok(())
    }

    fn ensure_open(&self) -> Result<(), LifecycleError> {
        if self.is_closed() {
            return Err(LifecycleError::ContextClosed {
                context: self.id.to_string(),
            });
        }
        Ok(())
    }

    /// Closes every cursor of this context. Idempotent; later calls report nothing.
    pub fn close(&self) -> DisposalReport {
        if self.closed.swap(true, Ordering::AcqRel) {
            return DisposalReport::default();
        }

        let cursors = std::mem::take(&mut *self.cursors.lock());
        self.donors.lock().clear();

        let mut report = DisposalReport {
            contexts_closed: 1,
            ..Default::default()
        };
        for cursor in cursors {
            let outcome = cursor.close();
            if let Err(e) = &outcome {
                warn!(
                    context = %self.id,
                    segment = cursor.segment(),
                    error = %e,
                    "cursor disposal failed, continuing"
                );
            }
            report.record_cursor(outcome);
        }

        debug!(
            context = %self.id,
            cursors = report.cursors_closed,
            handles = report.handles_released,
            failures = report.failures.len(),
            "execution context closed"
        );
        report
    }
}

impl Drop for ExecutionContext {
    fn drop(&mut self) {
        let report = self.close();
        if !report.is_clean() {
            warn!(
                context = %self.id,
                failures = report.failures.len(),
                "execution context dropped with disposal failures"
            );
        }
    }
}

impl std::fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("id", &self.id)
            .field("field", &self.query.field)
            .field("cursors", &self.cursor_count())
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}
