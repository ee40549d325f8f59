//! Minimal top-k driver over [`ScoringCursor`]s.
//!
//! Stands in for the host's collector: one execution context, every segment in
//! order, a bounded min-heap of the best scores. Documents scoring `NaN` (zero
//! magnitude on either side) are not ranked.
//!
//! [`ScoringCursor`]: crate::scoring::ScoringCursor

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::index::{GlobalDocId, SegmentReader};
use crate::query::VectorQuery;
use crate::scoring::ScoringResult;

/// A ranked document.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoredDoc {
    pub doc: GlobalDocId,
    pub score: f32,
}

/// Heap entry ordered so that the worst hit sits on top.
#[derive(Debug)]
struct Worst(ScoredDoc);

impl PartialEq for Worst {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Worst {}

impl PartialOrd for Worst {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Worst {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .0
            .score
            .total_cmp(&self.0.score)
            .then_with(|| self.0.doc.cmp(&other.0.doc))
    }
}

/// Scores every document of `segments` and returns the `k` best, best first.
///
/// Ties are broken by ascending document id. The execution context is closed
/// before returning.
pub fn top_k<S: SegmentReader>(
    query: &VectorQuery,
    segments: &[S],
    k: usize,
) -> ScoringResult<Vec<ScoredDoc>> {
    if k == 0 {
        return Ok(Vec::new());
    }

    let context = query.new_execution_context()?;
    let mut heap: BinaryHeap<Worst> = BinaryHeap::with_capacity(k + 1);
    let mut scored = 0usize;

    for segment in segments {
        let Some(mut cursor) = context.scoring_cursor_for(segment)? else {
            continue;
        };
        while cursor.next_doc().is_some() {
            let score = cursor.score()?;
            scored += 1;
            if score.is_nan() {
                continue;
            }
            let Some(doc) = cursor.global_doc_id() else {
                continue;
            };

            let candidate = Worst(ScoredDoc { doc, score });
            if heap.len() < k {
                heap.push(candidate);
            } else if let Some(worst) = heap.peek()
                && candidate < *worst
            {
                heap.pop();
                heap.push(candidate);
            }
        }
    }

    let report = context.close();
    if !report.is_clean() {
        warn!(
            failures = report.failures.len(),
            "disposal failures after top-k collection"
        );
    }

    let hits: Vec<ScoredDoc> = heap.into_sorted_vec().into_iter().map(|w| w.0).collect();
    debug!(
        query = %query,
        scored,
        returned = hits.len(),
        "top-k collection finished"
    );
    Ok(hits)
}
