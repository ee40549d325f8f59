//! Document value store interface consumed by scoring cursors.
//!
//! The index, its segments and iteration order belong to the host. Scoring only
//! needs, per segment and field, an iterator over local document ids that exposes
//! the current document's encoded vector, plus the segment's base offset.

pub mod memory;
pub mod types;


pub use memory::{MemoryIndex, MemoryIndexBuilder, MemorySegment};
pub use types::{GlobalDocId, LocalDocId};

/// Forward-only iterator over the documents of one segment that carry a value.
pub trait DocValues: Send {
    /// Moves to the next document and returns its id, or `None` once exhausted.
    fn next_doc(&mut self) -> Option<LocalDocId>;

    /// Moves to the first document `>= target`.
    fn advance(&mut self, target: LocalDocId) -> Option<LocalDocId>;

    /// The current document, `None` before the first move and after exhaustion.
    fn doc_id(&self) -> Option<LocalDocId>;

    /// Encoded value of the current document.
    fn binary_value(&self) -> Option<&[u8]>;

    /// Upper bound on the number of documents this iterator yields.
    fn cost(&self) -> usize;
}

/// One segment of the host index.
pub trait SegmentReader {
    /// Position of the segment within the index.
    fn segment_ord(&self) -> usize;

    /// Offset added to local ids to form [`GlobalDocId`]s.
    fn doc_base(&self) -> u64;

    /// Values for `field`, or `None` if no document in this segment has one.
    fn binary_doc_values(&self, field: &str) -> Option<Box<dyn DocValues>>;
}
