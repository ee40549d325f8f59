//! In-memory document value store.

use std::collections::HashMap;
use std::sync::Arc;

use super::types::{GlobalDocId, LocalDocId};
use super::{DocValues, SegmentReader};
use crate::codec;

type Column = Arc<[(LocalDocId, Vec<u8>)]>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Position {
    Unpositioned,
    At(usize),
    Exhausted,
}

/// [`DocValues`] over one column of a [`MemorySegment`].
#[derive(Debug)]
pub struct MemoryDocValues {
    column: Column,
    position: Position,
}

impl MemoryDocValues {
    fn new(column: Column) -> Self {
        Self {
            column,
            position: Position::Unpositioned,
        }
    }

    fn settle(&mut self, index: usize) -> Option<LocalDocId> {
        if index < self.column.len() {
            self.position = Position::At(index);
            Some(self.column[index].0)
        } else {
            self.position = Position::Exhausted;
            None
        }
    }
}

impl DocValues for MemoryDocValues {
    fn next_doc(&mut self) -> Option<LocalDocId> {
        match self.position {
            Position::Unpositioned => self.settle(0),
            Position::At(i) => self.settle(i + 1),
            Position::Exhausted => None,
        }
    }

    fn advance(&mut self, target: LocalDocId) -> Option<LocalDocId> {
        let start = match self.position {
            Position::Unpositioned => 0,
            Position::At(i) if self.column[i].0 >= target => return Some(self.column[i].0),
            Position::At(i) => i + 1,
            Position::Exhausted => return None,
        };
        let offset = self.column[start..].partition_point(|(id, _)| *id < target);
        self.settle(start + offset)
    }

    fn doc_id(&self) -> Option<LocalDocId> {
        match self.position {
            Position::At(i) => Some(self.column[i].0),
            Position::Unpositioned | Position::Exhausted => None,
        }
    }

    fn binary_value(&self) -> Option<&[u8]> {
        match self.position {
            Position::At(i) => Some(&self.column[i].1),
            Position::Unpositioned | Position::Exhausted => None,
        }
    }

    fn cost(&self) -> usize {
        self.column.len()
    }
}

/// One immutable segment held in memory.
#[derive(Debug, Clone)]
pub struct MemorySegment {
    ord: usize,
    doc_base: u64,
    columns: HashMap<String, Column>,
}

impl MemorySegment {
    /// Builds a segment from per-field `(local id, encoded value)` lists.
    ///
    /// Values are sorted by id; fields with no values are dropped.
    pub fn new(
        ord: usize,
        doc_base: u64,
        columns: HashMap<String, Vec<(LocalDocId, Vec<u8>)>>,
    ) -> Self {
        let columns = columns
            .into_iter()
            .filter(|(_, values)| !values.is_empty())
            .map(|(field, mut values)| {
                values.sort_by_key(|(id, _)| *id);
                (field, Column::from(values))
            })
            .collect();

        Self {
            ord,
            doc_base,
            columns,
        }
    }

    /// A segment with no values for any field.
    pub fn empty(ord: usize, doc_base: u64) -> Self {
        Self::new(ord, doc_base, HashMap::new())
    }

    /// Number of values stored for `field`.
    pub fn value_count(&self, field: &str) -> usize {
        self.columns.get(field).map_or(0, |c| c.len())
    }
}

impl SegmentReader for MemorySegment {
    fn segment_ord(&self) -> usize {
        self.ord
    }

    fn doc_base(&self) -> u64 {
        self.doc_base
    }

    fn binary_doc_values(&self, field: &str) -> Option<Box<dyn DocValues>> {
        let column = self.columns.get(field)?;
        Some(Box::new(MemoryDocValues::new(Arc::clone(column))))
    }
}

/// A segmented in-memory index.
#[derive(Debug, Clone, Default)]
pub struct MemoryIndex {
    segments: Vec<MemorySegment>,
    max_doc: u64,
}

impl MemoryIndex {
    pub fn builder(field: impl Into<String>) -> MemoryIndexBuilder {
        MemoryIndexBuilder::new(field)
    }

    /// Assembles an index from prebuilt segments. `max_doc` bounds all global ids.
    pub fn from_segments(segments: Vec<MemorySegment>, max_doc: u64) -> Self {
        Self { segments, max_doc }
    }

    pub fn segments(&self) -> &[MemorySegment] {
        &self.segments
    }

    pub fn max_doc(&self) -> u64 {
        self.max_doc
    }
}

/// Accumulates documents for one vector field and cuts them into segments.
#[derive(Debug)]
pub struct MemoryIndexBuilder {
    field: String,
    segment_size: usize,
    docs: Vec<Option<Vec<u8>>>,
}

impl MemoryIndexBuilder {
    const DEFAULT_SEGMENT_SIZE: usize = 10_000;

    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            segment_size: Self::DEFAULT_SEGMENT_SIZE,
            docs: Vec::new(),
        }
    }

    /// Documents per segment (minimum 1).
    pub fn segment_size(mut self, segment_size: usize) -> Self {
        self.segment_size = segment_size.max(1);
        self
    }

    /// Adds a document with raw encoded bytes, or without a value.
    pub fn add_document(&mut self, value: Option<Vec<u8>>) -> GlobalDocId {
        let id = GlobalDocId(self.docs.len() as u64);
        self.docs.push(value);
        id
    }

    /// Encodes and adds a vector.
    pub fn add_vector(&mut self, vector: &[f32], include_magnitude: bool) -> GlobalDocId {
        self.add_document(Some(codec::encode(vector, include_magnitude)))
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    pub fn build(self) -> MemoryIndex {
        let max_doc = self.docs.len() as u64;
        let mut segments = Vec::with_capacity(self.docs.len().div_ceil(self.segment_size));
        let mut docs = self.docs.into_iter();
        let mut doc_base = 0u64;

        loop {
            let chunk: Vec<Option<Vec<u8>>> = docs.by_ref().take(self.segment_size).collect();
            if chunk.is_empty() {
                break;
            }
            let chunk_len = chunk.len() as u64;

            let values: Vec<(LocalDocId, Vec<u8>)> = chunk
                .into_iter()
                .enumerate()
                .filter_map(|(local, value)| value.map(|bytes| (local as LocalDocId, bytes)))
                .collect();

            let mut columns = HashMap::new();
            columns.insert(self.field.clone(), values);
            segments.push(MemorySegment::new(segments.len(), doc_base, columns));

            doc_base += chunk_len;
        }

        MemoryIndex { segments, max_doc }
    }
}
