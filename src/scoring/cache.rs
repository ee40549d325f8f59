//! Decoded-vector cache shared by the cursors of one cached [`ScorerFactory`].
//!
//! Keyed by [`GlobalDocId`]. Unbounded unless built with a capacity, and never
//! invalidated: discard the factory when the index changes.
//!
//! [`ScorerFactory`]: super::ScorerFactory

use moka::sync::Cache;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::codec::{CodecResult, DecodedVector};
use crate::index::GlobalDocId;

#[derive(Debug, Default)]
struct CacheCounters {
    hits: AtomicU64,
    misses: AtomicU64,
}

/// Shared handle to the decoded-vector map. Clones share entries and counters.
#[derive(Clone)]
pub struct VectorCache {
    entries: Cache<GlobalDocId, Arc<DecodedVector>>,
    counters: Arc<CacheCounters>,
    capacity: Option<u64>,
}

impl VectorCache {
    /// Creates an unbounded cache.
    #[inline]
    pub fn new() -> Self {
        Self {
            entries: Cache::builder().build(),
            counters: Arc::new(CacheCounters::default()),
            capacity: None,
        }
    }

    /// Creates a cache holding at most `capacity` vectors (LRU-style eviction).
    #[inline]
    pub fn with_capacity(capacity: u64) -> Self {
        Self {
            entries: Cache::builder().max_capacity(capacity).build(),
            counters: Arc::new(CacheCounters::default()),
            capacity: Some(capacity),
        }
    }

    /// Returns the cached vector for `doc`, decoding and inserting it on a miss.
    ///
    /// Concurrent misses on the same id may both decode; the last insert wins.
    pub fn get_or_decode<F>(&self, doc: GlobalDocId, decode: F) -> CodecResult<Arc<DecodedVector>>
    where
        F: FnOnce() -> CodecResult<DecodedVector>,
    {
        if let Some(vector) = self.entries.get(&doc) {
            self.counters.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(vector);
        }

        self.counters.misses.fetch_add(1, Ordering::Relaxed);
        let vector = Arc::new(decode()?);
        self.entries.insert(doc, Arc::clone(&vector));
        Ok(vector)
    }

    #[inline]
    pub fn get(&self, doc: GlobalDocId) -> Option<Arc<DecodedVector>> {
        self.entries.get(&doc)
    }

    #[inline]
    pub fn contains(&self, doc: GlobalDocId) -> bool {
        self.entries.contains_key(&doc)
    }

    /// Number of cached vectors (after pending maintenance).
    pub fn len(&self) -> u64 {
        self.entries.run_pending_tasks();
        self.entries.entry_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Lookups answered from the cache.
    #[inline]
    pub fn hits(&self) -> u64 {
        self.counters.hits.load(Ordering::Relaxed)
    }

    /// Lookups that had to decode.
    #[inline]
    pub fn misses(&self) -> u64 {
        self.counters.misses.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn capacity(&self) -> Option<u64> {
        self.capacity
    }

    #[inline]
    pub fn clear(&self) {
        self.entries.invalidate_all();
    }
}

impl Default for VectorCache {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for VectorCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VectorCache")
            .field("entries", &self.entries.entry_count())
            .field("capacity", &self.capacity)
            .field("hits", &self.hits())
            .field("misses", &self.misses())
            .finish()
    }
}
