//! Test fixtures for integration tests.

use vscore::index::{MemoryIndex, MemorySegment};

pub const FIELD: &str = "vector";

pub const DEFAULT_SEED: u64 = 0x5eed;

/// Dimension used by the full-size scenarios.
pub const FULL_DIM: usize = vscore::constants::DEFAULT_VECTOR_DIM;

/// splitmix64 step.
fn mix(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    x = (x ^ (x >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    x = (x ^ (x >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    x ^ (x >> 31)
}

/// Deterministic vector with components in `[-1, 1)`.
pub fn generate_deterministic_vector(seed: u64, dim: usize) -> Vec<f32> {
    let mut state = mix(seed);
    (0..dim)
        .map(|_| {
            state = mix(state);
            ((state >> 40) as f32 / (1u64 << 23) as f32) - 1.0
        })
        .collect()
}

/// Vectors for documents `0..count`, seeded by document number.
pub fn create_batch_vectors(count: usize, dim: usize) -> Vec<Vec<f32>> {
    (0..count)
        .map(|doc| generate_deterministic_vector(DEFAULT_SEED.wrapping_add(doc as u64), dim))
        .collect()
}

#[derive(Debug, Clone)]
pub struct IndexBuilder {
    segment_size: usize,
    include_magnitude: bool,
    gaps_every: Option<usize>,
}

impl Default for IndexBuilder {
    fn default() -> Self {
        Self {
            segment_size: 1_000,
            include_magnitude: true,
            gaps_every: None,
        }
    }
}

impl IndexBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn segment_size(mut self, size: usize) -> Self {
        self.segment_size = size;
        self
    }

    pub fn include_magnitude(mut self, include: bool) -> Self {
        self.include_magnitude = include;
        self
    }

    /// Leaves every `n`th document without a vector.
    pub fn gaps_every(mut self, n: usize) -> Self {
        self.gaps_every = Some(n);
        self
    }

    pub fn build(self, vectors: &[Vec<f32>]) -> MemoryIndex {
        let mut builder = MemoryIndex::builder(FIELD).segment_size(self.segment_size);
        for (doc, vector) in vectors.iter().enumerate() {
            match self.gaps_every {
                Some(n) if doc % n == n - 1 => {
                    builder.add_document(None);
                }
                _ => {
                    builder.add_vector(vector, self.include_magnitude);
                }
            }
        }
        builder.build()
    }
}

/// A single-document segment carrying `bytes` verbatim.
pub fn raw_segment(bytes: Vec<u8>) -> MemorySegment {
    let mut columns = std::collections::HashMap::new();
    columns.insert(FIELD.to_string(), vec![(0, bytes)]);
    MemorySegment::new(0, 0, columns)
}

/// Brute-force best document by cosine similarity.
pub fn brute_force_top1(query: &[f32], vectors: &[Vec<f32>]) -> usize {
    let mut best = 0;
    let mut best_score = f64::NEG_INFINITY;
    for (doc, vector) in vectors.iter().enumerate() {
        let score = vscore::similarity::dot(query, vector)
            / (vscore::similarity::magnitude(query) * vscore::similarity::magnitude(vector));
        if score > best_score {
            best = doc;
            best_score = score;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vectors_are_deterministic() {
        assert_eq!(
            generate_deterministic_vector(7, 16),
            generate_deterministic_vector(7, 16)
        );
        assert_ne!(
            generate_deterministic_vector(7, 16),
            generate_deterministic_vector(8, 16)
        );
    }

    #[test]
    fn test_vector_components_in_range() {
        let vector = generate_deterministic_vector(DEFAULT_SEED, 1024);
        assert!(vector.iter().all(|x| (-1.0..1.0).contains(x)));
    }

    #[test]
    fn test_gaps() {
        let vectors = create_batch_vectors(10, 4);
        let index = IndexBuilder::new().segment_size(10).gaps_every(5).build(&vectors);
        assert_eq!(index.max_doc(), 10);
        assert_eq!(index.segments()[0].value_count(FIELD), 8);
    }
}
