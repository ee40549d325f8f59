//! Vector fingerprints.
//!
//! A fingerprint identifies a query by content. It keys the scorer donation
//! registry of an execution context and feeds the `Hash` impl of queries.

use blake3::Hasher;

/// Truncates a BLAKE3 digest to its first 64 bits.
///
/// With 64 bits the birthday bound sits around 4.3 billion distinct inputs. An
/// execution context only ever looks up the fingerprint of its own query, so the
/// donation registry never holds two distinct vectors. `VectorQuery` equality
/// compares contents, so hash collisions never merge distinct queries.
#[inline]
fn truncate_to_u64(hash: &blake3::Hash) -> u64 {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&hash.as_bytes()[..8]);
    u64::from_le_bytes(bytes)
}

/// Fingerprints a (field, vector) pair by the bit patterns of the components.
///
/// `0.0` and `-0.0` fingerprint differently, and every `NaN` bit pattern is
/// distinct, matching the bitwise equality used for queries.
#[inline]
pub fn query_fingerprint(field: &str, vector: &[f32]) -> u64 {
    let mut hasher = Hasher::new();
    hasher.update(field.as_bytes());
    hasher.update(b"|");
    hasher.update(bytemuck::cast_slice(vector));
    truncate_to_u64(&hasher.finalize())
}
