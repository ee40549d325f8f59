//! Pure similarity math.
//!
//! Accumulation happens in `f64` and only the final score is narrowed to `f32`.
//! Zero magnitudes are not guarded: they yield `NaN` or infinities, which callers
//! see as-is.

/// Dot product over the common prefix of `a` and `b`.
#[inline]
pub fn dot(a: &[f32], b: &[f32]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(&x, &y)| x as f64 * y as f64)
        .sum()
}

/// Euclidean norm, `sqrt(Σv²)`.
#[inline]
pub fn magnitude(v: &[f32]) -> f64 {
    v.iter().map(|&x| x as f64 * x as f64).sum::<f64>().sqrt()
}

/// Cosine similarity, computing any magnitude not supplied.
#[inline]
pub fn cosine_similarity(a: &[f32], b: &[f32], mag_a: Option<f64>, mag_b: Option<f64>) -> f32 {
    let mag_a = mag_a.unwrap_or_else(|| magnitude(a));
    let mag_b = mag_b.unwrap_or_else(|| magnitude(b));
    (dot(a, b) / (mag_a * mag_b)) as f32
}

/// Cosine similarity of two vectors whose last element is their precomputed magnitude.
///
/// Both slices must be non-empty and of equal length.
#[inline]
pub(crate) fn cosine_similarity_packed(a: &[f32], b: &[f32]) -> f32 {
    let size = a.len() - 1;
    cosine_similarity(
        &a[..size],
        &b[..size],
        Some(a[size] as f64),
        Some(b[size] as f64),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dot_and_magnitude() {
        assert_eq!(dot(&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]), 32.0);
        assert_eq!(magnitude(&[3.0, 4.0]), 5.0);
        assert_eq!(magnitude(&[]), 0.0);
    }

    #[test]
    fn test_cosine_identical_vectors() {
        let v = [0.3, -1.2, 4.5, 0.01];
        let similarity = cosine_similarity(&v, &v, None, None);
        assert!((similarity - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_orthogonal_and_opposite() {
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0], None, None).abs() < 1e-6);
        assert!((cosine_similarity(&[1.0, 0.0], &[-2.0, 0.0], None, None) + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_uses_supplied_magnitudes() {
        // Deliberately wrong magnitudes prove they are not recomputed.
        let similarity = cosine_similarity(&[1.0, 0.0], &[1.0, 0.0], Some(2.0), Some(2.0));
        assert_eq!(similarity, 0.25);
    }

    #[test]
    fn test_cosine_zero_vector_is_not_guarded() {
        let similarity = cosine_similarity(&[0.0, 0.0], &[1.0, 2.0], None, None);
        assert!(similarity.is_nan());
    }

    #[test]
    fn test_cosine_packed() {
        let a = [3.0, 4.0, 5.0];
        let b = [6.0, 8.0, 10.0];
        assert!((cosine_similarity_packed(&a, &b) - 1.0).abs() < 1e-6);
    }
}
