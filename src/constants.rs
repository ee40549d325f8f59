//! Cross-cutting, shared constants.
//!
//! # Dimension Invariants
//!
//! The vector dimension is not part of the wire format: writer and reader agree on it
//! out of band through field configuration. [`DimConfig`] carries that agreement at
//! runtime; the compile-time constants remain the defaults.

use thiserror::Error;

/// Default number of `f32` components per vector.
pub const DEFAULT_VECTOR_DIM: usize = 512;

/// Bytes per encoded component.
pub const FLOAT_BYTES: usize = std::mem::size_of::<f32>();

/// Upper bound of a cosine score, reported as the cursor max score.
pub const MAX_COSINE_SCORE: f32 = 1.0;

/// Default field holding encoded vectors.
pub const DEFAULT_VECTOR_FIELD: &str = "vector";

/// Runtime dimension configuration shared by writer and reader of a vector field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DimConfig {
    /// Number of vector components (without the trailing magnitude).
    pub vector_dim: usize,
}

impl Default for DimConfig {
    fn default() -> Self {
        Self {
            vector_dim: DEFAULT_VECTOR_DIM,
        }
    }
}

impl DimConfig {
    pub fn new(vector_dim: usize) -> Self {
        Self { vector_dim }
    }

    /// Returns an error if the dimension is zero.
    pub fn validate(&self) -> Result<(), DimValidationError> {
        if self.vector_dim == 0 {
            return Err(DimValidationError::ZeroDimension);
        }
        Ok(())
    }
}

/// Error returned when dimension validation fails.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DimValidationError {
    #[error("vector dimension cannot be zero")]
    ZeroDimension,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dim_config_validate() {
        assert!(DimConfig::default().validate().is_ok());
        assert_eq!(
            DimConfig::new(0).validate(),
            Err(DimValidationError::ZeroDimension)
        );
        assert_eq!(
            DimConfig::new(0).validate().unwrap_err().to_string(),
            "vector dimension cannot be zero"
        );
    }
}
