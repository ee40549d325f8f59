//! Environment-backed configuration.
//!
//! Every setting has a default. Override with `VSCORE_*` environment variables.

pub mod error;


pub use error::ConfigError;

use std::env;
use std::str::FromStr;

use crate::constants::{DEFAULT_VECTOR_DIM, DEFAULT_VECTOR_FIELD, DimConfig};
use crate::scoring::{ScorerFactory, ScoringResult, ScoringStrategy};

/// Default number of hits returned by the demo driver.
pub const DEFAULT_TOP_K: usize = 10;

/// Scoring configuration loaded from environment variables.
///
/// Use [`Config::from_env`] to read `VSCORE_*` overrides on top of defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Scoring backend. Default: `default`.
    pub strategy: ScoringStrategy,

    /// Name of the binary doc-values field holding vectors. Default: `vector`.
    pub field: String,

    /// Vector dimension shared by writer and reader. Default: `512`.
    pub vector_dim: usize,

    /// Max vectors held by the cached strategy. `None` (default) is unbounded.
    pub cache_capacity: Option<u64>,

    /// Hits returned per query. Default: `10`.
    pub top_k: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            strategy: ScoringStrategy::Default,
            field: DEFAULT_VECTOR_FIELD.to_string(),
            vector_dim: DEFAULT_VECTOR_DIM,
            cache_capacity: None,
            top_k: DEFAULT_TOP_K,
        }
    }
}

impl Config {
    const ENV_STRATEGY: &'static str = "VSCORE_STRATEGY";
    const ENV_FIELD: &'static str = "VSCORE_FIELD";
    const ENV_VECTOR_DIM: &'static str = "VSCORE_VECTOR_DIM";
    const ENV_CACHE_CAPACITY: &'static str = "VSCORE_CACHE_CAPACITY";
    const ENV_TOP_K: &'static str = "VSCORE_TOP_K";

    /// Loads configuration from environment variables (falling back to defaults).
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let strategy = Self::parse_strategy_from_env(defaults.strategy)?;
        let field = Self::parse_string_from_env(Self::ENV_FIELD, defaults.field);
        let vector_dim = Self::parse_from_env(Self::ENV_VECTOR_DIM, defaults.vector_dim)?;
        let cache_capacity = Self::parse_optional_from_env(Self::ENV_CACHE_CAPACITY)?;
        let top_k = Self::parse_from_env(Self::ENV_TOP_K, defaults.top_k)?;

        Ok(Self {
            strategy,
            field,
            vector_dim,
            cache_capacity,
            top_k,
        })
    }

    /// Checks the basic invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.field.trim().is_empty() {
            return Err(ConfigError::EmptyField);
        }
        self.dims().validate().map_err(|_| ConfigError::ZeroValue {
            name: Self::ENV_VECTOR_DIM,
        })?;
        if self.top_k == 0 {
            return Err(ConfigError::ZeroValue {
                name: Self::ENV_TOP_K,
            });
        }
        if self.cache_capacity == Some(0) {
            return Err(ConfigError::ZeroValue {
                name: Self::ENV_CACHE_CAPACITY,
            });
        }
        Ok(())
    }

    /// Returns the dimension config for the vector field.
    pub fn dims(&self) -> DimConfig {
        DimConfig::new(self.vector_dim)
    }

    /// Resolves the configured strategy into a scorer factory.
    pub fn build_factory(&self) -> ScoringResult<ScorerFactory> {
        match (self.strategy, self.cache_capacity) {
            (ScoringStrategy::Cached, Some(capacity)) => {
                Ok(ScorerFactory::cached_with_capacity(capacity))
            }
            (strategy, _) => ScorerFactory::from_strategy(strategy),
        }
    }

    fn parse_strategy_from_env(default: ScoringStrategy) -> Result<ScoringStrategy, ConfigError> {
        match env::var(Self::ENV_STRATEGY) {
            Ok(value) if !value.trim().is_empty() => value
                .parse()
                .map_err(|reason| ConfigError::InvalidStrategy { value, reason }),
            _ => Ok(default),
        }
    }

    fn parse_string_from_env(var_name: &str, default: String) -> String {
        env::var(var_name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or(default)
    }

    fn parse_from_env<T>(var_name: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr<Err = std::num::ParseIntError>,
    {
        Ok(Self::parse_optional_from_env(var_name)?.unwrap_or(default))
    }

    fn parse_optional_from_env<T>(var_name: &'static str) -> Result<Option<T>, ConfigError>
    where
        T: FromStr<Err = std::num::ParseIntError>,
    {
        match env::var(var_name) {
            Ok(value) if !value.trim().is_empty() => value
                .trim()
                .parse()
                .map(Some)
                .map_err(|source| ConfigError::ParseError {
                    name: var_name,
                    value,
                    source,
                }),
            _ => Ok(None),
        }
    }
}
