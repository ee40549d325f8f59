//! Configuration error types.

use thiserror::Error;

/// Errors that can occur during configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Strategy name is not one of `default`, `cached`, `external`.
    #[error("invalid scoring strategy '{value}': {reason}")]
    InvalidStrategy { value: String, reason: String },

    /// A numeric environment variable could not be parsed.
    #[error("failed to parse {name}='{value}': {source}")]
    ParseError {
        name: &'static str,
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },

    /// A numeric setting is zero where a positive value is required.
    #[error("{name} must be greater than zero")]
    ZeroValue { name: &'static str },

    /// The vector field name is empty.
    #[error("vector field name must not be empty")]
    EmptyField,
}
