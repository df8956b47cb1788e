//! Crate-wide error type

use thiserror::Error;

use crate::traits::MergeError;

/// Result alias used across the crate
pub type Result<T> = core::result::Result<T, Error>;

/// Errors raised by ingestion, strategy configuration and optimization
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Dataset weight was negative, NaN or infinite
    #[error("invalid weight {weight} for dataset '{dataset}': must be finite and non-negative")]
    InvalidWeight { dataset: String, weight: f64 },

    /// Range method name not recognized
    #[error("unknown range method '{name}'; valid methods: {}", .valid.join(", "))]
    UnknownMethod {
        name: String,
        valid: Vec<&'static str>,
    },

    /// A numeric parameter is outside its accepted domain
    #[error("invalid parameter {name}={value}: {reason}")]
    InvalidParameter {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },

    /// Merging two accumulators with different configurations
    #[error(transparent)]
    Merge(#[from] MergeError),
}

impl Error {
    pub(crate) fn invalid_parameter(name: &'static str, value: f64, reason: &'static str) -> Self {
        Error::InvalidParameter {
            name,
            value,
            reason,
        }
    }
}
