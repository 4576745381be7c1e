//! Engine error types.

use thiserror::Error;

use crate::IndicatorId;

/// Errors reported by the [`Registry`](crate::Registry).
///
/// Indicator computation itself never fails: short series produce empty
/// output and malformed bars propagate through the arithmetic. Only
/// misconfiguration is an error.
#[derive(Debug, Error)]
pub enum Error {
    /// A parameter is out of its valid domain (zero period, non-positive
    /// standard deviation multiplier, ...).
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// What is wrong with it.
        reason: String,
    },

    /// Indicator kind is unknown or cannot be created from the given input.
    #[error("unsupported indicator: {0}")]
    UnsupportedIndicator(String),

    /// No instance with this id is registered.
    #[error("unknown indicator id: {0}")]
    UnknownId(IndicatorId),

    /// Session config could not be (de)serialized.
    #[error("invalid indicator config: {0}")]
    Config(#[from] serde_json::Error),
}

impl Error {
    /// Creates an `InvalidParameter` error.
    #[must_use]
    pub fn invalid_parameter(name: &'static str, reason: impl Into<String>) -> Self {
        Error::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
