//! Error types for signal stabilization.

use thiserror::Error;

/// Result type for signal operations.
pub type SignalResult<T> = Result<T, SignalError>;

/// Errors raised by the stabilization layer.
///
/// Every variant is a wiring or configuration bug; perception gaps are never
/// reported as errors.
#[derive(Debug, Error)]
pub enum SignalError {
    #[error("Unknown signal key: {0}")]
    UnknownKey(String),

    #[error("Duplicate signal key: {0}")]
    DuplicateKey(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl SignalError {
    /// Create an unknown key error.
    pub fn unknown_key(key: impl AsRef<str>) -> Self {
        Self::UnknownKey(key.as_ref().to_string())
    }

    /// Create a duplicate key error.
    pub fn duplicate_key(key: impl AsRef<str>) -> Self {
        Self::DuplicateKey(key.as_ref().to_string())
    }

    /// Create an invalid configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }
}
