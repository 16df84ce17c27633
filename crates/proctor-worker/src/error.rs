//! Worker error types.

use proctor_signal::SignalError;
use thiserror::Error;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Metrics exporter failed: {0}")]
    MetricsFailed(String),

    #[error("Signal pipeline error: {0}")]
    Signal(#[from] SignalError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WorkerError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn metrics_failed(msg: impl Into<String>) -> Self {
        Self::MetricsFailed(msg.into())
    }

    /// Check if the error stems from configuration rather than input data.
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            WorkerError::ConfigError(_) | WorkerError::Signal(SignalError::InvalidConfig(_))
        )
    }
}
