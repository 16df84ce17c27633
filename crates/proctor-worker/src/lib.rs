//! Replay worker for the proctoring signal pipeline.
//!
//! This crate provides:
//! - Environment-driven worker configuration
//! - Stabilizer configuration loading and validation
//! - A replay loop over newline-delimited frame observations
//! - Structured session logging and metrics export

pub mod config;
pub mod error;
pub mod logging;
pub mod replay;

pub use config::{load_stabilizer_config, WorkerConfig};
pub use error::{WorkerError, WorkerResult};
pub use logging::{init_tracing, install_metrics_exporter, SessionLogger};
pub use replay::{ReplaySession, ReplayStats};
