//! Shared data models for the proctoring signal pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Per-frame perception inputs (detections, head pose, face landmarks)
//! - Signal keys naming each monitored condition
//! - Alerts and per-frame reports produced by the stabilization layer

pub mod alert;
pub mod detection;
pub mod geometry;
pub mod observation;
pub mod signal;

// Re-export common types
pub use alert::{Alert, FrameReport, LivenessDiagnostics};
pub use detection::{classes, Detection};
pub use geometry::{BoundingBox, BoundingBoxError, Point};
pub use observation::{FaceLandmarks, FrameObservation, HeadObservation};
pub use signal::{keys, SignalKey, SignalKeyParseError};
