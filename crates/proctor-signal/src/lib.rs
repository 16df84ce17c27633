#![deny(unreachable_patterns)]
//! Signal stabilization and alerting for per-frame proctoring observations.
//!
//! Raw perception output flickers: detectors miss objects for a frame, report
//! one object twice, and head pose jitters around its thresholds. This crate
//! turns that stream into stable per-signal booleans and a small set of
//! rate-limited alerts.
//!
//! # Architecture
//!
//! ```text
//! FrameObservation
//!     │
//!     ▼
//! ┌────────────────────┐
//! │ Confidence Filter  │ ← Per-class minimum confidence
//! └─────────┬──────────┘
//!           ▼
//! ┌────────────────────┐
//! │ Detection Merger   │ ← One detection per physical object
//! └─────────┬──────────┘
//!           ▼
//! ┌──────────────┬──────────────────┬─────────────────────┐
//! │ Window Voter │ Duration Debounce│ Liveness Classifier │
//! │  (objects)   │  (head / face)   │  (static image)     │
//! └──────┬───────┴────────┬─────────┴──────────┬──────────┘
//!        └────────────────┼────────────────────┘
//!                         ▼
//!              ┌─────────────────────┐
//!              │ Alert Hysteresis    │ ← cooldown / reset cooldown
//!              └──────────┬──────────┘
//!                         ▼
//!              ┌─────────────────────┐
//!              │ Alert Queue         │ ← display window
//!              └─────────────────────┘
//! ```
//!
//! Every time-dependent component reads an injectable [`Clock`], and each
//! operation also has an `_at` variant taking the time explicitly.

pub mod alert_queue;
pub mod blink;
pub mod clock;
pub mod confidence;
pub mod config;
pub mod debounce;
pub mod error;
pub mod head_pose;
pub mod hysteresis;
pub mod liveness;
pub mod merge;
pub mod metrics;
pub mod pipeline;
pub mod voter;

#[cfg(test)]
mod tests;

pub use alert_queue::AlertQueue;
pub use blink::{eye_aspect_ratio, BlinkDetector};
pub use clock::{Clock, ManualClock, SharedClock, SystemClock};
pub use confidence::ConfidenceFilter;
pub use config::{
    AlertConfig, CooldownOverride, HeadCondition, PresenceCondition, SignalKind, SignalSpec,
    SignalTable, StabilizerConfig,
};
pub use debounce::DurationDebouncer;
pub use error::{SignalError, SignalResult};
pub use head_pose::{FaceGeometry, HeadPoseClassifier, HeadPoseThresholds};
pub use hysteresis::{AlertEngine, AlertStats, Transition};
pub use liveness::LivenessClassifier;
pub use merge::{merge_by_class, DetectionMerger};
pub use pipeline::SignalPipeline;
pub use voter::SlidingWindowVoter;
