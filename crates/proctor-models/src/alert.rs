//! Alerts and per-frame reports produced by the stabilization layer.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::signal::SignalKey;

/// A displayed alert message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Alert {
    /// Display text
    pub message: String,
    /// Creation time in seconds
    pub timestamp: f64,
}

impl Alert {
    /// Create a new alert.
    pub fn new(message: impl Into<String>, timestamp: f64) -> Self {
        Self {
            message: message.into(),
            timestamp,
        }
    }

    /// Seconds elapsed since the alert was created.
    pub fn age(&self, now: f64) -> f64 {
        now - self.timestamp
    }
}

/// Liveness verdict with the raw variances behind it.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct LivenessDiagnostics {
    /// Low motion variance and no recent blink
    pub fake: bool,
    pub yaw_variance: f64,
    pub pitch_variance: f64,
    pub gaze_variance: f64,
}

/// Output of one pipeline iteration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct FrameReport {
    /// Pipeline time the frame was processed at
    pub timestamp: f64,
    /// Currently displayed alert messages, oldest first
    pub active_alerts: Vec<String>,
    /// Debounced boolean per signal key
    pub signals: BTreeMap<SignalKey, bool>,
    /// Liveness diagnostics for overlay/logging
    pub liveness: LivenessDiagnostics,
    /// Detections remaining after filtering and merging
    pub detection_count: usize,
    /// Blinks counted since the session started
    pub total_blinks: u64,
}

impl FrameReport {
    /// Keys whose debounced signal is currently true.
    pub fn raised_signals(&self) -> impl Iterator<Item = &SignalKey> {
        self.signals
            .iter()
            .filter_map(|(key, raised)| raised.then_some(key))
    }
}
