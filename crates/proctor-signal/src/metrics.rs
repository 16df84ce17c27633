//! Metrics emitted by the stabilization pipeline.
//!
//! Recording is a no-op until the host process installs a recorder.

use metrics::{counter, gauge, histogram};

/// Metric names as constants for consistency.
pub mod names {
    // Frame metrics
    pub const FRAMES_PROCESSED_TOTAL: &str = "proctor_frames_processed_total";
    pub const DETECTIONS_MERGED_TOTAL: &str = "proctor_detections_merged_total";
    pub const FRAME_DURATION_SECONDS: &str = "proctor_frame_duration_seconds";

    // Alert metrics
    pub const ALERTS_RAISED_TOTAL: &str = "proctor_alerts_raised_total";
    pub const ALERTS_CLEARED_TOTAL: &str = "proctor_alerts_cleared_total";
    pub const ALERTS_ACTIVE: &str = "proctor_alerts_active";

    // Liveness metrics
    pub const FAKE_PRESENCE_FRAMES_TOTAL: &str = "proctor_fake_presence_frames_total";
    pub const BLINKS_TOTAL: &str = "proctor_blinks_total";
}

/// Record one processed frame.
pub fn record_frame_processed(duration_secs: f64) {
    counter!(names::FRAMES_PROCESSED_TOTAL).increment(1);
    histogram!(names::FRAME_DURATION_SECONDS).record(duration_secs);
}

/// Record detections removed by merging.
pub fn record_detections_merged(removed: usize) {
    if removed > 0 {
        counter!(names::DETECTIONS_MERGED_TOTAL).increment(removed as u64);
    }
}

/// Record an emitted alert.
pub fn record_alert_raised(key: &str, repeat: bool) {
    let labels = [("key", key.to_string()), ("repeat", repeat.to_string())];
    counter!(names::ALERTS_RAISED_TOTAL, &labels).increment(1);
}

/// Record a key returning to inactive.
pub fn record_alert_cleared(key: &str) {
    let labels = [("key", key.to_string())];
    counter!(names::ALERTS_CLEARED_TOTAL, &labels).increment(1);
}

/// Update the displayed alerts gauge.
pub fn set_active_alerts(count: usize) {
    gauge!(names::ALERTS_ACTIVE).set(count as f64);
}

/// Record a frame judged as fake presence.
pub fn record_fake_presence_frame() {
    counter!(names::FAKE_PRESENCE_FRAMES_TOTAL).increment(1);
}

/// Record a completed blink.
pub fn record_blink() {
    counter!(names::BLINKS_TOTAL).increment(1);
}
