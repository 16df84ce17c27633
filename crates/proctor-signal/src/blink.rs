//! Blink detection from the eye aspect ratio (EAR).

use proctor_models::{FaceLandmarks, Point};

use crate::config::BlinkConfig;

/// Eye aspect ratio of a six-point eye contour.
///
/// Returns `None` when the eye corners coincide.
pub fn eye_aspect_ratio(eye: &[Point; 6]) -> Option<f64> {
    let horizontal = eye[0].distance(&eye[3]);
    if horizontal <= f64::EPSILON {
        return None;
    }
    let vertical = eye[1].distance(&eye[5]) + eye[2].distance(&eye[4]);
    Some(vertical / (2.0 * horizontal))
}

/// Mean EAR over both eyes.
pub fn landmarks_ear(landmarks: &FaceLandmarks) -> Option<f64> {
    let left = eye_aspect_ratio(&landmarks.left_eye)?;
    let right = eye_aspect_ratio(&landmarks.right_eye)?;
    Some((left + right) / 2.0)
}

/// Counts closed-eye runs and reports a blink when the eyes reopen.
#[derive(Debug, Clone)]
pub struct BlinkDetector {
    ear_threshold: f64,
    min_closed_frames: u32,
    closed_frames: u32,
    total_blinks: u64,
}

impl BlinkDetector {
    pub fn new(config: &BlinkConfig) -> Self {
        Self {
            ear_threshold: config.ear_threshold,
            min_closed_frames: config.min_closed_frames,
            closed_frames: 0,
            total_blinks: 0,
        }
    }

    /// Feed one frame's EAR. Returns true when a blink just completed.
    ///
    /// `None` (unmeasurable eyes) counts as an open frame.
    pub fn update(&mut self, ear: Option<f64>) -> bool {
        if ear.is_some_and(|e| e < self.ear_threshold) {
            self.closed_frames += 1;
            return false;
        }

        let blinked = self.closed_frames >= self.min_closed_frames;
        if blinked {
            self.total_blinks += 1;
        }
        self.closed_frames = 0;
        blinked
    }

    /// Drop any partial closed-eye run, e.g. when the face is lost.
    pub fn reset(&mut self) {
        self.closed_frames = 0;
    }

    /// Count an externally detected blink toward the total.
    pub fn record_external(&mut self) {
        self.total_blinks += 1;
    }

    pub fn total_blinks(&self) -> u64 {
        self.total_blinks
    }
}

impl Default for BlinkDetector {
    fn default() -> Self {
        Self::new(&BlinkConfig::default())
    }
}
