//! Head pose and gaze classification from face landmarks.
//!
//! Ratios are normalized by face or eye size so they do not depend on how
//! close the subject sits to the camera:
//! - yaw: nose offset from the cheek midpoint over face width
//! - pitch: nose offset from the forehead/chin midpoint over face height
//! - gaze: mean iris offset from the eye-corner midpoint over eye width
//!
//! Positive yaw and gaze point to the image right, positive pitch points down.

use proctor_models::{FaceLandmarks, HeadObservation, Point};

pub use crate::config::HeadPoseThresholds;

/// Normalized pose ratios and face size for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceGeometry {
    pub yaw: f64,
    pub pitch: f64,
    pub gaze: f64,
    /// Face width in pixels
    pub face_width: f64,
    /// Face height in pixels
    pub face_height: f64,
}

impl FaceGeometry {
    /// Compute ratios from landmarks. Widths and heights are floored at one pixel.
    pub fn from_landmarks(lm: &FaceLandmarks) -> Self {
        let face_width = (lm.right_cheek.x - lm.left_cheek.x).max(1.0);
        let face_height = (lm.chin.y - lm.forehead.y).max(1.0);
        let face_center_x = (lm.left_cheek.x + lm.right_cheek.x) / 2.0;
        let face_center_y = (lm.forehead.y + lm.chin.y) / 2.0;

        let left_gaze = iris_offset(&lm.left_eye, lm.left_iris);
        let right_gaze = iris_offset(&lm.right_eye, lm.right_iris);

        Self {
            yaw: (lm.nose_tip.x - face_center_x) / face_width,
            pitch: (lm.nose_tip.y - face_center_y) / face_height,
            gaze: (left_gaze + right_gaze) / 2.0,
            face_width,
            face_height,
        }
    }
}

fn iris_offset(eye: &[Point; 6], iris: Point) -> f64 {
    let (a, b) = (eye[0].x, eye[3].x);
    let (left, right) = (a.min(b), a.max(b));
    let width = (right - left).max(1.0);
    (iris.x - (left + right) / 2.0) / width
}

/// Turns [`FaceGeometry`] into observation flags.
#[derive(Debug, Clone, Default)]
pub struct HeadPoseClassifier {
    thresholds: HeadPoseThresholds,
}

impl HeadPoseClassifier {
    pub fn new(thresholds: HeadPoseThresholds) -> Self {
        Self { thresholds }
    }

    pub fn classify(&self, geometry: &FaceGeometry, blinked: bool) -> HeadObservation {
        let t = &self.thresholds;
        HeadObservation {
            looking_away: geometry.yaw.abs() > t.look_away_yaw,
            looking_down: geometry.pitch > t.look_down_pitch,
            looking_up: geometry.pitch < t.look_up_pitch,
            looking_left: geometry.gaze < t.gaze_left,
            looking_right: geometry.gaze > t.gaze_right,
            partial_face: geometry.face_width < t.min_face_width
                || geometry.face_height < t.min_face_height,
            yaw: geometry.yaw,
            pitch: geometry.pitch,
            gaze: geometry.gaze,
            blinked,
        }
    }

    /// Classify directly from landmarks.
    pub fn classify_landmarks(&self, landmarks: &FaceLandmarks, blinked: bool) -> HeadObservation {
        self.classify(&FaceGeometry::from_landmarks(landmarks), blinked)
    }
}
