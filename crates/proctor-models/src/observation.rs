//! Per-frame perception inputs.
//!
//! A frame carries the detector output and, when a face was found, either an
//! already-classified [`HeadObservation`] or the raw [`FaceLandmarks`] it can
//! be derived from.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::detection::Detection;
use crate::geometry::Point;

/// Head pose, gaze and blink observation for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct HeadObservation {
    #[serde(default)]
    pub looking_away: bool,
    #[serde(default)]
    pub looking_down: bool,
    #[serde(default)]
    pub looking_up: bool,
    #[serde(default)]
    pub looking_left: bool,
    #[serde(default)]
    pub looking_right: bool,
    #[serde(default)]
    pub partial_face: bool,
    /// Horizontal nose offset from face center, normalized by face width
    pub yaw: f64,
    /// Vertical nose offset from face center, normalized by face height
    pub pitch: f64,
    /// Mean iris offset from eye center, normalized by eye width
    pub gaze: f64,
    /// A completed blink ended on this frame
    #[serde(default)]
    pub blinked: bool,
}

/// Named facial landmarks in pixel coordinates.
///
/// Eye contours are six points in the order used by the eye aspect ratio:
/// outer corner, two upper lid points, inner corner, two lower lid points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FaceLandmarks {
    pub nose_tip: Point,
    pub left_cheek: Point,
    pub right_cheek: Point,
    pub forehead: Point,
    pub chin: Point,
    pub left_eye: [Point; 6],
    pub right_eye: [Point; 6],
    pub left_iris: Point,
    pub right_iris: Point,
}

/// Everything the perception layer produced for one frame.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct FrameObservation {
    /// Capture time in seconds; replays use it as the pipeline clock
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<f64>,

    /// Raw detector output
    #[serde(default)]
    pub detections: Vec<Detection>,

    /// Classified head observation, when the face source provides one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head: Option<HeadObservation>,

    /// Raw landmarks, used when no classified observation is present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub landmarks: Option<FaceLandmarks>,
}

impl FrameObservation {
    /// True when the face source found no face on this frame.
    pub fn face_missing(&self) -> bool {
        self.head.is_none() && self.landmarks.is_none()
    }
}
