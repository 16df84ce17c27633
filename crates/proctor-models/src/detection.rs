//! Object detections produced by the external detector.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::geometry::BoundingBox;

/// Class labels emitted by the person and cheating-object detectors.
pub mod classes {
    pub const PERSON: &str = "person";
    pub const CELL_PHONE: &str = "cell_phone";
    pub const BOOK: &str = "book";
    pub const HEADPHONE: &str = "headphone";
    pub const EARBUD: &str = "earbud";

    /// Classes produced by both detectors, which therefore need merging.
    pub const MERGEABLE: &[&str] = &[PERSON, CELL_PHONE, BOOK, HEADPHONE, EARBUD];
}

/// One perceived object in a frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Detection {
    /// Category label
    pub class: String,
    /// Detection confidence score (0.0-1.0)
    pub confidence: f64,
    /// Bounding box in pixel coordinates
    pub bbox: BoundingBox,
}

impl Detection {
    /// Create a new detection.
    pub fn new(class: impl Into<String>, confidence: f64, bbox: BoundingBox) -> Self {
        Self {
            class: class.into(),
            confidence,
            bbox,
        }
    }

    /// Check if this detection has the given class label.
    pub fn is(&self, class: &str) -> bool {
        self.class == class
    }

    /// Check if this is a person detection.
    pub fn is_person(&self) -> bool {
        self.is(classes::PERSON)
    }

    /// Bounding box area in pixels.
    pub fn area(&self) -> f64 {
        self.bbox.area()
    }
}
