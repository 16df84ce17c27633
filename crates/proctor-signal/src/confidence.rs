//! Per-class confidence filtering of raw detector output.

use std::collections::HashMap;

use proctor_models::Detection;

use crate::config::ConfidenceConfig;

/// Drops detections below their class's minimum confidence.
#[derive(Debug, Clone)]
pub struct ConfidenceFilter {
    default: f64,
    per_class: HashMap<String, f64>,
}

impl ConfidenceFilter {
    pub fn new(config: &ConfidenceConfig) -> Self {
        Self {
            default: config.default,
            per_class: config.per_class.clone(),
        }
    }

    /// Minimum confidence for a class.
    pub fn threshold(&self, class: &str) -> f64 {
        self.per_class.get(class).copied().unwrap_or(self.default)
    }

    pub fn accepts(&self, detection: &Detection) -> bool {
        detection.confidence >= self.threshold(&detection.class)
    }

    /// Keep accepted detections, preserving input order.
    pub fn apply(&self, detections: &[Detection]) -> Vec<Detection> {
        detections
            .iter()
            .filter(|d| self.accepts(d))
            .cloned()
            .collect()
    }
}

impl Default for ConfidenceFilter {
    fn default() -> Self {
        Self::new(&ConfidenceConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proctor_models::{classes, BoundingBox};

    fn det(class: &str, confidence: f64) -> Detection {
        Detection::new(class, confidence, BoundingBox::new(0.0, 0.0, 10.0, 10.0))
    }

    #[test]
    fn test_per_class_thresholds() {
        let filter = ConfidenceFilter::default();
        assert!(!filter.accepts(&det(classes::CELL_PHONE, 0.55)));
        assert!(filter.accepts(&det(classes::CELL_PHONE, 0.6)));
        assert!(filter.accepts(&det(classes::BOOK, 0.45)));
        assert!(!filter.accepts(&det("laptop", 0.49)));
    }

    #[test]
    fn test_filter_preserves_order() {
        let filter = ConfidenceFilter::default();
        let kept = filter.apply(&[
            det(classes::PERSON, 0.9),
            det(classes::CELL_PHONE, 0.2),
            det(classes::BOOK, 0.7),
        ]);
        let kept: Vec<_> = kept.iter().map(|d| d.class.as_str()).collect();
        assert_eq!(kept, vec![classes::PERSON, classes::BOOK]);
    }
}
