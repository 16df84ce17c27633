//! Same-class detection merging.
//!
//! Two detectors run on every frame and both report people and the smaller
//! cheating objects, so one physical object often shows up as several
//! overlapping boxes. The merger collapses each overlapping group into the
//! single detection with the largest box.
//!
//! Clustering is single-link against each cluster's seed box: detections are
//! visited in input order and join the first cluster whose seed overlaps them
//! by at least the IoU threshold. Output lists pass-through detections first
//! in input order, followed by one representative per cluster, grouped by
//! class in order of first appearance.

use std::collections::HashSet;

use proctor_models::Detection;

use crate::config::MergeConfig;

/// A group of detections believed to be one physical object.
#[derive(Debug)]
struct Cluster<'a> {
    /// First detection in the cluster; membership is tested against it
    seed: &'a Detection,
    /// Largest-area member seen so far
    best: &'a Detection,
}

impl<'a> Cluster<'a> {
    fn new(seed: &'a Detection) -> Self {
        Self { seed, best: seed }
    }

    fn absorb(&mut self, detection: &'a Detection) {
        // Strictly greater keeps the first-encountered member on ties
        if detection.area() > self.best.area() {
            self.best = detection;
        }
    }
}

/// Collapses overlapping same-class detections.
#[derive(Debug, Clone)]
pub struct DetectionMerger {
    iou_threshold: f64,
    classes: HashSet<String>,
}

impl DetectionMerger {
    pub fn new(config: &MergeConfig) -> Self {
        Self {
            iou_threshold: config.iou_threshold,
            classes: config.classes.iter().cloned().collect(),
        }
    }

    pub fn iou_threshold(&self) -> f64 {
        self.iou_threshold
    }

    /// Whether a class takes part in merging.
    pub fn is_eligible(&self, class: &str) -> bool {
        self.classes.contains(class)
    }

    /// Merge a frame's detections.
    pub fn merge(&self, detections: &[Detection]) -> Vec<Detection> {
        let mut merged = Vec::with_capacity(detections.len());
        let mut eligible_classes: Vec<&str> = Vec::new();

        for detection in detections {
            if self.is_eligible(&detection.class) {
                if !eligible_classes.contains(&detection.class.as_str()) {
                    eligible_classes.push(&detection.class);
                }
            } else {
                merged.push(detection.clone());
            }
        }

        for class in eligible_classes {
            let members = detections.iter().filter(|d| d.is(class));
            merged.extend(cluster(members, self.iou_threshold).into_iter().cloned());
        }

        merged
    }
}

impl Default for DetectionMerger {
    fn default() -> Self {
        Self::new(&MergeConfig::default())
    }
}

/// Merge detections of the given classes using an IoU threshold.
pub fn merge_by_class(detections: &[Detection], classes: &[&str], iou_threshold: f64) -> Vec<Detection> {
    let config = MergeConfig {
        iou_threshold,
        classes: classes.iter().map(|c| c.to_string()).collect(),
    };
    DetectionMerger::new(&config).merge(detections)
}

/// Single-link clustering of one class, returning each cluster's representative.
fn cluster<'a>(members: impl Iterator<Item = &'a Detection>, iou_threshold: f64) -> Vec<&'a Detection> {
    let mut clusters: Vec<Cluster<'a>> = Vec::new();

    for detection in members {
        match clusters
            .iter_mut()
            .find(|c| c.seed.bbox.iou(&detection.bbox) >= iou_threshold)
        {
            Some(existing) => existing.absorb(detection),
            None => clusters.push(Cluster::new(detection)),
        }
    }

    clusters.into_iter().map(|c| c.best).collect()
}
