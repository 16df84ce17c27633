//! Per-frame composition of the stabilization stages.
//!
//! One call per captured frame, in order:
//! 1. confidence filter and same-class merge of the detections
//! 2. head observation, from the face source or derived from landmarks
//! 3. liveness ingestion and verdict
//! 4. per-signal stabilization (voter for objects, debouncer for head, face
//!    and liveness conditions)
//! 5. alert hysteresis into the alert queue
//!
//! The clock is read once per frame and that time is used by every stage.

use std::collections::BTreeMap;
use std::time::Instant;

use proctor_models::{FrameObservation, FrameReport, HeadObservation, LivenessDiagnostics, SignalKey};
use tracing::{debug, info, trace};

use crate::alert_queue::AlertQueue;
use crate::blink::{landmarks_ear, BlinkDetector};
use crate::clock::SharedClock;
use crate::config::{SignalKind, SignalTable, StabilizerConfig};
use crate::confidence::ConfidenceFilter;
use crate::debounce::DurationDebouncer;
use crate::error::SignalResult;
use crate::head_pose::HeadPoseClassifier;
use crate::hysteresis::{AlertEngine, AlertStats};
use crate::liveness::LivenessClassifier;
use crate::merge::DetectionMerger;
use crate::metrics;
use crate::voter::SlidingWindowVoter;

/// Owns every stabilization component for one monitored session.
#[derive(Debug)]
pub struct SignalPipeline {
    signals: SignalTable,
    confidence: ConfidenceFilter,
    merger: DetectionMerger,
    head_pose: HeadPoseClassifier,
    blink: BlinkDetector,
    voter: SlidingWindowVoter,
    debouncer: DurationDebouncer,
    liveness: LivenessClassifier,
    engine: AlertEngine,
    queue: AlertQueue,
    clock: SharedClock,
    frames: u64,
}

impl SignalPipeline {
    /// Validate the configuration and build every component.
    pub fn new(config: StabilizerConfig, clock: SharedClock) -> SignalResult<Self> {
        let start = clock.now();
        Self::starting_at(config, clock, start)
    }

    /// Like [`SignalPipeline::new`], with the liveness blink timer starting at `start`.
    ///
    /// Replays use the first frame's timestamp here.
    pub fn starting_at(config: StabilizerConfig, clock: SharedClock, start: f64) -> SignalResult<Self> {
        config.validate()?;

        let signals = config.signals.clone();
        let voter = SlidingWindowVoter::new(signals.presence_keys(), config.voter.window, config.voter.min_votes);
        let debouncer = DurationDebouncer::new(signals.debounced_keys(), config.debounce.threshold_secs, clock.clone());
        let liveness = LivenessClassifier::starting_at(&config.liveness, clock.clone(), start);
        let engine = AlertEngine::new(&signals, &config.alerts, clock.clone());
        let queue = AlertQueue::new(config.alerts.display_duration_secs, clock.clone());

        info!(
            signals = signals.len(),
            voter_window = config.voter.window,
            min_votes = config.voter.min_votes,
            debounce_secs = config.debounce.threshold_secs,
            "Signal pipeline initialized"
        );

        Ok(Self {
            confidence: ConfidenceFilter::new(&config.confidence),
            merger: DetectionMerger::new(&config.merge),
            head_pose: HeadPoseClassifier::new(config.head_pose.clone()),
            blink: BlinkDetector::new(&config.blink),
            signals,
            voter,
            debouncer,
            liveness,
            engine,
            queue,
            clock,
            frames: 0,
        })
    }

    /// Process one frame at the injected clock's current time.
    pub fn process_frame(&mut self, frame: &FrameObservation) -> SignalResult<FrameReport> {
        let now = self.clock.now();
        self.process_frame_at(frame, now)
    }

    /// Process one frame at an explicit time.
    pub fn process_frame_at(&mut self, frame: &FrameObservation, now: f64) -> SignalResult<FrameReport> {
        let started = Instant::now();

        // 1. Detections
        let filtered = self.confidence.apply(&frame.detections);
        let merged = self.merger.merge(&filtered);
        if merged.len() < filtered.len() {
            debug!(
                before = filtered.len(),
                after = merged.len(),
                "Merged overlapping detections"
            );
        }
        metrics::record_detections_merged(filtered.len() - merged.len());
        let person_count = merged.iter().filter(|d| d.is_person()).count();

        // 2. Head
        let head = self.observe_head(frame);

        // 3. Liveness
        match &head {
            Some(h) => self.liveness.update_at(h.yaw, h.pitch, h.gaze, h.blinked, now),
            None => self.liveness.expire_at(now),
        }
        let liveness = self.liveness.is_fake_at(now);
        if liveness.fake {
            metrics::record_fake_presence_frame();
        }

        // 4 + 5. Stabilize and alert
        let mut signals = BTreeMap::new();
        for spec in self.signals.iter() {
            let stable = match &spec.kind {
                SignalKind::Presence { condition } => {
                    self.voter.update(&spec.key, condition.evaluate(&merged))?
                }
                SignalKind::Sustained { source } => {
                    let raw = source.evaluate(head.as_ref(), person_count);
                    self.debouncer.process_at(&spec.key, raw, now)?
                }
                SignalKind::Liveness => self.debouncer.process_at(&spec.key, liveness.fake, now)?,
            };
            self.engine.trigger_at(&spec.key, stable, now, &mut self.queue)?;
            signals.insert(spec.key.clone(), stable);
        }

        let active_alerts = self.queue.active_alerts_at(now);
        metrics::set_active_alerts(active_alerts.len());
        metrics::record_frame_processed(started.elapsed().as_secs_f64());
        self.frames += 1;

        trace!(
            frame = self.frames,
            now,
            detections = merged.len(),
            alerts = active_alerts.len(),
            "Frame processed"
        );

        Ok(FrameReport {
            timestamp: now,
            active_alerts,
            signals,
            liveness,
            detection_count: merged.len(),
            total_blinks: self.blink.total_blinks(),
        })
    }

    fn observe_head(&mut self, frame: &FrameObservation) -> Option<HeadObservation> {
        if let Some(head) = frame.head {
            if head.blinked {
                self.blink.record_external();
                metrics::record_blink();
            }
            return Some(head);
        }

        let Some(landmarks) = &frame.landmarks else {
            self.blink.reset();
            return None;
        };

        let blinked = self.blink.update(landmarks_ear(landmarks));
        if blinked {
            metrics::record_blink();
        }
        Some(self.head_pose.classify_landmarks(landmarks, blinked))
    }

    /// Latest liveness verdict without ingesting a frame.
    pub fn liveness(&self, now: f64) -> LivenessDiagnostics {
        self.liveness.is_fake_at(now)
    }

    /// Seconds a sustained signal has been continuously true.
    pub fn sustained_for(&self, key: &SignalKey, now: f64) -> SignalResult<Option<f64>> {
        self.debouncer.elapsed(key, now)
    }

    pub fn is_active(&self, key: &SignalKey) -> SignalResult<bool> {
        self.engine.is_active(key)
    }

    pub fn alert_stats(&self) -> AlertStats {
        self.engine.stats()
    }

    pub fn frames_processed(&self) -> u64 {
        self.frames
    }

    pub fn signals(&self) -> &SignalTable {
        &self.signals
    }
}
