//! Static-image liveness detection.
//!
//! Combines two cues: head and gaze micro-motion over a sliding time window,
//! and time since the last blink. A subject is flagged as fake presence only
//! when the motion is too static and no blink has been seen for the timeout.

use std::collections::VecDeque;

use proctor_models::LivenessDiagnostics;
use tracing::debug;

use crate::clock::SharedClock;
use crate::config::{LivenessConfig, LivenessWeights};

/// Samples required before a sequence's variance is trusted.
pub const MIN_SAMPLES: usize = 10;

/// Variance reported while history is still too short.
pub const DEFAULT_VARIANCE: f64 = 1.0;

/// Time-stamped yaw, pitch and gaze samples.
#[derive(Debug, Clone, Default)]
pub struct LivenessSampleSet {
    yaw: VecDeque<(f64, f64)>,
    pitch: VecDeque<(f64, f64)>,
    gaze: VecDeque<(f64, f64)>,
}

impl LivenessSampleSet {
    fn last_sample_time(&self) -> Option<f64> {
        self.yaw.back().map(|(t, _)| *t)
    }

    fn push(&mut self, now: f64, yaw: f64, pitch: f64, gaze: f64) {
        self.yaw.push_back((now, yaw));
        self.pitch.push_back((now, pitch));
        self.gaze.push_back((now, gaze));
    }

    /// Drop samples older than `window` relative to `now`.
    pub fn prune(&mut self, now: f64, window: f64) {
        for seq in [&mut self.yaw, &mut self.pitch, &mut self.gaze] {
            while seq.front().is_some_and(|(t, _)| now - t > window) {
                seq.pop_front();
            }
        }
    }

    pub fn len(&self) -> usize {
        self.yaw.len()
    }

    pub fn is_empty(&self) -> bool {
        self.yaw.is_empty()
    }

    /// Population variances of (yaw, pitch, gaze) over every held sample.
    pub fn variances(&self) -> (f64, f64, f64) {
        self.variances_within(f64::INFINITY, f64::INFINITY)
    }

    /// Population variances over the samples with `now - t <= window`.
    pub fn variances_within(&self, now: f64, window: f64) -> (f64, f64, f64) {
        (
            variance(&self.yaw, now, window),
            variance(&self.pitch, now, window),
            variance(&self.gaze, now, window),
        )
    }
}

fn variance(seq: &VecDeque<(f64, f64)>, now: f64, window: f64) -> f64 {
    let values: Vec<f64> = seq
        .iter()
        .filter(|(t, _)| now - t <= window)
        .map(|(_, v)| *v)
        .collect();
    if values.len() < MIN_SAMPLES {
        return DEFAULT_VARIANCE;
    }
    // Shifted by the first value so a constant sequence is exactly zero
    let shift = values[0];
    let n = values.len() as f64;
    let (sum, sum_sq) = values.iter().fold((0.0, 0.0), |(s, sq), v| {
        let d = v - shift;
        (s + d, sq + d * d)
    });
    ((sum_sq - sum * sum / n) / n).max(0.0)
}

/// Decides whether the subject is a live, naturally moving person.
#[derive(Debug)]
pub struct LivenessClassifier {
    window: f64,
    sample_interval: f64,
    min_variance: f64,
    blink_timeout: f64,
    weights: LivenessWeights,
    samples: LivenessSampleSet,
    last_blink: f64,
    clock: SharedClock,
}

impl LivenessClassifier {
    /// Create a classifier. The blink timer starts at construction time.
    pub fn new(config: &LivenessConfig, clock: SharedClock) -> Self {
        let now = clock.now();
        Self::starting_at(config, clock, now)
    }

    /// Create a classifier whose blink timer starts at `start`.
    pub fn starting_at(config: &LivenessConfig, clock: SharedClock, start: f64) -> Self {
        Self {
            window: config.window_secs,
            sample_interval: config.sample_interval_secs,
            min_variance: config.min_variance,
            blink_timeout: config.blink_timeout_secs,
            weights: config.weights,
            samples: LivenessSampleSet::default(),
            last_blink: start,
            clock,
        }
    }

    /// Ingest one observation using the injected clock.
    pub fn update(&mut self, yaw: f64, pitch: f64, gaze: f64, blinked: bool) {
        let now = self.clock.now();
        self.update_at(yaw, pitch, gaze, blinked, now);
    }

    /// Ingest one observation at an explicit time.
    pub fn update_at(&mut self, yaw: f64, pitch: f64, gaze: f64, blinked: bool, now: f64) {
        let due = self
            .samples
            .last_sample_time()
            .map_or(true, |last| now - last >= self.sample_interval);
        if due {
            self.samples.push(now, yaw, pitch, gaze);
        }
        self.samples.prune(now, self.window);

        if blinked {
            self.last_blink = now;
        }
    }

    /// Age out samples without ingesting an observation.
    ///
    /// Called on frames that carry no face.
    pub fn expire_at(&mut self, now: f64) {
        self.samples.prune(now, self.window);
    }

    /// Current verdict using the injected clock.
    pub fn is_fake(&self) -> LivenessDiagnostics {
        self.is_fake_at(self.clock.now())
    }

    /// Current verdict at an explicit time.
    ///
    /// Only samples inside the window ending at `now` count.
    pub fn is_fake_at(&self, now: f64) -> LivenessDiagnostics {
        let (yaw_variance, pitch_variance, gaze_variance) = self.samples.variances_within(now, self.window);
        let score = self.weights.yaw * yaw_variance
            + self.weights.pitch * pitch_variance
            + self.weights.gaze * gaze_variance;

        let static_motion = score < self.min_variance;
        let no_recent_blink = now - self.last_blink > self.blink_timeout;
        let fake = static_motion && no_recent_blink;

        if fake {
            debug!(
                score,
                since_blink = now - self.last_blink,
                samples = self.samples.len(),
                "Liveness check failed"
            );
        }

        LivenessDiagnostics {
            fake,
            yaw_variance,
            pitch_variance,
            gaze_variance,
        }
    }

    pub fn samples(&self) -> &LivenessSampleSet {
        &self.samples
    }

    pub fn last_blink(&self) -> f64 {
        self.last_blink
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use std::sync::Arc;

    fn classifier() -> LivenessClassifier {
        LivenessClassifier::starting_at(&LivenessConfig::default(), Arc::new(ManualClock::new(0.0)), 0.0)
    }

    /// Feed `count` samples spaced 0.25s apart, returning the last timestamp.
    fn feed(c: &mut LivenessClassifier, count: usize, value: impl Fn(usize) -> f64) -> f64 {
        let mut now = 0.0;
        for i in 0..count {
            now = i as f64 * 0.25;
            let v = value(i);
            c.update_at(v, v, v, false, now);
        }
        now
    }

    #[test]
    fn test_short_history_reports_default_variance() {
        let mut c = classifier();
        feed(&mut c, 9, |_| 0.0);
        assert_eq!(c.samples().variances(), (1.0, 1.0, 1.0));
    }

    #[test]
    fn test_identical_values_have_zero_variance() {
        let mut c = classifier();
        feed(&mut c, 12, |_| 0.05);
        let (y, p, g) = c.samples().variances();
        assert_eq!((y, p, g), (0.0, 0.0, 0.0));
    }

    #[test]
    fn test_sampling_is_rate_limited() {
        let mut c = classifier();
        c.update_at(0.0, 0.0, 0.0, false, 0.0);
        c.update_at(0.0, 0.0, 0.0, false, 0.1);
        c.update_at(0.0, 0.0, 0.0, false, 0.2);
        c.update_at(0.0, 0.0, 0.0, false, 0.3);
        assert_eq!(c.samples().len(), 2);
    }

    #[test]
    fn test_old_samples_are_pruned() {
        let mut c = classifier();
        feed(&mut c, 60, |_| 0.0);
        // 60 samples over 14.75s, window keeps the last 10s
        assert_eq!(c.samples().len(), 41);
    }

    #[test]
    fn test_static_without_blink_is_fake() {
        let mut c = classifier();
        let now = feed(&mut c, 48, |_| 0.01);
        assert!(now > 10.0);
        let verdict = c.is_fake_at(now);
        assert!(verdict.fake);
        assert_eq!(verdict.yaw_variance, 0.0);
    }

    #[test]
    fn test_recent_blink_keeps_static_subject_live() {
        let mut c = classifier();
        let now = feed(&mut c, 48, |_| 0.01);
        c.update_at(0.01, 0.01, 0.01, true, now);
        assert!(!c.is_fake_at(now + 0.1).fake);
        assert!(c.is_fake_at(now + 10.5).fake);
    }

    #[test]
    fn test_natural_motion_is_live() {
        let mut c = classifier();
        let now = feed(&mut c, 48, |i| if i % 2 == 0 { 0.1 } else { -0.1 });
        let verdict = c.is_fake_at(now);
        assert!(!verdict.fake);
        assert!(verdict.yaw_variance > 0.009);
    }

    #[test]
    fn test_verdict_ignores_samples_outside_window() {
        let mut c = classifier();
        let last = feed(&mut c, 30, |_| 0.01);
        assert_eq!(c.samples().variances().0, 0.0);

        // No ingestion since; every sample is older than the window
        let verdict = c.is_fake_at(last + 10.5);
        assert!(!verdict.fake);
        assert_eq!(verdict.yaw_variance, DEFAULT_VARIANCE);
        assert_eq!(c.samples().len(), 30);

        c.expire_at(last + 10.5);
        assert!(c.samples().is_empty());
    }

    #[test]
    fn test_blink_timer_starts_at_construction() {
        let clock = Arc::new(ManualClock::new(100.0));
        let c = LivenessClassifier::new(&LivenessConfig::default(), clock.clone());
        assert_eq!(c.last_blink(), 100.0);
        assert!(!c.is_fake().fake);
    }
}
