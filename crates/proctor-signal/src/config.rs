//! Configuration for the signal stabilization pipeline.
//!
//! Every section has sensible defaults so a partial JSON document is enough
//! to override individual values. [`StabilizerConfig::validate`] rejects
//! configuration errors before any frame is processed.

use std::collections::{HashMap, HashSet};

use proctor_models::{classes, keys, Detection, HeadObservation, SignalKey};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{SignalError, SignalResult};

/// Top-level configuration for [`crate::SignalPipeline`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StabilizerConfig {
    pub alerts: AlertConfig,
    pub debounce: DebounceConfig,
    pub voter: VoterConfig,
    pub liveness: LivenessConfig,
    pub merge: MergeConfig,
    pub confidence: ConfidenceConfig,
    pub head_pose: HeadPoseThresholds,
    pub blink: BlinkConfig,
    pub signals: SignalTable,
}

// === Alerting ===

/// Hysteresis and display settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    /// Minimum seconds between two alerts for the same key (default: 5.0)
    pub cooldown_secs: f64,

    /// Seconds after the last alert before a false condition clears the key (default: 2.0)
    pub reset_cooldown_secs: f64,

    /// How long an alert stays on screen (default: 2.0)
    pub display_duration_secs: f64,

    /// Per-key cooldown overrides
    pub overrides: HashMap<SignalKey, CooldownOverride>,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            cooldown_secs: 5.0,
            reset_cooldown_secs: 2.0,
            display_duration_secs: 2.0,
            overrides: HashMap::new(),
        }
    }
}

/// Optional per-key replacement for the global cooldowns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CooldownOverride {
    #[serde(default)]
    pub cooldown_secs: Option<f64>,
    #[serde(default)]
    pub reset_cooldown_secs: Option<f64>,
}

/// Resolved cooldowns for one key.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cooldowns {
    pub cooldown: f64,
    pub reset_cooldown: f64,
}

impl AlertConfig {
    /// Cooldowns for `key`, with any override applied.
    pub fn cooldowns_for(&self, key: &SignalKey) -> Cooldowns {
        let mut resolved = Cooldowns {
            cooldown: self.cooldown_secs,
            reset_cooldown: self.reset_cooldown_secs,
        };
        if let Some(o) = self.overrides.get(key) {
            if let Some(c) = o.cooldown_secs {
                resolved.cooldown = c;
            }
            if let Some(r) = o.reset_cooldown_secs {
                resolved.reset_cooldown = r;
            }
        }
        resolved
    }
}

// === Debounce ===

/// Duration debouncer settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DebounceConfig {
    /// Seconds a head condition must hold continuously (default: 2.0)
    pub threshold_secs: f64,
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self { threshold_secs: 2.0 }
    }
}

// === Voter ===

/// Sliding-window voter settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VoterConfig {
    /// Number of recent frames kept per key (default: 15)
    pub window: usize,

    /// Positive frames required inside the window (default: 5)
    pub min_votes: usize,
}

impl Default for VoterConfig {
    fn default() -> Self {
        Self {
            window: 15,
            min_votes: 5,
        }
    }
}

// === Liveness ===

/// Liveness classifier settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LivenessConfig {
    /// Seconds of samples retained (default: 10.0)
    pub window_secs: f64,

    /// Minimum seconds between stored samples (default: 0.2)
    pub sample_interval_secs: f64,

    /// Weighted variance below which motion counts as static (default: 0.0005)
    pub min_variance: f64,

    /// Seconds without a blink before blinking counts as absent (default: 10.0)
    pub blink_timeout_secs: f64,

    /// Per-signal variance weights
    pub weights: LivenessWeights,
}

impl Default for LivenessConfig {
    fn default() -> Self {
        Self {
            window_secs: 10.0,
            sample_interval_secs: 0.2,
            min_variance: 0.0005,
            blink_timeout_secs: 10.0,
            weights: LivenessWeights::default(),
        }
    }
}

/// Weights applied to each variance in the liveness score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LivenessWeights {
    pub yaw: f64,
    pub pitch: f64,
    pub gaze: f64,
}

impl Default for LivenessWeights {
    fn default() -> Self {
        Self {
            yaw: 1.0,
            pitch: 1.0,
            gaze: 1.0,
        }
    }
}

// === Detection filtering ===

/// Detection merge settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    /// IoU at or above which two same-class boxes are one object (default: 0.5)
    pub iou_threshold: f64,

    /// Classes eligible for merging
    pub classes: Vec<String>,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            iou_threshold: 0.5,
            classes: classes::MERGEABLE.iter().map(|c| c.to_string()).collect(),
        }
    }
}

/// Minimum detector confidence per class.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfidenceConfig {
    /// Threshold for classes without an entry (default: 0.5)
    pub default: f64,

    /// Per-class thresholds
    pub per_class: HashMap<String, f64>,
}

impl Default for ConfidenceConfig {
    fn default() -> Self {
        let per_class = [
            (classes::PERSON, 0.5),
            (classes::CELL_PHONE, 0.6),
            (classes::BOOK, 0.4),
            (classes::HEADPHONE, 0.5),
            (classes::EARBUD, 0.5),
        ]
        .into_iter()
        .map(|(class, threshold)| (class.to_string(), threshold))
        .collect();

        Self {
            default: 0.5,
            per_class,
        }
    }
}

// === Face ===

/// Ratio thresholds turning head geometry into observation flags.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HeadPoseThresholds {
    /// |yaw| above this is looking away (default: 0.2)
    pub look_away_yaw: f64,
    /// Pitch above this is looking down (default: 0.13)
    pub look_down_pitch: f64,
    /// Pitch below this is looking up (default: -0.1)
    pub look_up_pitch: f64,
    /// Gaze below this is looking left (default: -0.15)
    pub gaze_left: f64,
    /// Gaze above this is looking right (default: 0.15)
    pub gaze_right: f64,
    /// Face narrower than this many pixels is partial (default: 80)
    pub min_face_width: f64,
    /// Face shorter than this many pixels is partial (default: 100)
    pub min_face_height: f64,
}

impl Default for HeadPoseThresholds {
    fn default() -> Self {
        Self {
            look_away_yaw: 0.2,
            look_down_pitch: 0.13,
            look_up_pitch: -0.1,
            gaze_left: -0.15,
            gaze_right: 0.15,
            min_face_width: 80.0,
            min_face_height: 100.0,
        }
    }
}

/// Eye-aspect-ratio blink detection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BlinkConfig {
    /// EAR below which the eyes count as closed (default: 0.20)
    pub ear_threshold: f64,
    /// Closed frames required before reopening counts as a blink (default: 2)
    pub min_closed_frames: u32,
}

impl Default for BlinkConfig {
    fn default() -> Self {
        Self {
            ear_threshold: 0.20,
            min_closed_frames: 2,
        }
    }
}

// === Signals ===

/// One monitored condition and the component that stabilizes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalSpec {
    pub key: SignalKey,
    /// Alert text shown when the signal fires
    pub message: String,
    pub kind: SignalKind,
}

impl SignalSpec {
    pub fn new(key: &str, message: &str, kind: SignalKind) -> Self {
        Self {
            key: SignalKey::from(key),
            message: message.to_string(),
            kind,
        }
    }
}

/// Which stabilizer owns a signal's state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SignalKind {
    /// Object presence, stabilized by the sliding-window voter
    Presence { condition: PresenceCondition },
    /// Head condition, stabilized by the duration debouncer
    Sustained { source: HeadCondition },
    /// Fake-presence verdict of the liveness classifier
    Liveness,
}

/// Per-frame object predicate for presence signals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum PresenceCondition {
    /// Any detection of one of the classes
    AnyOf { classes: Vec<String> },
    /// At least `count` detections of the class
    AtLeast { class: String, count: usize },
    /// No detection of the class
    Absent { class: String },
}

impl PresenceCondition {
    /// Evaluate against the merged detections of one frame.
    pub fn evaluate(&self, detections: &[Detection]) -> bool {
        match self {
            PresenceCondition::AnyOf { classes } => detections
                .iter()
                .any(|d| classes.iter().any(|c| d.is(c))),
            PresenceCondition::AtLeast { class, count } => {
                detections.iter().filter(|d| d.is(class)).count() >= *count
            }
            PresenceCondition::Absent { class } => !detections.iter().any(|d| d.is(class)),
        }
    }
}

/// Head observation flag feeding a sustained signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeadCondition {
    LookingAway,
    LookingDown,
    LookingUp,
    LookingLeft,
    LookingRight,
    PartialFace,
    /// No face found while at least one person is detected
    FaceHidden,
}

impl HeadCondition {
    /// Evaluate for one frame. A missing face is a false observation for
    /// every flag except [`HeadCondition::FaceHidden`].
    pub fn evaluate(&self, head: Option<&HeadObservation>, person_count: usize) -> bool {
        let Some(head) = head else {
            return matches!(self, HeadCondition::FaceHidden) && person_count > 0;
        };
        match self {
            HeadCondition::LookingAway => head.looking_away,
            HeadCondition::LookingDown => head.looking_down,
            HeadCondition::LookingUp => head.looking_up,
            HeadCondition::LookingLeft => head.looking_left,
            HeadCondition::LookingRight => head.looking_right,
            HeadCondition::PartialFace => head.partial_face,
            HeadCondition::FaceHidden => false,
        }
    }
}

/// The fixed universe of signals for one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SignalTable(pub Vec<SignalSpec>);

impl SignalTable {
    pub fn iter(&self) -> impl Iterator<Item = &SignalSpec> {
        self.0.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &SignalKey> {
        self.0.iter().map(|s| &s.key)
    }

    /// Keys owned by the sliding-window voter.
    pub fn presence_keys(&self) -> impl Iterator<Item = &SignalKey> {
        self.0
            .iter()
            .filter(|s| matches!(s.kind, SignalKind::Presence { .. }))
            .map(|s| &s.key)
    }

    /// Keys owned by the duration debouncer.
    pub fn sustained_keys(&self) -> impl Iterator<Item = &SignalKey> {
        self.0
            .iter()
            .filter(|s| matches!(s.kind, SignalKind::Sustained { .. }))
            .map(|s| &s.key)
    }

    /// Keys owned by the duration debouncer: sustained head and face
    /// conditions plus the liveness verdict.
    pub fn debounced_keys(&self) -> impl Iterator<Item = &SignalKey> {
        self.0
            .iter()
            .filter(|s| matches!(s.kind, SignalKind::Sustained { .. } | SignalKind::Liveness))
            .map(|s| &s.key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for SignalTable {
    fn default() -> Self {
        use HeadCondition::*;

        let any_of = |classes: &[&str]| SignalKind::Presence {
            condition: PresenceCondition::AnyOf {
                classes: classes.iter().map(|c| c.to_string()).collect(),
            },
        };
        let sustained = |source| SignalKind::Sustained { source };

        Self(vec![
            SignalSpec::new(keys::PHONE, "Phone detected", any_of(&[classes::CELL_PHONE])),
            SignalSpec::new(keys::BOOK, "Book detected", any_of(&[classes::BOOK])),
            SignalSpec::new(
                keys::AUDIO_DEVICE,
                "Audio device detected",
                any_of(&[classes::HEADPHONE, classes::EARBUD]),
            ),
            SignalSpec::new(
                keys::MULTIPLE_PEOPLE,
                "Multiple people detected",
                SignalKind::Presence {
                    condition: PresenceCondition::AtLeast {
                        class: classes::PERSON.to_string(),
                        count: 2,
                    },
                },
            ),
            SignalSpec::new(
                keys::NO_PERSON,
                "No person detected",
                SignalKind::Presence {
                    condition: PresenceCondition::Absent {
                        class: classes::PERSON.to_string(),
                    },
                },
            ),
            SignalSpec::new(keys::LOOKING_AWAY, "Looking away from screen", sustained(LookingAway)),
            SignalSpec::new(keys::LOOKING_DOWN, "Looking down", sustained(LookingDown)),
            SignalSpec::new(keys::LOOKING_UP, "Looking up", sustained(LookingUp)),
            SignalSpec::new(keys::LOOKING_LEFT, "Eyes looking left", sustained(LookingLeft)),
            SignalSpec::new(keys::LOOKING_RIGHT, "Eyes looking right", sustained(LookingRight)),
            SignalSpec::new(keys::PARTIAL_FACE, "Face partially visible", sustained(PartialFace)),
            SignalSpec::new(keys::FACE_HIDDEN, "Face hidden", sustained(FaceHidden)),
            SignalSpec::new(
                keys::FAKE_PRESENCE,
                "Possible fake presence (static image)",
                SignalKind::Liveness,
            ),
        ])
    }
}

// === Validation ===

fn ensure(condition: bool, message: impl FnOnce() -> String) -> SignalResult<()> {
    if condition {
        Ok(())
    } else {
        Err(SignalError::invalid_config(message()))
    }
}

fn ensure_non_negative(name: &str, value: f64) -> SignalResult<()> {
    ensure(value.is_finite() && value >= 0.0, || {
        format!("{name} must be a finite non-negative number, got {value}")
    })
}

fn ensure_positive(name: &str, value: f64) -> SignalResult<()> {
    ensure(value.is_finite() && value > 0.0, || {
        format!("{name} must be a finite positive number, got {value}")
    })
}

impl VoterConfig {
    pub fn validate(&self) -> SignalResult<()> {
        ensure(self.window > 0, || "voter.window must be at least 1".to_string())?;
        ensure(self.min_votes > 0, || "voter.min_votes must be at least 1".to_string())?;
        ensure(self.min_votes <= self.window, || {
            format!(
                "voter.min_votes ({}) exceeds voter.window ({}); the signal could never stabilize",
                self.min_votes, self.window
            )
        })
    }
}

impl LivenessConfig {
    pub fn validate(&self) -> SignalResult<()> {
        ensure_positive("liveness.window_secs", self.window_secs)?;
        ensure_non_negative("liveness.sample_interval_secs", self.sample_interval_secs)?;
        ensure_non_negative("liveness.min_variance", self.min_variance)?;
        ensure_non_negative("liveness.blink_timeout_secs", self.blink_timeout_secs)?;
        ensure_non_negative("liveness.weights.yaw", self.weights.yaw)?;
        ensure_non_negative("liveness.weights.pitch", self.weights.pitch)?;
        ensure_non_negative("liveness.weights.gaze", self.weights.gaze)
    }
}

impl MergeConfig {
    pub fn validate(&self) -> SignalResult<()> {
        ensure(
            self.iou_threshold.is_finite() && self.iou_threshold > 0.0 && self.iou_threshold <= 1.0,
            || format!("merge.iou_threshold must be in (0, 1], got {}", self.iou_threshold),
        )
    }
}

impl ConfidenceConfig {
    pub fn validate(&self) -> SignalResult<()> {
        let in_range = |v: f64| (0.0..=1.0).contains(&v);
        ensure(in_range(self.default), || {
            format!("confidence.default must be in [0, 1], got {}", self.default)
        })?;
        for (class, threshold) in &self.per_class {
            ensure(in_range(*threshold), || {
                format!("confidence.per_class.{class} must be in [0, 1], got {threshold}")
            })?;
        }
        Ok(())
    }
}

impl BlinkConfig {
    pub fn validate(&self) -> SignalResult<()> {
        ensure_positive("blink.ear_threshold", self.ear_threshold)?;
        ensure(self.min_closed_frames > 0, || {
            "blink.min_closed_frames must be at least 1".to_string()
        })
    }
}

impl StabilizerConfig {
    /// Reject configuration errors up front.
    pub fn validate(&self) -> SignalResult<()> {
        ensure_non_negative("alerts.cooldown_secs", self.alerts.cooldown_secs)?;
        ensure_non_negative("alerts.reset_cooldown_secs", self.alerts.reset_cooldown_secs)?;
        ensure_positive("alerts.display_duration_secs", self.alerts.display_duration_secs)?;
        ensure_non_negative("debounce.threshold_secs", self.debounce.threshold_secs)?;
        self.voter.validate()?;
        self.liveness.validate()?;
        self.merge.validate()?;
        self.confidence.validate()?;
        self.blink.validate()?;

        if self.alerts.reset_cooldown_secs == 0.0 {
            warn!("alerts.reset_cooldown_secs is zero; alerts clear on the first false frame");
        }

        ensure(!self.signals.is_empty(), || "at least one signal must be configured".to_string())?;

        let mut seen = HashSet::new();
        for spec in self.signals.iter() {
            if !seen.insert(&spec.key) {
                return Err(SignalError::duplicate_key(&spec.key));
            }
            if spec.message.trim().is_empty() {
                warn!(key = %spec.key, "Signal has an empty alert message");
            }
        }

        for (key, o) in &self.alerts.overrides {
            if !seen.contains(key) {
                return Err(SignalError::unknown_key(key));
            }
            if let Some(c) = o.cooldown_secs {
                ensure_non_negative(&format!("alerts.overrides.{key}.cooldown_secs"), c)?;
            }
            if let Some(r) = o.reset_cooldown_secs {
                ensure_non_negative(&format!("alerts.overrides.{key}.reset_cooldown_secs"), r)?;
            }
        }

        Ok(())
    }

    /// Parse a JSON document and validate it.
    pub fn from_json(json: &str) -> SignalResult<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| SignalError::invalid_config(format!("malformed configuration: {e}")))?;
        config.validate()?;
        Ok(config)
    }
}
