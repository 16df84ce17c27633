//! Duration debouncing for head-pose and face conditions.
//!
//! A condition must hold continuously for the configured threshold before the
//! debounced signal turns true. Any false observation restarts the timer.

use std::collections::HashMap;

use proctor_models::SignalKey;
use tracing::trace;

use crate::clock::SharedClock;
use crate::error::{SignalError, SignalResult};

/// Per-key timer state.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DebounceState {
    /// When the current continuous true run began
    pub start_time: Option<f64>,
}

/// Converts an instantaneous boolean into "held for at least `threshold` seconds".
#[derive(Debug)]
pub struct DurationDebouncer {
    threshold: f64,
    states: HashMap<SignalKey, DebounceState>,
    clock: SharedClock,
}

impl DurationDebouncer {
    /// Create a debouncer over a fixed set of keys.
    pub fn new<'a>(
        keys: impl IntoIterator<Item = &'a SignalKey>,
        threshold: f64,
        clock: SharedClock,
    ) -> Self {
        Self {
            threshold,
            states: keys
                .into_iter()
                .map(|k| (k.clone(), DebounceState::default()))
                .collect(),
            clock,
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Feed one observation using the injected clock.
    pub fn process(&mut self, key: &SignalKey, condition: bool) -> SignalResult<bool> {
        let now = self.clock.now();
        self.process_at(key, condition, now)
    }

    /// Feed one observation at an explicit time.
    pub fn process_at(&mut self, key: &SignalKey, condition: bool, now: f64) -> SignalResult<bool> {
        let state = self
            .states
            .get_mut(key)
            .ok_or_else(|| SignalError::unknown_key(key))?;

        if !condition {
            state.start_time = None;
            return Ok(false);
        }

        let start = *state.start_time.get_or_insert_with(|| {
            trace!(key = %key, start = now, "Debounce timer started");
            now
        });
        Ok(now - start >= self.threshold)
    }

    /// Seconds the current true run has lasted, if one is in progress.
    pub fn elapsed(&self, key: &SignalKey, now: f64) -> SignalResult<Option<f64>> {
        let state = self.states.get(key).ok_or_else(|| SignalError::unknown_key(key))?;
        Ok(state.start_time.map(|start| now - start))
    }

    /// Read-only view of a key's state.
    pub fn state(&self, key: &SignalKey) -> Option<&DebounceState> {
        self.states.get(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use std::sync::Arc;

    fn debouncer(threshold: f64) -> (DurationDebouncer, SignalKey) {
        let key = SignalKey::from("looking_away");
        let clock = Arc::new(ManualClock::new(0.0));
        (DurationDebouncer::new([&key], threshold, clock), key)
    }

    #[test]
    fn test_triggers_after_threshold() {
        let (mut d, key) = debouncer(2.0);
        assert!(!d.process_at(&key, true, 0.0).unwrap());
        assert!(!d.process_at(&key, true, 1.0).unwrap());
        assert!(d.process_at(&key, true, 2.0).unwrap());
        assert!(d.process_at(&key, true, 3.0).unwrap());
    }

    #[test]
    fn test_just_under_threshold_never_triggers() {
        let (mut d, key) = debouncer(2.0);
        let mut t = 0.0;
        while t < 1.95 {
            assert!(!d.process_at(&key, true, t).unwrap());
            t += 0.1;
        }
        assert!(!d.process_at(&key, false, 2.1).unwrap());
    }

    #[test]
    fn test_false_resets_timer() {
        let (mut d, key) = debouncer(2.0);
        d.process_at(&key, true, 0.0).unwrap();
        d.process_at(&key, true, 1.5).unwrap();
        assert!(!d.process_at(&key, false, 1.6).unwrap());
        assert_eq!(d.elapsed(&key, 1.6).unwrap(), None);

        assert!(!d.process_at(&key, true, 1.7).unwrap());
        assert!(!d.process_at(&key, true, 3.0).unwrap());
        assert!(d.process_at(&key, true, 3.8).unwrap());
    }

    #[test]
    fn test_elapsed_tracks_run() {
        let (mut d, key) = debouncer(2.0);
        d.process_at(&key, true, 4.0).unwrap();
        assert_eq!(d.elapsed(&key, 5.5).unwrap(), Some(1.5));
    }

    #[test]
    fn test_uses_injected_clock() {
        let key = SignalKey::from("looking_down");
        let clock = Arc::new(ManualClock::new(10.0));
        let mut d = DurationDebouncer::new([&key], 1.0, clock.clone());

        assert!(!d.process(&key, true).unwrap());
        clock.advance(1.0);
        assert!(d.process(&key, true).unwrap());
    }

    #[test]
    fn test_unknown_key_is_an_error() {
        let (mut d, _) = debouncer(2.0);
        let err = d.process_at(&SignalKey::from("phone"), true, 0.0).unwrap_err();
        assert!(matches!(err, SignalError::UnknownKey(k) if k == "phone"));
    }
}
