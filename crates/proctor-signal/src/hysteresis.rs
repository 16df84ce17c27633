//! Alert hysteresis.
//!
//! Each key is either inactive or active. Entering the active state emits an
//! alert; a key that stays active re-alerts at most once per `cooldown`; a
//! false condition only clears the key once `reset_cooldown` has passed since
//! its last alert.

use std::collections::HashMap;

use proctor_models::SignalKey;
use tracing::{debug, info};

use crate::alert_queue::AlertQueue;
use crate::clock::SharedClock;
use crate::config::{AlertConfig, Cooldowns, SignalTable};
use crate::error::{SignalError, SignalResult};
use crate::metrics;

/// Per-key alert state.
#[derive(Debug, Clone)]
pub struct AlertState {
    pub active: bool,
    pub last_alert_time: Option<f64>,
    pub message: String,
    pub cooldowns: Cooldowns,
}

impl AlertState {
    fn since_last_alert(&self, now: f64) -> f64 {
        self.last_alert_time.map_or(f64::INFINITY, |t| now - t)
    }
}

/// Outcome of one [`AlertEngine::trigger_at`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// inactive -> active, alert emitted
    Raised,
    /// active -> active after the cooldown, alert emitted
    Repeated,
    /// active -> inactive
    Cleared,
    /// Condition true while active and within cooldown
    Suppressed,
    /// Condition false while active and within reset cooldown
    Held,
    /// Condition false while inactive
    Idle,
}

impl Transition {
    /// Whether an alert was pushed to the queue.
    pub fn emitted(&self) -> bool {
        matches!(self, Transition::Raised | Transition::Repeated)
    }
}

/// Counters over the engine's lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AlertStats {
    pub raised: u64,
    pub repeated: u64,
    pub cleared: u64,
    pub suppressed: u64,
}

impl AlertStats {
    /// Alerts pushed to the queue.
    pub fn emitted(&self) -> u64 {
        self.raised + self.repeated
    }

    fn record(&mut self, transition: Transition) {
        match transition {
            Transition::Raised => self.raised += 1,
            Transition::Repeated => self.repeated += 1,
            Transition::Cleared => self.cleared += 1,
            Transition::Suppressed => self.suppressed += 1,
            Transition::Held | Transition::Idle => {}
        }
    }
}

/// Per-key hysteresis state machine feeding the alert queue.
#[derive(Debug)]
pub struct AlertEngine {
    states: HashMap<SignalKey, AlertState>,
    stats: AlertStats,
    clock: SharedClock,
}

impl AlertEngine {
    /// Create an engine for every signal in the table.
    pub fn new(signals: &SignalTable, config: &AlertConfig, clock: SharedClock) -> Self {
        let states = signals
            .iter()
            .map(|spec| {
                let state = AlertState {
                    active: false,
                    last_alert_time: None,
                    message: spec.message.clone(),
                    cooldowns: config.cooldowns_for(&spec.key),
                };
                (spec.key.clone(), state)
            })
            .collect();

        Self {
            states,
            stats: AlertStats::default(),
            clock,
        }
    }

    /// Apply a debounced condition using the injected clock.
    pub fn trigger(&mut self, key: &SignalKey, condition: bool, queue: &mut AlertQueue) -> SignalResult<Transition> {
        let now = self.clock.now();
        self.trigger_at(key, condition, now, queue)
    }

    /// Apply a debounced condition at an explicit time.
    pub fn trigger_at(
        &mut self,
        key: &SignalKey,
        condition: bool,
        now: f64,
        queue: &mut AlertQueue,
    ) -> SignalResult<Transition> {
        let state = self
            .states
            .get_mut(key)
            .ok_or_else(|| SignalError::unknown_key(key))?;

        let since = state.since_last_alert(now);
        let transition = match (condition, state.active) {
            (true, false) => Transition::Raised,
            (true, true) if since >= state.cooldowns.cooldown => Transition::Repeated,
            (true, true) => Transition::Suppressed,
            (false, true) if since >= state.cooldowns.reset_cooldown => Transition::Cleared,
            (false, true) => Transition::Held,
            (false, false) => Transition::Idle,
        };

        match transition {
            Transition::Raised | Transition::Repeated => {
                state.active = true;
                state.last_alert_time = Some(now);
                queue.add_alert_at(state.message.clone(), now);

                let repeat = transition == Transition::Repeated;
                info!(key = %key, repeat, message = %state.message, "Alert raised");
                metrics::record_alert_raised(key.as_str(), repeat);
            }
            Transition::Cleared => {
                state.active = false;
                debug!(key = %key, since_last_alert = since, "Alert cleared");
                metrics::record_alert_cleared(key.as_str());
            }
            Transition::Suppressed | Transition::Held | Transition::Idle => {}
        }

        self.stats.record(transition);
        Ok(transition)
    }

    /// Whether a key is currently active.
    pub fn is_active(&self, key: &SignalKey) -> SignalResult<bool> {
        self.states
            .get(key)
            .map(|s| s.active)
            .ok_or_else(|| SignalError::unknown_key(key))
    }

    pub fn state(&self, key: &SignalKey) -> Option<&AlertState> {
        self.states.get(key)
    }

    /// Keys currently in the active state, sorted.
    pub fn active_keys(&self) -> Vec<&SignalKey> {
        let mut keys: Vec<_> = self
            .states
            .iter()
            .filter_map(|(k, s)| s.active.then_some(k))
            .collect();
        keys.sort();
        keys
    }

    pub fn stats(&self) -> AlertStats {
        self.stats
    }
}
