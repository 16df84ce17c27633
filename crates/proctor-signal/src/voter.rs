//! Sliding-window voting for flicker-prone object presence.

use std::collections::{HashMap, VecDeque};

use proctor_models::SignalKey;

use crate::error::{SignalError, SignalResult};

/// Bounded history of recent observations for one key.
#[derive(Debug, Clone)]
pub struct VoteHistory {
    votes: VecDeque<bool>,
    positives: usize,
    window: usize,
}

impl VoteHistory {
    pub fn new(window: usize) -> Self {
        Self {
            votes: VecDeque::with_capacity(window),
            positives: 0,
            window,
        }
    }

    /// Append an observation, dropping the oldest once full.
    pub fn push(&mut self, present: bool) {
        if self.votes.len() == self.window {
            if let Some(true) = self.votes.pop_front() {
                self.positives -= 1;
            }
        }
        self.votes.push_back(present);
        if present {
            self.positives += 1;
        }
    }

    /// Number of true observations in the window.
    pub fn positives(&self) -> usize {
        self.positives
    }

    pub fn len(&self) -> usize {
        self.votes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.votes.is_empty()
    }
}

/// Presence is stable when at least `min_votes` of the last `window` frames saw it.
#[derive(Debug, Clone)]
pub struct SlidingWindowVoter {
    min_votes: usize,
    histories: HashMap<SignalKey, VoteHistory>,
}

impl SlidingWindowVoter {
    /// Create a voter over a fixed set of keys.
    ///
    /// `min_votes <= window` is checked by config validation.
    pub fn new<'a>(keys: impl IntoIterator<Item = &'a SignalKey>, window: usize, min_votes: usize) -> Self {
        Self {
            min_votes,
            histories: keys
                .into_iter()
                .map(|k| (k.clone(), VoteHistory::new(window)))
                .collect(),
        }
    }

    /// Record this frame's observation and return the stable verdict.
    pub fn update(&mut self, key: &SignalKey, present: bool) -> SignalResult<bool> {
        let history = self
            .histories
            .get_mut(key)
            .ok_or_else(|| SignalError::unknown_key(key))?;
        history.push(present);
        Ok(history.positives() >= self.min_votes)
    }

    pub fn history(&self, key: &SignalKey) -> Option<&VoteHistory> {
        self.histories.get(key)
    }
}
