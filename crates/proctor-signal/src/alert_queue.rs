//! Time-windowed FIFO of displayed alerts.

use std::collections::VecDeque;

use proctor_models::Alert;

use crate::clock::SharedClock;

/// Holds alerts for `display_duration` seconds after they are raised.
///
/// Entries arrive in time order, so expiry only ever truncates the head.
/// Identical messages are not deduplicated.
#[derive(Debug)]
pub struct AlertQueue {
    display_duration: f64,
    alerts: VecDeque<Alert>,
    clock: SharedClock,
}

impl AlertQueue {
    pub fn new(display_duration: f64, clock: SharedClock) -> Self {
        Self {
            display_duration,
            alerts: VecDeque::new(),
            clock,
        }
    }

    /// Append an alert stamped with the injected clock.
    pub fn add_alert(&mut self, message: impl Into<String>) {
        let now = self.clock.now();
        self.add_alert_at(message, now);
    }

    pub fn add_alert_at(&mut self, message: impl Into<String>, now: f64) {
        self.alerts.push_back(Alert::new(message, now));
    }

    /// Evict expired alerts and return the remaining messages, oldest first.
    pub fn active_alerts(&mut self) -> Vec<String> {
        let now = self.clock.now();
        self.active_alerts_at(now)
    }

    pub fn active_alerts_at(&mut self, now: f64) -> Vec<String> {
        while self
            .alerts
            .front()
            .is_some_and(|a| a.age(now) > self.display_duration)
        {
            self.alerts.pop_front();
        }
        self.alerts.iter().map(|a| a.message.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.alerts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alerts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use std::sync::Arc;

    fn queue() -> (AlertQueue, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(0.0));
        (AlertQueue::new(2.0, clock.clone()), clock)
    }

    #[test]
    fn test_alert_expires_after_display_duration() {
        let (mut q, clock) = queue();
        q.add_alert("Phone detected");

        clock.set(1.9);
        assert_eq!(q.active_alerts(), vec!["Phone detected"]);

        clock.set(2.1);
        assert!(q.active_alerts().is_empty());
        assert!(q.is_empty());
    }

    #[test]
    fn test_arrival_order_and_no_dedup() {
        let (mut q, _) = queue();
        q.add_alert_at("Phone detected", 0.0);
        q.add_alert_at("Looking away from screen", 0.5);
        q.add_alert_at("Phone detected", 1.0);

        assert_eq!(
            q.active_alerts_at(1.5),
            vec!["Phone detected", "Looking away from screen", "Phone detected"]
        );
        assert_eq!(q.active_alerts_at(2.7), vec!["Phone detected"]);
    }

    #[test]
    fn test_exact_display_duration_is_still_shown() {
        let (mut q, _) = queue();
        q.add_alert_at("Book detected", 1.0);
        assert_eq!(q.active_alerts_at(3.0).len(), 1);
    }
}
