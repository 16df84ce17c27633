//! Cross-component scenarios driven by simulated time.

#[cfg(test)]
mod hysteresis_scenario_tests {
    use std::sync::Arc;

    use proctor_models::SignalKey;

    use crate::alert_queue::AlertQueue;
    use crate::clock::{ManualClock, SharedClock};
    use crate::config::{AlertConfig, CooldownOverride, SignalTable};
    use crate::hysteresis::{AlertEngine, Transition};

    fn phone_engine(clock: SharedClock) -> AlertEngine {
        let mut alerts = AlertConfig::default();
        alerts.overrides.insert(
            SignalKey::from("phone"),
            CooldownOverride {
                cooldown_secs: Some(3.0),
                reset_cooldown_secs: Some(1.0),
            },
        );
        AlertEngine::new(&SignalTable::default(), &alerts, clock)
    }

    #[test]
    fn test_phone_alert_lifecycle() {
        let clock = Arc::new(ManualClock::new(0.0));
        let mut engine = phone_engine(clock.clone());
        let mut queue = AlertQueue::new(2.0, clock.clone());
        let phone = SignalKey::from("phone");

        assert_eq!(engine.trigger(&phone, true, &mut queue).unwrap(), Transition::Raised);
        assert_eq!(queue.active_alerts(), vec!["Phone detected"]);

        clock.set(0.5);
        assert_eq!(engine.trigger(&phone, false, &mut queue).unwrap(), Transition::Held);
        assert!(engine.is_active(&phone).unwrap());

        clock.set(1.5);
        assert_eq!(engine.trigger(&phone, false, &mut queue).unwrap(), Transition::Cleared);
        assert!(!engine.is_active(&phone).unwrap());
        assert_eq!(engine.stats().emitted(), 1);
    }

    #[test]
    fn test_persistent_condition_repeats_each_cooldown() {
        let clock = Arc::new(ManualClock::new(0.0));
        let mut engine = phone_engine(clock.clone());
        let mut queue = AlertQueue::new(2.0, clock.clone());
        let phone = SignalKey::from("phone");

        // 10s of continuous detection at 10 fps
        for i in 0..=100 {
            clock.set(i as f64 * 0.1);
            engine.trigger(&phone, true, &mut queue).unwrap();
        }

        let stats = engine.stats();
        assert_eq!(stats.raised, 1);
        assert_eq!(stats.repeated, 3);
        assert!(stats.suppressed > 90);
    }
}

#[cfg(test)]
mod pipeline_scenario_tests {
    use std::sync::Arc;

    use proctor_models::{classes, keys, BoundingBox, Detection, FrameObservation, HeadObservation, SignalKey};

    use crate::clock::ManualClock;
    use crate::config::{CooldownOverride, StabilizerConfig};
    use crate::pipeline::SignalPipeline;

    fn person() -> Detection {
        Detection::new(classes::PERSON, 0.95, BoundingBox::new(200.0, 50.0, 450.0, 470.0))
    }

    fn phone() -> Detection {
        Detection::new(classes::CELL_PHONE, 0.8, BoundingBox::new(500.0, 300.0, 540.0, 380.0))
    }

    fn attentive() -> HeadObservation {
        HeadObservation {
            yaw: 0.02,
            pitch: 0.01,
            gaze: 0.0,
            ..Default::default()
        }
    }

    fn frame(detections: Vec<Detection>, head: Option<HeadObservation>) -> FrameObservation {
        FrameObservation {
            timestamp: None,
            detections,
            head,
            landmarks: None,
        }
    }

    #[test]
    fn test_phone_end_to_end() {
        let mut config = StabilizerConfig::default();
        config.voter.window = 1;
        config.voter.min_votes = 1;
        config.alerts.overrides.insert(
            SignalKey::from(keys::PHONE),
            CooldownOverride {
                cooldown_secs: Some(3.0),
                reset_cooldown_secs: Some(1.0),
            },
        );
        let clock = Arc::new(ManualClock::new(0.0));
        let mut p = SignalPipeline::new(config, clock.clone()).unwrap();
        let key = SignalKey::from(keys::PHONE);

        let report = p.process_frame(&frame(vec![person(), phone()], Some(attentive()))).unwrap();
        assert_eq!(report.active_alerts, vec!["Phone detected"]);
        assert!(report.signals[&key]);

        clock.set(0.5);
        p.process_frame(&frame(vec![person()], Some(attentive()))).unwrap();
        assert!(p.is_active(&key).unwrap());

        clock.set(1.5);
        let report = p.process_frame(&frame(vec![person()], Some(attentive()))).unwrap();
        assert!(!p.is_active(&key).unwrap());
        assert!(!report.signals[&key]);
        assert_eq!(p.alert_stats().emitted(), 1);
    }

    #[test]
    fn test_flickering_phone_stabilizes() {
        let clock = Arc::new(ManualClock::new(0.0));
        let mut p = SignalPipeline::new(StabilizerConfig::default(), clock.clone()).unwrap();
        let key = SignalKey::from(keys::PHONE);

        let mut first_stable = None;
        for i in 0..15 {
            let detections = if i % 3 == 2 { vec![person()] } else { vec![person(), phone()] };
            let report = p.process_frame(&frame(detections, Some(attentive()))).unwrap();
            if report.signals[&key] && first_stable.is_none() {
                first_stable = Some(i);
            }
            clock.advance(1.0 / 30.0);
        }
        // Fifth positive vote lands on frame 6
        assert_eq!(first_stable, Some(6));
        assert_eq!(p.alert_stats().raised, 1);
    }

    #[test]
    fn test_single_frame_head_turn_is_ignored() {
        let clock = Arc::new(ManualClock::new(0.0));
        let mut p = SignalPipeline::new(StabilizerConfig::default(), clock.clone()).unwrap();
        let turned = HeadObservation {
            looking_away: true,
            yaw: 0.3,
            ..attentive()
        };

        for i in 0..60 {
            let head = if i % 10 == 0 { turned } else { attentive() };
            let report = p.process_frame(&frame(vec![person()], Some(head))).unwrap();
            assert!(report.active_alerts.is_empty(), "frame {i}: {:?}", report.active_alerts);
            clock.advance(0.1);
        }
    }

    #[test]
    fn test_face_hidden_requires_person() {
        let clock = Arc::new(ManualClock::new(0.0));
        let mut p = SignalPipeline::new(StabilizerConfig::default(), clock.clone()).unwrap();
        let hidden = SignalKey::from(keys::FACE_HIDDEN);
        let no_person = SignalKey::from(keys::NO_PERSON);

        // Person in frame, face covered for 2.5s
        let report = (0..=25)
            .map(|_| {
                let report = p.process_frame(&frame(vec![person()], None)).unwrap();
                clock.advance(0.1);
                report
            })
            .last()
            .unwrap();
        assert!(report.signals[&hidden]);
        assert!(!report.signals[&no_person]);
        assert!(report.active_alerts.contains(&"Face hidden".to_string()));

        // Subject leaves entirely: face_hidden drops, no_person takes over
        let report = (0..5)
            .map(|_| {
                let report = p.process_frame(&frame(vec![], None)).unwrap();
                clock.advance(0.1);
                report
            })
            .last()
            .unwrap();
        assert!(!report.signals[&hidden]);
        assert!(report.signals[&no_person]);
    }

    #[test]
    fn test_static_photo_flags_fake_presence() {
        let clock = Arc::new(ManualClock::new(0.0));
        let mut p = SignalPipeline::new(StabilizerConfig::default(), clock.clone()).unwrap();
        let fake = SignalKey::from(keys::FAKE_PRESENCE);

        let mut first_raw = None;
        let mut first_fake = None;
        for i in 0..60 {
            let report = p.process_frame(&frame(vec![person()], Some(attentive()))).unwrap();
            if report.liveness.fake && first_raw.is_none() {
                first_raw = Some(report.timestamp);
                assert!(!report.signals[&fake]);
                assert!(report.active_alerts.is_empty());
            }
            if report.signals[&fake] && first_fake.is_none() {
                first_fake = Some(report.timestamp);
                assert!(report
                    .active_alerts
                    .contains(&"Possible fake presence (static image)".to_string()));
                assert_eq!(report.liveness.yaw_variance, 0.0);
            }
            clock.set((i + 1) as f64 * 0.25);
        }

        // Raw verdict after the blink timeout, alert after the debounce threshold
        let first_raw = first_raw.unwrap();
        let first_fake = first_fake.unwrap();
        assert!(first_raw > 10.0 && first_raw <= 10.5, "raw at {first_raw}");
        assert!(first_fake >= first_raw + 2.0 && first_fake <= first_raw + 2.25, "flagged at {first_fake}");
    }

    #[test]
    fn test_faceless_frames_do_not_reuse_old_motion() {
        let clock = Arc::new(ManualClock::new(0.0));
        let mut p = SignalPipeline::new(StabilizerConfig::default(), clock.clone()).unwrap();
        let fake = SignalKey::from(keys::FAKE_PRESENCE);

        // Calm subject for 7.25s, then the face is covered long past the window
        for i in 0..30 {
            clock.set(i as f64 * 0.25);
            p.process_frame(&frame(vec![person()], Some(attentive()))).unwrap();
        }
        let reports: Vec<_> = (0..=40)
            .map(|i| {
                clock.set(18.0 + i as f64 * 0.25);
                p.process_frame(&frame(vec![person()], None)).unwrap()
            })
            .collect();

        for report in &reports {
            assert!(!report.liveness.fake, "fake at {}", report.timestamp);
            assert!(!report.signals[&fake]);
            assert_eq!(report.liveness.yaw_variance, 1.0);
            assert!(!report
                .active_alerts
                .contains(&"Possible fake presence (static image)".to_string()));
        }
        assert!(!p.liveness(28.0).fake);
    }

    #[test]
    fn test_moving_subject_that_blinks_is_live() {
        let clock = Arc::new(ManualClock::new(0.0));
        let mut p = SignalPipeline::new(StabilizerConfig::default(), clock.clone()).unwrap();

        for i in 0..80 {
            let head = HeadObservation {
                yaw: (i as f64 * 0.7).sin() * 0.05,
                pitch: (i as f64 * 0.3).cos() * 0.03,
                gaze: 0.0,
                blinked: i % 16 == 0,
                ..Default::default()
            };
            let report = p.process_frame(&frame(vec![person()], Some(head))).unwrap();
            assert!(!report.liveness.fake);
            clock.advance(0.25);
        }
        assert_eq!(p.process_frame(&frame(vec![person()], None)).unwrap().total_blinks, 5);
    }
}
