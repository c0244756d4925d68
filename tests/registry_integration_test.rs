//! Integration tests for the game registry
//!
//! These tests drive complete sessions through the public registry API:
//! - Boat and balloon sessions on the intensity path
//! - Raw PCM sessions and ambient noise calibration
//! - Lifecycle and validation errors
//! - Concurrent events on one game and across games

use std::sync::Arc;
use std::thread;

use breath_trainer::game::{FrameState, GameStats};
use breath_trainer::telemetry::GameEvent;
use breath_trainer::testing::signals::{silence_bytes, sine_wave, to_pcm16_bytes, white_noise};
use breath_trainer::{AppConfig, Difficulty, GameError, GameKind, GameRegistry, GameStatus};

fn registry() -> GameRegistry {
    GameRegistry::new(AppConfig::default()).expect("default config builds")
}

fn running_game(registry: &GameRegistry, kind: GameKind) -> String {
    let id = registry
        .create_game(kind, "Tester")
        .expect("create game")
        .game_id
        .to_string();
    registry.start_game(&id).expect("start game");
    id
}

fn boat_consecutive_blows(registry: &GameRegistry, id: &str) -> u32 {
    match registry.game_status(id).unwrap().stats {
        GameStats::Boat(stats) => stats.consecutive_blows,
        other => panic!("expected boat stats, got {:?}", other),
    }
}

#[test]
fn test_boat_session_progresses_every_frame() {
    let registry = registry();
    let id = running_game(&registry, GameKind::Boat);
    registry.set_difficulty(&id, Difficulty::Medium).unwrap();

    let mut last_progress = -1.0;
    let mut last_consecutive = 0;
    for intensity in [0.7, 0.8, 0.9, 1.0, 1.0] {
        let frame = registry.process_intensity(&id, intensity, None).unwrap();
        assert!(frame.blow_detected);

        let FrameState::Boat(boat) = frame.state else {
            panic!("expected a boat frame");
        };
        assert!((0.0..=100.0).contains(&boat.position));

        // the course restarts on level-up, so progress counts completed laps
        let progress = (frame.level - 1) as f64 * 100.0 + boat.position;
        assert!(
            progress > last_progress,
            "progress {} after {}",
            progress,
            last_progress
        );
        last_progress = progress;
        last_consecutive = boat.consecutive_blows;
    }

    assert_eq!(last_consecutive, 5);
    assert_eq!(boat_consecutive_blows(&registry, &id), 5);
    assert!(registry
        .recent_events()
        .iter()
        .any(|event| matches!(event, GameEvent::LevelUp { .. })));
}

#[test]
fn test_balloon_bursts_once_with_single_penalty() {
    let registry = registry();
    let id = running_game(&registry, GameKind::Balloon);

    let mut bursts = 0;
    let mut previous_score = 0;
    for _ in 0..13 {
        let frame = registry.process_intensity(&id, 0.9, None).unwrap();
        let FrameState::Balloon(balloon) = frame.state else {
            panic!("expected a balloon frame");
        };
        assert!((0.0..=100.0).contains(&balloon.pressure));

        if balloon.is_popped {
            bursts += 1;
            assert_eq!(balloon.pressure, 0.0);
            assert_eq!(balloon.size, 1.0);
            // 50 point penalty; the blow itself still earns floor(0.9 * 10)
            assert_eq!(frame.score, previous_score - 50 + 9);
        }
        previous_score = frame.score;
    }

    assert_eq!(bursts, 1);
    let events = registry.recent_events();
    assert_eq!(
        events
            .iter()
            .filter(|event| matches!(event, GameEvent::Burst { .. }))
            .count(),
        1
    );
    assert_eq!(
        events
            .iter()
            .filter(|event| matches!(event, GameEvent::FullBonus { .. }))
            .count(),
        1
    );
}

#[test]
fn test_balloon_leaks_to_empty_without_input() {
    let registry = registry();
    let id = running_game(&registry, GameKind::Balloon);
    registry.process_intensity(&id, 1.0, None).unwrap();

    let mut last_pressure = f64::MAX;
    for _ in 0..25 {
        let frame = registry.process_intensity(&id, 0.0, None).unwrap();
        let FrameState::Balloon(balloon) = frame.state else {
            panic!("expected a balloon frame");
        };
        assert!(balloon.pressure <= last_pressure);
        last_pressure = balloon.pressure;
    }
    assert_eq!(last_pressure, 0.0);
}

#[test]
fn test_silent_calibration_makes_any_signal_a_blow() {
    let registry = registry();
    let id = running_game(&registry, GameKind::Boat);

    let status = registry
        .calibrate(&vec![silence_bytes(2048); 3])
        .unwrap();
    assert!(status.is_calibrated);
    assert!(status.baseline_level.abs() < 1e-9);
    assert_eq!(status.sample_count, 3);

    let faint = to_pcm16_bytes(&white_noise(4410, 0.01, 21));
    let frame = registry.process_audio(&id, &faint).unwrap();
    assert!(frame.blow_detected);
    assert_eq!(frame.blow_intensity, 1.0);
}

#[test]
fn test_empty_calibration_leaves_state_untouched() {
    let registry = registry();
    let noise: Vec<Vec<u8>> = (0..3)
        .map(|seed| to_pcm16_bytes(&white_noise(2048, 0.05, seed)))
        .collect();
    let calibrated = registry.calibrate(&noise).unwrap();

    let empty: Vec<Vec<u8>> = Vec::new();
    let unchanged = registry.calibrate(&empty).unwrap();
    assert_eq!(unchanged, calibrated);
    assert_eq!(registry.calibration_status().unwrap(), calibrated);
}

#[test]
fn test_uncalibrated_detection_uses_default_threshold() {
    let registry = registry();
    let id = running_game(&registry, GameKind::Boat);

    let tone = to_pcm16_bytes(&sine_wave(44_100, 400.0, 4410, 0.5));
    let frame = registry.process_audio(&id, &tone).unwrap();
    let metadata = frame.metadata.expect("raw frames carry metadata");
    assert_eq!(metadata.threshold, 0.1);
    assert!(frame.blow_detected);

    let high = to_pcm16_bytes(&sine_wave(44_100, 6000.0, 4410, 0.5));
    let frame = registry.process_audio(&id, &high).unwrap();
    assert!(!frame.blow_detected);
}

#[test]
fn test_processing_an_ended_game_is_rejected() {
    let registry = registry();
    let id = running_game(&registry, GameKind::Boat);
    registry.process_intensity(&id, 0.8, None).unwrap();
    let finished = registry.end_game(&id).unwrap();
    let before = registry.game_status(&id).unwrap();
    assert_eq!(before.status, GameStatus::Ended);
    assert_eq!(before.score, finished.score);

    let tone = to_pcm16_bytes(&sine_wave(44_100, 400.0, 4410, 0.5));
    assert!(matches!(
        registry.process_audio(&id, &tone),
        Err(GameError::InvalidState {
            status: GameStatus::Ended,
            ..
        })
    ));
    assert!(matches!(
        registry.process_intensity(&id, 0.9, None),
        Err(GameError::InvalidState { .. })
    ));
    assert_eq!(registry.game_status(&id).unwrap(), before);
}

#[test]
fn test_lifecycle_errors() {
    let registry = registry();
    let id = registry
        .create_game(GameKind::Balloon, "")
        .unwrap()
        .game_id
        .to_string();

    assert!(matches!(
        registry.process_intensity(&id, 0.5, None),
        Err(GameError::InvalidState {
            status: GameStatus::Created,
            ..
        })
    ));
    assert!(matches!(
        registry.end_game(&id),
        Err(GameError::InvalidState { .. })
    ));

    registry.start_game(&id).unwrap();
    assert!(matches!(
        registry.start_game(&id),
        Err(GameError::InvalidState { .. })
    ));
    assert_eq!(registry.game_status(&id).unwrap().player_name, "Player");

    assert!(matches!(
        registry.end_game("balloon_0_0"),
        Err(GameError::NotFound { .. })
    ));
}

#[test]
fn test_validation_errors() {
    assert!(matches!(
        "submarine".parse::<GameKind>(),
        Err(GameError::Validation { .. })
    ));
    assert!(matches!(
        "extreme".parse::<Difficulty>(),
        Err(GameError::Validation { .. })
    ));

    let registry = registry();
    let id = running_game(&registry, GameKind::Boat);
    assert!(matches!(
        registry.process_intensity(&id, f64::NAN, None),
        Err(GameError::Validation { .. })
    ));
    assert!(matches!(
        registry.process_audio(&id, &[]),
        Err(GameError::Validation { .. })
    ));
    assert_eq!(boat_consecutive_blows(&registry, &id), 0);
}

#[test]
fn test_extreme_intensities_stay_in_range() {
    let registry = registry();
    let boat = running_game(&registry, GameKind::Boat);
    let balloon = running_game(&registry, GameKind::Balloon);

    for intensity in [f64::INFINITY, f64::NEG_INFINITY, 1.0e300, -1.0e300, 0.5] {
        for id in [&boat, &balloon] {
            let frame = registry.process_intensity(id, intensity, Some(-10.0)).unwrap();
            assert!((0.0..=1.0).contains(&frame.blow_intensity));
            match frame.state {
                FrameState::Boat(state) => assert!((0.0..=100.0).contains(&state.position)),
                FrameState::Balloon(state) => {
                    assert!((0.0..=100.0).contains(&state.pressure))
                }
            }
        }
    }
}

#[test]
fn test_events_on_one_game_are_serialized() {
    let registry = Arc::new(registry());
    let id = running_game(&registry, GameKind::Boat);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let registry = Arc::clone(&registry);
            let id = id.clone();
            thread::spawn(move || {
                for _ in 0..25 {
                    registry.process_intensity(&id, 0.9, None).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(boat_consecutive_blows(&registry, &id), 200);
}

#[test]
fn test_games_run_independently_across_threads() {
    let registry = Arc::new(registry());

    let handles: Vec<_> = (0..6)
        .map(|n| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                let kind = if n % 2 == 0 {
                    GameKind::Boat
                } else {
                    GameKind::Balloon
                };
                let id = running_game(&registry, kind);
                for _ in 0..10 {
                    registry.process_intensity(&id, 0.6, None).unwrap();
                }
                registry.end_game(&id).unwrap().score
            })
        })
        .collect();

    for handle in handles {
        assert!(handle.join().unwrap() > 0);
    }

    let stats = registry.stats().unwrap();
    assert_eq!(stats.total_games, 6);
    assert_eq!(stats.running_games, 0);
    assert_eq!(registry.cleanup_inactive_games().unwrap(), 6);
    assert!(registry.list_games().unwrap().is_empty());
}

#[test]
fn test_calibration_swaps_atomically_during_detection() {
    let registry = Arc::new(registry());
    let id = running_game(&registry, GameKind::Boat);
    let tone = to_pcm16_bytes(&sine_wave(44_100, 400.0, 4410, 0.5));

    let detector = {
        let registry = Arc::clone(&registry);
        let id = id.clone();
        thread::spawn(move || {
            (0..40)
                .map(|_| {
                    let frame = registry.process_audio(&id, &tone).unwrap();
                    frame.metadata.expect("raw frames carry metadata").threshold
                })
                .collect::<Vec<f64>>()
        })
    };
    let calibrator = {
        let registry = Arc::clone(&registry);
        thread::spawn(move || {
            (0..20u64)
                .map(|seed| {
                    let amplitude = 0.05 + seed as f32 * 0.01;
                    let samples: Vec<Vec<u8>> = (0..3)
                        .map(|n| to_pcm16_bytes(&white_noise(2048, amplitude, seed * 10 + n)))
                        .collect();
                    let status = registry.calibrate(&samples).unwrap();
                    assert!(status.is_calibrated);
                    status.recommended_threshold
                })
                .collect::<Vec<f64>>()
        })
    };

    let thresholds = detector.join().unwrap();
    let calibrated = calibrator.join().unwrap();
    assert_eq!(thresholds.len(), 40);

    let default_threshold = AppConfig::default().detection.default_threshold;
    for threshold in thresholds {
        assert!(
            threshold == default_threshold || calibrated.contains(&threshold),
            "threshold {} was never published by a calibration",
            threshold
        );
    }
}

#[test]
fn test_subscribers_see_lifecycle_events() {
    let registry = registry();
    let mut events = registry.subscribe_events();
    let id = running_game(&registry, GameKind::Balloon);
    registry.end_game(&id).unwrap();

    assert!(matches!(events.try_recv().unwrap(), GameEvent::Created { .. }));
    assert!(matches!(events.try_recv().unwrap(), GameEvent::Started { .. }));
    assert!(matches!(events.try_recv().unwrap(), GameEvent::Ended { .. }));
}
