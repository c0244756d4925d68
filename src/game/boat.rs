// BoatGameState - boat propelled by blowing
//
// Every frame moves the boat by an amount derived from the frame's intensity,
// even when no blow was detected, so the boat responds to soft breathing.
// Reaching the finish line levels up: the boat returns to the start with a
// higher top speed and more water resistance.

use serde::Serialize;

use crate::analysis::BlowDetection;
use crate::config::BoatConfig;
use crate::game::{Difficulty, Progress};
use crate::history::BoundedHistory;

/// Points per detected blow from consecutive blows, capped
const CONSECUTIVE_SCORE_STEP: u64 = 2;
const CONSECUTIVE_SCORE_CAP: u64 = 20;

/// Boat state after one frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoatFrame {
    pub position: f64,
    pub speed: f64,
    pub consecutive_blows: u32,
    /// Position as a fraction of the course
    pub progress: f64,
    pub max_speed: f64,
    pub resistance: f64,
    /// The boat crossed the finish line this frame
    pub leveled_up: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoatStats {
    pub position: f64,
    pub speed: f64,
    pub total_blows: usize,
    pub consecutive_blows: u32,
    pub max_blow_intensity: f64,
    pub progress: f64,
}

#[derive(Debug, Clone)]
pub struct BoatGameState {
    config: BoatConfig,
    position: f64,
    speed: f64,
    max_speed: f64,
    resistance: f64,
    consecutive_blows: u32,
    blow_history: BoundedHistory<f64>,
}

impl BoatGameState {
    pub fn new(config: &BoatConfig) -> Self {
        Self {
            config: config.clone(),
            position: 0.0,
            speed: 0.0,
            max_speed: config.initial_max_speed,
            resistance: config.initial_resistance,
            consecutive_blows: 0,
            blow_history: BoundedHistory::new(config.blow_history),
        }
    }

    /// Start hook: boat back at the start line, no blow history
    pub fn reset(&mut self) {
        self.position = 0.0;
        self.speed = 0.0;
        self.consecutive_blows = 0;
        self.blow_history.clear();
        log::info!("[Boat] Boat at the starting position");
    }

    /// Apply one detection
    ///
    /// Movement, level-up, blow bookkeeping, water resistance and scoring, in
    /// that order. The consecutive counter used for scoring already includes
    /// this frame's blow.
    pub fn advance(
        &mut self,
        detection: BlowDetection,
        difficulty: Difficulty,
        progress: &mut Progress,
    ) -> BoatFrame {
        let intensity = detection.intensity.clamp(0.0, 1.0);

        let movement = self.movement(intensity, difficulty);
        self.speed = movement;
        self.position = (self.position + movement).clamp(0.0, self.config.max_position);

        let leveled_up = self.position >= self.config.max_position;
        if leveled_up {
            self.level_up(progress);
        }

        if detection.detected {
            self.blow_history.push(intensity);
            self.consecutive_blows = self.consecutive_blows.saturating_add(1);
        }

        self.apply_water_resistance();

        if detection.detected {
            let blow_score = (intensity * 10.0).floor() as u64;
            let consecutive_bonus = (self.consecutive_blows as u64 * CONSECUTIVE_SCORE_STEP)
                .min(CONSECUTIVE_SCORE_CAP);
            progress.award(blow_score + consecutive_bonus);
        }

        BoatFrame {
            position: self.position,
            speed: self.speed,
            consecutive_blows: self.consecutive_blows,
            progress: self.position / self.config.max_position,
            max_speed: self.max_speed,
            resistance: self.resistance,
            leveled_up,
        }
    }

    fn movement(&self, intensity: f64, difficulty: Difficulty) -> f64 {
        let base = intensity * self.max_speed * self.config.movement_gain;
        let consecutive_bonus = (self.consecutive_blows as f64
            * self.config.consecutive_bonus_step)
            .min(self.config.consecutive_bonus_cap);
        (base + consecutive_bonus) * movement_multiplier(difficulty)
    }

    fn level_up(&mut self, progress: &mut Progress) {
        progress.level += 1;
        self.position = 0.0;
        self.max_speed += self.config.level_speed_increase;
        self.resistance += self.config.level_resistance_increase;
        log::info!("[Boat] Level up! New level: {}", progress.level);
    }

    fn apply_water_resistance(&mut self) {
        self.speed *= 1.0 - self.resistance;
        if self.speed < self.config.speed_floor {
            self.speed = 0.0;
        }
    }

    pub fn stats(&self) -> BoatStats {
        BoatStats {
            position: self.position,
            speed: self.speed,
            total_blows: self.blow_history.len(),
            consecutive_blows: self.consecutive_blows,
            max_blow_intensity: self.blow_history.iter().copied().fold(0.0, f64::max),
            progress: self.position / self.config.max_position,
        }
    }

    /// Teardown hook
    pub fn log_summary(&self) {
        let total = self.blow_history.len();
        let average = if total == 0 {
            0.0
        } else {
            self.blow_history.iter().sum::<f64>() / total as f64
        };
        log::info!(
            "[Boat] Finished - total blows: {}, average intensity: {:.2}",
            total,
            average
        );
    }
}

/// Easier settings move the boat further per frame
fn movement_multiplier(difficulty: Difficulty) -> f64 {
    match difficulty {
        Difficulty::Easy => 2.0,
        Difficulty::Medium => 1.5,
        Difficulty::Hard => 1.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boat() -> (BoatGameState, Progress) {
        let mut boat = BoatGameState::new(&BoatConfig::default());
        boat.reset();
        (boat, Progress { score: 0, level: 1 })
    }

    #[test]
    fn test_first_frame_movement_and_score() {
        let (mut boat, mut progress) = boat();
        let frame = boat.advance(BlowDetection::new(true, 0.7), Difficulty::Medium, &mut progress);

        // (0.7 * 10 * 5 + 0) * 1.5
        assert!((frame.position - 52.5).abs() < 1e-9);
        // speed decays by the water resistance after the move
        assert!((frame.speed - 52.5 * 0.95).abs() < 1e-9);
        assert_eq!(frame.consecutive_blows, 1);
        // floor(7) + min(1 * 2, 20)
        assert_eq!(progress.score, 9);
        assert!(!frame.leveled_up);
    }

    #[test]
    fn test_level_up_resets_position_and_ramps_difficulty() {
        let (mut boat, mut progress) = boat();
        boat.advance(BlowDetection::new(true, 0.7), Difficulty::Medium, &mut progress);
        let frame = boat.advance(BlowDetection::new(true, 0.8), Difficulty::Medium, &mut progress);

        assert!(frame.leveled_up);
        assert_eq!(frame.position, 0.0);
        assert_eq!(progress.level, 2);
        assert_eq!(frame.max_speed, 11.0);
        assert!((frame.resistance - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_undetected_frames_still_move() {
        let (mut boat, mut progress) = boat();
        let frame = boat.advance(BlowDetection::new(false, 0.1), Difficulty::Easy, &mut progress);
        assert!((frame.position - 10.0).abs() < 1e-9);
        assert_eq!(frame.consecutive_blows, 0);
        assert_eq!(progress.score, 0);
    }

    #[test]
    fn test_silence_after_a_blow_keeps_bonus_speed() {
        let (mut boat, mut progress) = boat();
        let first = boat.advance(BlowDetection::new(true, 0.3), Difficulty::Hard, &mut progress);
        assert!((first.position - 15.0).abs() < 1e-9);
        assert_eq!(first.consecutive_blows, 1);

        // the consecutive-blow bonus still moves the boat 0.5 per silent frame
        for n in 1..=20 {
            let frame = boat.advance(BlowDetection::silent(), Difficulty::Hard, &mut progress);
            assert!((frame.speed - 0.5 * 0.95).abs() < 1e-12, "speed {}", frame.speed);
            assert!((frame.position - (15.0 + 0.5 * n as f64)).abs() < 1e-9);
            assert_eq!(frame.consecutive_blows, 1);
        }
    }

    #[test]
    fn test_silence_from_rest_stays_still() {
        let (mut boat, mut progress) = boat();
        for _ in 0..5 {
            let frame = boat.advance(BlowDetection::silent(), Difficulty::Easy, &mut progress);
            assert_eq!(frame.speed, 0.0);
            assert_eq!(frame.position, 0.0);
        }
    }

    #[test]
    fn test_position_stays_in_range_for_extreme_input() {
        let (mut boat, mut progress) = boat();
        for intensity in [1.0e9, -5.0, 1.0, 0.0, 1.0e-12] {
            let frame = boat.advance(
                BlowDetection::new(true, intensity),
                Difficulty::Easy,
                &mut progress,
            );
            assert!((0.0..=100.0).contains(&frame.position));
            assert!(frame.speed >= 0.0);
        }
    }

    #[test]
    fn test_consecutive_score_bonus_caps() {
        let (mut boat, mut progress) = boat();
        for _ in 0..15 {
            boat.advance(BlowDetection::new(true, 0.0), Difficulty::Hard, &mut progress);
        }
        let before = progress.score;
        boat.advance(BlowDetection::new(true, 0.0), Difficulty::Hard, &mut progress);
        assert_eq!(progress.score - before, 20);
    }

    #[test]
    fn test_stats_track_blows() {
        let (mut boat, mut progress) = boat();
        boat.advance(BlowDetection::new(true, 0.4), Difficulty::Easy, &mut progress);
        boat.advance(BlowDetection::new(true, 0.9), Difficulty::Easy, &mut progress);
        boat.advance(BlowDetection::new(false, 0.05), Difficulty::Easy, &mut progress);

        let stats = boat.stats();
        assert_eq!(stats.total_blows, 2);
        assert_eq!(stats.consecutive_blows, 2);
        assert_eq!(stats.max_blow_intensity, 0.9);

        boat.reset();
        assert_eq!(boat.stats().total_blows, 0);
        assert_eq!(boat.stats().position, 0.0);
    }
}
