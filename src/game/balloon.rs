// BalloonGameState - balloon inflated by sustained blowing
//
// Blows add pressure, a constant leak removes it every frame. Pressure at 95%
// of the maximum bursts the balloon (reset plus penalty); holding it at 80%
// without bursting earns a one-time bonus.

use serde::Serialize;

use crate::analysis::{BlowDetection, ContinuousBlow};
use crate::config::BalloonConfig;
use crate::game::{Difficulty, Progress};
use crate::history::BoundedHistory;

/// Nominal duration of one intensity-path frame in seconds
const INTENSITY_FRAME_SECS: f64 = 0.1;

/// Bonus for perfectly steady pressure on the raw-audio path
const CONSISTENCY_BONUS_MAX: f64 = 5.0;
const CONSISTENCY_WINDOW: usize = 3;

const NO_BURST_BONUS: u64 = 10;

const MIN_SIZE: f64 = 1.0;
const MAX_SIZE: f64 = 10.0;

/// Balloon state after one frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BalloonFrame {
    pub blow_duration: f64,
    pub size: f64,
    pub pressure: f64,
    pub pressure_percent: f64,
    /// Pressure as a fraction of the maximum
    pub progress: f64,
    pub is_full: bool,
    /// The balloon burst this frame
    pub is_popped: bool,
    /// Display scale for clients, 20% (empty) to 200% (maximum)
    pub size_percent: f64,
    /// The one-time full bonus was granted this frame
    pub full_bonus_awarded: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BalloonStats {
    pub size: f64,
    pub pressure: f64,
    pub max_pressure_reached: f64,
    pub total_blow_sessions: usize,
    pub avg_blow_intensity: f64,
    pub bursts: u32,
    pub full_bonus_awarded: bool,
    pub progress: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct BlowSession {
    intensity: f64,
    duration_secs: f64,
}

#[derive(Debug, Clone)]
pub struct BalloonGameState {
    config: BalloonConfig,
    pressure: f64,
    size: f64,
    pressure_history: BoundedHistory<f64>,
    blow_sessions: BoundedHistory<BlowSession>,
    full_bonus_awarded: bool,
    bursts: u32,
}

impl BalloonGameState {
    pub fn new(config: &BalloonConfig) -> Self {
        Self {
            config: config.clone(),
            pressure: 0.0,
            size: MIN_SIZE,
            pressure_history: BoundedHistory::new(config.history),
            blow_sessions: BoundedHistory::new(config.history),
            full_bonus_awarded: false,
            bursts: 0,
        }
    }

    /// Start hook: empty balloon, no history
    ///
    /// The full bonus flag is left alone; it is granted once per game instance.
    pub fn reset(&mut self) {
        self.pressure = 0.0;
        self.size = MIN_SIZE;
        self.pressure_history.clear();
        self.blow_sessions.clear();
        log::info!("[Balloon] Balloon empty");
    }

    /// Apply one precomputed intensity reading
    ///
    /// Only the part of the intensity above the inflate floor adds pressure, so
    /// weak readings flagged as blows never accumulate.
    pub fn advance_intensity(
        &mut self,
        detection: BlowDetection,
        progress: &mut Progress,
    ) -> BalloonFrame {
        let intensity = detection.intensity.clamp(0.0, 1.0);
        let floor = self.config.min_inflate_intensity;

        if detection.detected && intensity >= floor {
            let span = (1.0 - floor).max(f64::EPSILON);
            let effective = ((intensity - floor) / span).clamp(0.0, 1.0);
            self.add_pressure(effective * self.config.pressure_gain);
            self.blow_sessions.push(BlowSession {
                intensity,
                duration_secs: INTENSITY_FRAME_SECS,
            });
        }

        let duration = if detection.detected {
            INTENSITY_FRAME_SECS
        } else {
            0.0
        };
        self.finish_frame(detection.detected, intensity, duration, progress)
    }

    /// Apply one continuous-blow estimate from raw audio
    pub fn advance_audio(
        &mut self,
        blow: ContinuousBlow,
        difficulty: Difficulty,
        progress: &mut Progress,
    ) -> BalloonFrame {
        let intensity = blow.intensity.clamp(0.0, 1.0);

        if blow.detected {
            let base = intensity * blow.duration_secs * self.config.pressure_gain;
            let added = (base + self.consistency_bonus()) * inflate_multiplier(difficulty);
            self.add_pressure(added);
            self.blow_sessions.push(BlowSession {
                intensity,
                duration_secs: blow.duration_secs,
            });
        }

        self.finish_frame(blow.detected, intensity, blow.duration_secs, progress)
    }

    /// Steadier recent pressure earns a larger bonus
    fn consistency_bonus(&self) -> f64 {
        if self.pressure_history.len() < CONSISTENCY_WINDOW {
            return 0.0;
        }
        let recent: Vec<f64> = self
            .pressure_history
            .latest(CONSISTENCY_WINDOW)
            .copied()
            .collect();
        let mean = recent.iter().sum::<f64>() / recent.len() as f64;
        let variance =
            recent.iter().map(|p| (p - mean).powi(2)).sum::<f64>() / recent.len() as f64;
        (CONSISTENCY_BONUS_MAX - variance).max(0.0)
    }

    fn add_pressure(&mut self, amount: f64) {
        self.pressure = (self.pressure + amount).clamp(0.0, self.config.max_pressure);
        self.pressure_history.push(self.pressure);
    }

    /// Leak, resize, burst check, then scoring
    fn finish_frame(
        &mut self,
        detected: bool,
        intensity: f64,
        duration: f64,
        progress: &mut Progress,
    ) -> BalloonFrame {
        let max = self.config.max_pressure;

        self.pressure = (self.pressure - self.config.leak_rate).max(0.0);
        self.size = self.size_for(self.pressure);

        let is_popped = self.pressure >= max * self.config.burst_ratio;
        if is_popped {
            self.burst(progress);
        }
        let is_full = self.pressure >= max * self.config.full_ratio;

        if detected {
            let blow_score = (intensity * 10.0).floor() as u64;
            let pressure_bonus = (self.pressure / 5.0).floor() as u64;
            let no_burst_bonus = if is_popped { 0 } else { NO_BURST_BONUS };
            progress.award(blow_score + pressure_bonus + no_burst_bonus);
        }

        let mut full_bonus_awarded = false;
        if is_full && !is_popped && !self.full_bonus_awarded {
            self.full_bonus_awarded = true;
            full_bonus_awarded = true;
            progress.award(self.config.full_bonus);
            log::info!(
                "[Balloon] Full bonus of {} points awarded",
                self.config.full_bonus
            );
        }

        BalloonFrame {
            blow_duration: duration,
            size: self.size,
            pressure: self.pressure,
            pressure_percent: self.ratio() * 100.0,
            progress: self.ratio(),
            is_full,
            is_popped,
            size_percent: 20.0 + (self.size - MIN_SIZE) / (MAX_SIZE - MIN_SIZE) * 180.0,
            full_bonus_awarded,
        }
    }

    fn burst(&mut self, progress: &mut Progress) {
        self.pressure = 0.0;
        self.size = MIN_SIZE;
        self.bursts += 1;
        progress.penalize(self.config.burst_penalty);
        log::info!(
            "[Balloon] Burst! Penalty of {} points applied",
            self.config.burst_penalty
        );
    }

    fn size_for(&self, pressure: f64) -> f64 {
        MIN_SIZE + (pressure / self.config.max_pressure) * (MAX_SIZE - MIN_SIZE)
    }

    fn ratio(&self) -> f64 {
        if self.config.max_pressure > 0.0 {
            self.pressure / self.config.max_pressure
        } else {
            0.0
        }
    }

    pub fn stats(&self) -> BalloonStats {
        let sessions = self.blow_sessions.len();
        let avg_blow_intensity = if sessions == 0 {
            0.0
        } else {
            self.blow_sessions.iter().map(|s| s.intensity).sum::<f64>() / sessions as f64
        };

        BalloonStats {
            size: self.size,
            pressure: self.pressure,
            max_pressure_reached: self.pressure_history.iter().copied().fold(0.0, f64::max),
            total_blow_sessions: sessions,
            avg_blow_intensity,
            bursts: self.bursts,
            full_bonus_awarded: self.full_bonus_awarded,
            progress: self.ratio(),
        }
    }

    /// Teardown hook
    pub fn log_summary(&self) {
        let total_secs: f64 = self.blow_sessions.iter().map(|s| s.duration_secs).sum();
        log::info!(
            "[Balloon] Finished - blow sessions: {}, blowing time: {:.1}s, bursts: {}",
            self.blow_sessions.len(),
            total_secs,
            self.bursts
        );
    }
}

/// Easier settings inflate faster on the raw-audio path
fn inflate_multiplier(difficulty: Difficulty) -> f64 {
    match difficulty {
        Difficulty::Easy => 1.3,
        Difficulty::Medium => 1.0,
        Difficulty::Hard => 0.7,
    }
}
