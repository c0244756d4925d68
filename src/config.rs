//! Configuration management for detection and game tuning
//!
//! This module provides runtime configuration loading from JSON files,
//! enabling difficulty curves and detection thresholds to be adjusted
//! without recompilation. Every field has a default matching the shipped
//! game behavior, so partial config files are accepted.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Complete application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub detection: DetectionConfig,
    pub intensity: IntensityConfig,
    pub boat: BoatConfig,
    pub balloon: BalloonConfig,
}

/// Raw PCM blow detection parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Sample rate of incoming PCM buffers in Hz
    pub sample_rate: u32,
    /// Lower edge of the human-blow band (Hz)
    pub blow_band_low_hz: f32,
    /// Upper edge of the human-blow band (Hz)
    pub blow_band_high_hz: f32,
    /// Out-of-band high-pass cutoff (Hz)
    pub high_pass_hz: f32,
    /// Out-of-band low-pass cutoff (Hz)
    pub low_pass_hz: f32,
    /// Threshold used before any calibration has run
    pub default_threshold: f64,
    /// Calibrated threshold = baseline * this multiplier
    pub baseline_multiplier: f64,
    /// Band used by the balloon's continuous-blow analysis (Hz)
    pub continuous_band_low_hz: f32,
    pub continuous_band_high_hz: f32,
    /// Divisor normalizing the continuous-blow band magnitude
    pub continuous_normalizer: f32,
    /// Normalized band magnitude above which a continuous blow is detected
    pub continuous_threshold: f64,
    /// Number of calibration sample RMS values kept for diagnostics
    pub calibration_history: usize,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44_100,
            blow_band_low_hz: 200.0,
            blow_band_high_hz: 800.0,
            high_pass_hz: 100.0,
            low_pass_hz: 2000.0,
            default_threshold: 0.1,
            baseline_multiplier: 2.5,
            continuous_band_low_hz: 150.0,
            continuous_band_high_hz: 600.0,
            continuous_normalizer: 1000.0,
            continuous_threshold: 0.3,
            calibration_history: 50,
        }
    }
}

/// Detection policy for precomputed intensity / metering readings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IntensityConfig {
    /// Blow threshold when no metering value is supplied
    pub blow_threshold: f64,
    /// Metering level (dB) a blow must exceed
    pub db_threshold: f64,
    /// Minimum intensity required alongside a passing metering level
    pub db_min_intensity: f64,
}

impl Default for IntensityConfig {
    fn default() -> Self {
        Self {
            // 0.15 filters most external noise while still catching soft blows
            blow_threshold: 0.15,
            // blows sit between -30 dB (strong) and -50 dB (weak), ambient below -55 dB
            db_threshold: -50.0,
            db_min_intensity: 0.10,
        }
    }
}

/// Boat game physics
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BoatConfig {
    pub max_position: f64,
    pub initial_max_speed: f64,
    pub initial_resistance: f64,
    /// Scales intensity * max_speed into movement per frame
    pub movement_gain: f64,
    pub consecutive_bonus_step: f64,
    pub consecutive_bonus_cap: f64,
    /// Speeds below this snap to zero after resistance
    pub speed_floor: f64,
    pub level_speed_increase: f64,
    pub level_resistance_increase: f64,
    pub blow_history: usize,
}

impl Default for BoatConfig {
    fn default() -> Self {
        Self {
            max_position: 100.0,
            initial_max_speed: 10.0,
            initial_resistance: 0.05,
            movement_gain: 5.0,
            consecutive_bonus_step: 0.5,
            consecutive_bonus_cap: 2.0,
            speed_floor: 0.1,
            level_speed_increase: 1.0,
            level_resistance_increase: 0.05,
            blow_history: 100,
        }
    }
}

/// Balloon game physics
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BalloonConfig {
    pub max_pressure: f64,
    /// Pressure lost every frame, blow or not
    pub leak_rate: f64,
    /// Fraction of max pressure at which the balloon bursts
    pub burst_ratio: f64,
    /// Fraction of max pressure counted as "full"
    pub full_ratio: f64,
    /// Intensities below this never add pressure on the intensity path
    pub min_inflate_intensity: f64,
    pub pressure_gain: f64,
    pub burst_penalty: u64,
    pub full_bonus: u64,
    pub history: usize,
}

impl Default for BalloonConfig {
    fn default() -> Self {
        Self {
            max_pressure: 100.0,
            leak_rate: 0.5,
            burst_ratio: 0.95,
            full_ratio: 0.8,
            min_inflate_intensity: 0.5,
            pressure_gain: 10.0,
            burst_penalty: 50,
            full_bonus: 150,
            history: 50,
        }
    }
}

impl AppConfig {
    /// Load configuration from JSON file
    ///
    /// # Arguments
    /// * `path` - Path to JSON config file
    ///
    /// # Returns
    /// The parsed configuration, or the defaults if the file is missing or
    /// its JSON is invalid.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    log::info!("[Config] Loaded configuration from {:?}", path.as_ref());
                    config
                }
                Err(err) => {
                    log::warn!(
                        "[Config] Failed to parse JSON from {:?}: {}. Using defaults.",
                        path.as_ref(),
                        err
                    );
                    Self::default()
                }
            },
            Err(err) => {
                log::warn!(
                    "[Config] Failed to read config file {:?}: {}. Using defaults.",
                    path.as_ref(),
                    err
                );
                Self::default()
            }
        }
    }

    /// Load configuration from the default asset location
    pub fn load() -> Self {
        Self::load_from_file("assets/breath_config.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.detection.sample_rate, 44_100);
        assert_eq!(config.detection.default_threshold, 0.1);
        assert_eq!(config.detection.baseline_multiplier, 2.5);
        assert_eq!(config.intensity.blow_threshold, 0.15);
        assert_eq!(config.boat.initial_max_speed, 10.0);
        assert_eq!(config.balloon.leak_rate, 0.5);
        assert_eq!(config.balloon.burst_penalty, 50);
    }

    #[test]
    fn test_json_roundtrip() {
        let config = AppConfig::default();
        let json = serde_json::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.boat.movement_gain, config.boat.movement_gain);
        assert_eq!(parsed.balloon.full_bonus, config.balloon.full_bonus);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let parsed: AppConfig =
            serde_json::from_str(r#"{ "balloon": { "leak_rate": 1.5 } }"#).unwrap();
        assert_eq!(parsed.balloon.leak_rate, 1.5);
        assert_eq!(parsed.balloon.max_pressure, 100.0);
        assert_eq!(parsed.detection.sample_rate, 44_100);
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = AppConfig::load_from_file("does/not/exist.json");
        assert_eq!(config.intensity.db_threshold, -50.0);
    }
}
