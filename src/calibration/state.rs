// CalibrationState - ambient noise baseline storage
//
// Detection compares the filtered RMS of each frame against a threshold. Before
// calibration that threshold is a fixed default; afterwards it is a multiple of
// the measured ambient baseline.

use serde::{Deserialize, Serialize};

use crate::config::DetectionConfig;
use crate::history::BoundedHistory;

/// CalibrationState stores the ambient noise baseline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationState {
    /// Whether a calibration has completed
    pub is_calibrated: bool,
    /// Mean ambient RMS of the last calibration call
    pub baseline_level: f64,
    /// Per-buffer RMS values of the last calibration call (diagnostics only)
    pub noise_samples: BoundedHistory<f64>,
}

/// Calibration summary exposed to callers
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CalibrationStatus {
    pub is_calibrated: bool,
    pub baseline_level: f64,
    pub sample_count: usize,
    pub recommended_threshold: f64,
}

impl CalibrationState {
    /// Uncalibrated state: zero baseline, fixed default threshold
    pub fn new_default() -> Self {
        Self::with_capacity(DetectionConfig::default().calibration_history)
    }

    /// Uncalibrated state keeping at most `history` per-buffer readings
    pub fn with_capacity(history: usize) -> Self {
        Self {
            is_calibrated: false,
            baseline_level: 0.0,
            noise_samples: BoundedHistory::new(history),
        }
    }

    /// Build a calibrated state from per-buffer RMS readings
    ///
    /// # Returns
    /// `None` for an empty reading set, since there is no baseline to average.
    pub fn from_readings(readings: &[f64], history: usize) -> Option<Self> {
        if readings.is_empty() {
            return None;
        }

        let baseline_level = readings.iter().sum::<f64>() / readings.len() as f64;
        let mut noise_samples = BoundedHistory::new(history);
        for &rms in readings {
            noise_samples.push(rms);
        }

        Some(Self {
            is_calibrated: true,
            baseline_level: baseline_level.max(0.0),
            noise_samples,
        })
    }

    /// RMS level a frame must exceed to count as a blow
    pub fn detection_threshold(&self, config: &DetectionConfig) -> f64 {
        if self.is_calibrated {
            self.baseline_level * config.baseline_multiplier
        } else {
            config.default_threshold
        }
    }

    pub fn status(&self, config: &DetectionConfig) -> CalibrationStatus {
        CalibrationStatus {
            is_calibrated: self.is_calibrated,
            baseline_level: self.baseline_level,
            sample_count: self.noise_samples.len(),
            recommended_threshold: self.detection_threshold(config),
        }
    }
}

impl Default for CalibrationState {
    fn default() -> Self {
        Self::new_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_default() {
        let state = CalibrationState::new_default();
        assert!(!state.is_calibrated);
        assert_eq!(state.baseline_level, 0.0);
        assert!(state.noise_samples.is_empty());
        assert_eq!(state.detection_threshold(&DetectionConfig::default()), 0.1);
    }

    #[test]
    fn test_from_readings_averages() {
        let state = CalibrationState::from_readings(&[0.01, 0.02, 0.03], 50).unwrap();
        assert!(state.is_calibrated);
        assert!((state.baseline_level - 0.02).abs() < 1e-12);
        assert_eq!(state.noise_samples.len(), 3);

        let threshold = state.detection_threshold(&DetectionConfig::default());
        assert!((threshold - 0.05).abs() < 1e-12);
    }

    #[test]
    fn test_from_empty_readings_is_none() {
        assert!(CalibrationState::from_readings(&[], 50).is_none());
    }

    #[test]
    fn test_history_is_bounded() {
        let readings = vec![0.01; 80];
        let state = CalibrationState::from_readings(&readings, 50).unwrap();
        assert_eq!(state.noise_samples.len(), 50);
        assert_eq!(state.status(&DetectionConfig::default()).sample_count, 50);
    }

    #[test]
    fn test_silent_baseline_gives_zero_threshold() {
        let state = CalibrationState::from_readings(&[0.0, 0.0, 0.0], 50).unwrap();
        let status = state.status(&DetectionConfig::default());
        assert!(status.is_calibrated);
        assert_eq!(status.baseline_level, 0.0);
        assert_eq!(status.recommended_threshold, 0.0);
    }

    #[test]
    fn test_state_serializes() {
        let state = CalibrationState::from_readings(&[0.5], 4).unwrap();
        let json = serde_json::to_string(&state).unwrap();
        let restored: CalibrationState = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, state);
    }
}
