// CalibrationManager: Focused manager for the shared noise baseline
//
// Single Responsibility: Calibration state ownership and atomic replacement
// Detection reads a copy of the threshold under a read lock; calibration
// computes the new state outside the lock and swaps it in with one write.

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::calibration::{CalibrationState, CalibrationStatus, NoiseCalibrator};
use crate::config::DetectionConfig;
use crate::error::{log_game_error, GameError};

const COMPONENT: &str = "CalibrationManager";

/// Manages the calibration state shared by every detection call
///
/// # Example
/// ```ignore
/// let manager = CalibrationManager::new(&DetectionConfig::default());
/// manager.calibrate(&ambient_buffers)?;
/// let threshold = manager.threshold()?;
/// ```
pub struct CalibrationManager {
    calibrator: NoiseCalibrator,
    state: RwLock<CalibrationState>,
    config: DetectionConfig,
}

impl CalibrationManager {
    /// Create a manager with an uncalibrated state
    pub fn new(config: &DetectionConfig) -> Self {
        Self {
            calibrator: NoiseCalibrator::new(config),
            state: RwLock::new(CalibrationState::with_capacity(config.calibration_history)),
            config: config.clone(),
        }
    }

    /// Measure ambient noise and replace the baseline
    ///
    /// # Arguments
    /// * `samples` - Raw 16-bit PCM buffers of ambient noise
    ///
    /// # Returns
    /// * `Ok(Some(status))` - New baseline applied
    /// * `Ok(None)` - Empty sample set, previous calibration untouched
    ///
    /// # Errors
    /// - Malformed sample buffer (state untouched)
    /// - Lock poisoning on calibration state
    pub fn calibrate<B: AsRef<[u8]>>(
        &self,
        samples: &[B],
    ) -> Result<Option<CalibrationStatus>, GameError> {
        let new_state = self
            .calibrator
            .calibrate(samples)
            .inspect_err(|err| log_game_error(err, COMPONENT, "calibrate"))?;

        let Some(new_state) = new_state else {
            log::warn!("[CalibrationManager] Empty sample set, keeping current calibration");
            return Ok(None);
        };

        let status = new_state.status(&self.config);
        let mut state_guard = self
            .write_state()
            .inspect_err(|err| log_game_error(err, COMPONENT, "calibrate"))?;
        *state_guard = new_state;
        Ok(Some(status))
    }

    /// Current detection threshold (fixed default until calibrated)
    pub fn threshold(&self) -> Result<f64, GameError> {
        Ok(self.read_state()?.detection_threshold(&self.config))
    }

    /// Current calibration summary
    pub fn status(&self) -> Result<CalibrationStatus, GameError> {
        Ok(self.read_state()?.status(&self.config))
    }

    // ========================================================================
    // HELPER METHODS - Lock management
    // ========================================================================

    fn read_state(&self) -> Result<RwLockReadGuard<'_, CalibrationState>, GameError> {
        self.state.read().map_err(|_| GameError::LockPoisoned {
            component: "calibration_state".to_string(),
        })
    }

    fn write_state(&self) -> Result<RwLockWriteGuard<'_, CalibrationState>, GameError> {
        self.state.write().map_err(|_| GameError::LockPoisoned {
            component: "calibration_state".to_string(),
        })
    }
}

impl Default for CalibrationManager {
    fn default() -> Self {
        Self::new(&DetectionConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::signals::{silence_bytes, to_pcm16_bytes, white_noise};

    #[test]
    fn test_new() {
        let manager = CalibrationManager::default();
        let status = manager.status().unwrap();
        assert!(!status.is_calibrated);
        assert_eq!(status.sample_count, 0);
        assert_eq!(manager.threshold().unwrap(), 0.1);
    }

    #[test]
    fn test_calibrate_replaces_baseline() {
        let manager = CalibrationManager::default();
        let loud: Vec<Vec<u8>> = (0..3)
            .map(|seed| to_pcm16_bytes(&white_noise(2048, 0.3, seed)))
            .collect();
        let first = manager.calibrate(&loud).unwrap().unwrap();
        assert!(first.is_calibrated);
        assert!(first.baseline_level > 0.0);

        // A second call does not average with the first
        let quiet = vec![silence_bytes(2048); 2];
        let second = manager.calibrate(&quiet).unwrap().unwrap();
        assert_eq!(second.baseline_level, 0.0);
        assert_eq!(second.sample_count, 2);
        assert_eq!(manager.threshold().unwrap(), 0.0);
    }

    #[test]
    fn test_empty_calibration_keeps_state() {
        let manager = CalibrationManager::default();
        let samples = vec![to_pcm16_bytes(&white_noise(1024, 0.2, 5))];
        manager.calibrate(&samples).unwrap();
        let before = manager.status().unwrap();

        let empty: Vec<Vec<u8>> = Vec::new();
        assert!(manager.calibrate(&empty).unwrap().is_none());
        assert_eq!(manager.status().unwrap(), before);
    }

    #[test]
    fn test_malformed_calibration_keeps_state() {
        let manager = CalibrationManager::default();
        let samples = vec![silence_bytes(16), vec![0u8; 5]];
        assert!(matches!(
            manager.calibrate(&samples),
            Err(GameError::Validation { .. })
        ));
        assert!(!manager.status().unwrap().is_calibrated);
    }
}
