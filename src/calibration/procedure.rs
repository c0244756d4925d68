// NoiseCalibrator - ambient noise measurement
//
// Each calibration buffer goes through the same decoding and preprocessing as
// detection (minus the blow-band filters); the per-buffer RMS values are then
// averaged into the new baseline.

use crate::analysis::features::ambient_rms;
use crate::calibration::state::CalibrationState;
use crate::config::DetectionConfig;
use crate::error::GameError;

/// Computes calibration states from ambient noise recordings
#[derive(Debug, Clone)]
pub struct NoiseCalibrator {
    history: usize,
}

impl NoiseCalibrator {
    pub fn new(config: &DetectionConfig) -> Self {
        Self {
            history: config.calibration_history,
        }
    }

    /// Measure a set of ambient buffers
    ///
    /// # Arguments
    /// * `samples` - Raw 16-bit PCM buffers recorded without blowing
    ///
    /// # Returns
    /// * `Ok(Some(state))` - Calibrated state from these buffers only
    /// * `Ok(None)` - Empty sample set; the caller keeps its current state
    ///
    /// # Errors
    /// `GameError::Validation` if any buffer is malformed. No partial state is
    /// produced in that case.
    pub fn calibrate<B: AsRef<[u8]>>(
        &self,
        samples: &[B],
    ) -> Result<Option<CalibrationState>, GameError> {
        let readings = samples
            .iter()
            .map(|sample| ambient_rms(sample.as_ref()))
            .collect::<Result<Vec<f64>, GameError>>()?;

        let state = CalibrationState::from_readings(&readings, self.history);
        if let Some(state) = &state {
            log::info!(
                "[NoiseCalibrator] baseline={:.5} from {} samples",
                state.baseline_level,
                readings.len()
            );
        }
        Ok(state)
    }
}

impl Default for NoiseCalibrator {
    fn default() -> Self {
        Self::new(&DetectionConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::signals::{silence_bytes, to_pcm16_bytes, white_noise};

    #[test]
    fn test_silent_samples_give_zero_baseline() {
        let samples = vec![silence_bytes(1024); 3];
        let state = NoiseCalibrator::default().calibrate(&samples).unwrap().unwrap();
        assert!(state.is_calibrated);
        assert!(state.baseline_level.abs() < 1e-9);
        assert_eq!(state.noise_samples.len(), 3);
    }

    #[test]
    fn test_noise_samples_give_positive_baseline() {
        let samples: Vec<Vec<u8>> = (0..4)
            .map(|seed| to_pcm16_bytes(&white_noise(2048, 0.05, seed)))
            .collect();
        let state = NoiseCalibrator::default().calibrate(&samples).unwrap().unwrap();
        assert!(state.baseline_level > 0.0);
    }

    #[test]
    fn test_empty_sample_set_is_none() {
        let samples: Vec<Vec<u8>> = Vec::new();
        assert!(NoiseCalibrator::default().calibrate(&samples).unwrap().is_none());
    }

    #[test]
    fn test_malformed_sample_is_rejected() {
        let samples = vec![silence_bytes(64), vec![1u8, 2, 3]];
        let result = NoiseCalibrator::default().calibrate(&samples);
        assert!(matches!(result, Err(GameError::Validation { .. })));
    }
}
