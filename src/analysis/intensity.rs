// IntensityDetector - blow detection from precomputed readings
//
// Client devices can report metering directly from their OS audio APIs, which
// avoids shipping raw PCM. This detector applies the blow policy to such
// readings and produces the same BlowDetection the raw path produces.

use crate::analysis::features::BlowDetection;
use crate::config::IntensityConfig;
use crate::error::GameError;

/// Blow policy for intensity / decibel readings
#[derive(Debug, Clone)]
pub struct IntensityDetector {
    config: IntensityConfig,
}

impl IntensityDetector {
    pub fn new(config: &IntensityConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Decide whether a reading is a blow
    ///
    /// With a metering value the blow must be louder than the dB threshold and
    /// carry a minimum intensity; without one, intensity alone decides.
    ///
    /// # Arguments
    /// * `intensity` - Client-side intensity, clamped to [0, 1]
    /// * `metering_db` - Optional metering level in dB
    ///
    /// # Errors
    /// `GameError::Validation` when either value is NaN.
    pub fn detect(
        &self,
        intensity: f64,
        metering_db: Option<f64>,
    ) -> Result<BlowDetection, GameError> {
        if intensity.is_nan() {
            return Err(GameError::validation("intensity is not a number"));
        }
        if metering_db.is_some_and(f64::is_nan) {
            return Err(GameError::validation("metering level is not a number"));
        }

        let intensity = intensity.clamp(0.0, 1.0);
        let detected = match metering_db {
            Some(db) => db > self.config.db_threshold && intensity >= self.config.db_min_intensity,
            None => intensity >= self.config.blow_threshold,
        };

        Ok(BlowDetection::new(detected, intensity))
    }
}

impl Default for IntensityDetector {
    fn default() -> Self {
        Self::new(&IntensityConfig::default())
    }
}
