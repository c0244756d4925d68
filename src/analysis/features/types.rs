// Types module - Data structures for blow detection
//
// This module defines the detection results handed to the game state machines.
// Both ingestion paths (raw PCM and precomputed intensity) produce the same
// BlowDetection shape so game logic never depends on which path ran.

use serde::{Deserialize, Serialize};

/// Outcome of blow detection for one frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlowDetection {
    /// Whether the frame counts as a blow
    pub detected: bool,

    /// Blow intensity (0.0 to 1.0)
    pub intensity: f64,
}

impl BlowDetection {
    pub fn new(detected: bool, intensity: f64) -> Self {
        Self {
            detected,
            intensity: intensity.clamp(0.0, 1.0),
        }
    }

    /// A frame with no blow and no energy
    pub fn silent() -> Self {
        Self::new(false, 0.0)
    }
}

/// Continuous-blow estimate from band-limited spectral magnitude
///
/// Used by the balloon game when it is driven by raw audio.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContinuousBlow {
    pub detected: bool,

    /// Normalized band magnitude (0.0 to 1.0)
    pub intensity: f64,

    /// Estimated blow duration in seconds (0.0 to 0.5)
    pub duration_secs: f64,
}

/// Spectral side-channel computed alongside detection
///
/// Informational only: game state never reads these values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AudioMetadata {
    /// Peak of the filtered magnitude spectrum in Hz
    pub dominant_frequency: f64,

    /// Spectral energy below the blow band
    pub low_frequency_energy: f64,

    /// Spectral energy inside the blow band
    pub mid_frequency_energy: f64,

    /// Spectral energy above the blow band
    pub high_frequency_energy: f64,

    pub total_energy: f64,

    /// Filtered-vs-residual power ratio in dB (+inf when the residual is silent)
    pub snr_db: f64,

    /// RMS of the filtered signal
    pub rms: f64,

    /// Threshold the RMS was compared against
    pub threshold: f64,
}

/// Everything the extractor derives from one raw buffer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlowAnalysis {
    pub detection: BlowDetection,
    pub continuous: ContinuousBlow,
    pub metadata: AudioMetadata,
}
