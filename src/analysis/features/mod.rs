// SignalFeatureExtractor - blow detection from raw PCM
//
// This module turns one raw audio buffer into a blow decision, a normalized
// intensity and a spectral metadata side-channel.
//
// Module organization:
// - types: Data structures (BlowDetection, ContinuousBlow, AudioMetadata)
// - temporal: PCM decoding, normalization, DC removal, windowing, RMS, SNR
// - filters: Zero-phase Butterworth blow-band filter chain
// - fft: Magnitude spectrum computation
// - spectral: Dominant frequency, band energies, band magnitude
// - mod.rs: Coordinator (SignalFeatureExtractor)
//
// Detection pipeline:
// 1. Decode 16-bit PCM and normalize to [-1, 1] by peak
// 2. Remove DC offset and apply a Hamming window
// 3. Band-pass 200-800 Hz, high-pass 100 Hz, low-pass 2000 Hz
// 4. RMS of the filtered signal against the adaptive threshold

mod fft;
mod filters;
mod spectral;
pub(crate) mod temporal;
mod types;

pub use types::{AudioMetadata, BlowAnalysis, BlowDetection, ContinuousBlow};

use fft::FftProcessor;
use filters::BlowFilterChain;
use spectral::SpectralFeatures;
use temporal::{compute_rms, decode_pcm16, normalize_peak, preprocess, signal_to_noise_db};

use crate::config::DetectionConfig;
use crate::error::GameError;

/// Longest continuous-blow estimate, reached at full band intensity
const MAX_CONTINUOUS_DURATION_SECS: f64 = 0.5;

/// SignalFeatureExtractor coordinates the blow detection pipeline
///
/// Holds no calibration state of its own: callers pass the current detection
/// threshold, so one extractor can be shared by every game.
pub struct SignalFeatureExtractor {
    sample_rate: u32,
    config: DetectionConfig,
    filters: BlowFilterChain,
    fft_processor: FftProcessor,
    spectral_features: SpectralFeatures,
}

impl SignalFeatureExtractor {
    /// Create an extractor for the configured sample rate
    ///
    /// # Errors
    /// `GameError::Validation` when the filter cutoffs do not fit the sample rate.
    pub fn new(config: &DetectionConfig) -> Result<Self, GameError> {
        let sample_rate = config.sample_rate;
        Ok(Self {
            sample_rate,
            config: config.clone(),
            filters: BlowFilterChain::new(sample_rate, config)?,
            fft_processor: FftProcessor::new(),
            spectral_features: SpectralFeatures::new(sample_rate),
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Detect a blow in a raw PCM buffer
    ///
    /// # Arguments
    /// * `buffer` - Little-endian signed 16-bit mono PCM
    /// * `threshold` - RMS level a blow must exceed (from calibration)
    ///
    /// # Returns
    /// Detection, continuous-blow estimate and metadata. Silent buffers are not
    /// errors: their RMS is zero and no blow is detected.
    ///
    /// # Errors
    /// `GameError::Validation` for a malformed payload.
    pub fn detect_blow(&self, buffer: &[u8], threshold: f64) -> Result<BlowAnalysis, GameError> {
        let raw = decode_pcm16(buffer)?;
        let normalized = normalize_peak(&raw);

        let mut processed = normalized.clone();
        preprocess(&mut processed);
        let filtered = self.filters.apply(&processed);

        let rms = compute_rms(&filtered);
        let detection = classify_rms(rms, threshold);
        let metadata = self.compute_metadata(&normalized, &filtered, rms, threshold);
        let continuous = self.analyze_continuous_blow(&raw);

        log::trace!(
            "[FeatureExtractor] samples={} rms={:.5} threshold={:.5} detected={}",
            raw.len(),
            rms,
            threshold,
            detection.detected
        );

        Ok(BlowAnalysis {
            detection,
            continuous,
            metadata,
        })
    }

    /// Estimate a continuous blow from band-limited spectral magnitude
    ///
    /// Works on raw (integer-scale) samples: the mean magnitude of the
    /// continuous band is divided by a fixed normalizer and capped at 1.
    pub fn analyze_continuous_blow(&self, raw: &[f32]) -> ContinuousBlow {
        let spectrum = self.fft_processor.compute_magnitude_spectrum(raw);
        let band_magnitude = self
            .spectral_features
            .band_mean_magnitude(
                &spectrum,
                raw.len(),
                self.config.continuous_band_low_hz,
                self.config.continuous_band_high_hz,
            )
            .unwrap_or(0.0);

        let intensity = if self.config.continuous_normalizer > 0.0 {
            ((band_magnitude / self.config.continuous_normalizer) as f64).min(1.0)
        } else {
            0.0
        };

        ContinuousBlow {
            detected: intensity > self.config.continuous_threshold,
            intensity,
            duration_secs: intensity * MAX_CONTINUOUS_DURATION_SECS,
        }
    }

    fn compute_metadata(
        &self,
        normalized: &[f32],
        filtered: &[f32],
        rms: f64,
        threshold: f64,
    ) -> AudioMetadata {
        let spectrum = self.fft_processor.compute_magnitude_spectrum(filtered);
        let fft_len = filtered.len();
        let energies = self.spectral_features.band_energies(
            &spectrum,
            fft_len,
            self.config.blow_band_low_hz,
            self.config.blow_band_high_hz,
        );

        AudioMetadata {
            dominant_frequency: self.spectral_features.dominant_frequency(&spectrum, fft_len) as f64,
            low_frequency_energy: energies.low,
            mid_frequency_energy: energies.mid,
            high_frequency_energy: energies.high,
            total_energy: energies.total(),
            snr_db: signal_to_noise_db(normalized, filtered),
            rms,
            threshold,
        }
    }
}

/// Ambient RMS of one calibration buffer
///
/// Same decoding, normalization, DC removal and windowing as detection, without
/// the blow-band filters.
///
/// # Errors
/// `GameError::Validation` for a malformed payload.
pub fn ambient_rms(buffer: &[u8]) -> Result<f64, GameError> {
    let raw = decode_pcm16(buffer)?;
    let mut processed = normalize_peak(&raw);
    preprocess(&mut processed);
    Ok(compute_rms(&processed))
}

/// Compare an RMS level against the detection threshold
///
/// A zero threshold (calibrated against pure silence) treats any energy as a
/// full-intensity blow.
fn classify_rms(rms: f64, threshold: f64) -> BlowDetection {
    let intensity = if threshold > 0.0 {
        (rms / threshold).min(1.0)
    } else if rms > 0.0 {
        1.0
    } else {
        0.0
    };
    BlowDetection::new(rms > threshold, intensity)
}
