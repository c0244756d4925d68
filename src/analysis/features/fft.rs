// FFT module - Fast Fourier Transform computation
//
// This module computes one-sided magnitude spectra for buffers of arbitrary
// length. Windowing happens upstream in preprocessing, so the spectrum here is
// taken over the samples exactly as given.

use rustfft::{num_complex::Complex, FftPlanner};
use std::sync::Mutex;

/// FFT processor that computes magnitude spectra from audio buffers
pub struct FftProcessor {
    fft_planner: Mutex<FftPlanner<f32>>,
}

impl FftProcessor {
    pub fn new() -> Self {
        Self {
            fft_planner: Mutex::new(FftPlanner::new()),
        }
    }

    /// Compute the magnitude spectrum of a buffer
    ///
    /// Returns magnitudes for the non-negative frequencies only (exploiting
    /// symmetry of real-valued FFT). Bin `i` sits at `i * sample_rate / len`.
    ///
    /// # Arguments
    /// * `audio` - Time-domain samples (any length)
    ///
    /// # Returns
    /// Magnitude spectrum (size = len / 2 + 1), empty for an empty buffer
    pub fn compute_magnitude_spectrum(&self, audio: &[f32]) -> Vec<f32> {
        if audio.is_empty() {
            return Vec::new();
        }

        let mut buffer: Vec<Complex<f32>> =
            audio.iter().map(|&sample| Complex::new(sample, 0.0)).collect();

        let fft = {
            // The planner only caches plans, so a poisoned lock is still usable.
            let mut planner = self
                .fft_planner
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            planner.plan_fft_forward(audio.len())
        };
        fft.process(&mut buffer);

        buffer[..audio.len() / 2 + 1]
            .iter()
            .map(|c| c.norm())
            .collect()
    }
}

impl Default for FftProcessor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spectrum_length_is_one_sided() {
        let processor = FftProcessor::new();
        assert_eq!(processor.compute_magnitude_spectrum(&[0.0; 1000]).len(), 501);
        assert_eq!(processor.compute_magnitude_spectrum(&[0.0; 7]).len(), 4);
        assert!(processor.compute_magnitude_spectrum(&[]).is_empty());
    }

    #[test]
    fn test_sine_peaks_at_its_bin() {
        let processor = FftProcessor::new();
        let len = 1000;
        // 25 whole cycles over the buffer lands exactly on bin 25
        let signal: Vec<f32> = (0..len)
            .map(|i| (2.0 * std::f32::consts::PI * 25.0 * i as f32 / len as f32).sin())
            .collect();
        let spectrum = processor.compute_magnitude_spectrum(&signal);

        let (peak_bin, _) = spectrum
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.total_cmp(b))
            .unwrap();
        assert_eq!(peak_bin, 25);
        assert!((spectrum[25] - len as f32 / 2.0).abs() < 1.0);
    }
}
