// Spectral module - Frequency-domain measurements
//
// This module computes spectral measures from one-sided magnitude spectra
// produced by FftProcessor. Bin `i` of a spectrum computed from `fft_len`
// samples sits at `i * sample_rate / fft_len` Hz.

/// Energy split around the blow band
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandEnergies {
    pub low: f64,
    pub mid: f64,
    pub high: f64,
}

impl BandEnergies {
    pub fn total(&self) -> f64 {
        self.low + self.mid + self.high
    }
}

/// Spectral feature computation functions
pub struct SpectralFeatures {
    sample_rate: u32,
}

impl SpectralFeatures {
    /// Create a new spectral features processor
    ///
    /// # Arguments
    /// * `sample_rate` - Audio sample rate in Hz
    pub fn new(sample_rate: u32) -> Self {
        Self { sample_rate }
    }

    fn bin_frequency(&self, bin: usize, fft_len: usize) -> f32 {
        bin as f32 * self.sample_rate as f32 / fft_len as f32
    }

    /// Frequency of the strongest bin, 0 Hz for a silent spectrum
    pub fn dominant_frequency(&self, spectrum: &[f32], fft_len: usize) -> f32 {
        let peak = spectrum
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.total_cmp(b));

        match peak {
            Some((bin, &mag)) if mag > 1e-10 => self.bin_frequency(bin, fft_len),
            _ => 0.0,
        }
    }

    /// Squared-magnitude energy below, inside and above `[low_hz, high_hz]`
    pub fn band_energies(
        &self,
        spectrum: &[f32],
        fft_len: usize,
        low_hz: f32,
        high_hz: f32,
    ) -> BandEnergies {
        let mut energies = BandEnergies {
            low: 0.0,
            mid: 0.0,
            high: 0.0,
        };

        for (bin, &mag) in spectrum.iter().enumerate() {
            let freq = self.bin_frequency(bin, fft_len);
            let energy = (mag as f64) * (mag as f64);
            if freq < low_hz {
                energies.low += energy;
            } else if freq <= high_hz {
                energies.mid += energy;
            } else {
                energies.high += energy;
            }
        }

        energies
    }

    /// Mean magnitude of the bins within `[low_hz, high_hz]`
    ///
    /// # Returns
    /// `None` when no bin falls inside the band (very short buffers)
    pub fn band_mean_magnitude(
        &self,
        spectrum: &[f32],
        fft_len: usize,
        low_hz: f32,
        high_hz: f32,
    ) -> Option<f32> {
        let (sum, count) = spectrum
            .iter()
            .enumerate()
            .filter(|(bin, _)| {
                let freq = self.bin_frequency(*bin, fft_len);
                freq >= low_hz && freq <= high_hz
            })
            .fold((0.0f64, 0usize), |(sum, count), (_, &mag)| {
                (sum + mag as f64, count + 1)
            });

        if count == 0 {
            None
        } else {
            Some((sum / count as f64) as f32)
        }
    }
}
