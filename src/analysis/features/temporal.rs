// Temporal module - Time-domain preprocessing and energy
//
// This module turns a raw PCM payload into the normalized, DC-free, windowed
// signal both detection and noise calibration work on, and computes RMS and
// signal-to-noise energy measures on time-domain buffers.

use crate::error::GameError;

/// Decode little-endian signed 16-bit PCM into raw sample values
///
/// Values keep their integer scale (-32768..=32767).
///
/// # Errors
/// `GameError::Validation` for an empty payload or an odd byte count.
pub fn decode_pcm16(bytes: &[u8]) -> Result<Vec<f32>, GameError> {
    if bytes.is_empty() {
        return Err(GameError::validation("malformed audio payload: empty buffer"));
    }
    if bytes.len() % 2 != 0 {
        return Err(GameError::validation(format!(
            "malformed audio payload: {} bytes is not a whole number of 16-bit samples",
            bytes.len()
        )));
    }

    Ok(bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]) as f32)
        .collect())
}

/// Scale samples into [-1, 1] by their peak magnitude
///
/// A silent buffer (peak zero) is divided by one instead.
pub fn normalize_peak(samples: &[f32]) -> Vec<f32> {
    let peak = samples.iter().fold(0.0f32, |acc, &x| acc.max(x.abs()));
    let scale = if peak > 0.0 { peak } else { 1.0 };
    samples.iter().map(|&x| x / scale).collect()
}

/// Subtract the mean so the buffer has no DC offset
pub fn remove_dc(samples: &mut [f32]) {
    if samples.is_empty() {
        return;
    }
    let mean = samples.iter().map(|&x| x as f64).sum::<f64>() / samples.len() as f64;
    for sample in samples.iter_mut() {
        *sample -= mean as f32;
    }
}

/// Symmetric Hamming window of the given length
pub fn hamming_window(len: usize) -> Vec<f32> {
    match len {
        0 => Vec::new(),
        1 => vec![1.0],
        _ => (0..len)
            .map(|i| {
                0.54 - 0.46 * ((2.0 * std::f32::consts::PI * i as f32) / (len as f32 - 1.0)).cos()
            })
            .collect(),
    }
}

/// DC removal followed by Hamming windowing to reduce spectral leakage
pub fn preprocess(samples: &mut [f32]) {
    remove_dc(samples);
    let window = hamming_window(samples.len());
    for (sample, w) in samples.iter_mut().zip(window) {
        *sample *= w;
    }
}

/// Root-mean-square energy (0.0 for an empty buffer)
pub fn compute_rms(samples: &[f32]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_squares: f64 = samples.iter().map(|&x| (x as f64) * (x as f64)).sum();
    (sum_squares / samples.len() as f64).sqrt()
}

/// Signal-to-noise ratio in dB between a filtered signal and what it removed
///
/// Noise is `original - filtered`. Returns `+inf` when the noise power is
/// exactly zero.
pub fn signal_to_noise_db(original: &[f32], filtered: &[f32]) -> f64 {
    let len = original.len().min(filtered.len());
    if len == 0 {
        return f64::INFINITY;
    }

    let signal_power: f64 = filtered[..len]
        .iter()
        .map(|&x| (x as f64) * (x as f64))
        .sum::<f64>()
        / len as f64;
    let noise_power: f64 = original[..len]
        .iter()
        .zip(&filtered[..len])
        .map(|(&o, &f)| {
            let residual = (o - f) as f64;
            residual * residual
        })
        .sum::<f64>()
        / len as f64;

    if noise_power == 0.0 {
        return f64::INFINITY;
    }
    10.0 * (signal_power / noise_power).log10()
}
