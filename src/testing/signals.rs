//! Synthetic PCM generators.

use rand::{rngs::StdRng, Rng, SeedableRng};
use std::f32::consts::PI;

/// Pure tone in `[-amplitude, amplitude]`
pub fn sine_wave(sample_rate: u32, freq_hz: f32, len: usize, amplitude: f32) -> Vec<f32> {
    (0..len)
        .map(|n| (2.0 * PI * freq_hz * n as f32 / sample_rate as f32).sin() * amplitude)
        .collect()
}

/// Uniform white noise, reproducible for a given seed
pub fn white_noise(len: usize, amplitude: f32, seed: u64) -> Vec<f32> {
    if amplitude <= 0.0 {
        return vec![0.0; len];
    }
    let mut rng = StdRng::seed_from_u64(seed);
    (0..len)
        .map(|_| rng.gen_range(-amplitude..amplitude))
        .collect()
}

/// Encode float samples as little-endian signed 16-bit PCM
///
/// Samples are clamped to [-1, 1] before scaling.
pub fn to_pcm16_bytes(samples: &[f32]) -> Vec<u8> {
    samples
        .iter()
        .flat_map(|&x| ((x.clamp(-1.0, 1.0) * i16::MAX as f32) as i16).to_le_bytes())
        .collect()
}

/// `len` samples of digital silence as PCM bytes
pub fn silence_bytes(len: usize) -> Vec<u8> {
    vec![0u8; len * 2]
}
