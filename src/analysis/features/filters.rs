// Filters module - Blow band filtering
//
// Butterworth biquad sections isolate the human-blow band: an 8-pole band-pass
// (4th-order Butterworth prototype per edge) over the blow band, followed by a
// wider 2nd-order high-pass and low-pass. Every section runs forward and then
// backward over the buffer so the result has no phase shift.
//
// The band-pass sections are designed from the analog prototype: Butterworth
// poles, low-pass to band-pass transform, then a prewarped bilinear transform
// into one biquad per conjugate pole pair.

use std::f64::consts::PI;

use biquad::{Biquad, Coefficients, DirectForm2Transposed, ToHertz, Type, Q_BUTTERWORTH_F64};
use rustfft::num_complex::Complex;

use crate::config::DetectionConfig;
use crate::error::GameError;

/// Butterworth prototype order for each edge of the blow band
const BAND_PASS_ORDER: usize = 4;

/// Ordered chain of zero-phase Butterworth sections
pub struct BlowFilterChain {
    sections: Vec<Coefficients<f64>>,
}

impl BlowFilterChain {
    /// Build the chain for a sample rate
    ///
    /// # Errors
    /// `GameError::Validation` when a cutoff does not fit below Nyquist or the
    /// band edges are out of order.
    pub fn new(sample_rate: u32, config: &DetectionConfig) -> Result<Self, GameError> {
        let fs = sample_rate as f64;
        let nyquist = fs / 2.0;

        let cutoffs = [
            ("band low edge", config.blow_band_low_hz),
            ("band high edge", config.blow_band_high_hz),
            ("high-pass", config.high_pass_hz),
            ("low-pass", config.low_pass_hz),
        ];
        for (label, cutoff) in cutoffs {
            let cutoff = cutoff as f64;
            if !(cutoff > 0.0 && cutoff < nyquist) {
                return Err(GameError::validation(format!(
                    "{} cutoff {} Hz does not fit a {} Hz sample rate",
                    label, cutoff, sample_rate
                )));
            }
        }
        if config.blow_band_low_hz >= config.blow_band_high_hz {
            return Err(GameError::validation(format!(
                "blow band {}-{} Hz is empty",
                config.blow_band_low_hz, config.blow_band_high_hz
            )));
        }

        let mut sections = butterworth_band_pass(
            fs,
            config.blow_band_low_hz as f64,
            config.blow_band_high_hz as f64,
            BAND_PASS_ORDER,
        );
        sections.push(second_order_section(
            fs,
            Type::HighPass,
            "high-pass",
            config.high_pass_hz,
        )?);
        sections.push(second_order_section(
            fs,
            Type::LowPass,
            "low-pass",
            config.low_pass_hz,
        )?);

        Ok(Self { sections })
    }

    /// Run every section over the signal, returning the filtered copy
    pub fn apply(&self, signal: &[f32]) -> Vec<f32> {
        let mut work: Vec<f64> = signal.iter().map(|&x| x as f64).collect();
        for coefficients in &self.sections {
            filter_zero_phase(&mut work, *coefficients);
        }
        work.into_iter().map(|x| x as f32).collect()
    }
}

fn second_order_section(
    fs: f64,
    filter: Type<f64>,
    label: &str,
    cutoff: f32,
) -> Result<Coefficients<f64>, GameError> {
    Coefficients::<f64>::from_params(filter, fs.hz(), (cutoff as f64).hz(), Q_BUTTERWORTH_F64)
        .map_err(|err| {
            GameError::validation(format!(
                "cannot build {} section at {} Hz: {:?}",
                label, cutoff, err
            ))
        })
}

/// Digital Butterworth band-pass as `order` biquad sections (2 × order poles)
///
/// Edges are prewarped so the -3 dB points land on `low_hz` and `high_hz`.
fn butterworth_band_pass(
    fs: f64,
    low_hz: f64,
    high_hz: f64,
    order: usize,
) -> Vec<Coefficients<f64>> {
    let k = 2.0 * fs;
    let low = k * (PI * low_hz / fs).tan();
    let high = k * (PI * high_hz / fs).tan();
    let bandwidth = high - low;
    let center_sq = low * high;

    let mut sections = Vec::with_capacity(order);
    // Upper half-plane prototype poles; each yields two band-pass pole pairs
    for i in 0..order / 2 {
        let angle = PI * (2 * i + order + 1) as f64 / (2 * order) as f64;
        let prototype = Complex::new(angle.cos(), angle.sin());

        let half = prototype * (bandwidth / 2.0);
        let root = (half * half - center_sq).sqrt();
        for pole in [half + root, half - root] {
            sections.push(bilinear_band_section(k, bandwidth, pole));
        }
    }
    sections
}

/// Bilinear transform of `B s / ((s - p)(s - p*))`
fn bilinear_band_section(k: f64, bandwidth: f64, pole: Complex<f64>) -> Coefficients<f64> {
    let a1 = -2.0 * pole.re;
    let a0 = pole.norm_sqr();
    let k_sq = k * k;
    let norm = k_sq + a1 * k + a0;

    Coefficients {
        a1: (2.0 * a0 - 2.0 * k_sq) / norm,
        a2: (k_sq - a1 * k + a0) / norm,
        b0: bandwidth * k / norm,
        b1: 0.0,
        b2: -bandwidth * k / norm,
    }
}

/// Forward-backward pass through one biquad section
fn filter_zero_phase(buffer: &mut [f64], coefficients: Coefficients<f64>) {
    let mut forward = DirectForm2Transposed::<f64>::new(coefficients);
    for sample in buffer.iter_mut() {
        *sample = forward.run(*sample);
    }

    let mut backward = DirectForm2Transposed::<f64>::new(coefficients);
    for sample in buffer.iter_mut().rev() {
        *sample = backward.run(*sample);
    }
}
