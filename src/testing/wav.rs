//! WAV file loading and writing for recorded sessions.

use std::path::Path;

use crate::error::GameError;

/// Mono 16-bit PCM recording
#[derive(Debug, Clone, PartialEq)]
pub struct Recording {
    pub sample_rate: u32,
    pub samples: Vec<i16>,
}

impl Recording {
    /// Split the recording into little-endian PCM frames of `frame_len` samples
    ///
    /// The trailing partial frame is kept when it holds at least one sample.
    pub fn pcm_frames(&self, frame_len: usize) -> Vec<Vec<u8>> {
        let frame_len = frame_len.max(1);
        self.samples
            .chunks(frame_len)
            .map(|chunk| chunk.iter().flat_map(|s| s.to_le_bytes()).collect())
            .collect()
    }
}

/// Load a WAV file as mono 16-bit PCM
///
/// Float and wider integer formats are converted; multi-channel input is
/// averaged down to mono.
///
/// # Errors
/// `GameError::Validation` when the file cannot be opened or decoded.
pub fn read_recording(path: &Path) -> Result<Recording, GameError> {
    let mut reader = hound::WavReader::open(path).map_err(|err| {
        GameError::validation(format!("failed to open {}: {err}", path.display()))
    })?;
    let spec = reader.spec();
    if spec.channels == 0 {
        return Err(GameError::validation(format!(
            "{} has zero channels",
            path.display()
        )));
    }

    let read_err =
        |err: hound::Error| GameError::validation(format!("error reading {}: {err}", path.display()));

    let samples: Vec<f32> = match (spec.sample_format, spec.bits_per_sample) {
        (hound::SampleFormat::Float, _) => reader
            .samples::<f32>()
            .map(|s| s.map_err(read_err))
            .collect::<Result<_, _>>()?,
        (hound::SampleFormat::Int, 16) => reader
            .samples::<i16>()
            .map(|s| s.map(|v| v as f32 / i16::MAX as f32).map_err(read_err))
            .collect::<Result<_, _>>()?,
        (hound::SampleFormat::Int, 24) => reader
            .samples::<i32>()
            .map(|s| s.map(|v| v as f32 / 8_388_607.0).map_err(read_err))
            .collect::<Result<_, _>>()?,
        (hound::SampleFormat::Int, 32) => reader
            .samples::<i32>()
            .map(|s| s.map(|v| v as f32 / i32::MAX as f32).map_err(read_err))
            .collect::<Result<_, _>>()?,
        (_, bits) => {
            return Err(GameError::validation(format!(
                "unsupported bits_per_sample={} for {}",
                bits,
                path.display()
            )))
        }
    };

    let channels = spec.channels as usize;
    let samples = samples
        .chunks(channels)
        .map(|chunk| {
            let mono = chunk.iter().sum::<f32>() / chunk.len() as f32;
            (mono.clamp(-1.0, 1.0) * i16::MAX as f32) as i16
        })
        .collect();

    Ok(Recording {
        sample_rate: spec.sample_rate,
        samples,
    })
}

/// Write float samples as a mono 16-bit WAV file
///
/// # Errors
/// `GameError::Validation` when the file cannot be written.
pub fn write_recording(path: &Path, sample_rate: u32, samples: &[f32]) -> Result<(), GameError> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let write_err =
        |err: hound::Error| GameError::validation(format!("error writing {}: {err}", path.display()));

    let mut writer = hound::WavWriter::create(path, spec).map_err(write_err)?;
    for &sample in samples {
        writer
            .write_sample((sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)
            .map_err(write_err)?;
    }
    writer.finalize().map_err(write_err)
}
