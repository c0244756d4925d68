// Analysis module - blow detection for both ingestion paths
//
// Raw PCM buffers go through the SignalFeatureExtractor (normalization,
// filtering, RMS against an adaptive threshold); precomputed client readings go
// through the IntensityDetector. Both yield a BlowDetection, which is all the
// game state machines ever see.

pub mod features;
pub mod intensity;

pub use features::{
    ambient_rms, AudioMetadata, BlowAnalysis, BlowDetection, ContinuousBlow,
    SignalFeatureExtractor,
};
pub use intensity::IntensityDetector;
