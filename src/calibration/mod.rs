// Calibration module - ambient noise baseline for adaptive thresholds
//
// This module provides two components:
// 1. CalibrationState: the baseline noise level and the threshold derived from it
// 2. NoiseCalibrator: turns a set of ambient-noise buffers into a new state
//
// The calibration workflow:
// 1. Client records a few buffers of silence / room noise
// 2. NoiseCalibrator averages their RMS into a baseline
// 3. The new state replaces the previous one wholesale

pub mod procedure;
pub mod state;

pub use procedure::NoiseCalibrator;
pub use state::{CalibrationState, CalibrationStatus};
