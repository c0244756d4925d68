//! Deterministic audio sources for tests and the simulation CLI.
//!
//! Nothing here touches audio hardware: synthetic signals are generated from
//! closed-form expressions or a seeded RNG, and recorded sessions come from WAV
//! files on disk.

pub mod signals;
pub mod wav;
