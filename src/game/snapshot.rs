// Snapshot records returned by the registry
//
// Plain serializable values copied out of a game while its lock is held; the
// caller can keep or send them without touching the live state again.

use serde::Serialize;

use crate::analysis::AudioMetadata;
use crate::calibration::CalibrationStatus;
use crate::game::{
    BalloonFrame, BalloonStats, BoatFrame, BoatStats, Difficulty, GameId, GameKind, GameStatus,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreatedGame {
    pub game_id: GameId,
    pub game_type: GameKind,
    pub player_name: String,
    pub status: GameStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StartSnapshot {
    pub game_id: GameId,
    pub player_name: String,
    pub game_type: GameKind,
    pub level: u32,
    pub difficulty: Difficulty,
    /// Unix time in milliseconds
    pub started_at_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinalSnapshot {
    pub game_id: GameId,
    pub player_name: String,
    pub game_type: GameKind,
    pub score: u64,
    pub level: u32,
    pub duration_secs: f64,
    pub stats: GameStats,
}

/// Result of one audio or intensity frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameSnapshot {
    pub game_id: GameId,
    pub blow_detected: bool,
    pub blow_intensity: f64,
    pub score: u64,
    pub level: u32,
    #[serde(flatten)]
    pub state: FrameState,
    /// Spectral side-channel, raw-audio frames only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<AudioMetadata>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "game_type", rename_all = "lowercase")]
pub enum FrameState {
    Boat(BoatFrame),
    Balloon(BalloonFrame),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "game_type", rename_all = "lowercase")]
pub enum GameStats {
    Boat(BoatStats),
    Balloon(BalloonStats),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameStatusSnapshot {
    pub game_id: GameId,
    pub player_name: String,
    pub game_type: GameKind,
    pub status: GameStatus,
    pub score: u64,
    pub level: u32,
    pub difficulty: Difficulty,
    pub audio_threshold: f64,
    pub started_at_ms: Option<u64>,
    pub stats: GameStats,
}

/// One line of a game listing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameSummary {
    pub game_id: GameId,
    pub player_name: String,
    pub game_type: GameKind,
    pub status: GameStatus,
    pub score: u64,
    pub level: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegistryStats {
    pub total_games: usize,
    pub running_games: usize,
    pub boat_games: usize,
    pub balloon_games: usize,
    pub events_published: u64,
    pub calibration: CalibrationStatus,
}
