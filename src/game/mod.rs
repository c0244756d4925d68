// Game module - breathing game state machines
//
// Every game shares one lifecycle (Created -> Running -> Ended), a score, a
// level and a difficulty; the variant-specific physics live in `boat` and
// `balloon`. GameState is the only type the registry talks to: it checks the
// lifecycle, hands detections to the variant and assembles snapshots.

pub mod balloon;
pub mod boat;
pub mod snapshot;

pub use balloon::{BalloonFrame, BalloonGameState, BalloonStats};
pub use boat::{BoatFrame, BoatGameState, BoatStats};
pub use snapshot::{
    CreatedGame, FinalSnapshot, FrameSnapshot, FrameState, GameStats, GameStatusSnapshot,
    GameSummary, RegistryStats, StartSnapshot,
};

use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::analysis::{BlowAnalysis, BlowDetection};
use crate::config::AppConfig;
use crate::error::GameError;

/// Threshold before any calibration or difficulty change
const INITIAL_AUDIO_THRESHOLD: f64 = 0.5;

/// Calibrated per-game threshold = ambient baseline * this margin
const CALIBRATION_MARGIN: f64 = 1.5;

const DEFAULT_PLAYER_NAME: &str = "Player";

/// Game variants a registry can create
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameKind {
    Boat,
    Balloon,
}

impl GameKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameKind::Boat => "boat",
            GameKind::Balloon => "balloon",
        }
    }
}

impl fmt::Display for GameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GameKind {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "boat" => Ok(GameKind::Boat),
            "balloon" => Ok(GameKind::Balloon),
            other => Err(GameError::validation(format!(
                "unknown game type '{}', expected boat or balloon",
                other
            ))),
        }
    }
}

/// Difficulty setting, mutable in any lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[default]
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// Factor applied to the game's audio threshold on every difficulty change
    pub fn threshold_multiplier(&self) -> f64 {
        match self {
            Difficulty::Easy => 0.7,
            Difficulty::Medium => 1.0,
            Difficulty::Hard => 1.5,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(GameError::validation(format!(
                "unknown difficulty '{}', expected easy, medium or hard",
                other
            ))),
        }
    }
}

/// Lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    Created,
    Running,
    Ended,
}

/// Opaque game identifier, never reused within a process
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameId(String);

impl GameId {
    pub(crate) fn generate(kind: GameKind, sequence: u64) -> Self {
        GameId(format!("{}_{}_{}", kind, sequence, unix_millis()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for GameId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Score and level shared by every variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub score: u64,
    pub level: u32,
}

impl Progress {
    fn new() -> Self {
        Self { score: 0, level: 1 }
    }

    pub fn award(&mut self, points: u64) {
        self.score = self.score.saturating_add(points);
    }

    /// Subtract points, flooring the score at zero
    pub fn penalize(&mut self, points: u64) {
        self.score = self.score.saturating_sub(points);
    }
}

/// Variant-specific continuous state
#[derive(Debug, Clone)]
enum GameVariant {
    Boat(BoatGameState),
    Balloon(BalloonGameState),
}

/// One live game: shared lifecycle plus its variant
#[derive(Debug, Clone)]
pub struct GameState {
    id: GameId,
    sequence: u64,
    player_name: String,
    kind: GameKind,
    status: GameStatus,
    progress: Progress,
    difficulty: Difficulty,
    audio_threshold: f64,
    started: Option<Instant>,
    started_at_ms: Option<u64>,
    variant: GameVariant,
}

impl GameState {
    /// Create a game in the Created state
    ///
    /// # Arguments
    /// * `id` - Identifier assigned by the registry
    /// * `sequence` - Creation order, used for stable listings
    /// * `kind` - Variant to build
    /// * `player_name` - Display name; blank names become "Player"
    /// * `config` - Physics tuning for the variant
    pub fn new(
        id: GameId,
        sequence: u64,
        kind: GameKind,
        player_name: &str,
        config: &AppConfig,
    ) -> Self {
        let player_name = match player_name.trim() {
            "" => DEFAULT_PLAYER_NAME.to_string(),
            name => name.to_string(),
        };
        let variant = match kind {
            GameKind::Boat => GameVariant::Boat(BoatGameState::new(&config.boat)),
            GameKind::Balloon => GameVariant::Balloon(BalloonGameState::new(&config.balloon)),
        };

        Self {
            id,
            sequence,
            player_name,
            kind,
            status: GameStatus::Created,
            progress: Progress::new(),
            difficulty: Difficulty::default(),
            audio_threshold: INITIAL_AUDIO_THRESHOLD,
            started: None,
            started_at_ms: None,
            variant,
        }
    }

    pub fn id(&self) -> &GameId {
        &self.id
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn player_name(&self) -> &str {
        &self.player_name
    }

    pub fn kind(&self) -> GameKind {
        self.kind
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn score(&self) -> u64 {
        self.progress.score
    }

    pub fn level(&self) -> u32 {
        self.progress.level
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn audio_threshold(&self) -> f64 {
        self.audio_threshold
    }

    pub fn is_running(&self) -> bool {
        self.status == GameStatus::Running
    }

    /// Created -> Running
    ///
    /// Resets the score and the variant's continuous state.
    pub fn start(&mut self) -> Result<StartSnapshot, GameError> {
        if self.status != GameStatus::Created {
            return Err(self.invalid_state("start"));
        }

        self.status = GameStatus::Running;
        self.progress.score = 0;
        self.started = Some(Instant::now());
        let started_at_ms = unix_millis();
        self.started_at_ms = Some(started_at_ms);

        match &mut self.variant {
            GameVariant::Boat(boat) => boat.reset(),
            GameVariant::Balloon(balloon) => balloon.reset(),
        }

        log::info!(
            "[GameState] Game {} started for {}",
            self.id,
            self.player_name
        );

        Ok(StartSnapshot {
            game_id: self.id.clone(),
            player_name: self.player_name.clone(),
            game_type: self.kind,
            level: self.progress.level,
            difficulty: self.difficulty,
            started_at_ms,
        })
    }

    /// Running -> Ended
    pub fn end(&mut self) -> Result<FinalSnapshot, GameError> {
        if self.status != GameStatus::Running {
            return Err(self.invalid_state("end"));
        }

        self.status = GameStatus::Ended;
        let duration_secs = self
            .started
            .map(|started| started.elapsed().as_secs_f64())
            .unwrap_or(0.0);

        match &self.variant {
            GameVariant::Boat(boat) => boat.log_summary(),
            GameVariant::Balloon(balloon) => balloon.log_summary(),
        }

        log::info!(
            "[GameState] Game {} ended. Score: {}, duration: {:.1}s",
            self.id,
            self.progress.score,
            duration_secs
        );

        Ok(FinalSnapshot {
            game_id: self.id.clone(),
            player_name: self.player_name.clone(),
            game_type: self.kind,
            score: self.progress.score,
            level: self.progress.level,
            duration_secs,
            stats: self.stats(),
        })
    }

    /// Fail with InvalidState unless the game is Running
    pub fn ensure_running(&self, operation: &'static str) -> Result<(), GameError> {
        if self.is_running() {
            Ok(())
        } else {
            Err(self.invalid_state(operation))
        }
    }

    /// Apply one analyzed raw-audio frame
    ///
    /// The boat follows the RMS detection; the balloon follows the
    /// band-limited continuous-blow estimate.
    pub fn process_audio(&mut self, analysis: &BlowAnalysis) -> Result<FrameSnapshot, GameError> {
        self.ensure_running("process audio for")?;

        let difficulty = self.difficulty;
        let (detection, state) = match &mut self.variant {
            GameVariant::Boat(boat) => {
                let frame = boat.advance(analysis.detection, difficulty, &mut self.progress);
                (analysis.detection, FrameState::Boat(frame))
            }
            GameVariant::Balloon(balloon) => {
                let blow = analysis.continuous;
                let frame = balloon.advance_audio(blow, difficulty, &mut self.progress);
                (
                    BlowDetection::new(blow.detected, blow.intensity),
                    FrameState::Balloon(frame),
                )
            }
        };

        Ok(self.frame_snapshot(detection, state, Some(analysis.metadata)))
    }

    /// Apply one precomputed intensity reading
    pub fn process_intensity(
        &mut self,
        detection: BlowDetection,
    ) -> Result<FrameSnapshot, GameError> {
        self.ensure_running("process intensity for")?;

        let difficulty = self.difficulty;
        let state = match &mut self.variant {
            GameVariant::Boat(boat) => {
                FrameState::Boat(boat.advance(detection, difficulty, &mut self.progress))
            }
            GameVariant::Balloon(balloon) => {
                FrameState::Balloon(balloon.advance_intensity(detection, &mut self.progress))
            }
        };

        Ok(self.frame_snapshot(detection, state, None))
    }

    /// Change difficulty and rescale the audio threshold
    ///
    /// The multiplier compounds across calls: Hard twice is 1.5 * 1.5.
    pub fn set_difficulty(&mut self, difficulty: Difficulty) {
        self.difficulty = difficulty;
        self.audio_threshold *= difficulty.threshold_multiplier();
        log::debug!(
            "[GameState] Game {} difficulty={} threshold={:.4}",
            self.id,
            difficulty,
            self.audio_threshold
        );
    }

    /// Replace the audio threshold from an ambient baseline
    pub fn calibrate_threshold(&mut self, baseline_level: f64) {
        self.audio_threshold = baseline_level * CALIBRATION_MARGIN;
        log::info!(
            "[GameState] Game {} threshold calibrated to {:.5}",
            self.id,
            self.audio_threshold
        );
    }

    /// Variant statistics (pure read)
    pub fn stats(&self) -> GameStats {
        match &self.variant {
            GameVariant::Boat(boat) => GameStats::Boat(boat.stats()),
            GameVariant::Balloon(balloon) => GameStats::Balloon(balloon.stats()),
        }
    }

    pub fn status_snapshot(&self) -> GameStatusSnapshot {
        GameStatusSnapshot {
            game_id: self.id.clone(),
            player_name: self.player_name.clone(),
            game_type: self.kind,
            status: self.status,
            score: self.progress.score,
            level: self.progress.level,
            difficulty: self.difficulty,
            audio_threshold: self.audio_threshold,
            started_at_ms: self.started_at_ms,
            stats: self.stats(),
        }
    }

    pub fn summary(&self) -> GameSummary {
        GameSummary {
            game_id: self.id.clone(),
            player_name: self.player_name.clone(),
            game_type: self.kind,
            status: self.status,
            score: self.progress.score,
            level: self.progress.level,
        }
    }

    fn frame_snapshot(
        &self,
        detection: BlowDetection,
        state: FrameState,
        metadata: Option<crate::analysis::AudioMetadata>,
    ) -> FrameSnapshot {
        FrameSnapshot {
            game_id: self.id.clone(),
            blow_detected: detection.detected,
            blow_intensity: detection.intensity,
            score: self.progress.score,
            level: self.progress.level,
            state,
            metadata,
        }
    }

    fn invalid_state(&self, operation: &'static str) -> GameError {
        GameError::InvalidState {
            game_id: self.id.to_string(),
            status: self.status,
            operation,
        }
    }
}

fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or(0)
}
