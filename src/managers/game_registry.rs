// GameRegistry: Owner of every live game
//
// Single Responsibility: Game lookup, lifecycle dispatch and calibration fan-out
// The id map lock is only held to look up, insert or remove; each game has its
// own mutex, so events for one game are serialized while different games run
// independently. Lock order is always map, then game.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tokio::sync::broadcast;

use crate::analysis::{IntensityDetector, SignalFeatureExtractor};
use crate::calibration::CalibrationStatus;
use crate::config::AppConfig;
use crate::error::{log_game_error, GameError};
use crate::game::{
    CreatedGame, Difficulty, FinalSnapshot, FrameSnapshot, GameId, GameKind, GameState,
    GameStatus, GameStatusSnapshot, GameSummary, RegistryStats, StartSnapshot,
};
use crate::managers::CalibrationManager;
use crate::telemetry::{EventHub, GameEvent};

const COMPONENT: &str = "GameRegistry";

type SharedGame = Arc<Mutex<GameState>>;

/// Registry of live games keyed by generated id
///
/// Constructed once and passed by reference (or `Arc`) to whoever handles
/// requests; there is no global instance.
///
/// # Example
/// ```ignore
/// let registry = GameRegistry::new(AppConfig::default())?;
/// let game = registry.create_game(GameKind::Boat, "Ana")?;
/// registry.start_game(game.game_id.as_str())?;
/// let frame = registry.process_intensity(game.game_id.as_str(), 0.8, None)?;
/// ```
pub struct GameRegistry {
    config: AppConfig,
    games: RwLock<HashMap<GameId, SharedGame>>,
    game_counter: AtomicU64,
    extractor: SignalFeatureExtractor,
    intensity_detector: IntensityDetector,
    calibration: CalibrationManager,
    events: EventHub,
}

impl GameRegistry {
    /// Build a registry from configuration
    ///
    /// # Errors
    /// `GameError::Validation` when the detection filters do not fit the
    /// configured sample rate.
    pub fn new(config: AppConfig) -> Result<Self, GameError> {
        let extractor = SignalFeatureExtractor::new(&config.detection)
            .inspect_err(|err| log_game_error(err, COMPONENT, "registry_init"))?;

        Ok(Self {
            intensity_detector: IntensityDetector::new(&config.intensity),
            calibration: CalibrationManager::new(&config.detection),
            extractor,
            games: RwLock::new(HashMap::new()),
            game_counter: AtomicU64::new(0),
            events: EventHub::default(),
            config,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Create a game in the Created state
    pub fn create_game(&self, kind: GameKind, player_name: &str) -> Result<CreatedGame, GameError> {
        let sequence = self.game_counter.fetch_add(1, Ordering::Relaxed) + 1;
        let id = GameId::generate(kind, sequence);
        let game = GameState::new(id.clone(), sequence, kind, player_name, &self.config);

        let created = CreatedGame {
            game_id: id.clone(),
            game_type: kind,
            player_name: game.player_name().to_string(),
            status: game.status(),
        };

        self.write_games("create_game")?
            .insert(id.clone(), Arc::new(Mutex::new(game)));

        log::info!(
            "[GameRegistry] Created {} game {} for {}",
            kind,
            id,
            created.player_name
        );
        self.events.publish(GameEvent::Created {
            game_id: id.to_string(),
            game_type: kind,
        });
        Ok(created)
    }

    pub fn start_game(&self, game_id: &str) -> Result<StartSnapshot, GameError> {
        let game = self.find_game(game_id, "start_game")?;
        let started = lock_game(&game, game_id)?
            .start()
            .inspect_err(|err| log_game_error(err, COMPONENT, "start_game"))?;

        self.events.publish(GameEvent::Started {
            game_id: game_id.to_string(),
        });
        Ok(started)
    }

    /// End a running game; it stays listed until cleanup
    pub fn end_game(&self, game_id: &str) -> Result<FinalSnapshot, GameError> {
        let game = self.find_game(game_id, "end_game")?;
        let finished = lock_game(&game, game_id)?
            .end()
            .inspect_err(|err| log_game_error(err, COMPONENT, "end_game"))?;

        self.events.publish(GameEvent::Ended {
            game_id: game_id.to_string(),
            score: finished.score,
            level: finished.level,
            duration_secs: finished.duration_secs,
        });
        Ok(finished)
    }

    /// Run blow detection on a raw PCM buffer and apply it to a game
    ///
    /// # Arguments
    /// * `game_id` - Target game, must be Running
    /// * `buffer` - Little-endian signed 16-bit mono PCM at the configured rate
    ///
    /// # Errors
    /// - `NotFound` for an unknown id
    /// - `InvalidState` when the game is not Running
    /// - `Validation` for a malformed buffer
    ///
    /// On any error the game state is unchanged.
    pub fn process_audio(&self, game_id: &str, buffer: &[u8]) -> Result<FrameSnapshot, GameError> {
        let game = self.find_game(game_id, "process_audio")?;
        let mut guard = lock_game(&game, game_id)?;
        guard
            .ensure_running("process audio for")
            .inspect_err(|err| log_game_error(err, COMPONENT, "process_audio"))?;

        let threshold = self.calibration.threshold()?;
        let analysis = self
            .extractor
            .detect_blow(buffer, threshold)
            .inspect_err(|err| log_game_error(err, COMPONENT, "process_audio"))?;

        let frame = guard.process_audio(&analysis)?;
        drop(guard);

        tracing::debug!(
            game_id = %frame.game_id,
            detected = frame.blow_detected,
            intensity = frame.blow_intensity,
            rms = analysis.metadata.rms,
            threshold,
            score = frame.score,
            "audio frame processed"
        );
        self.publish_frame_events(&frame);
        Ok(frame)
    }

    /// Apply a precomputed intensity (and optional metering level) to a game
    ///
    /// # Errors
    /// - `NotFound` for an unknown id
    /// - `InvalidState` when the game is not Running
    /// - `Validation` for NaN readings
    pub fn process_intensity(
        &self,
        game_id: &str,
        intensity: f64,
        metering_db: Option<f64>,
    ) -> Result<FrameSnapshot, GameError> {
        let game = self.find_game(game_id, "process_intensity")?;
        let mut guard = lock_game(&game, game_id)?;
        guard
            .ensure_running("process intensity for")
            .inspect_err(|err| log_game_error(err, COMPONENT, "process_intensity"))?;

        let detection = self
            .intensity_detector
            .detect(intensity, metering_db)
            .inspect_err(|err| log_game_error(err, COMPONENT, "process_intensity"))?;

        let frame = guard.process_intensity(detection)?;
        drop(guard);

        tracing::debug!(
            game_id = %frame.game_id,
            detected = frame.blow_detected,
            intensity = frame.blow_intensity,
            score = frame.score,
            "intensity frame processed"
        );
        self.publish_frame_events(&frame);
        Ok(frame)
    }

    /// Measure ambient noise and rescale every running game's threshold
    ///
    /// An empty sample set leaves the calibration and every game untouched and
    /// returns the current status.
    pub fn calibrate<B: AsRef<[u8]>>(&self, samples: &[B]) -> Result<CalibrationStatus, GameError> {
        let Some(status) = self.calibration.calibrate(samples)? else {
            return self.calibration.status();
        };

        let games = self.read_games("calibrate")?;
        let mut games_updated = 0;
        for (id, game) in games.iter() {
            let mut guard = lock_game(game, id.as_str())?;
            if guard.is_running() {
                guard.calibrate_threshold(status.baseline_level);
                games_updated += 1;
            }
        }
        drop(games);

        log::info!(
            "[GameRegistry] Calibrated baseline={:.5}, {} running games updated",
            status.baseline_level,
            games_updated
        );
        self.events.publish(GameEvent::Calibrated {
            baseline_level: status.baseline_level,
            games_updated,
        });
        Ok(status)
    }

    pub fn set_difficulty(
        &self,
        game_id: &str,
        difficulty: Difficulty,
    ) -> Result<GameStatusSnapshot, GameError> {
        let game = self.find_game(game_id, "set_difficulty")?;
        let mut guard = lock_game(&game, game_id)?;
        guard.set_difficulty(difficulty);
        Ok(guard.status_snapshot())
    }

    pub fn game_status(&self, game_id: &str) -> Result<GameStatusSnapshot, GameError> {
        let game = self.find_game(game_id, "game_status")?;
        let guard = lock_game(&game, game_id)?;
        Ok(guard.status_snapshot())
    }

    /// Every game in creation order
    pub fn list_games(&self) -> Result<Vec<GameSummary>, GameError> {
        let games = self.read_games("list_games")?;
        let mut entries = Vec::with_capacity(games.len());
        for (id, game) in games.iter() {
            let guard = lock_game(game, id.as_str())?;
            entries.push((guard.sequence(), guard.summary()));
        }
        entries.sort_by_key(|(sequence, _)| *sequence);
        Ok(entries.into_iter().map(|(_, summary)| summary).collect())
    }

    /// Running games only, in creation order
    pub fn active_games(&self) -> Result<Vec<GameSummary>, GameError> {
        Ok(self
            .list_games()?
            .into_iter()
            .filter(|summary| summary.status == GameStatus::Running)
            .collect())
    }

    /// Drop every game that is not Running
    ///
    /// # Returns
    /// Number of games removed
    pub fn cleanup_inactive_games(&self) -> Result<usize, GameError> {
        let mut games = self.write_games("cleanup_inactive_games")?;
        let before = games.len();

        let mut inactive = Vec::new();
        for (id, game) in games.iter() {
            if !lock_game(game, id.as_str())?.is_running() {
                inactive.push(id.clone());
            }
        }
        for id in &inactive {
            games.remove(id);
        }

        let removed = before - games.len();
        if removed > 0 {
            log::info!("[GameRegistry] Removed {} inactive games", removed);
        }
        Ok(removed)
    }

    pub fn stats(&self) -> Result<RegistryStats, GameError> {
        let summaries = self.list_games()?;
        let count = |kind: GameKind| summaries.iter().filter(|s| s.game_type == kind).count();

        Ok(RegistryStats {
            total_games: summaries.len(),
            running_games: summaries
                .iter()
                .filter(|s| s.status == GameStatus::Running)
                .count(),
            boat_games: count(GameKind::Boat),
            balloon_games: count(GameKind::Balloon),
            events_published: self.events.total_events(),
            calibration: self.calibration.status()?,
        })
    }

    pub fn calibration_status(&self) -> Result<CalibrationStatus, GameError> {
        self.calibration.status()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<GameEvent> {
        self.events.subscribe()
    }

    pub fn recent_events(&self) -> Vec<GameEvent> {
        self.events.snapshot().recent
    }

    // ========================================================================
    // HELPER METHODS - Lock management and lookup
    // ========================================================================

    fn find_game(&self, game_id: &str, context: &str) -> Result<SharedGame, GameError> {
        let games = self.read_games(context)?;
        games.get(game_id).cloned().ok_or_else(|| {
            let err = GameError::NotFound {
                game_id: game_id.to_string(),
            };
            log_game_error(&err, COMPONENT, context);
            err
        })
    }

    fn read_games(
        &self,
        context: &str,
    ) -> Result<RwLockReadGuard<'_, HashMap<GameId, SharedGame>>, GameError> {
        self.games.read().map_err(|_| {
            let err = GameError::LockPoisoned {
                component: "game_registry".to_string(),
            };
            log_game_error(&err, COMPONENT, context);
            err
        })
    }

    fn write_games(
        &self,
        context: &str,
    ) -> Result<RwLockWriteGuard<'_, HashMap<GameId, SharedGame>>, GameError> {
        self.games.write().map_err(|_| {
            let err = GameError::LockPoisoned {
                component: "game_registry".to_string(),
            };
            log_game_error(&err, COMPONENT, context);
            err
        })
    }

    fn publish_frame_events(&self, frame: &FrameSnapshot) {
        for event in GameEvent::from_frame(frame) {
            self.events.publish(event);
        }
    }
}

fn lock_game<'a>(game: &'a SharedGame, game_id: &str) -> Result<MutexGuard<'a, GameState>, GameError> {
    game.lock().map_err(|_| GameError::LockPoisoned {
        component: format!("game {}", game_id),
    })
}
