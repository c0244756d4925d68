use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use breath_trainer::calibration::CalibrationStatus;
use breath_trainer::game::{FinalSnapshot, FrameSnapshot};
use breath_trainer::telemetry::GameEvent;
use breath_trainer::testing::wav::read_recording;
use breath_trainer::{AppConfig, Difficulty, GameKind, GameRegistry};
use clap::{Parser, Subcommand};
use serde::Serialize;

#[derive(Parser, Debug)]
#[command(
    name = "breath_cli",
    about = "Offline session runner for the breath trainer games"
)]
struct Cli {
    /// JSON configuration file (defaults to assets/breath_config.json)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Log library activity to stderr
    #[arg(long)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Play a recorded WAV session through a game, frame by frame
    Simulate {
        #[arg(long)]
        game: GameKind,
        #[arg(long)]
        wav: PathBuf,
        #[arg(long, default_value_t = 100)]
        frame_ms: u32,
        #[arg(long)]
        difficulty: Option<Difficulty>,
        /// Ambient noise recording used to calibrate before playing
        #[arg(long)]
        noise: Option<PathBuf>,
        #[arg(long, default_value = "Player")]
        player: String,
    },
    /// Feed precomputed intensity readings through a game
    Intensity {
        #[arg(long)]
        game: GameKind,
        /// Comma-separated intensities, e.g. 0.7,0.8,0.9
        #[arg(long, value_delimiter = ',', required = true)]
        values: Vec<f64>,
        /// Metering level applied to every reading
        #[arg(long, allow_hyphen_values = true)]
        db: Option<f64>,
        #[arg(long)]
        difficulty: Option<Difficulty>,
        #[arg(long, default_value = "Player")]
        player: String,
    },
    /// Print the effective configuration as JSON
    Config,
}

/// Last line printed by a session
#[derive(Serialize)]
struct SessionReport {
    frames: usize,
    summary: FinalSnapshot,
    #[serde(skip_serializing_if = "Option::is_none")]
    calibration: Option<CalibrationStatus>,
    events: Vec<GameEvent>,
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    if cli.verbose {
        breath_trainer::init_logging();
    }

    let config = match &cli.config {
        Some(path) => AppConfig::load_from_file(path),
        None => AppConfig::load(),
    };

    match cli.command {
        Commands::Simulate {
            game,
            wav,
            frame_ms,
            difficulty,
            noise,
            player,
        } => run_simulate(
            config,
            game,
            &wav,
            frame_ms,
            difficulty,
            noise.as_deref(),
            &player,
        ),
        Commands::Intensity {
            game,
            values,
            db,
            difficulty,
            player,
        } => run_intensity(config, game, &values, db, difficulty, &player),
        Commands::Config => {
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(ExitCode::from(0))
        }
    }
}

fn run_simulate(
    mut config: AppConfig,
    kind: GameKind,
    wav: &Path,
    frame_ms: u32,
    difficulty: Option<Difficulty>,
    noise: Option<&Path>,
    player: &str,
) -> Result<ExitCode> {
    if frame_ms == 0 {
        bail!("--frame-ms must be positive");
    }

    let recording =
        read_recording(wav).with_context(|| format!("loading session {}", wav.display()))?;
    config.detection.sample_rate = recording.sample_rate;
    let frame_len = (recording.sample_rate as usize * frame_ms as usize / 1000).max(1);

    let registry = GameRegistry::new(config)
        .with_context(|| format!("sample rate {} Hz", recording.sample_rate))?;
    let game_id = registry.create_game(kind, player)?.game_id;
    registry.start_game(game_id.as_str())?;

    let calibration = match noise {
        Some(path) => {
            let ambient = read_recording(path)
                .with_context(|| format!("loading noise {}", path.display()))?;
            Some(registry.calibrate(&ambient.pcm_frames(frame_len))?)
        }
        None => None,
    };
    if let Some(difficulty) = difficulty {
        registry.set_difficulty(game_id.as_str(), difficulty)?;
    }

    let mut frames = 0;
    for pcm in recording.pcm_frames(frame_len) {
        let frame = registry.process_audio(game_id.as_str(), &pcm)?;
        emit_frame(&frame)?;
        frames += 1;
    }

    finish_session(&registry, game_id.as_str(), frames, calibration)
}

fn run_intensity(
    config: AppConfig,
    kind: GameKind,
    values: &[f64],
    db: Option<f64>,
    difficulty: Option<Difficulty>,
    player: &str,
) -> Result<ExitCode> {
    let registry = GameRegistry::new(config)?;
    let game_id = registry.create_game(kind, player)?.game_id;
    registry.start_game(game_id.as_str())?;
    if let Some(difficulty) = difficulty {
        registry.set_difficulty(game_id.as_str(), difficulty)?;
    }

    for &intensity in values {
        let frame = registry
            .process_intensity(game_id.as_str(), intensity, db)
            .with_context(|| format!("intensity {}", intensity))?;
        emit_frame(&frame)?;
    }

    finish_session(&registry, game_id.as_str(), values.len(), None)
}

fn emit_frame(frame: &FrameSnapshot) -> Result<()> {
    println!("{}", serde_json::to_string(frame)?);
    Ok(())
}

fn finish_session(
    registry: &GameRegistry,
    game_id: &str,
    frames: usize,
    calibration: Option<CalibrationStatus>,
) -> Result<ExitCode> {
    let summary = registry.end_game(game_id)?;
    let report = SessionReport {
        frames,
        summary,
        calibration,
        events: registry.recent_events(),
    };
    println!("{}", serde_json::to_string(&report)?);
    Ok(ExitCode::from(0))
}
