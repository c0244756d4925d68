// Breath Trainer Core - breathing-therapy game engine
// Blow detection from microphone signals driving boat and balloon games

// Module declarations
pub mod analysis;
pub mod calibration;
pub mod config;
pub mod error;
pub mod game;
pub mod history;
pub mod managers;
pub mod telemetry;
pub mod testing;

// Re-exports for convenience
pub use config::AppConfig;
pub use error::{ErrorCode, GameError};
pub use game::{Difficulty, GameId, GameKind, GameStatus};
pub use managers::GameRegistry;

/// Install the `tracing` fmt subscriber, writing to stderr
///
/// `log` records from the library are picked up as well. Calling this more than
/// once is harmless: later calls leave the first subscriber in place.
pub fn init_logging() {
    if tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(tracing::Level::INFO)
        .with_target(false)
        .try_init()
        .is_ok()
    {
        log::debug!("[Logging] tracing subscriber installed");
    }
}
