// Game error types and constants

use crate::error::ErrorCode;
use crate::game::GameStatus;
use log::error;
use std::fmt;

/// Game error code constants
///
/// Single source of truth for the numeric codes handed to external callers
/// (request handlers map them onto their own response format).
///
/// Error code range: 3001-3004
pub struct GameErrorCodes {}

impl GameErrorCodes {
    /// Malformed input (unknown game type, invalid difficulty, bad audio payload)
    pub const VALIDATION: i32 = 3001;

    /// Unknown game id
    pub const NOT_FOUND: i32 = 3002;

    /// Operation attempted in the wrong lifecycle state
    pub const INVALID_STATE: i32 = 3003;

    /// Registry or calibration lock was poisoned
    pub const LOCK_POISONED: i32 = 3004;
}

/// Log a game error with structured context
///
/// # Arguments
/// * `component` - Manager that hit the error (e.g. `GameRegistry`)
/// * `context` - Operation being performed
pub fn log_game_error(err: &GameError, component: &str, context: &str) {
    error!("{}", describe_game_error(err, component, context));
}

fn describe_game_error(err: &GameError, component: &str, context: &str) -> String {
    format!(
        "Game error in {}: code={}, component={}, message={}",
        context,
        err.code(),
        component,
        err.message()
    )
}

/// Errors surfaced by the game core
///
/// None of these are retried internally; numeric edge cases (silence, empty
/// calibration sets) are guarded and never reach this type.
#[derive(Debug, Clone, PartialEq)]
pub enum GameError {
    /// Malformed input, nothing was mutated
    Validation { reason: String },

    /// No game registered under this id
    NotFound { game_id: String },

    /// The game is not in the lifecycle state the operation requires
    InvalidState {
        game_id: String,
        status: GameStatus,
        operation: &'static str,
    },

    /// Mutex/RwLock was poisoned
    LockPoisoned { component: String },
}

impl GameError {
    pub(crate) fn validation(reason: impl Into<String>) -> Self {
        GameError::Validation {
            reason: reason.into(),
        }
    }
}

impl ErrorCode for GameError {
    fn code(&self) -> i32 {
        match self {
            GameError::Validation { .. } => GameErrorCodes::VALIDATION,
            GameError::NotFound { .. } => GameErrorCodes::NOT_FOUND,
            GameError::InvalidState { .. } => GameErrorCodes::INVALID_STATE,
            GameError::LockPoisoned { .. } => GameErrorCodes::LOCK_POISONED,
        }
    }

    fn message(&self) -> String {
        match self {
            GameError::Validation { reason } => format!("Invalid input: {}", reason),
            GameError::NotFound { game_id } => format!("Game not found: {}", game_id),
            GameError::InvalidState {
                game_id,
                status,
                operation,
            } => format!(
                "Cannot {} game {} while it is {:?}",
                operation, game_id, status
            ),
            GameError::LockPoisoned { component } => {
                format!("Lock poisoned for component: {}", component)
            }
        }
    }
}

impl fmt::Display for GameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "GameError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for GameError {}
