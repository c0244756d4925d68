// Error types for the breath trainer core
//
// This module defines the game error type, providing structured error handling
// with numeric codes suitable for request handlers outside the crate.

mod game;

pub use game::{log_game_error, GameError, GameErrorCodes};

/// Error codes for structured error reporting
///
/// This trait provides a standard way to get error codes and messages
/// from custom error types, enabling consistent error handling across
/// the request boundary.
pub trait ErrorCode {
    /// Get the numeric error code
    fn code(&self) -> i32;

    /// Get the human-readable error message
    fn message(&self) -> String;
}
