//! Error types for the game simulation.
//!
//! The tick itself never fails; these cover loading tuning data and
//! setting up a session.

use thiserror::Error;

/// Result type alias using [`GameError`].
pub type Result<T> = std::result::Result<T, GameError>;

/// Top-level error type for all game simulation errors.
#[derive(Debug, Error)]
pub enum GameError {
    /// Failed to read a configuration file.
    #[error("Failed to read config file '{path}': {source}")]
    ConfigIo {
        /// Path to the file that could not be read.
        path: String,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Configuration text could not be parsed.
    #[error("Failed to parse config '{origin}': {message}")]
    ConfigParse {
        /// File path, or `<inline>` for in-memory text.
        origin: String,
        /// Error message.
        message: String,
    },

    /// Configuration parsed but holds unusable values.
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// Invalid entity reference.
    #[error("Entity not found: {0}")]
    EntityNotFound(u64),

    /// Invalid game state.
    #[error("Invalid game state: {0}")]
    InvalidState(String),
}
