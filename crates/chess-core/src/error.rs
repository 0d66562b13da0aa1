//! Errors raised by game state handling.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("Malformed game state: {0}")]
    MalformedState(String),

    #[error("Invalid square: {0}")]
    InvalidSquare(String),

    #[error("Invalid game id: {0}")]
    InvalidGameId(String),

    #[error("History index {index} out of range (history has {len} moves)")]
    HistoryIndex { index: usize, len: usize },
}
