use serde::{Deserialize, Serialize};

use crate::pgn;

pub const STANDARD_START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// The record stored per game: board position plus move history.
/// Both fields are always written together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameDocument {
    pub fen: String,
    pub pgn: String,
}

impl GameDocument {
    pub fn new(fen: impl Into<String>, pgn: impl Into<String>) -> Self {
        Self {
            fen: fen.into(),
            pgn: pgn.into(),
        }
    }

    /// Document for a fresh game.
    pub fn start() -> Self {
        Self::new(STANDARD_START_FEN, "")
    }

    /// Number of plies recorded in the PGN movetext. Unparseable movetext counts as zero.
    pub fn ply_count(&self) -> usize {
        pgn::parse_pgn(&self.pgn)
            .map(|parsed| parsed.moves.len())
            .unwrap_or(0)
    }
}

impl Default for GameDocument {
    fn default() -> Self {
        Self::start()
    }
}
