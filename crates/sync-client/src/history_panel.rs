use chess_core::{move_rows, GameError, GameState, HistoryEntry, MoveRow};

/// A past position picked from the move table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preview {
    pub fen: String,
    pub index: usize,
    /// True when `index` is the last move, i.e. the live position.
    pub is_live: bool,
}

/// Two-column (White/Black) move table. Rows are derived from the game's
/// history and rebuilt from scratch on every change.
#[derive(Debug, Default)]
pub struct MoveHistoryPanel {
    rows: Vec<MoveRow>,
}

impl MoveHistoryPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rebuild(&mut self, history: &[HistoryEntry]) -> &[MoveRow] {
        self.rows = move_rows(history);
        &self.rows
    }

    pub fn rows(&self) -> &[MoveRow] {
        &self.rows
    }

    /// Replay the game through `index` on a scratch board.
    pub fn select(&self, game: &GameState, index: usize) -> Result<Preview, GameError> {
        let scratch = game.replay_prefix(index)?;
        Ok(Preview {
            fen: scratch.fen(),
            index,
            is_live: index + 1 == game.moves().len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn game_with(sans: &[&str]) -> GameState {
        let mut game = GameState::new();
        for san in sans {
            assert!(game.apply_san(san).is_applied());
        }
        game
    }

    #[test]
    fn test_rebuild_pairs_moves() {
        let game = game_with(&["e4", "e5", "Nf3"]);
        let mut panel = MoveHistoryPanel::new();
        let rows = panel.rebuild(&game.history());
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].white.san, "e4");
        assert_eq!(rows[0].black.as_ref().unwrap().san, "e5");
        assert_eq!(rows[1].number, 2);
        assert!(rows[1].black.is_none());
    }

    #[test]
    fn test_select_previews_and_detects_live() {
        let game = game_with(&["e4", "e5", "Nf3"]);
        let panel = MoveHistoryPanel::new();

        let first = panel.select(&game, 0).unwrap();
        assert!(!first.is_live);
        assert!(first.fen.starts_with("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b"));

        let last = panel.select(&game, 2).unwrap();
        assert!(last.is_live);
        assert_eq!(last.fen, game.fen());

        assert!(panel.select(&game, 3).is_err());
    }
}
