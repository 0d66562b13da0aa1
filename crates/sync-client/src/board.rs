//! Board display and the gestures it reports.

use std::io::Write;

use chess_core::{File, GameState, GameStatus, MoveRow, Piece, Rank, Square};

/// What a player does to the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gesture {
    HoverEnter(Square),
    HoverExit(Square),
    DragStart { square: Square, piece: Piece },
    Drop { from: Square, to: Square },
    /// The piece finished animating into place.
    SnapEnd,
}

/// A rendering surface for one game.
pub trait BoardView {
    fn render(&mut self, fen: &str);
    fn set_interactive(&mut self, interactive: bool);
    fn highlight(&mut self, squares: &[Square]);
    fn clear_highlights(&mut self);
    /// Put a dragged piece back on `from`. Game state is not involved.
    fn snapback(&mut self, from: Square);
    fn show_status(&mut self, status: &GameStatus, fen: &str);
    fn show_history(&mut self, rows: &[MoveRow]);
    fn show_warning(&mut self, message: &str);
}

/// Plain-text board for terminals.
pub struct TextBoard<W: Write> {
    out: W,
    fen: Option<String>,
    highlights: Vec<Square>,
    interactive: bool,
}

impl<W: Write> TextBoard<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            fen: None,
            highlights: Vec::new(),
            interactive: true,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit(&mut self, text: &str) {
        if let Err(e) = self.out.write_all(text.as_bytes()).and_then(|_| self.out.flush()) {
            tracing::warn!("Failed to write board output: {e}");
        }
    }

    fn draw(&mut self) {
        let Some(fen) = self.fen.clone() else { return };
        let game = match GameState::from_fen(&fen) {
            Ok(game) => game,
            Err(e) => {
                self.emit(&format!("! cannot draw position: {e}\n"));
                return;
            }
        };

        let mut text = String::new();
        for rank in (0..8u32).rev() {
            text.push_str(&format!("{} ", rank + 1));
            for file in 0..8u32 {
                let square = Square::from_coords(File::new(file), Rank::new(rank));
                let glyph = game.piece_at(square).map(|p| p.char()).unwrap_or('.');
                let mark = if self.highlights.contains(&square) { '*' } else { ' ' };
                text.push(glyph);
                text.push(mark);
            }
            text.push('\n');
        }
        text.push_str("  a b c d e f g h");
        if !self.interactive {
            text.push_str("   (viewing history)");
        }
        text.push('\n');
        self.emit(&text);
    }
}

impl<W: Write> BoardView for TextBoard<W> {
    fn render(&mut self, fen: &str) {
        if self.fen.as_deref() == Some(fen) && self.highlights.is_empty() {
            return;
        }
        self.fen = Some(fen.to_string());
        self.highlights.clear();
        self.draw();
    }

    fn set_interactive(&mut self, interactive: bool) {
        self.interactive = interactive;
    }

    fn highlight(&mut self, squares: &[Square]) {
        self.highlights = squares.to_vec();
        self.draw();
    }

    fn clear_highlights(&mut self) {
        if !self.highlights.is_empty() {
            self.highlights.clear();
            self.draw();
        }
    }

    fn snapback(&mut self, from: Square) {
        self.emit(&format!("x move from {from} rejected\n"));
    }

    fn show_status(&mut self, status: &GameStatus, fen: &str) {
        self.emit(&format!("{status}\nFEN: {fen}\n"));
    }

    fn show_history(&mut self, rows: &[MoveRow]) {
        let mut text = String::new();
        for row in rows {
            let black = row.black.as_ref().map(|e| e.san.as_str()).unwrap_or("");
            text.push_str(&format!("{:>3}. {:<8} {}\n", row.number, row.white.san, black));
        }
        self.emit(&text);
    }

    fn show_warning(&mut self, message: &str) {
        self.emit(&format!("! {message}\n"));
    }
}

/// Keeps every call it receives. Used to observe a controller from tests.
#[derive(Debug, Default)]
pub struct RecordingBoard {
    pub renders: Vec<String>,
    pub interactive: Option<bool>,
    pub highlights: Vec<Square>,
    pub snapbacks: Vec<Square>,
    pub statuses: Vec<String>,
    pub rows: Vec<MoveRow>,
    pub warnings: Vec<String>,
}

impl RecordingBoard {
    pub fn last_render(&self) -> Option<&str> {
        self.renders.last().map(String::as_str)
    }

    pub fn last_status(&self) -> Option<&str> {
        self.statuses.last().map(String::as_str)
    }
}

impl BoardView for RecordingBoard {
    fn render(&mut self, fen: &str) {
        self.renders.push(fen.to_string());
    }

    fn set_interactive(&mut self, interactive: bool) {
        self.interactive = Some(interactive);
    }

    fn highlight(&mut self, squares: &[Square]) {
        self.highlights = squares.to_vec();
    }

    fn clear_highlights(&mut self) {
        self.highlights.clear();
    }

    fn snapback(&mut self, from: Square) {
        self.snapbacks.push(from);
    }

    fn show_status(&mut self, status: &GameStatus, _fen: &str) {
        self.statuses.push(status.to_string());
    }

    fn show_history(&mut self, rows: &[MoveRow]) {
        self.rows = rows.to_vec();
    }

    fn show_warning(&mut self, message: &str) {
        self.warnings.push(message.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess_core::document::STANDARD_START_FEN;

    fn output(board: TextBoard<Vec<u8>>) -> String {
        String::from_utf8(board.into_inner()).unwrap()
    }

    #[test]
    fn test_text_board_draws_start_position() {
        let mut board = TextBoard::new(Vec::new());
        board.render(STANDARD_START_FEN);
        let text = output(board);
        assert!(text.contains("8 r n b q k b n r"));
        assert!(text.contains("1 R N B Q K B N R"));
        assert!(text.ends_with("  a b c d e f g h\n"));
    }

    #[test]
    fn test_text_board_marks_highlights() {
        let mut board = TextBoard::new(Vec::new());
        board.render(STANDARD_START_FEN);
        let e2: Square = "e2".parse().unwrap();
        let e4: Square = "e4".parse().unwrap();
        board.highlight(&[e2, e4]);
        let text = output(board);
        assert!(text.contains("2 P P P P P*P P P"));
        assert!(text.contains("4 . . . . .*. . ."));
    }
}
