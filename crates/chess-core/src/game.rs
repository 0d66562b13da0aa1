//! Game state adapter over shakmaty.
//!
//! Legality, check and termination detection all come from the rules engine.
//! This module keeps the move history next to the position so the pair can
//! be serialized to, and rebuilt from, a `GameDocument`.

use std::fmt;

use shakmaty::fen::Fen;
use shakmaty::san::SanPlus;
use shakmaty::{CastlingMode, Chess, Color, EnPassantMode, File, Move, Piece, Position, Role, Square};

use crate::document::{GameDocument, STANDARD_START_FEN};
use crate::error::GameError;
use crate::history::HistoryEntry;
use crate::pgn;

/// A ply that was accepted and recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayedMove {
    pub from: Square,
    pub to: Square,
    pub promotion: Option<Role>,
    /// SAN including the `+`/`#` suffix.
    pub san: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    GameOver,
    NoPiece,
    IllegalMove,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveResult {
    Applied(PlayedMove),
    Rejected(RejectReason),
}

impl MoveResult {
    pub fn is_applied(&self) -> bool {
        matches!(self, MoveResult::Applied(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawReason {
    Stalemate,
    InsufficientMaterial,
    FiftyMoveRule,
    ThreefoldRepetition,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Normal,
    Check,
    Checkmate,
    Draw(DrawReason),
}

/// Side to move combined with the position's outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameStatus {
    pub turn: Color,
    pub outcome: Outcome,
}

impl GameStatus {
    pub fn is_game_over(&self) -> bool {
        matches!(self.outcome, Outcome::Checkmate | Outcome::Draw(_))
    }
}

pub fn color_name(color: Color) -> &'static str {
    match color {
        Color::White => "White",
        Color::Black => "Black",
    }
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let side = color_name(self.turn);
        match self.outcome {
            Outcome::Checkmate => write!(f, "Game over, {side} is in checkmate."),
            Outcome::Draw(_) => write!(f, "Game over, drawn position"),
            Outcome::Check => write!(f, "{side} to move, {side} is in check"),
            Outcome::Normal => write!(f, "{side} to move"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GameState {
    initial: Chess,
    /// FEN of the initial position when it is not the standard start.
    initial_fen: Option<String>,
    position: Chess,
    moves: Vec<PlayedMove>,
    /// Repetition keys of every position reached, starting with the initial one.
    seen: Vec<String>,
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}

impl GameState {
    pub fn new() -> Self {
        Self::from_position(Chess::default())
    }

    fn from_position(initial: Chess) -> Self {
        let fen = fen_of(&initial);
        let initial_fen = (fen != STANDARD_START_FEN).then_some(fen);
        Self {
            seen: vec![repetition_key(&initial)],
            position: initial.clone(),
            initial,
            initial_fen,
            moves: Vec::new(),
        }
    }

    /// Start a game from a FEN. History is empty.
    pub fn from_fen(fen: &str) -> Result<Self, GameError> {
        Ok(Self::from_position(parse_position(fen)?))
    }

    /// Rebuild a game by replaying PGN movetext. Returns None if the PGN
    /// cannot be read or contains a move that is illegal where it is played.
    pub fn from_pgn(pgn_text: &str) -> Option<Self> {
        let parsed = pgn::parse_pgn(pgn_text)?;
        let mut game = match parsed.start_fen.as_deref() {
            Some(fen) => Self::from_fen(fen).ok()?,
            None => Self::new(),
        };
        for san in &parsed.moves {
            if let MoveResult::Rejected(reason) = game.apply_san(san) {
                tracing::debug!(san = %san, ?reason, "PGN replay stopped at rejected move");
                return None;
            }
        }
        Some(game)
    }

    /// Apply the move a piece makes when dragged from `from` to `to`.
    /// Pawns reaching the last rank always promote to a queen.
    pub fn apply_move(&mut self, from: Square, to: Square) -> MoveResult {
        if self.is_game_over() {
            return MoveResult::Rejected(RejectReason::GameOver);
        }
        if self.position.board().piece_at(from).is_none() {
            return MoveResult::Rejected(RejectReason::NoPiece);
        }

        let candidate = self
            .position
            .legal_moves()
            .iter()
            .filter(|m| drag_squares(m) == (from, to))
            .find(|m| matches!(m.promotion(), None | Some(Role::Queen)))
            .cloned();

        match candidate {
            Some(mv) => MoveResult::Applied(self.play(mv)),
            None => MoveResult::Rejected(RejectReason::IllegalMove),
        }
    }

    /// Apply a move given in SAN (check suffixes are accepted).
    pub fn apply_san(&mut self, san: &str) -> MoveResult {
        if self.is_game_over() {
            return MoveResult::Rejected(RejectReason::GameOver);
        }
        let parsed: SanPlus = match san.trim().parse() {
            Ok(s) => s,
            Err(_) => return MoveResult::Rejected(RejectReason::IllegalMove),
        };
        match parsed.san.to_move(&self.position) {
            Ok(mv) => MoveResult::Applied(self.play(mv)),
            Err(_) => MoveResult::Rejected(RejectReason::IllegalMove),
        }
    }

    fn play(&mut self, mv: Move) -> PlayedMove {
        let (from, to) = drag_squares(&mv);
        let promotion = mv.promotion();
        let san = SanPlus::from_move_and_play_unchecked(&mut self.position, mv);

        let played = PlayedMove {
            from,
            to,
            promotion,
            san: san.to_string(),
        };
        self.seen.push(repetition_key(&self.position));
        self.moves.push(played.clone());
        played
    }

    /// Replace the state with a document's contents.
    ///
    /// The PGN is replayed so the history survives; if it is missing or does
    /// not lead to the document's FEN, the FEN alone is loaded. A FEN that
    /// does not describe a legal position is rejected and nothing changes.
    pub fn load(&mut self, document: &GameDocument) -> Result<(), GameError> {
        let target = fen_of(&parse_position(&document.fen)?);

        if let Some(replayed) = Self::from_pgn(&document.pgn) {
            if replayed.fen() == target {
                *self = replayed;
                return Ok(());
            }
            tracing::debug!("PGN does not lead to the document FEN, loading FEN only");
        }

        *self = Self::from_fen(&target)?;
        Ok(())
    }

    /// Replace the state with a bare position. History is cleared.
    pub fn load_fen(&mut self, fen: &str) -> Result<(), GameError> {
        *self = Self::from_fen(fen)?;
        Ok(())
    }

    pub fn document(&self) -> GameDocument {
        GameDocument::new(self.fen(), self.pgn())
    }

    pub fn fen(&self) -> String {
        fen_of(&self.position)
    }

    pub fn pgn(&self) -> String {
        let sans: Vec<String> = self.moves.iter().map(|m| m.san.clone()).collect();
        pgn::write_pgn(
            self.initial_fen.as_deref(),
            u32::from(self.initial.fullmoves()),
            self.initial.turn() == Color::Black,
            &sans,
            self.result_token(),
        )
    }

    fn result_token(&self) -> Option<&'static str> {
        match self.status().outcome {
            Outcome::Checkmate => Some(match self.turn() {
                Color::White => "0-1",
                Color::Black => "1-0",
            }),
            Outcome::Draw(_) => Some("1/2-1/2"),
            Outcome::Normal | Outcome::Check => None,
        }
    }

    pub fn history(&self) -> Vec<HistoryEntry> {
        self.moves
            .iter()
            .enumerate()
            .map(|(index, m)| HistoryEntry {
                index,
                san: m.san.clone(),
            })
            .collect()
    }

    pub fn moves(&self) -> &[PlayedMove] {
        &self.moves
    }

    pub fn turn(&self) -> Color {
        self.position.turn()
    }

    pub fn status(&self) -> GameStatus {
        let pos = &self.position;
        let outcome = if pos.is_checkmate() {
            Outcome::Checkmate
        } else if pos.is_stalemate() {
            Outcome::Draw(DrawReason::Stalemate)
        } else if pos.is_insufficient_material() {
            Outcome::Draw(DrawReason::InsufficientMaterial)
        } else if pos.halfmoves() >= 100 {
            Outcome::Draw(DrawReason::FiftyMoveRule)
        } else if self.is_threefold_repetition() {
            Outcome::Draw(DrawReason::ThreefoldRepetition)
        } else if pos.is_check() {
            Outcome::Check
        } else {
            Outcome::Normal
        };

        GameStatus {
            turn: pos.turn(),
            outcome,
        }
    }

    pub fn is_game_over(&self) -> bool {
        self.status().is_game_over()
    }

    fn is_threefold_repetition(&self) -> bool {
        match self.seen.last() {
            Some(current) => self.seen.iter().filter(|key| *key == current).count() >= 3,
            None => false,
        }
    }

    pub fn piece_at(&self, square: Square) -> Option<Piece> {
        self.position.board().piece_at(square)
    }

    /// Squares the piece on `square` can move to. Castling is reported as
    /// the king's destination square.
    pub fn legal_destinations(&self, square: Square) -> Vec<Square> {
        if self.is_game_over() {
            return Vec::new();
        }
        let mut dests: Vec<Square> = self
            .position
            .legal_moves()
            .iter()
            .map(drag_squares)
            .filter(|(from, _)| *from == square)
            .map(|(_, to)| to)
            .collect();
        dests.sort();
        dests.dedup();
        dests
    }

    /// A disposable game holding history entries `0..=index`.
    pub fn replay_prefix(&self, index: usize) -> Result<GameState, GameError> {
        if index >= self.moves.len() {
            return Err(GameError::HistoryIndex {
                index,
                len: self.moves.len(),
            });
        }

        let mut scratch = Self::from_position(self.initial.clone());
        for played in &self.moves[..=index] {
            if let MoveResult::Rejected(reason) = scratch.apply_san(&played.san) {
                return Err(GameError::MalformedState(format!(
                    "history move {} rejected on replay: {reason:?}",
                    played.san
                )));
            }
        }
        Ok(scratch)
    }
}

/// Source and destination square of a move as seen on the board.
fn drag_squares(mv: &Move) -> (Square, Square) {
    match *mv {
        Move::Normal { from, to, .. } | Move::EnPassant { from, to } => (from, to),
        Move::Castle { king, rook } => {
            let file = if rook.file() > king.file() {
                File::G
            } else {
                File::C
            };
            (king, Square::from_coords(file, king.rank()))
        }
        Move::Put { to, .. } => (to, to),
    }
}

fn parse_position(fen: &str) -> Result<Chess, GameError> {
    let parsed: Fen = fen
        .trim()
        .parse()
        .map_err(|e| GameError::MalformedState(format!("invalid FEN '{fen}': {e}")))?;
    parsed
        .into_position::<Chess>(CastlingMode::Standard)
        .map_err(|e| GameError::MalformedState(format!("illegal position '{fen}': {e}")))
}

fn fen_of(pos: &Chess) -> String {
    Fen::from_position(pos, EnPassantMode::Legal).to_string()
}

/// Position, side, castling rights and en passant square: the fields that
/// decide whether two positions repeat.
fn repetition_key(pos: &Chess) -> String {
    fen_of(pos)
        .split_whitespace()
        .take(4)
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn parse_square(name: &str) -> Result<Square, GameError> {
    name.trim()
        .parse()
        .map_err(|_| GameError::InvalidSquare(name.to_string()))
}
