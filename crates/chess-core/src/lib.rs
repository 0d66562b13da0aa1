//! Chess state shared by the sync server and its clients.
//!
//! `GameState` wraps shakmaty for legality and termination, `GameDocument` is
//! the `{fen, pgn}` record kept in the document store, and `GameId` keys it.

pub mod document;
pub mod error;
pub mod game;
pub mod game_id;
pub mod history;
pub mod pgn;

pub use document::GameDocument;
pub use error::GameError;
pub use game::{
    DrawReason, GameState, GameStatus, MoveResult, Outcome, PlayedMove, RejectReason,
};
pub use game_id::GameId;
pub use history::{move_rows, HistoryEntry, MoveRow};

pub use game::parse_square;
pub use shakmaty::{Color, File, Piece, Rank, Role, Square};
