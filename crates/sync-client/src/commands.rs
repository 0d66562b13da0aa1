//! Line commands for the terminal client.

use chess_core::{parse_square, GameError, Square};
use thiserror::Error;

use crate::board::Gesture;
use crate::controller::UiEvent;

pub const HELP: &str = "\
commands:
  e2 e4          move the piece on e2 to e4 (also: move e2 e4, e2e4)
  hover e2       highlight where the piece on e2 can go
  unhover        clear highlights
  history <n>    show the position after move n (1 = White's first move)
  live           return to the current position
  board          redraw the board
  help           show this text
  quit           leave the game";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Ui(UiEvent),
    Help,
    Quit,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum CommandError {
    #[error("unknown command '{0}', type 'help'")]
    Unknown(String),
    #[error("{0}")]
    Square(#[from] GameError),
    #[error("'history' needs a move number starting at 1")]
    HistoryNumber,
}

/// Parse one input line. Blank lines give `Ok(None)`.
pub fn parse_command(line: &str) -> Result<Option<Command>, CommandError> {
    let words: Vec<&str> = line.split_whitespace().collect();
    let command = match words.as_slice() {
        [] => return Ok(None),
        ["quit" | "exit" | "q"] => Command::Quit,
        ["help" | "?"] => Command::Help,
        ["board"] => Command::Ui(UiEvent::Redraw),
        ["live"] => Command::Ui(UiEvent::ResumeLive),
        ["unhover"] => Command::Ui(UiEvent::Board(Gesture::HoverExit(Square::A1))),
        ["hover", square] => Command::Ui(UiEvent::Board(Gesture::HoverEnter(parse_square(square)?))),
        ["history", n] => {
            let number: usize = n.parse().map_err(|_| CommandError::HistoryNumber)?;
            let index = number.checked_sub(1).ok_or(CommandError::HistoryNumber)?;
            Command::Ui(UiEvent::SelectHistory(index))
        }
        ["move", from, to] | [from, to] => move_command(from, to)?,
        [joined] if joined.len() == 4 && joined.is_ascii() => {
            let (from, to) = joined.split_at(2);
            move_command(from, to)?
        }
        [other, ..] => return Err(CommandError::Unknown(other.to_string())),
    };
    Ok(Some(command))
}

fn move_command(from: &str, to: &str) -> Result<Command, CommandError> {
    Ok(Command::Ui(UiEvent::Move {
        from: parse_square(from)?,
        to: parse_square(to)?,
    }))
}
