//! PGN reading and writing for the `pgn` half of a game document.
//!
//! Only the parts the document needs are handled: the `FEN` tag for games
//! that did not start from the standard position, and the mainline SAN moves.

use std::fmt::Write;
use std::ops::ControlFlow;

use pgn_reader::{RawTag, Reader, SanPlus, Skip, Visitor};

/// Mainline of a PGN game.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedPgn {
    /// Value of the `FEN` tag, if any.
    pub start_fen: Option<String>,
    /// Mainline moves in SAN, without check suffixes.
    pub moves: Vec<String>,
}

struct MainlineCollector;

impl Visitor for MainlineCollector {
    type Tags = Option<String>;
    type Movetext = ParsedPgn;
    type Output = ParsedPgn;

    fn begin_tags(&mut self) -> ControlFlow<ParsedPgn, Option<String>> {
        ControlFlow::Continue(None)
    }

    fn tag(
        &mut self,
        tags: &mut Option<String>,
        name: &[u8],
        value: RawTag<'_>,
    ) -> ControlFlow<ParsedPgn> {
        if name == b"FEN" {
            *tags = Some(value.decode_utf8_lossy().into_owned());
        }
        ControlFlow::Continue(())
    }

    fn begin_movetext(&mut self, tags: Option<String>) -> ControlFlow<ParsedPgn, ParsedPgn> {
        ControlFlow::Continue(ParsedPgn {
            start_fen: tags,
            moves: Vec::new(),
        })
    }

    fn san(&mut self, movetext: &mut ParsedPgn, san_plus: SanPlus) -> ControlFlow<ParsedPgn> {
        movetext.moves.push(san_plus.san.to_string());
        ControlFlow::Continue(())
    }

    fn begin_variation(&mut self, _movetext: &mut ParsedPgn) -> ControlFlow<ParsedPgn, Skip> {
        // Mainline only
        ControlFlow::Continue(Skip(true))
    }

    fn end_game(&mut self, movetext: ParsedPgn) -> ParsedPgn {
        movetext
    }
}

/// Parse the first game of a PGN string. An empty string is an empty game.
/// Returns None when the text cannot be read as PGN.
pub fn parse_pgn(pgn: &str) -> Option<ParsedPgn> {
    if pgn.trim().is_empty() {
        return Some(ParsedPgn::default());
    }

    let mut reader = Reader::new(pgn.as_bytes());
    match reader.read_game(&mut MainlineCollector) {
        Ok(Some(parsed)) => Some(parsed),
        Ok(None) => Some(ParsedPgn::default()),
        Err(e) => {
            tracing::debug!("Failed to read PGN: {e}");
            None
        }
    }
}

/// Render a move list as PGN.
///
/// `first_move_number` and `black_first` describe the starting position so
/// that games set up from a FEN keep their move numbering (`12... Qh4`).
pub fn write_pgn(
    start_fen: Option<&str>,
    first_move_number: u32,
    black_first: bool,
    sans: &[String],
    result: Option<&str>,
) -> String {
    let mut out = String::new();

    if let Some(fen) = start_fen {
        let _ = write!(out, "[SetUp \"1\"]\n[FEN \"{fen}\"]\n\n");
    }

    let mut number = first_move_number;
    let mut white_to_move = !black_first;
    let mut tokens: Vec<String> = Vec::with_capacity(sans.len() + 1);

    for (i, san) in sans.iter().enumerate() {
        if white_to_move {
            tokens.push(format!("{number}. {san}"));
        } else if i == 0 {
            tokens.push(format!("{number}... {san}"));
        } else {
            tokens.push(san.clone());
        }
        if !white_to_move {
            number += 1;
        }
        white_to_move = !white_to_move;
    }

    if let Some(result) = result {
        tokens.push(result.to_string());
    }

    out.push_str(&tokens.join(" "));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pgn_movetext() {
        let parsed = parse_pgn("1. e4 e5 2. Nf3 Nc6 3. Bb5+ a6 *").unwrap();
        assert_eq!(parsed.start_fen, None);
        assert_eq!(parsed.moves, vec!["e4", "e5", "Nf3", "Nc6", "Bb5", "a6"]);
    }

    #[test]
    fn test_parse_pgn_skips_comments_and_variations() {
        let pgn = "1. e4 {best by test} e5 (1... c5 2. Nf3) 2. Nf3 1-0";
        let parsed = parse_pgn(pgn).unwrap();
        assert_eq!(parsed.moves, vec!["e4", "e5", "Nf3"]);
    }

    #[test]
    fn test_parse_pgn_fen_tag() {
        let pgn = r#"[SetUp "1"]
[FEN "4k3/8/8/8/8/8/4P3/4K3 w - - 0 1"]

1. e4 Kd7"#;
        let parsed = parse_pgn(pgn).unwrap();
        assert_eq!(parsed.start_fen.as_deref(), Some("4k3/8/8/8/8/8/4P3/4K3 w - - 0 1"));
        assert_eq!(parsed.moves.len(), 2);
    }

    #[test]
    fn test_parse_empty_pgn() {
        assert_eq!(parse_pgn("  ").unwrap(), ParsedPgn::default());
    }

    #[test]
    fn test_write_pgn_numbering() {
        let sans: Vec<String> = ["e4", "e5", "Nf3"].iter().map(|s| s.to_string()).collect();
        assert_eq!(write_pgn(None, 1, false, &sans, None), "1. e4 e5 2. Nf3");

        let sans: Vec<String> = ["Qh4#"].iter().map(|s| s.to_string()).collect();
        assert_eq!(
            write_pgn(None, 2, true, &sans, Some("0-1")),
            "2... Qh4# 0-1"
        );
    }

    #[test]
    fn test_write_pgn_with_setup() {
        let pgn = write_pgn(Some("8/8/8/8/8/8/8/K6k w - - 0 1"), 1, false, &[], None);
        assert!(pgn.starts_with("[SetUp \"1\"]\n[FEN \"8/8/8/8/8/8/8/K6k w - - 0 1\"]"));
    }
}
