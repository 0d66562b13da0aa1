use serde::Serialize;

/// One ply of the move list, as shown in the history table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryEntry {
    /// 0-based ply index.
    pub index: usize,
    pub san: String,
}

/// A full move: White's ply and, unless the history ends on it, Black's reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MoveRow {
    /// 1-based full-move number.
    pub number: usize,
    pub white: HistoryEntry,
    pub black: Option<HistoryEntry>,
}

/// Pair consecutive history entries into table rows.
pub fn move_rows(history: &[HistoryEntry]) -> Vec<MoveRow> {
    history
        .chunks(2)
        .enumerate()
        .map(|(i, pair)| MoveRow {
            number: i + 1,
            white: pair[0].clone(),
            black: pair.get(1).cloned(),
        })
        .collect()
}
