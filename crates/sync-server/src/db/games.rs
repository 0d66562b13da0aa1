use chess_core::{GameDocument, GameId};
use sqlx::PgPool;

use crate::error::AppError;

/// Fetch a game document.
pub async fn get_game(pool: &PgPool, id: &GameId) -> Result<Option<GameDocument>, AppError> {
    let row: Option<(String, String)> =
        sqlx::query_as(r#"SELECT fen, pgn FROM sync_games WHERE id = $1"#)
            .bind(id.as_str())
            .fetch_optional(pool)
            .await?;

    Ok(row.map(|(fen, pgn)| GameDocument { fen, pgn }))
}

/// Write the full document, replacing whatever was there.
/// Returns the document it replaced.
pub async fn upsert_game(
    pool: &PgPool,
    id: &GameId,
    doc: &GameDocument,
) -> Result<Option<GameDocument>, AppError> {
    let (prev_fen, prev_pgn): (Option<String>, Option<String>) = sqlx::query_as(
        r#"WITH prev AS (
               SELECT fen, pgn FROM sync_games WHERE id = $1
           )
           INSERT INTO sync_games (id, fen, pgn)
           VALUES ($1, $2, $3)
           ON CONFLICT (id) DO UPDATE SET
               fen = EXCLUDED.fen,
               pgn = EXCLUDED.pgn,
               updated_at = NOW()
           RETURNING (SELECT fen FROM prev), (SELECT pgn FROM prev)"#,
    )
    .bind(id.as_str())
    .bind(&doc.fen)
    .bind(&doc.pgn)
    .fetch_one(pool)
    .await?;

    Ok(match (prev_fen, prev_pgn) {
        (Some(fen), Some(pgn)) => Some(GameDocument { fen, pgn }),
        _ => None,
    })
}

/// Insert a new document. Returns false if the id is already taken.
pub async fn insert_game(pool: &PgPool, id: &GameId, doc: &GameDocument) -> Result<bool, AppError> {
    let result = sqlx::query(
        r#"INSERT INTO sync_games (id, fen, pgn)
           VALUES ($1, $2, $3)
           ON CONFLICT (id) DO NOTHING"#,
    )
    .bind(id.as_str())
    .bind(&doc.fen)
    .bind(&doc.pgn)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}
