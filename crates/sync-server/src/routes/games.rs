use axum::{extract::Path, http::StatusCode, Extension, Json};
use chess_core::{GameDocument, GameId, GameState};
use serde_json::Value as JsonValue;

use crate::error::AppError;
use crate::hub::Hub;
use crate::store::Store;

fn document_json(id: &GameId, doc: &GameDocument) -> JsonValue {
    serde_json::json!({
        "id": id,
        "fen": doc.fen,
        "pgn": doc.pgn,
    })
}

/// Reject documents whose FEN is not a legal position.
fn validate(doc: &GameDocument) -> Result<(), AppError> {
    GameState::from_fen(&doc.fen)?;
    Ok(())
}

/// POST /api/games
/// Mint an id and store a game at the starting position.
pub async fn create_game(
    Extension(store): Extension<Store>,
) -> Result<(StatusCode, Json<JsonValue>), AppError> {
    let id = GameId::generate();
    let doc = GameDocument::start();

    if !store.insert_new(&id, &doc).await? {
        return Err(AppError::Conflict(format!("Game {id} already exists")));
    }

    tracing::info!(game_id = %id, "Created game");
    Ok((StatusCode::CREATED, Json(document_json(&id, &doc))))
}

/// GET /api/games/{game_id}
pub async fn get_game(
    Extension(store): Extension<Store>,
    Path(game_id): Path<String>,
) -> Result<Json<JsonValue>, AppError> {
    let id = GameId::parse(&game_id)?;
    let doc = store
        .get(&id)
        .await?
        .ok_or_else(|| AppError::NotFound("Game not found".into()))?;

    Ok(Json(document_json(&id, &doc)))
}

/// PUT /api/games/{game_id}
/// Replace the full document and push it to subscribers. Last write wins.
pub async fn put_game(
    Extension(store): Extension<Store>,
    Extension(hub): Extension<Hub>,
    Path(game_id): Path<String>,
    Json(doc): Json<GameDocument>,
) -> Result<Json<JsonValue>, AppError> {
    let id = GameId::parse(&game_id)?;
    validate(&doc)?;

    let _ordering = hub.lock_writes(&id).await;
    let previous = store.upsert(&id, &doc).await?;

    if let Some(prev) = &previous {
        let (old_plies, new_plies) = (prev.ply_count(), doc.ply_count());
        if new_plies < old_plies {
            tracing::warn!(
                game_id = %id,
                old_plies,
                new_plies,
                "Write replaced a longer game; a concurrent move was likely overwritten"
            );
        }
    }

    let delivered = hub.publish(&id, &doc);
    tracing::debug!(game_id = %id, delivered, "Stored game document");

    Ok(Json(document_json(&id, &doc)))
}
