//! Realtime subscription to one game document.
//!
//! The first frame is the current document (`null` if it does not exist yet),
//! followed by every accepted write, including the subscriber's own.

use axum::{
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    extract::Path,
    response::IntoResponse,
    Extension,
};
use chess_core::{GameDocument, GameId};
use futures::{SinkExt, StreamExt};
use tokio::sync::broadcast::error::RecvError;

use crate::error::AppError;
use crate::hub::Hub;
use crate::store::Store;

/// GET /api/games/{game_id}/ws
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Path(game_id): Path<String>,
    Extension(store): Extension<Store>,
    Extension(hub): Extension<Hub>,
) -> Result<impl IntoResponse, AppError> {
    let id = GameId::parse(&game_id)?;
    Ok(ws.on_upgrade(move |socket| handle_socket(socket, id, store, hub)))
}

fn snapshot_frame(doc: Option<&GameDocument>) -> Option<Message> {
    match serde_json::to_string(&doc) {
        Ok(text) => Some(Message::Text(text.into())),
        Err(e) => {
            tracing::error!("Failed to encode snapshot: {e}");
            None
        }
    }
}

async fn handle_socket(socket: WebSocket, id: GameId, store: Store, hub: Hub) {
    let (mut sender, mut receiver) = socket.split();

    // Subscribe before reading so no write lands between the two.
    let mut updates = hub.subscribe(&id);
    tracing::info!(game_id = %id, "Subscriber connected");

    let initial = match store.get(&id).await {
        Ok(doc) => doc,
        Err(e) => {
            tracing::warn!(game_id = %id, "Failed to read initial snapshot: {e}");
            None
        }
    };
    if let Some(frame) = snapshot_frame(initial.as_ref()) {
        if sender.send(frame).await.is_err() {
            drop(updates);
            hub.release(&id);
            return;
        }
    }

    loop {
        tokio::select! {
            update = updates.recv() => {
                let doc = match update {
                    Ok(doc) => Some(doc),
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::debug!(game_id = %id, skipped, "Subscriber lagged, resending latest");
                        store.get(&id).await.ok().flatten()
                    }
                    Err(RecvError::Closed) => break,
                };
                let Some(doc) = doc else { continue };
                let Some(frame) = snapshot_frame(Some(&doc)) else { continue };
                if sender.send(frame).await.is_err() {
                    break;
                }
            }
            incoming = receiver.next() => {
                match incoming {
                    Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                    // Subscribers are read-only; writes go through PUT.
                    Some(Ok(_)) => continue,
                }
            }
        }
    }

    drop(updates);
    hub.release(&id);
    tracing::info!(game_id = %id, "Subscriber disconnected");
}
