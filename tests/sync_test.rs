//! Integration tests for the sync server and the client talking to it.
//!
//! Each test starts its own in-process server with an in-memory store.

mod common;

use std::time::{Duration, Instant};

use chess_core::{parse_square, GameDocument, GameState};
use futures::StreamExt;
use serde_json::{json, Value};
use sync_client::{
    BoardView, Controller, RecordingBoard, RemoteChannel, SyncChannel, SyncEvent, UiEvent,
};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio_tungstenite::tungstenite::Message;

use common::TestServer;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn create_game(server: &TestServer) -> String {
    let resp = common::client()
        .post(server.url("/api/games"))
        .send()
        .await
        .expect("Failed to send create request");
    assert_eq!(resp.status(), 201);
    let body: Value = resp.json().await.unwrap();
    body["id"].as_str().unwrap().to_string()
}

async fn put_game(server: &TestServer, id: &str, doc: &GameDocument) -> reqwest::Response {
    common::client()
        .put(server.url(&format!("/api/games/{id}")))
        .json(doc)
        .send()
        .await
        .expect("Failed to send put request")
}

fn document_after(moves: &[&str]) -> GameDocument {
    let mut game = GameState::new();
    for san in moves {
        assert!(game.apply_san(san).is_applied(), "{san} should be legal");
    }
    game.document()
}

async fn next_snapshot<S>(stream: &mut S) -> Option<GameDocument>
where
    S: futures::Stream<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Unpin,
{
    loop {
        let frame = tokio::time::timeout(Duration::from_secs(5), stream.next())
            .await
            .expect("Timed out waiting for snapshot")
            .expect("Subscription ended")
            .expect("WebSocket error");
        if let Message::Text(text) = frame {
            return serde_json::from_str(text.as_str()).expect("Snapshot is not a document");
        }
    }
}

/// Feed sync events into `controller` until `done` holds or five seconds pass.
async fn wait_for<V, C>(
    controller: &mut Controller<V, C>,
    updates: &mut UnboundedReceiver<SyncEvent>,
    mut done: impl FnMut(&Controller<V, C>) -> bool,
) -> bool
where
    V: BoardView,
    C: SyncChannel,
{
    let deadline = Instant::now() + Duration::from_secs(5);
    while !done(controller) {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match tokio::time::timeout(remaining, updates.recv()).await {
            Ok(Some(event)) => controller.handle_sync(event),
            _ => return false,
        }
    }
    true
}

fn play(controller: &mut Controller<RecordingBoard, RemoteChannel>, from: &str, to: &str) {
    controller.handle_ui(UiEvent::Move {
        from: parse_square(from).unwrap(),
        to: parse_square(to).unwrap(),
    });
}

// ---------------------------------------------------------------------------
// HTTP API
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_health() {
    let server = TestServer::spawn().await;
    let resp = common::client()
        .get(server.url("/health"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!({ "status": "ok" }));
}

#[tokio::test]
async fn test_create_then_get() {
    let server = TestServer::spawn().await;
    let id = create_game(&server).await;
    assert_eq!(id.len(), 20);

    let resp = common::client()
        .get(server.url(&format!("/api/games/{id}")))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["id"], id.as_str());
    assert_eq!(body["fen"], GameDocument::start().fen.as_str());
    assert_eq!(body["pgn"], "");
}

#[tokio::test]
async fn test_get_unknown_and_invalid_ids() {
    let server = TestServer::spawn().await;

    let resp = common::client()
        .get(server.url("/api/games/doesnotexist"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    let resp = common::client()
        .get(server.url("/api/games/bad.id"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert!(body["detail"].as_str().unwrap().contains("Invalid game id"));
}

#[tokio::test]
async fn test_put_rejects_illegal_position() {
    let server = TestServer::spawn().await;
    let id = create_game(&server).await;

    let resp = put_game(&server, &id, &GameDocument::new("not a fen", "")).await;
    assert_eq!(resp.status(), 400);

    // Stored document is untouched
    let body: Value = common::client()
        .get(server.url(&format!("/api/games/{id}")))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["fen"], GameDocument::start().fen.as_str());
}

#[tokio::test]
async fn test_last_write_wins() {
    let server = TestServer::spawn().await;
    let id = "lastwritewins";

    let longer = document_after(&["e4", "e5", "Nf3"]);
    let shorter = document_after(&["d4"]);
    assert_eq!(put_game(&server, id, &longer).await.status(), 200);
    assert_eq!(put_game(&server, id, &shorter).await.status(), 200);

    let stored: GameDocument = common::client()
        .get(server.url(&format!("/api/games/{id}")))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(stored, shorter);
}

// ---------------------------------------------------------------------------
// WebSocket subscription
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_subscription_sends_snapshot_then_changes() {
    let server = TestServer::spawn().await;
    let id = "fresh-game";

    let (mut stream, _) = tokio_tungstenite::connect_async(server.ws_url(id))
        .await
        .expect("Failed to connect");
    assert_eq!(next_snapshot(&mut stream).await, None);

    let first = document_after(&["e4"]);
    put_game(&server, id, &first).await;
    assert_eq!(next_snapshot(&mut stream).await, Some(first));

    let second = document_after(&["e4", "c5"]);
    put_game(&server, id, &second).await;
    assert_eq!(next_snapshot(&mut stream).await, Some(second.clone()));

    // A late subscriber starts from the current document
    let (mut late, _) = tokio_tungstenite::connect_async(server.ws_url(id))
        .await
        .expect("Failed to connect");
    assert_eq!(next_snapshot(&mut late).await, Some(second));
}

#[tokio::test]
async fn test_concurrent_writes_publish_in_store_order() {
    let server = TestServer::spawn().await;
    let id = "racing-writes";

    let (mut stream, _) = tokio_tungstenite::connect_async(server.ws_url(id))
        .await
        .expect("Failed to connect");
    assert_eq!(next_snapshot(&mut stream).await, None);

    let openings = [
        "a3", "a4", "b3", "b4", "c3", "c4", "d3", "d4", "e3", "e4", "f3", "f4", "g3", "g4", "h3",
        "h4", "Na3", "Nc3", "Nf3", "Nh3",
    ];
    let writes: Vec<_> = openings
        .iter()
        .map(|san| {
            let doc = document_after(&[san]);
            let url = server.url(&format!("/api/games/{id}"));
            tokio::spawn(async move {
                let resp = common::client().put(url).json(&doc).send().await.unwrap();
                assert_eq!(resp.status(), 200);
            })
        })
        .collect();
    for write in futures::future::join_all(writes).await {
        write.unwrap();
    }

    let mut last = None;
    for _ in openings {
        last = next_snapshot(&mut stream).await;
    }

    // The final broadcast matches what the store kept
    let stored: GameDocument = common::client()
        .get(server.url(&format!("/api/games/{id}")))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(last, Some(stored));
}

// ---------------------------------------------------------------------------
// Client against a live server
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_two_clients_play_through_server() {
    let server = TestServer::spawn().await;

    let (mut white, mut white_updates) = Controller::start(
        RecordingBoard::default(),
        RemoteChannel::new(&server.base_url).unwrap(),
        None,
    );
    let game_id = white.game_id().clone();

    let (mut black, mut black_updates) = Controller::start(
        RecordingBoard::default(),
        RemoteChannel::new(&server.base_url).unwrap(),
        Some(game_id.clone()),
    );

    play(&mut white, "e2", "e4");
    assert!(
        wait_for(&mut black, &mut black_updates, |c| c.session().game.pgn() == "1. e4").await,
        "black never saw 1. e4"
    );
    assert_eq!(black.view().last_status(), Some("Black to move"));

    play(&mut black, "c7", "c5");
    assert!(
        wait_for(&mut white, &mut white_updates, |c| c.session().game.pgn() == "1. e4 c5").await,
        "white never saw 1... c5"
    );
    assert_eq!(white.view().rows.len(), 1);

    let stored: GameDocument = common::client()
        .get(server.url(&format!("/api/games/{game_id}")))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(stored, white.session().game.document());
}

#[tokio::test]
async fn test_moves_reach_store_before_client_exits() {
    let server = TestServer::spawn().await;
    let (controller, updates) = Controller::start(
        RecordingBoard::default(),
        RemoteChannel::new(&server.base_url).unwrap(),
        None,
    );
    let game_id = controller.game_id().clone();

    let (ui_tx, ui_rx) = tokio::sync::mpsc::unbounded_channel();
    ui_tx
        .send(UiEvent::Move {
            from: parse_square("e2").unwrap(),
            to: parse_square("e4").unwrap(),
        })
        .unwrap();
    drop(ui_tx);

    let controller = controller.run(ui_rx, updates).await;
    controller.channel().flush().await;

    // No waiting: the store already holds the last local move
    let stored: GameDocument = common::client()
        .get(server.url(&format!("/api/games/{game_id}")))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(stored.pgn, "1. e4");
    assert_eq!(stored, controller.session().game.document());
}

#[tokio::test]
async fn test_unreachable_server_is_reported() {
    let (mut controller, mut updates) = Controller::start(
        RecordingBoard::default(),
        RemoteChannel::new("http://127.0.0.1:1").unwrap(),
        None,
    );
    play(&mut controller, "d2", "d4");

    let reported = wait_for(&mut controller, &mut updates, |c| {
        let warnings = &c.view().warnings;
        warnings.iter().any(|w| w.starts_with("Move not saved"))
            && warnings.iter().any(|w| w.starts_with("Lost connection"))
    })
    .await;
    assert!(reported, "warnings: {:?}", controller.view().warnings);

    // The local move stands
    assert_eq!(controller.session().game.history().len(), 1);
}
