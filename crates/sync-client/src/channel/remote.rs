use chess_core::{GameDocument, GameId};
use futures::StreamExt;
use reqwest::Client;
use std::future::Future;

use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use url::Url;

use super::{Listeners, SyncChannel, SyncEvent};
use crate::error::ClientError;

enum WriteJob {
    Put { id: GameId, doc: GameDocument },
    /// Answered once every earlier job has finished.
    Flush(oneshot::Sender<()>),
}

/// Document store reached over HTTP (writes) and WebSocket (subscription).
///
/// Must be created inside a tokio runtime: writes are handed to a single
/// background task so they reach the server in the order they were issued.
pub struct RemoteChannel {
    base: Url,
    jobs: mpsc::UnboundedSender<WriteJob>,
    listeners: Listeners,
}

impl RemoteChannel {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let base = Url::parse(base_url)?;
        let listeners = Listeners::default();
        let (jobs, queue) = mpsc::unbounded_channel();

        tokio::spawn(write_loop(Client::new(), base.clone(), queue, listeners.clone()));

        Ok(Self {
            base,
            jobs,
            listeners,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn enqueue(&self, id: &GameId, doc: &GameDocument) {
        let job = WriteJob::Put {
            id: id.clone(),
            doc: doc.clone(),
        };
        if self.jobs.send(job).is_err() {
            tracing::warn!(game_id = %id, "Write queue closed, dropping write");
        }
    }
}

pub fn game_url(base: &Url, id: &GameId) -> Result<Url, ClientError> {
    Ok(base.join(&format!("/api/games/{id}"))?)
}

pub fn subscription_url(base: &Url, id: &GameId) -> Result<Url, ClientError> {
    let mut url = base.join(&format!("/api/games/{id}/ws"))?;
    let scheme = if url.scheme() == "https" { "wss" } else { "ws" };
    url.set_scheme(scheme)
        .map_err(|_| ClientError::InvalidLink(format!("cannot use {base} for WebSocket")))?;
    Ok(url)
}

async fn put_document(
    client: &Client,
    base: &Url,
    id: &GameId,
    doc: &GameDocument,
) -> Result<(), ClientError> {
    client
        .put(game_url(base, id)?)
        .json(doc)
        .send()
        .await?
        .error_for_status()?;
    Ok(())
}

async fn write_loop(
    client: Client,
    base: Url,
    mut queue: mpsc::UnboundedReceiver<WriteJob>,
    listeners: Listeners,
) {
    while let Some(job) = queue.recv().await {
        let (id, doc) = match job {
            WriteJob::Put { id, doc } => (id, doc),
            WriteJob::Flush(done) => {
                let _ = done.send(());
                continue;
            }
        };
        match put_document(&client, &base, &id, &doc).await {
            Ok(()) => tracing::debug!(game_id = %id, "Document written"),
            Err(e) => {
                tracing::warn!(game_id = %id, "Write failed: {e}");
                listeners.notify(
                    &id,
                    SyncEvent::WriteFailed {
                        game_id: id.clone(),
                        reason: e.to_string(),
                    },
                );
            }
        }
    }
}

async fn subscription_loop(
    url: Url,
    id: GameId,
    events: mpsc::UnboundedSender<SyncEvent>,
) -> Result<(), ClientError> {
    let (stream, _) = connect_async(url.as_str()).await?;
    tracing::info!(game_id = %id, "Subscribed to game document");
    let (_write, mut read) = stream.split();

    while let Some(frame) = read.next().await {
        let text = match frame? {
            Message::Text(text) => text,
            Message::Close(_) => break,
            _ => continue,
        };

        let doc: Option<GameDocument> = match serde_json::from_str(text.as_str()) {
            Ok(doc) => doc,
            Err(e) => {
                tracing::warn!(game_id = %id, "Ignoring undecodable snapshot: {e}");
                continue;
            }
        };

        if events.send(SyncEvent::Snapshot(doc)).is_err() {
            // Subscriber dropped its receiver
            return Ok(());
        }
    }

    Err(ClientError::SubscriptionClosed(url.to_string()))
}

impl SyncChannel for RemoteChannel {
    fn create(&self, id: &GameId, doc: &GameDocument) {
        self.enqueue(id, doc);
    }

    fn write(&self, id: &GameId, doc: &GameDocument) {
        self.enqueue(id, doc);
    }

    fn flush(&self) -> impl Future<Output = ()> + Send {
        let (done, finished) = oneshot::channel();
        let queued = self.jobs.send(WriteJob::Flush(done)).is_ok();
        async move {
            if queued {
                let _ = finished.await;
            }
        }
    }

    fn subscribe(&self, id: &GameId) -> mpsc::UnboundedReceiver<SyncEvent> {
        let (tx, rx) = self.listeners.add(id);
        let id = id.clone();

        match subscription_url(&self.base, &id) {
            Ok(url) => {
                tokio::spawn(async move {
                    if let Err(e) = subscription_loop(url, id.clone(), tx.clone()).await {
                        tracing::warn!(game_id = %id, "Subscription lost: {e}");
                        let _ = tx.send(SyncEvent::SubscriptionLost {
                            game_id: id,
                            reason: e.to_string(),
                        });
                    }
                });
            }
            Err(e) => {
                let _ = tx.send(SyncEvent::SubscriptionLost {
                    game_id: id,
                    reason: e.to_string(),
                });
            }
        }

        rx
    }
}
