//! The shared game document, seen from one client.

mod memory;
mod remote;

use std::future::Future;
use std::sync::{Arc, Mutex};

use chess_core::{GameDocument, GameId};
use tokio::sync::mpsc;

pub use memory::MemoryChannel;
pub use remote::RemoteChannel;

/// Something the document store told us.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    /// The full document after a change. `None` means it does not exist yet.
    Snapshot(Option<GameDocument>),
    /// A queued write did not reach the store. It is not retried.
    WriteFailed { game_id: GameId, reason: String },
    /// The subscription stopped delivering snapshots.
    SubscriptionLost { game_id: GameId, reason: String },
}

/// One logical document per game id. Every method returns immediately;
/// outcomes arrive later on the subscription receiver.
pub trait SyncChannel {
    /// Write the first version of a document for a freshly minted id.
    fn create(&self, id: &GameId, doc: &GameDocument);

    /// Replace the whole document. Writes are applied in the order they are
    /// issued and the last one wins.
    fn write(&self, id: &GameId, doc: &GameDocument);

    /// Resolves once every write issued so far has reached the store or
    /// been reported as failed.
    fn flush(&self) -> impl Future<Output = ()> + Send {
        async {}
    }

    /// Receive every change to the document, including echoes of our own writes.
    fn subscribe(&self, id: &GameId) -> mpsc::UnboundedReceiver<SyncEvent>;
}

/// Subscription senders grouped by game.
#[derive(Clone, Default)]
pub(crate) struct Listeners {
    inner: Arc<Mutex<Vec<(GameId, mpsc::UnboundedSender<SyncEvent>)>>>,
}

impl Listeners {
    pub(crate) fn add(&self, id: &GameId) -> (mpsc::UnboundedSender<SyncEvent>, mpsc::UnboundedReceiver<SyncEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.push((id.clone(), tx.clone()));
        (tx, rx)
    }

    pub(crate) fn insert(&self, id: &GameId, tx: mpsc::UnboundedSender<SyncEvent>) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.push((id.clone(), tx));
    }

    /// Send to every live subscriber of `id`, forgetting closed ones.
    pub(crate) fn notify(&self, id: &GameId, event: SyncEvent) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.retain(|(game_id, tx)| {
            if game_id != id {
                return !tx.is_closed();
            }
            tx.send(event.clone()).is_ok()
        });
    }
}
