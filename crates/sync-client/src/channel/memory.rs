use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use chess_core::{GameDocument, GameId};
use tokio::sync::mpsc;

use super::{Listeners, SyncChannel, SyncEvent};

/// In-process document store. Clones share the same documents, so several
/// controllers can play against each other without a server. Each clone is
/// its own client: write failures are only reported to its subscriptions.
#[derive(Default)]
pub struct MemoryChannel {
    documents: Arc<Mutex<HashMap<GameId, GameDocument>>>,
    listeners: Listeners,
    failing: Arc<AtomicBool>,
    /// Subscriptions made through this handle.
    own: Listeners,
}

impl Clone for MemoryChannel {
    fn clone(&self) -> Self {
        Self {
            documents: Arc::clone(&self.documents),
            listeners: self.listeners.clone(),
            failing: Arc::clone(&self.failing),
            own: Listeners::default(),
        }
    }
}

impl MemoryChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current stored document.
    pub fn document(&self, id: &GameId) -> Option<GameDocument> {
        let documents = self.documents.lock().unwrap_or_else(|e| e.into_inner());
        documents.get(id).cloned()
    }

    /// Make subsequent writes fail, as if the store were unreachable.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn store(&self, id: &GameId, doc: &GameDocument) {
        if self.failing.load(Ordering::SeqCst) {
            tracing::warn!(game_id = %id, "Write failed: store unavailable");
            self.own.notify(
                id,
                SyncEvent::WriteFailed {
                    game_id: id.clone(),
                    reason: "store unavailable".to_string(),
                },
            );
            return;
        }

        {
            let mut documents = self.documents.lock().unwrap_or_else(|e| e.into_inner());
            documents.insert(id.clone(), doc.clone());
        }
        self.listeners
            .notify(id, SyncEvent::Snapshot(Some(doc.clone())));
    }
}

impl SyncChannel for MemoryChannel {
    fn create(&self, id: &GameId, doc: &GameDocument) {
        self.store(id, doc);
    }

    fn write(&self, id: &GameId, doc: &GameDocument) {
        self.store(id, doc);
    }

    fn subscribe(&self, id: &GameId) -> mpsc::UnboundedReceiver<SyncEvent> {
        let (tx, rx) = self.listeners.add(id);
        self.own.insert(id, tx.clone());
        let _ = tx.send(SyncEvent::Snapshot(self.document(id)));
        rx
    }
}
