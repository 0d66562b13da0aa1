//! Per-game fan-out of accepted writes to WebSocket subscribers.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chess_core::{GameDocument, GameId};
use tokio::sync::{broadcast, OwnedMutexGuard};

type WriteLock = Arc<tokio::sync::Mutex<()>>;

#[derive(Clone)]
pub struct Hub {
    channels: Arc<Mutex<HashMap<GameId, broadcast::Sender<GameDocument>>>>,
    /// Held across store write and publish so subscribers see writes in store order.
    write_locks: Arc<Mutex<HashMap<GameId, WriteLock>>>,
    capacity: usize,
}

impl Hub {
    pub fn new(capacity: usize) -> Self {
        Self {
            channels: Arc::new(Mutex::new(HashMap::new())),
            write_locks: Arc::new(Mutex::new(HashMap::new())),
            capacity: capacity.max(1),
        }
    }

    pub fn subscribe(&self, id: &GameId) -> broadcast::Receiver<GameDocument> {
        let mut channels = self.channels.lock().unwrap_or_else(|e| e.into_inner());
        // Games whose subscribers all left without another write
        channels.retain(|_, sender| sender.receiver_count() > 0);
        channels
            .entry(id.clone())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe()
    }

    /// Serialize writes to one game. Keep the guard until the write has been
    /// published.
    pub async fn lock_writes(&self, id: &GameId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.write_locks.lock().unwrap_or_else(|e| e.into_inner());
            // Only the map holds an idle lock
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            Arc::clone(locks.entry(id.clone()).or_default())
        };
        lock.lock_owned().await
    }

    /// Deliver a snapshot to every subscriber of `id`. Returns how many received it.
    pub fn publish(&self, id: &GameId, doc: &GameDocument) -> usize {
        let mut channels = self.channels.lock().unwrap_or_else(|e| e.into_inner());
        let Some(sender) = channels.get(id) else {
            return 0;
        };
        match sender.send(doc.clone()) {
            Ok(n) => n,
            Err(_) => {
                // Everyone left
                channels.remove(id);
                0
            }
        }
    }

    /// Drop the channel for `id` once its last receiver is gone. Call after
    /// dropping the receiver returned by `subscribe`.
    pub fn release(&self, id: &GameId) {
        let mut channels = self.channels.lock().unwrap_or_else(|e| e.into_inner());
        if channels
            .get(id)
            .is_some_and(|sender| sender.receiver_count() == 0)
        {
            channels.remove(id);
        }
    }

    /// Games with a live channel.
    pub fn game_count(&self) -> usize {
        self.channels.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn subscriber_count(&self, id: &GameId) -> usize {
        let channels = self.channels.lock().unwrap_or_else(|e| e.into_inner());
        channels.get(id).map(|s| s.receiver_count()).unwrap_or(0)
    }
}
