//! Document storage: in memory by default, Postgres when configured.

use std::collections::HashMap;
use std::sync::Arc;

use chess_core::{GameDocument, GameId};
use sqlx::PgPool;
use tokio::sync::RwLock;

use crate::db;
use crate::error::AppError;

#[derive(Clone, Default)]
pub struct MemoryStore {
    games: Arc<RwLock<HashMap<GameId, GameDocument>>>,
}

#[derive(Clone)]
pub enum Store {
    Memory(MemoryStore),
    Postgres(PgPool),
}

impl Store {
    pub fn memory() -> Self {
        Store::Memory(MemoryStore::default())
    }

    pub async fn get(&self, id: &GameId) -> Result<Option<GameDocument>, AppError> {
        match self {
            Store::Memory(mem) => Ok(mem.games.read().await.get(id).cloned()),
            Store::Postgres(pool) => db::games::get_game(pool, id).await,
        }
    }

    /// Last write wins. Returns the replaced document, if any.
    pub async fn upsert(
        &self,
        id: &GameId,
        doc: &GameDocument,
    ) -> Result<Option<GameDocument>, AppError> {
        match self {
            Store::Memory(mem) => Ok(mem.games.write().await.insert(id.clone(), doc.clone())),
            Store::Postgres(pool) => db::games::upsert_game(pool, id, doc).await,
        }
    }

    /// Store a document under a fresh id. Returns false if the id exists.
    pub async fn insert_new(&self, id: &GameId, doc: &GameDocument) -> Result<bool, AppError> {
        match self {
            Store::Memory(mem) => {
                let mut games = mem.games.write().await;
                if games.contains_key(id) {
                    return Ok(false);
                }
                games.insert(id.clone(), doc.clone());
                Ok(true)
            }
            Store::Postgres(pool) => db::games::insert_game(pool, id, doc).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_last_write_wins() {
        let store = Store::memory();
        let id = GameId::generate();
        assert!(store.get(&id).await.unwrap().is_none());

        let first = GameDocument::start();
        assert!(store.upsert(&id, &first).await.unwrap().is_none());

        let second = GameDocument::new(
            "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1",
            "1. e4",
        );
        let prev = store.upsert(&id, &second).await.unwrap();
        assert_eq!(prev, Some(first));
        assert_eq!(store.get(&id).await.unwrap(), Some(second));
    }

    #[tokio::test]
    async fn test_insert_new_refuses_existing_id() {
        let store = Store::memory();
        let id = GameId::generate();
        assert!(store.insert_new(&id, &GameDocument::start()).await.unwrap());
        assert!(!store.insert_new(&id, &GameDocument::start()).await.unwrap());
    }
}
