//! Realtime document store for shared chess games.
//!
//! Each game is a single `{fen, pgn}` document. Clients write the whole
//! document after every move and subscribe over a WebSocket to receive every
//! change.

pub mod config;
pub mod db;
pub mod error;
pub mod hub;
pub mod routes;
pub mod store;

use axum::{
    routing::{get, post},
    Extension, Router,
};
use tower_http::cors::{Any, CorsLayer};

use crate::config::Config;
use crate::hub::Hub;
use crate::store::Store;

/// Pick the storage backend from the configuration.
pub async fn connect_store(config: &Config) -> Result<Store, sqlx::Error> {
    match &config.database_url {
        Some(url) => {
            tracing::info!("Connecting to database...");
            let pool = db::pool::create_pool(url).await?;
            tracing::info!("Running migrations...");
            db::pool::run_migrations(&pool).await?;
            Ok(Store::Postgres(pool))
        }
        None => {
            tracing::info!("DATABASE_URL not set - documents are kept in memory");
            Ok(Store::memory())
        }
    }
}

pub fn router(store: Store, hub: Hub) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/api/games", post(routes::games::create_game))
        .route(
            "/api/games/{game_id}",
            get(routes::games::get_game).put(routes::games::put_game),
        )
        .route("/api/games/{game_id}/ws", get(routes::game_ws::ws_handler))
        .layer(Extension(store))
        .layer(Extension(hub))
        .layer(cors)
}
