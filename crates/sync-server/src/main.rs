use sync_server::config::Config;
use sync_server::hub::Hub;

use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::from_env();

    let store = sync_server::connect_store(&config).await?;
    let hub = Hub::new(config.broadcast_capacity);

    let addr = format!("{}:{}", config.host, config.port);
    let app = sync_server::router(store, hub);

    tracing::info!("Starting server on {addr}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
