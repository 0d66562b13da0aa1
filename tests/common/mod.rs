use reqwest::Client;
use sync_server::hub::Hub;
use sync_server::store::Store;

/// A sync server running in-process on an ephemeral port with an in-memory store.
pub struct TestServer {
    pub base_url: String,
}

impl TestServer {
    pub async fn spawn() -> Self {
        let app = sync_server::router(Store::memory(), Hub::new(64));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("No local address");

        tokio::spawn(async move {
            axum_serve(listener, app).await;
        });

        Self {
            base_url: format!("http://{addr}"),
        }
    }

    /// Build a URL for an API endpoint.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// WebSocket URL for a game subscription.
    pub fn ws_url(&self, game_id: &str) -> String {
        format!(
            "{}/api/games/{game_id}/ws",
            self.base_url.replacen("http://", "ws://", 1)
        )
    }
}

async fn axum_serve(listener: tokio::net::TcpListener, app: axum::Router) {
    if let Err(e) = axum::serve(listener, app).await {
        panic!("Test server stopped: {e}");
    }
}

/// Build a reqwest client for tests.
pub fn client() -> Client {
    Client::new()
}
