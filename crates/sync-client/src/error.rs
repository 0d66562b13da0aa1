use chess_core::GameError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Subscription to {0} closed by server")]
    SubscriptionClosed(String),

    #[error("Invalid share link: {0}")]
    InvalidLink(String),

    #[error(transparent)]
    Game(#[from] GameError),
}
