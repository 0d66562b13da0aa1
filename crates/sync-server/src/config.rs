use std::env;

#[derive(Clone, Debug)]
pub struct Config {
    /// Postgres URL. Without it documents live in memory for the life of the process.
    pub database_url: Option<String>,
    pub host: String,
    pub port: u16,
    /// Buffered snapshots per game before a slow subscriber starts skipping.
    pub broadcast_capacity: usize,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            database_url: env::var("DATABASE_URL").ok().filter(|v| !v.is_empty()),
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8000),
            broadcast_capacity: env::var("BROADCAST_CAPACITY")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|n: &usize| *n > 0)
                .unwrap_or(64),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: None,
            host: "127.0.0.1".to_string(),
            port: 8000,
            broadcast_capacity: 64,
        }
    }
}
