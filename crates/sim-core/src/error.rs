//! Error types shared across the simulator crates.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("database migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("invalid curve state: {0}")]
    InvalidCurve(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("replay configuration missing endpoints")]
    ReplayRangeMissing,
}

pub type Result<T> = std::result::Result<T, Error>;
