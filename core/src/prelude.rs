use serde::{Deserialize, Serialize};

/// Endpoints and timing knobs shared by the feed and fetch layers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub base_url: String,
    pub ws_url: String,
    pub reconnect_delay_ms: u64,
    pub fetch_timeout_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".into(),
            ws_url: "ws://127.0.0.1:8000/ws".into(),
            reconnect_delay_ms: 5_000,
            fetch_timeout_ms: 10_000,
        }
    }
}

/// Common error type for the engine's asynchronous boundaries.
#[derive(thiserror::Error, Debug)]
pub enum EngineError {
    #[error("fetch failure: {0}")]
    Fetch(String),
    #[error("malformed message: {0}")]
    MalformedMessage(String),
    #[error("connection: {0}")]
    Connection(String),
}

pub type EngineResult<T> = Result<T, EngineError>;
