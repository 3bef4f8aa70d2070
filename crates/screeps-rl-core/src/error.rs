//! Error types for screeps-rl

use thiserror::Error;

/// Result type for screeps-rl operations
pub type Result<T> = std::result::Result<T, ScreepsRlError>;

/// screeps-rl error types
#[derive(Debug, Error)]
pub enum ScreepsRlError {
    /// Action index outside the catalog
    #[error("Invalid action index {index} (catalog has {len} actions)")]
    InvalidAction { index: usize, len: usize },

    /// Qualification queried before any qualifying tick
    #[error("Episode has not reached a qualifying tick yet")]
    NotYetQualified,

    /// Step called before the first reset
    #[error("Environment not reset, call reset first")]
    NotReset,

    /// Episode already terminated
    #[error("Episode terminated, call reset")]
    EpisodeTerminated,

    /// Administrative world reset failed
    #[error("World reset failed: {0}")]
    ResetFailed(String),

    /// Remote boundary (console/memory) failure
    #[error("Remote error: {0}")]
    Remote(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Unexpected response shape from the server
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Invalid configuration
    #[error("Config error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for ScreepsRlError {
    fn from(err: serde_json::Error) -> Self {
        ScreepsRlError::Serialization(err.to_string())
    }
}
