//! Error types for the Conscient engine

use thiserror::Error;

/// Errors that can occur while configuring the engine or persisting its state.
///
/// Scoring itself never fails: numeric inputs are clamped and corrupt stored
/// values fall back to defaults. `StorageCorrupt` is only produced by the
/// strict read path ([`crate::storage::PersistenceGateway::try_get`]).
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Stored value under '{key}' is corrupt: {reason}")]
    StorageCorrupt { key: String, reason: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid rule: {0}")]
    InvalidRule(String),

    #[error("Encoding error: {0}")]
    EncodingError(String),
}
