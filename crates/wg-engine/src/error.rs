//! Engine adapter errors.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

#[derive(Error, Debug)]
pub enum EngineError {
    /// The engine executable could not be started.
    #[error("Failed to launch engine '{program}': {source}")]
    Launch {
        program: String,
        source: std::io::Error,
    },

    /// The engine ran but reported failure.
    #[error("Engine '{program}' exited with {status}: {stderr}")]
    Exit {
        program: String,
        status: String,
        stderr: String,
    },

    /// Per-model folder is missing under the model root.
    #[error("Model folder not found: {path}")]
    ModelNotFound { path: PathBuf },

    /// A workspace variable name the engine could not accept.
    #[error("Invalid workspace variable name: {name}")]
    InvalidVariable { name: String },

    /// A configured parameter the adapter itself must interpret is malformed.
    #[error("Invalid parameter {key}: {reason}")]
    InvalidParameter { key: String, reason: String },

    #[error("I/O error while talking to engine: {0}")]
    Io(#[from] std::io::Error),
}
