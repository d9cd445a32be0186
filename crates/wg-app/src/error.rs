//! Error types for the wg-app service layer.

use std::path::PathBuf;

use wg_core::DeviceId;

/// Application error type that wraps errors from the backend crates and
/// gives the CLI one error surface.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Project error: {0}")]
    Project(String),

    #[error("Failed to read project file {path}: {message}")]
    ProjectFileRead { path: PathBuf, message: String },

    #[error("Project validation failed: {0}")]
    Validation(String),

    #[error("Device not found: {0}")]
    DeviceNotFound(DeviceId),

    #[error("Engine error: {0}")]
    Engine(String),

    #[error("Store error: {0}")]
    Results(String),

    #[error("Engine finished for device {device_id} but {table} was not written")]
    MissingOutput { device_id: DeviceId, table: String },

    #[error("No cached output for device {device_id} ({table})")]
    NotCached { device_id: DeviceId, table: String },

    #[error("Timeline error: {0}")]
    Timeline(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for wg-app operations.
pub type AppResult<T> = Result<T, AppError>;

// Conversions from backend error types
impl From<wg_project::ProjectError> for AppError {
    fn from(err: wg_project::ProjectError) -> Self {
        AppError::Project(err.to_string())
    }
}

impl From<wg_project::ValidationError> for AppError {
    fn from(err: wg_project::ValidationError) -> Self {
        AppError::Validation(err.to_string())
    }
}

impl From<wg_engine::EngineError> for AppError {
    fn from(err: wg_engine::EngineError) -> Self {
        AppError::Engine(err.to_string())
    }
}

impl From<wg_results::ResultsError> for AppError {
    fn from(err: wg_results::ResultsError) -> Self {
        AppError::Results(err.to_string())
    }
}

impl From<wg_core::CoreError> for AppError {
    fn from(err: wg_core::CoreError) -> Self {
        AppError::Timeline(err.to_string())
    }
}
