//! Error types for the ef-app service layer.

use std::path::PathBuf;

/// Application error type that wraps errors from the backend crates
/// and gives the CLI one error interface.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Scenario error: {0}")]
    Scenario(String),

    #[error("Failed to read scenario file: {path}")]
    ScenarioFileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Scenario validation failed: {0}")]
    Validation(String),

    #[error("Model error: {0}")]
    Model(String),

    #[error("Simulation error: {0}")]
    Simulation(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for ef-app operations.
pub type AppResult<T> = Result<T, AppError>;

// Conversions from backend error types
impl From<ef_project::ProjectError> for AppError {
    fn from(err: ef_project::ProjectError) -> Self {
        match err {
            ef_project::ProjectError::Validation(e) => AppError::Validation(e.to_string()),
            ef_project::ProjectError::Plan(e) => e.into(),
            other => AppError::Scenario(other.to_string()),
        }
    }
}

impl From<ef_sim::SimError> for AppError {
    fn from(err: ef_sim::SimError) -> Self {
        AppError::Simulation(err.to_string())
    }
}

impl From<ef_models::ModelError> for AppError {
    fn from(err: ef_models::ModelError) -> Self {
        AppError::Model(err.to_string())
    }
}
