//! Error types for model construction and evaluation.

use crate::model::ModelKind;
use ef_core::CoreError;
use thiserror::Error;

/// Errors raised while building or evaluating a compartment model.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("Missing parameter '{name}' for {model} model")]
    MissingParameter {
        model: ModelKind,
        name: &'static str,
    },

    #[error("Parameter '{name}' is not set")]
    UnsetParameter { name: String },

    #[error("Unknown parameter '{name}' for {model} model")]
    UnknownParameter { model: ModelKind, name: String },

    #[error("Invalid parameter '{name}': {source}")]
    InvalidParameter {
        name: String,
        #[source]
        source: CoreError,
    },

    #[error("Transmission source produced an invalid rate {value} at t={t}")]
    InvalidRate { t: f64, value: f64 },

    #[error("{model} state needs {expected} compartments, got {got}")]
    StateLength {
        model: ModelKind,
        expected: usize,
        got: usize,
    },

    #[error("State belongs to {got} model, expected {expected}")]
    KindMismatch { expected: ModelKind, got: ModelKind },

    #[error("Invalid state: {what}")]
    InvalidState { what: String },

    #[error("Unknown model '{0}'")]
    UnknownModel(String),

    #[error(transparent)]
    Core(#[from] CoreError),
}

pub type ModelResult<T> = Result<T, ModelError>;
