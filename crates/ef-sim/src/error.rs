//! Error types for simulation operations.

use ef_models::ModelError;
use thiserror::Error;

/// Errors encountered while planning or running a simulation.
///
/// Every error is fatal for the run that raised it; nothing is retried at
/// this layer.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimError {
    #[error("Configuration error: {what}")]
    Configuration { what: String },

    #[error("Phase {phase} is invalid: {source}")]
    InvalidPhase {
        phase: usize,
        #[source]
        source: ModelError,
    },

    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("Transmission rate {value} is invalid in phase {phase} at t={t}")]
    InvalidRate { phase: usize, t: f64, value: f64 },

    #[error("Numerical instability in phase {phase} at t={t}: {what}")]
    NumericalInstability { phase: usize, t: f64, what: String },

    #[error("Step limit of {max_steps} reached in phase {phase} at t={t}")]
    StepLimit {
        phase: usize,
        t: f64,
        max_steps: usize,
    },

    #[error("Invariant violated in phase {phase} at t={t}: {what}")]
    InvariantViolation { phase: usize, t: f64, what: String },
}

pub type SimResult<T> = Result<T, SimError>;

/// Coarse classification of `SimError`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Rejected before (or instead of) integrating: bad inputs.
    Configuration,
    /// The integrator produced non-finite values or could not make progress.
    NumericalInstability,
    /// A conservation or bound check failed: a law is wrong.
    InvariantViolation,
}

impl SimError {
    pub(crate) fn config(what: impl Into<String>) -> Self {
        SimError::Configuration { what: what.into() }
    }

    pub(crate) fn instability(t: f64, what: impl Into<String>) -> Self {
        SimError::NumericalInstability {
            phase: 0,
            t,
            what: what.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            SimError::Configuration { .. }
            | SimError::InvalidPhase { .. }
            | SimError::Model(_)
            | SimError::InvalidRate { .. } => ErrorKind::Configuration,
            SimError::NumericalInstability { .. } | SimError::StepLimit { .. } => {
                ErrorKind::NumericalInstability
            }
            SimError::InvariantViolation { .. } => ErrorKind::InvariantViolation,
        }
    }

    /// Phase index carried by run-time errors.
    pub fn phase(&self) -> Option<usize> {
        match self {
            SimError::InvalidPhase { phase, .. }
            | SimError::InvalidRate { phase, .. }
            | SimError::NumericalInstability { phase, .. }
            | SimError::StepLimit { phase, .. }
            | SimError::InvariantViolation { phase, .. } => Some(*phase),
            SimError::Configuration { .. } | SimError::Model(_) => None,
        }
    }

    /// Offending simulation time carried by run-time errors.
    pub fn time(&self) -> Option<f64> {
        match self {
            SimError::InvalidRate { t, .. }
            | SimError::NumericalInstability { t, .. }
            | SimError::StepLimit { t, .. }
            | SimError::InvariantViolation { t, .. } => Some(*t),
            _ => None,
        }
    }

    /// Attach the phase index to a run-time error raised by the integrator.
    pub fn in_phase(self, index: usize) -> Self {
        match self {
            SimError::InvalidRate { t, value, .. } => SimError::InvalidRate {
                phase: index,
                t,
                value,
            },
            SimError::NumericalInstability { t, what, .. } => SimError::NumericalInstability {
                phase: index,
                t,
                what,
            },
            SimError::StepLimit { t, max_steps, .. } => SimError::StepLimit {
                phase: index,
                t,
                max_steps,
            },
            SimError::InvariantViolation { t, what, .. } => SimError::InvariantViolation {
                phase: index,
                t,
                what,
            },
            other => other,
        }
    }
}
