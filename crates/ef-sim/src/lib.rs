//! Deterministic simulation core for compartmental epidemic models.
//!
//! Provides:
//! - `TransientModel` trait: pure right-hand side + state arithmetic
//! - Adaptive Dormand-Prince 5(4), fixed-step RK4 and forward Euler
//! - Integration over a strictly increasing `TimeGrid` into a `Trajectory`
//! - Phase plans: contiguous phases with their own parameters, chained
//!   end-state to start-state and concatenated into one trajectory
//! - Incremental recomposition after a phase edit and parallel sweeps

pub mod compose;
pub mod error;
pub mod grid;
pub mod integrator;
pub mod model;
pub mod phase;
pub mod sim;
pub mod sweep;
pub mod trajectory;

// Re-exports for public API
pub use compose::{Composition, PhaseSegment, compose, recompose};
pub use error::{ErrorKind, SimError, SimResult};
pub use grid::TimeGrid;
pub use integrator::{DormandPrince, ForwardEuler, Integrator, RK4, StepStats};
pub use model::{PhaseModel, TransientModel};
pub use phase::{
    ParameterUpdate, Phase, PhaseDef, PhaseEnd, PhasePlan, PhasePlanBuilder, PhaseSummary,
};
pub use sim::{IntegratorType, SimOptions, SimRecord, integrate};
pub use sweep::{mitigation_sweep, sweep, transmission_sweep};
pub use trajectory::{Peak, Trajectory};
