//! ef-models: compartment model library for epidemic simulation.
//!
//! Provides:
//! - Compartments and the `StateVector` of population fractions
//! - Named rate sets (`ParameterSet`) and transmission sources
//!   (`ParameterSource`: constant or time-varying)
//! - Derivative laws for the SEIR, SIR, SIR-F and SEWIR-F variants
//! - Reproduction number and residence-time calculations
//!
//! Every law is a pure function of state, time and parameters. The
//! Recovered compartment is never stored; it is the complement of the
//! modeled compartments and its derivative is reported alongside the others
//! so conservation can be checked.
//!
//! # Example
//!
//! ```
//! use ef_models::{Model, ModelKind, ParameterSource, StateVector};
//!
//! let kind = ModelKind::Seir;
//! let model = Model::compile(kind, &kind.example_parameters()).unwrap();
//! let x0 = StateVector::new(kind, vec![1.0 - 5e-7, 4e-7, 1e-7]).unwrap();
//! let source = ParameterSource::constant(1.6).unwrap();
//!
//! let dx = model.derivative(0.0, &x0, &source).unwrap();
//! assert!(dx.conservation_residual().abs() < 1e-15);
//! ```

pub mod adjust;
pub mod compartment;
pub mod error;
pub mod law;
pub mod model;
pub mod params;
pub mod seir;
pub mod sewir_f;
pub mod sir;
pub mod sir_f;
pub mod source;
pub mod state;

// Re-exports
pub use compartment::Compartment;
pub use error::{ModelError, ModelResult};
pub use law::{CompartmentLaw, Derivative};
pub use model::{Model, ModelKind};
pub use params::ParameterSet;
pub use seir::Seir;
pub use sewir_f::SewirF;
pub use sir::Sir;
pub use sir_f::SirF;
pub use source::{ParameterSource, TimeFn};
pub use state::StateVector;
