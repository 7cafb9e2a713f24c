//! ef-core: stable foundation for epiflow.
//!
//! Contains:
//! - numeric (Real + tolerances + float checks)
//! - units (uom time types + tau conversion)
//! - error (shared error types)

pub mod error;
pub mod numeric;
pub mod units;

// Re-exports: nice ergonomics for downstream crates
pub use error::{CoreError, CoreResult};
pub use numeric::*;
pub use units::Tau;
