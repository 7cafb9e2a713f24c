//! Derivative law trait shared by every model variant.

use crate::error::ModelResult;
use crate::model::ModelKind;
use crate::params::ParameterSet;
use nalgebra::DVector;

/// Instantaneous rate of change of a state.
///
/// `rates` lines up with the modeled compartments of the variant;
/// `recovered` is the derivative of the implicit Recovered complement.
#[derive(Clone, Debug, PartialEq)]
pub struct Derivative {
    pub rates: DVector<f64>,
    pub recovered: f64,
}

impl Derivative {
    /// Sum of all derivatives including the implicit compartment.
    ///
    /// Zero (up to rounding) for any law that conserves population.
    pub fn conservation_residual(&self) -> f64 {
        self.rates.sum() + self.recovered
    }

    pub fn is_finite(&self) -> bool {
        self.recovered.is_finite() && self.rates.iter().all(|r| r.is_finite())
    }
}

/// Compartmental derivative law with typed parameters.
///
/// Implementations are pure: the same state, transmission value and
/// parameters always give the same derivative.
pub trait CompartmentLaw: Clone + Send + Sync {
    /// Variant this law implements.
    const KIND: ModelKind;

    /// Name of the rate that a `ParameterSource` may drive over time.
    const TRANSMISSION: &'static str;

    /// Every parameter name the variant accepts.
    const NAMES: &'static [&'static str];

    /// Preset parameter values.
    fn example() -> Self;

    /// Build typed parameters, rejecting missing, unknown or invalid rates.
    fn from_parameters(params: &ParameterSet) -> ModelResult<Self>;

    /// Named rates as a set (inverse of `from_parameters`).
    fn parameters(&self) -> ParameterSet;

    /// Constant value of the transmission parameter.
    fn transmission(&self) -> f64;

    /// Derivative at `x` (modeled compartments, variant order) for the
    /// given value of the transmission parameter.
    fn rates(&self, x: &[f64], transmission: f64) -> Derivative;

    /// Basic reproduction number for the given transmission value.
    fn reproduction_number(&self, transmission: f64) -> f64;

    /// Rates whose reciprocal is a residence time (everything but
    /// probabilities and dimensionless numbers).
    fn residence_rates(&self) -> Vec<(&'static str, f64)>;
}

/// Reject names the variant does not know about.
pub(crate) fn check_known(
    model: ModelKind,
    params: &ParameterSet,
    known: &[&'static str],
) -> ModelResult<()> {
    for (name, _) in params.iter() {
        if !known.contains(&name) {
            return Err(crate::ModelError::UnknownParameter {
                model,
                name: name.to_string(),
            });
        }
    }
    Ok(())
}
