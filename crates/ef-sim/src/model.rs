//! TransientModel trait for pluggable dynamic systems.

use crate::error::{SimError, SimResult};
use ef_models::{Model, ModelError, ParameterSource, StateVector};

/// Trait for transient (dynamic) system models.
///
/// A TransientModel must implement:
/// - State type (Clone, for snapshots)
/// - RHS (right-hand side) computation: x_dot = f(t, x)
/// - Vector arithmetic for integration: add states, scale by scalar
/// - Component view used for error norms and finiteness checks
///
/// `rhs` takes `&self`: evaluation must not depend on call history.
pub trait TransientModel {
    /// State type (must be Clone).
    type State: Clone;

    /// Compute state derivative dxdt = f(t, x).
    fn rhs(&self, t: f64, x: &Self::State) -> SimResult<Self::State>;

    /// Add two states element-wise: result = a + b.
    fn add(&self, a: &Self::State, b: &Self::State) -> Self::State;

    /// Scale a state by a scalar: result = scale * a.
    fn scale(&self, a: &Self::State, scale: f64) -> Self::State;

    /// Flat view of a state's components.
    fn components<'a>(&self, x: &'a Self::State) -> &'a [f64];

    /// Check model-specific invariants at a recorded point.
    fn check_invariants(&self, _t: f64, _x: &Self::State, _tol: f64) -> SimResult<()> {
        Ok(())
    }
}

/// One phase's dynamics: a compiled model plus its transmission source.
#[derive(Clone, Copy, Debug)]
pub struct PhaseModel<'a> {
    model: &'a Model,
    source: &'a ParameterSource,
}

impl<'a> PhaseModel<'a> {
    pub fn new(model: &'a Model, source: &'a ParameterSource) -> Self {
        Self { model, source }
    }

    pub fn model(&self) -> &'a Model {
        self.model
    }

    pub fn source(&self) -> &'a ParameterSource {
        self.source
    }

    fn derivative(&self, t: f64, x: &StateVector) -> SimResult<ef_models::Derivative> {
        let d = self
            .model
            .derivative(t, x, self.source)
            .map_err(|e| match e {
                ModelError::InvalidRate { t, value } if !value.is_finite() => {
                    SimError::instability(t, format!("transmission source returned {value}"))
                }
                ModelError::InvalidRate { t, value } => SimError::InvalidRate { phase: 0, t, value },
                other => SimError::Model(other),
            })?;
        if !d.is_finite() {
            return Err(SimError::instability(t, "non-finite derivative"));
        }
        Ok(d)
    }
}

impl TransientModel for PhaseModel<'_> {
    type State = StateVector;

    fn rhs(&self, t: f64, x: &StateVector) -> SimResult<StateVector> {
        let d = self.derivative(t, x)?;
        Ok(StateVector::raw(x.kind(), d.rates))
    }

    fn add(&self, a: &StateVector, b: &StateVector) -> StateVector {
        StateVector::raw(a.kind(), a.vector() + b.vector())
    }

    fn scale(&self, a: &StateVector, scale: f64) -> StateVector {
        StateVector::raw(a.kind(), a.vector() * scale)
    }

    fn components<'s>(&self, x: &'s StateVector) -> &'s [f64] {
        x.as_slice()
    }

    fn check_invariants(&self, t: f64, x: &StateVector, tol: f64) -> SimResult<()> {
        if let Some(what) = x.bound_violation(tol) {
            return Err(SimError::InvariantViolation { phase: 0, t, what });
        }
        let residual = self.derivative(t, x)?.conservation_residual();
        if residual.abs() > tol {
            return Err(SimError::InvariantViolation {
                phase: 0,
                t,
                what: format!("derivatives sum to {residual:e} instead of 0"),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ef_models::ModelKind;

    #[test]
    fn rhs_matches_model_law() {
        let kind = ModelKind::SirF;
        let model = Model::compile(kind, &kind.example_parameters()).unwrap();
        let source = model.default_source();
        let pm = PhaseModel::new(&model, &source);
        let x = kind.example_state().unwrap();
        let dx = pm.rhs(0.0, &x).unwrap();
        let expected = model.rates(x.as_slice(), 0.2);
        assert_eq!(dx.vector(), &expected.rates);
    }

    #[test]
    fn invalid_rate_is_reported_with_time() {
        let kind = ModelKind::Seir;
        let model = Model::compile(kind, &kind.example_parameters()).unwrap();
        let source = ParameterSource::from_fn("negative", |_| -1.0);
        let pm = PhaseModel::new(&model, &source);
        let err = pm.rhs(4.0, &kind.example_state().unwrap()).unwrap_err();
        assert!(matches!(err, SimError::InvalidRate { t, value, .. } if t == 4.0 && value == -1.0));
    }

    #[test]
    fn arithmetic_keeps_kind() {
        let kind = ModelKind::Sir;
        let model = Model::compile(kind, &kind.example_parameters()).unwrap();
        let source = model.default_source();
        let pm = PhaseModel::new(&model, &source);
        let x = StateVector::new(kind, vec![0.5, 0.25]).unwrap();
        let y = pm.add(&x, &pm.scale(&x, 2.0));
        assert_eq!(y.kind(), kind);
        assert_eq!(y.as_slice(), &[1.5, 0.75]);
    }
}
