//! Every law conserves population: the derivatives of the modeled
//! compartments and of the implicit Recovered compartment sum to zero.

use ef_models::{Model, ModelKind, ParameterSource, StateVector};
use proptest::prelude::*;

fn state_for(kind: ModelKind, raw: &[f64]) -> StateVector {
    // Normalize into a valid state leaving some room for Recovered.
    let n = kind.len();
    let weights: Vec<f64> = raw.iter().take(n).map(|w| w + 1e-3).collect();
    let sum: f64 = weights.iter().sum::<f64>() * 1.25;
    StateVector::new(kind, weights.iter().map(|w| w / sum).collect()).unwrap()
}

proptest! {
    #[test]
    fn derivatives_sum_to_zero(
        raw in prop::collection::vec(0.0_f64..1.0, 5),
        transmission in 0.0_f64..5.0,
        t in 0.0_f64..500.0,
    ) {
        for kind in ModelKind::ALL {
            let model = Model::compile(kind, &kind.example_parameters()).unwrap();
            let x = state_for(kind, &raw);
            let source = ParameterSource::constant(transmission).unwrap();
            let d = model.derivative(t, &x, &source).unwrap();
            prop_assert!(d.is_finite());
            prop_assert!(d.conservation_residual().abs() < 1e-12);
        }
    }

    #[test]
    fn susceptible_never_increases(
        raw in prop::collection::vec(0.0_f64..1.0, 5),
        transmission in 0.0_f64..5.0,
    ) {
        for kind in ModelKind::ALL {
            let model = Model::compile(kind, &kind.example_parameters()).unwrap();
            let x = state_for(kind, &raw);
            let d = model.rates(x.as_slice(), transmission);
            prop_assert!(d.rates[0] <= 0.0);
        }
    }
}

#[test]
fn time_varying_source_is_evaluated_at_t() {
    let kind = ModelKind::Seir;
    let model = Model::compile(kind, &kind.example_parameters()).unwrap();
    let x = kind.example_state().unwrap();
    let step = ParameterSource::step(0.5, 2.0, 30.0).unwrap();

    let early = model.derivative(10.0, &x, &step).unwrap();
    let late = model.derivative(40.0, &x, &step).unwrap();
    let low = model.rates(x.as_slice(), 0.5);
    let high = model.rates(x.as_slice(), 2.0);

    assert_eq!(early, low);
    assert_eq!(late, high);
}

#[test]
fn negative_time_varying_rate_is_an_error() {
    let kind = ModelKind::SirF;
    let model = Model::compile(kind, &kind.example_parameters()).unwrap();
    let x = kind.example_state().unwrap();
    let source = ParameterSource::from_fn("falls below zero", |t| 0.2 - 0.01 * t);
    assert!(model.derivative(10.0, &x, &source).is_ok());
    assert!(model.derivative(30.0, &x, &source).is_err());
}
