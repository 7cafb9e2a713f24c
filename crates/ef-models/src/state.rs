//! State vectors of compartment fractions.

use crate::compartment::Compartment;
use crate::error::{ModelError, ModelResult};
use crate::model::ModelKind;
use ef_core::{ensure_finite, ensure_positive};
use nalgebra::DVector;

/// Slack allowed on the unit sum when validating user-supplied states.
const SUM_SLACK: f64 = 1e-9;

/// Fractions of the population in each modeled compartment.
///
/// The Recovered compartment is implicit: `recovered() = 1 - total()`.
/// A state never changes once produced; integration creates new ones.
#[derive(Clone, Debug, PartialEq)]
pub struct StateVector {
    kind: ModelKind,
    values: DVector<f64>,
}

impl StateVector {
    /// Validated constructor: right length, finite, non-negative, sum <= 1.
    pub fn new(kind: ModelKind, values: Vec<f64>) -> ModelResult<Self> {
        if values.len() != kind.len() {
            return Err(ModelError::StateLength {
                model: kind,
                expected: kind.len(),
                got: values.len(),
            });
        }
        for (c, v) in kind.compartments().iter().zip(&values) {
            ensure_finite(*v, "state fraction")?;
            if *v < 0.0 {
                return Err(ModelError::InvalidState {
                    what: format!("{c} fraction is negative ({v})"),
                });
            }
        }
        let total: f64 = values.iter().sum();
        if total > 1.0 + SUM_SLACK {
            return Err(ModelError::InvalidState {
                what: format!("compartments sum to {total} > 1"),
            });
        }
        Ok(Self::raw(kind, DVector::from_vec(values)))
    }

    /// Seed some compartments; Susceptible takes the remainder.
    ///
    /// A `Recovered` seed is allowed and only reduces the remainder. Each
    /// compartment may be seeded once.
    pub fn from_seeds(kind: ModelKind, seeds: &[(Compartment, f64)]) -> ModelResult<Self> {
        ensure_distinct(seeds.iter().map(|(c, _)| *c))?;
        let mut values = vec![0.0; kind.len()];
        let mut seeded = 0.0;
        for (c, v) in seeds {
            match (*c, kind.index_of(*c)) {
                (Compartment::Susceptible, _) => {
                    return Err(ModelError::InvalidState {
                        what: "susceptible is the remainder and cannot be seeded".to_string(),
                    });
                }
                (Compartment::Recovered, _) => {}
                (_, Some(idx)) => values[idx] = *v,
                (_, None) => {
                    return Err(ModelError::InvalidState {
                        what: format!("{kind} model has no {c} compartment"),
                    });
                }
            }
            seeded += v;
        }
        values[0] = 1.0 - seeded;
        Self::new(kind, values)
    }

    /// Seed from absolute counts in a population of `population`.
    pub fn from_counts(
        kind: ModelKind,
        counts: &[(Compartment, f64)],
        population: f64,
    ) -> ModelResult<Self> {
        ensure_positive(population, "population")?;
        let fractions: Vec<(Compartment, f64)> =
            counts.iter().map(|(c, n)| (*c, n / population)).collect();
        Self::from_seeds(kind, &fractions)
    }

    /// Unchecked constructor for states produced by integration.
    pub fn raw(kind: ModelKind, values: DVector<f64>) -> Self {
        debug_assert_eq!(values.len(), kind.len());
        Self { kind, values }
    }

    pub fn kind(&self) -> ModelKind {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        self.values.as_slice()
    }

    pub fn vector(&self) -> &DVector<f64> {
        &self.values
    }

    /// Fraction in `compartment`, including the implicit Recovered one.
    pub fn get(&self, compartment: Compartment) -> Option<f64> {
        if compartment == Compartment::Recovered {
            return Some(self.recovered());
        }
        self.kind.index_of(compartment).map(|idx| self.values[idx])
    }

    /// Sum of the modeled compartments.
    pub fn total(&self) -> f64 {
        self.values.sum()
    }

    pub fn recovered(&self) -> f64 {
        1.0 - self.total()
    }

    /// Fraction ever confirmed: everything past Susceptible, Exposed and
    /// Waiting.
    pub fn cumulative_cases(&self) -> f64 {
        let pre: f64 = self
            .kind
            .compartments()
            .iter()
            .zip(self.values.iter())
            .filter(|(c, _)| c.is_pre_confirmed())
            .map(|(_, v)| v)
            .sum();
        1.0 - pre
    }

    pub fn is_finite(&self) -> bool {
        self.values.iter().all(|v| v.is_finite())
    }

    /// Describe the first bound violated beyond `tol`, if any.
    pub fn bound_violation(&self, tol: f64) -> Option<String> {
        for (c, v) in self.kind.compartments().iter().zip(self.values.iter()) {
            if *v < -tol {
                return Some(format!("{c} fraction {v} is negative"));
            }
        }
        let total = self.total();
        if total > 1.0 + tol {
            return Some(format!("compartments sum to {total} > 1"));
        }
        None
    }

    /// Absolute counts for every modeled compartment plus Recovered last.
    pub fn to_counts(&self, population: f64) -> Vec<f64> {
        self.values
            .iter()
            .copied()
            .chain(std::iter::once(self.recovered()))
            .map(|v| v * population)
            .collect()
    }
}

/// Reject a compartment named more than once in one seeding.
pub fn ensure_distinct(compartments: impl IntoIterator<Item = Compartment>) -> ModelResult<()> {
    let mut seen = Vec::new();
    for c in compartments {
        if seen.contains(&c) {
            return Err(ModelError::InvalidState {
                what: format!("{c} is seeded more than once"),
            });
        }
        seen.push(c);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_validates_length_sign_and_sum() {
        assert!(StateVector::new(ModelKind::Seir, vec![0.9, 0.05, 0.05]).is_ok());
        assert!(matches!(
            StateVector::new(ModelKind::Seir, vec![0.9, 0.1]),
            Err(ModelError::StateLength { .. })
        ));
        assert!(StateVector::new(ModelKind::Seir, vec![1.1, -0.05, -0.05]).is_err());
        assert!(StateVector::new(ModelKind::Seir, vec![0.9, 0.2, 0.1]).is_err());
        assert!(StateVector::new(ModelKind::Sir, vec![f64::NAN, 0.0]).is_err());
    }

    #[test]
    fn from_counts_lockdown_scenario() {
        let pop = 3.3e8;
        let x = StateVector::from_counts(
            ModelKind::Seir,
            &[
                (Compartment::Infected, 25_000.0),
                (Compartment::Exposed, 75_000.0),
            ],
            pop,
        )
        .unwrap();
        assert!((x.get(Compartment::Infected).unwrap() - 25_000.0 / pop).abs() < 1e-18);
        assert!((x.get(Compartment::Exposed).unwrap() - 75_000.0 / pop).abs() < 1e-18);
        assert!((x.total() - 1.0).abs() < 1e-15);
        assert!(StateVector::from_counts(ModelKind::Seir, &[], 0.0).is_err());
    }

    #[test]
    fn seeds_reject_missing_compartments() {
        let err = StateVector::from_seeds(ModelKind::Sir, &[(Compartment::Exposed, 0.1)]);
        assert!(err.is_err());
        let x = StateVector::from_seeds(
            ModelKind::Sir,
            &[(Compartment::Infected, 0.1), (Compartment::Recovered, 0.2)],
        )
        .unwrap();
        assert!((x.recovered() - 0.2).abs() < 1e-15);
        assert!((x.get(Compartment::Susceptible).unwrap() - 0.7).abs() < 1e-15);
    }

    #[test]
    fn seeding_a_compartment_twice_is_rejected() {
        let err = StateVector::from_seeds(
            ModelKind::Sir,
            &[(Compartment::Infected, 0.1), (Compartment::Infected, 0.1)],
        )
        .unwrap_err();
        assert!(matches!(err, ModelError::InvalidState { .. }));
        assert!(
            StateVector::from_seeds(
                ModelKind::Sir,
                &[(Compartment::Recovered, 0.1), (Compartment::Recovered, 0.1)],
            )
            .is_err()
        );
    }

    #[test]
    fn cumulative_cases_excludes_pre_confirmed() {
        let x = StateVector::new(ModelKind::SewirF, vec![0.5, 0.1, 0.1, 0.2, 0.05]).unwrap();
        assert!((x.cumulative_cases() - 0.3).abs() < 1e-15);
        assert!((x.recovered() - 0.05).abs() < 1e-15);
    }

    #[test]
    fn counts_append_recovered() {
        let x = StateVector::new(ModelKind::Sir, vec![0.5, 0.25]).unwrap();
        assert_eq!(x.to_counts(100.0), vec![50.0, 25.0, 25.0]);
    }

    #[test]
    fn bound_violation_reports_negative() {
        let x = StateVector::raw(ModelKind::Sir, DVector::from_vec(vec![1.0, -1e-3]));
        assert!(x.bound_violation(1e-6).is_some());
        assert!(x.bound_violation(1e-2).is_none());
    }
}
