//! Named rate sets.

use crate::error::{ModelError, ModelResult};
use crate::model::ModelKind;
use ef_core::{CoreResult, ensure_non_negative};
use std::collections::BTreeMap;

/// Mapping from parameter name to value, constant for one phase.
///
/// Ordered by name so iteration and formatting are deterministic.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParameterSet {
    values: BTreeMap<String, f64>,
}

impl ParameterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: f64) -> Self {
        self.values.insert(name.into(), value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: f64) -> Option<f64> {
        self.values.insert(name.into(), value)
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Value of a rate the model cannot run without.
    pub fn require(&self, model: ModelKind, name: &'static str) -> ModelResult<f64> {
        self.get(name)
            .ok_or(ModelError::MissingParameter { model, name })
    }

    /// Copy of `self` with every entry of `overrides` applied on top.
    pub fn merged(&self, overrides: &ParameterSet) -> Self {
        let mut values = self.values.clone();
        for (k, v) in &overrides.values {
            values.insert(k.clone(), *v);
        }
        Self { values }
    }

    /// Copy of `self` with `name` multiplied by `ratio`.
    ///
    /// Used to re-derive a rate from a behavioural ratio, e.g.
    /// `rho_after = rho_before * go_out_after / go_out_before`.
    pub fn with_scaled(&self, name: &str, ratio: f64) -> ModelResult<Self> {
        let current = self.get(name).ok_or_else(|| ModelError::UnsetParameter {
            name: name.to_string(),
        })?;
        ensure_non_negative(ratio, "scale ratio")?;
        Ok(self.clone().with(name, current * ratio))
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for ParameterSet {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// Checked accessors used by the laws.
pub(crate) fn positive(params: &ParameterSet, model: ModelKind, name: &'static str) -> ModelResult<f64> {
    let v = params.require(model, name)?;
    checked(name, ef_core::ensure_positive(v, name))
}

pub(crate) fn non_negative(
    params: &ParameterSet,
    model: ModelKind,
    name: &'static str,
) -> ModelResult<f64> {
    let v = params.require(model, name)?;
    checked(name, ensure_non_negative(v, name))
}

pub(crate) fn fraction(params: &ParameterSet, model: ModelKind, name: &'static str) -> ModelResult<f64> {
    let v = params.require(model, name)?;
    checked(name, ef_core::ensure_fraction(v, name))
}

fn checked(name: &'static str, result: CoreResult<f64>) -> ModelResult<f64> {
    result.map_err(|source| ModelError::InvalidParameter {
        name: name.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merged_overrides_only_named_entries() {
        let base = ParameterSet::new().with("rho", 0.2).with("sigma", 0.075);
        let over = ParameterSet::new().with("rho", 0.1);
        let merged = base.merged(&over);
        assert_eq!(merged.get("rho"), Some(0.1));
        assert_eq!(merged.get("sigma"), Some(0.075));
        assert_eq!(base.get("rho"), Some(0.2));
    }

    #[test]
    fn with_scaled_applies_ratio() {
        let base = ParameterSet::new().with("rho", 0.2);
        let scaled = base.with_scaled("rho", 0.5).unwrap();
        assert!((scaled.get("rho").unwrap() - 0.1).abs() < 1e-15);
        assert!(base.with_scaled("kappa", 0.5).is_err());
        assert!(base.with_scaled("rho", -1.0).is_err());
    }

    #[test]
    fn require_reports_model_and_name() {
        let err = ParameterSet::new()
            .require(ModelKind::SirF, "kappa")
            .unwrap_err();
        assert_eq!(err.to_string(), "Missing parameter 'kappa' for SIR-F model");
    }

    #[test]
    fn checked_accessors() {
        let p = ParameterSet::new()
            .with("a", 0.5)
            .with("b", 0.0)
            .with("c", 1.5);
        assert!(positive(&p, ModelKind::Sir, "a").is_ok());
        assert!(positive(&p, ModelKind::Sir, "b").is_err());
        assert!(non_negative(&p, ModelKind::Sir, "b").is_ok());
        assert!(fraction(&p, ModelKind::Sir, "c").is_err());
    }

    #[test]
    fn iteration_is_sorted_by_name() {
        let p: ParameterSet = [("sigma", 1.0), ("kappa", 2.0), ("rho", 3.0)]
            .into_iter()
            .collect();
        let names: Vec<&str> = p.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["kappa", "rho", "sigma"]);
    }
}
