//! SEIR law driven by a reproduction number.
//!
//! The transmission rate is derived from R0: `beta = R0 * gamma`.
//!
//! ```text
//! dS = -beta S I
//! dE =  beta S I - sigma E
//! dI =  sigma E - gamma I
//! dR =  gamma I
//! ```

use crate::error::ModelResult;
use crate::law::{CompartmentLaw, Derivative, check_known};
use crate::model::ModelKind;
use crate::params::{ParameterSet, non_negative, positive};
use nalgebra::DVector;

#[derive(Clone, Debug, PartialEq)]
pub struct Seir {
    /// Reproduction number used when no time-varying source is given.
    pub r0: f64,
    /// Recovery rate (1 / infectious period).
    pub gamma: f64,
    /// Incubation rate (1 / incubation period).
    pub sigma: f64,
}

impl CompartmentLaw for Seir {
    const KIND: ModelKind = ModelKind::Seir;
    const TRANSMISSION: &'static str = "r0";
    const NAMES: &'static [&'static str] = &["r0", "gamma", "sigma"];

    fn example() -> Self {
        Self {
            r0: 1.6,
            gamma: 1.0 / 18.0,
            sigma: 1.0 / 5.2,
        }
    }

    fn from_parameters(params: &ParameterSet) -> ModelResult<Self> {
        check_known(Self::KIND, params, Self::NAMES)?;
        Ok(Self {
            r0: non_negative(params, Self::KIND, "r0")?,
            gamma: positive(params, Self::KIND, "gamma")?,
            sigma: positive(params, Self::KIND, "sigma")?,
        })
    }

    fn parameters(&self) -> ParameterSet {
        ParameterSet::new()
            .with("r0", self.r0)
            .with("gamma", self.gamma)
            .with("sigma", self.sigma)
    }

    fn transmission(&self) -> f64 {
        self.r0
    }

    fn rates(&self, x: &[f64], r0: f64) -> Derivative {
        let (s, e, i) = (x[0], x[1], x[2]);
        let beta = r0 * self.gamma;
        let infections = beta * s * i;
        let onsets = self.sigma * e;
        let recoveries = self.gamma * i;
        Derivative {
            rates: DVector::from_vec(vec![
                -infections,
                infections - onsets,
                onsets - recoveries,
            ]),
            recovered: recoveries,
        }
    }

    fn reproduction_number(&self, r0: f64) -> f64 {
        r0
    }

    fn residence_rates(&self) -> Vec<(&'static str, f64)> {
        vec![("gamma", self.gamma), ("sigma", self.sigma)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_transmission_only_drains() {
        let law = Seir::example();
        let d = law.rates(&[0.9, 0.05, 0.05], 0.0);
        assert_eq!(d.rates[0], 0.0);
        assert!(d.rates[1] < 0.0);
        assert!(d.conservation_residual().abs() < 1e-15);
    }

    #[test]
    fn infected_grows_above_threshold() {
        let law = Seir::example();
        // Equilibrium exposure: dE = 0 means beta S I = sigma E.
        let (s, i) = (0.99, 0.001);
        let e = 1.6 * law.gamma * s * i / law.sigma;
        let d = law.rates(&[s, e, i], 1.6);
        assert!(d.rates[2] > 0.0);
    }

    #[test]
    fn rejects_unknown_and_missing() {
        let params = Seir::example().parameters().with("rho", 0.2);
        assert!(Seir::from_parameters(&params).is_err());
        let missing = ParameterSet::new().with("r0", 1.6).with("gamma", 0.1);
        assert!(Seir::from_parameters(&missing).is_err());
    }
}
