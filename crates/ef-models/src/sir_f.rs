//! SIR-F law: SIR with a fatal outflow before and after confirmation.
//!
//! ```text
//! dS = -rho S I
//! dI =  rho (1 - theta) S I - (sigma + kappa) I
//! dF =  rho theta S I + kappa I
//! dR =  sigma I
//! ```
//!
//! `theta` is the fraction of new cases that die before being confirmed,
//! `kappa` the mortality rate of confirmed cases.

use crate::error::ModelResult;
use crate::law::{CompartmentLaw, Derivative, check_known};
use crate::model::ModelKind;
use crate::params::{ParameterSet, fraction, non_negative, positive};
use nalgebra::DVector;

#[derive(Clone, Debug, PartialEq)]
pub struct SirF {
    pub rho: f64,
    pub sigma: f64,
    pub kappa: f64,
    pub theta: f64,
}

impl CompartmentLaw for SirF {
    const KIND: ModelKind = ModelKind::SirF;
    const TRANSMISSION: &'static str = "rho";
    const NAMES: &'static [&'static str] = &["rho", "sigma", "kappa", "theta"];

    fn example() -> Self {
        Self {
            rho: 0.2,
            sigma: 0.075,
            kappa: 0.005,
            theta: 0.002,
        }
    }

    fn from_parameters(params: &ParameterSet) -> ModelResult<Self> {
        check_known(Self::KIND, params, Self::NAMES)?;
        Ok(Self {
            rho: non_negative(params, Self::KIND, "rho")?,
            sigma: positive(params, Self::KIND, "sigma")?,
            kappa: non_negative(params, Self::KIND, "kappa")?,
            theta: fraction(params, Self::KIND, "theta")?,
        })
    }

    fn parameters(&self) -> ParameterSet {
        ParameterSet::new()
            .with("rho", self.rho)
            .with("sigma", self.sigma)
            .with("kappa", self.kappa)
            .with("theta", self.theta)
    }

    fn transmission(&self) -> f64 {
        self.rho
    }

    fn rates(&self, x: &[f64], rho: f64) -> Derivative {
        let (s, i) = (x[0], x[1]);
        let infections = rho * s * i;
        let recoveries = self.sigma * i;
        let deaths = self.kappa * i;
        Derivative {
            rates: DVector::from_vec(vec![
                -infections,
                (1.0 - self.theta) * infections - recoveries - deaths,
                self.theta * infections + deaths,
            ]),
            recovered: recoveries,
        }
    }

    fn reproduction_number(&self, rho: f64) -> f64 {
        rho * (1.0 - self.theta) / (self.sigma + self.kappa)
    }

    fn residence_rates(&self) -> Vec<(&'static str, f64)> {
        [("rho", self.rho), ("sigma", self.sigma), ("kappa", self.kappa)]
            .into_iter()
            .filter(|(_, r)| *r > 0.0)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn example_r0_matches_closed_form() {
        let law = SirF::example();
        let expected = 0.2 * (1.0 - 0.002) / (0.075 + 0.005);
        assert!((law.reproduction_number(0.2) - expected).abs() < 1e-12);
    }

    #[test]
    fn fatal_only_grows() {
        let d = SirF::example().rates(&[0.6, 0.1, 0.01], 0.2);
        assert!(d.rates[2] > 0.0);
        assert!(d.conservation_residual().abs() < 1e-15);
    }

    #[test]
    fn theta_outside_unit_interval_is_rejected() {
        let params = SirF::example().parameters().with("theta", 1.5);
        assert!(SirF::from_parameters(&params).is_err());
    }
}
