//! SEWIR-F law: SIR-F with exposed and waiting stages before confirmation.
//!
//! ```text
//! dS = -rho1 S (W + I)
//! dE =  rho1 S (W + I) - rho2 E
//! dW =  rho2 E - rho3 W
//! dI =  rho3 (1 - theta) W - (sigma + kappa) I
//! dF =  rho3 theta W + kappa I
//! dR =  sigma I
//! ```

use crate::error::ModelResult;
use crate::law::{CompartmentLaw, Derivative, check_known};
use crate::model::ModelKind;
use crate::params::{ParameterSet, fraction, non_negative, positive};
use nalgebra::DVector;

#[derive(Clone, Debug, PartialEq)]
pub struct SewirF {
    pub rho1: f64,
    pub rho2: f64,
    pub rho3: f64,
    pub sigma: f64,
    pub kappa: f64,
    pub theta: f64,
}

impl CompartmentLaw for SewirF {
    const KIND: ModelKind = ModelKind::SewirF;
    const TRANSMISSION: &'static str = "rho1";
    const NAMES: &'static [&'static str] = &["rho1", "rho2", "rho3", "sigma", "kappa", "theta"];

    fn example() -> Self {
        Self {
            rho1: 0.2,
            rho2: 0.167,
            rho3: 0.167,
            sigma: 0.075,
            kappa: 0.005,
            theta: 0.002,
        }
    }

    fn from_parameters(params: &ParameterSet) -> ModelResult<Self> {
        check_known(Self::KIND, params, Self::NAMES)?;
        Ok(Self {
            rho1: non_negative(params, Self::KIND, "rho1")?,
            rho2: positive(params, Self::KIND, "rho2")?,
            rho3: positive(params, Self::KIND, "rho3")?,
            sigma: positive(params, Self::KIND, "sigma")?,
            kappa: non_negative(params, Self::KIND, "kappa")?,
            theta: fraction(params, Self::KIND, "theta")?,
        })
    }

    fn parameters(&self) -> ParameterSet {
        ParameterSet::new()
            .with("rho1", self.rho1)
            .with("rho2", self.rho2)
            .with("rho3", self.rho3)
            .with("sigma", self.sigma)
            .with("kappa", self.kappa)
            .with("theta", self.theta)
    }

    fn transmission(&self) -> f64 {
        self.rho1
    }

    fn rates(&self, x: &[f64], rho1: f64) -> Derivative {
        let (s, e, w, i) = (x[0], x[1], x[2], x[3]);
        let infections = rho1 * s * (w + i);
        let latent_exits = self.rho2 * e;
        let waiting_exits = self.rho3 * w;
        let recoveries = self.sigma * i;
        let deaths = self.kappa * i;
        Derivative {
            rates: DVector::from_vec(vec![
                -infections,
                infections - latent_exits,
                latent_exits - waiting_exits,
                (1.0 - self.theta) * waiting_exits - recoveries - deaths,
                self.theta * waiting_exits + deaths,
            ]),
            recovered: recoveries,
        }
    }

    fn reproduction_number(&self, rho1: f64) -> f64 {
        rho1 * (1.0 - self.theta) / (self.sigma + self.kappa)
    }

    fn residence_rates(&self) -> Vec<(&'static str, f64)> {
        [
            ("rho1", self.rho1),
            ("rho2", self.rho2),
            ("rho3", self.rho3),
            ("sigma", self.sigma),
            ("kappa", self.kappa),
        ]
        .into_iter()
        .filter(|(_, r)| *r > 0.0)
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn waiting_stage_feeds_infected() {
        let d = SewirF::example().rates(&[0.9, 0.0, 0.05, 0.0, 0.0], 0.2);
        assert!(d.rates[3] > 0.0);
        assert!(d.rates[4] > 0.0);
        assert!(d.conservation_residual().abs() < 1e-15);
    }

    #[test]
    fn typo_in_name_is_caught() {
        // "eho3" instead of "rho3"
        let params = SewirF::example().parameters().with("eho3", 0.1);
        let err = SewirF::from_parameters(&params).unwrap_err();
        assert!(err.to_string().contains("eho3"));
    }
}
