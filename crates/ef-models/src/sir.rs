//! SIR law (CovsirPhy form, rates per tau).
//!
//! ```text
//! dS = -rho S I
//! dI =  rho S I - sigma I
//! dR =  sigma I
//! ```

use crate::error::ModelResult;
use crate::law::{CompartmentLaw, Derivative, check_known};
use crate::model::ModelKind;
use crate::params::{ParameterSet, non_negative, positive};
use nalgebra::DVector;

#[derive(Clone, Debug, PartialEq)]
pub struct Sir {
    pub rho: f64,
    pub sigma: f64,
}

impl CompartmentLaw for Sir {
    const KIND: ModelKind = ModelKind::Sir;
    const TRANSMISSION: &'static str = "rho";
    const NAMES: &'static [&'static str] = &["rho", "sigma"];

    fn example() -> Self {
        Self {
            rho: 0.2,
            sigma: 0.075,
        }
    }

    fn from_parameters(params: &ParameterSet) -> ModelResult<Self> {
        check_known(Self::KIND, params, Self::NAMES)?;
        Ok(Self {
            rho: non_negative(params, Self::KIND, "rho")?,
            sigma: positive(params, Self::KIND, "sigma")?,
        })
    }

    fn parameters(&self) -> ParameterSet {
        ParameterSet::new()
            .with("rho", self.rho)
            .with("sigma", self.sigma)
    }

    fn transmission(&self) -> f64 {
        self.rho
    }

    fn rates(&self, x: &[f64], rho: f64) -> Derivative {
        let (s, i) = (x[0], x[1]);
        let infections = rho * s * i;
        let recoveries = self.sigma * i;
        Derivative {
            rates: DVector::from_vec(vec![-infections, infections - recoveries]),
            recovered: recoveries,
        }
    }

    fn reproduction_number(&self, rho: f64) -> f64 {
        rho / self.sigma
    }

    fn residence_rates(&self) -> Vec<(&'static str, f64)> {
        let mut out = vec![("sigma", self.sigma)];
        if self.rho > 0.0 {
            out.insert(0, ("rho", self.rho));
        }
        out
    }
}
