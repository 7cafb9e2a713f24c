//! Model variants and static dispatch over their laws.

use crate::compartment::Compartment;
use crate::error::{ModelError, ModelResult};
use crate::law::{CompartmentLaw, Derivative};
use crate::params::ParameterSet;
use crate::source::ParameterSource;
use crate::state::StateVector;
use crate::{Seir, SewirF, Sir, SirF};
use core::fmt;
use core::str::FromStr;
use ef_core::Tau;

/// Compartmental model variant. A simulation run commits to exactly one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ModelKind {
    /// Susceptible, Exposed, Infected (+ implicit Recovered), driven by R0.
    Seir,
    /// Susceptible, Infected (+ implicit Recovered).
    Sir,
    /// Susceptible, Infected, Fatal (+ implicit Recovered).
    SirF,
    /// Susceptible, Exposed, Waiting, Infected, Fatal (+ implicit Recovered).
    SewirF,
}

impl ModelKind {
    pub const ALL: [ModelKind; 4] = [
        ModelKind::Seir,
        ModelKind::Sir,
        ModelKind::SirF,
        ModelKind::SewirF,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ModelKind::Seir => "SEIR",
            ModelKind::Sir => "SIR",
            ModelKind::SirF => "SIR-F",
            ModelKind::SewirF => "SEWIR-F",
        }
    }

    /// Modeled compartments in state-vector order.
    pub fn compartments(self) -> &'static [Compartment] {
        use Compartment::*;
        match self {
            ModelKind::Seir => &[Susceptible, Exposed, Infected],
            ModelKind::Sir => &[Susceptible, Infected],
            ModelKind::SirF => &[Susceptible, Infected, Fatal],
            ModelKind::SewirF => &[Susceptible, Exposed, Waiting, Infected, Fatal],
        }
    }

    pub fn len(self) -> usize {
        self.compartments().len()
    }

    pub fn index_of(self, compartment: Compartment) -> Option<usize> {
        self.compartments().iter().position(|c| *c == compartment)
    }

    pub fn transmission_parameter(self) -> &'static str {
        match self {
            ModelKind::Seir => Seir::TRANSMISSION,
            ModelKind::Sir => Sir::TRANSMISSION,
            ModelKind::SirF => SirF::TRANSMISSION,
            ModelKind::SewirF => SewirF::TRANSMISSION,
        }
    }

    pub fn parameter_names(self) -> &'static [&'static str] {
        match self {
            ModelKind::Seir => Seir::NAMES,
            ModelKind::Sir => Sir::NAMES,
            ModelKind::SirF => SirF::NAMES,
            ModelKind::SewirF => SewirF::NAMES,
        }
    }

    /// Preset parameter values (CovsirPhy examples; notebook SEIR values).
    pub fn example_parameters(self) -> ParameterSet {
        match self {
            ModelKind::Seir => Seir::example().parameters(),
            ModelKind::Sir => Sir::example().parameters(),
            ModelKind::SirF => SirF::example().parameters(),
            ModelKind::SewirF => SewirF::example().parameters(),
        }
    }

    /// Preset initial state.
    ///
    /// SEIR seeds 1e-7 infected and 4e-7 exposed; the others seed 1000
    /// infected in a population of one million.
    pub fn example_state(self) -> ModelResult<StateVector> {
        let seeds: &[(Compartment, f64)] = match self {
            ModelKind::Seir => &[(Compartment::Exposed, 4e-7), (Compartment::Infected, 1e-7)],
            _ => &[(Compartment::Infected, 1e-3)],
        };
        StateVector::from_seeds(self, seeds)
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ModelKind {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_uppercase();
        match normalized.as_str() {
            "SEIR" => Ok(ModelKind::Seir),
            "SIR" => Ok(ModelKind::Sir),
            "SIRF" => Ok(ModelKind::SirF),
            "SEWIRF" => Ok(ModelKind::SewirF),
            _ => Err(ModelError::UnknownModel(s.to_string())),
        }
    }
}

/// A compiled model: variant + validated typed parameters.
#[derive(Clone, Debug, PartialEq)]
pub enum Model {
    Seir(Seir),
    Sir(Sir),
    SirF(SirF),
    SewirF(SewirF),
}

macro_rules! dispatch {
    ($self:expr, $law:ident => $body:expr) => {
        match $self {
            Model::Seir($law) => $body,
            Model::Sir($law) => $body,
            Model::SirF($law) => $body,
            Model::SewirF($law) => $body,
        }
    };
}

impl Model {
    /// Validate `params` for `kind` and build typed parameters.
    pub fn compile(kind: ModelKind, params: &ParameterSet) -> ModelResult<Self> {
        Ok(match kind {
            ModelKind::Seir => Model::Seir(Seir::from_parameters(params)?),
            ModelKind::Sir => Model::Sir(Sir::from_parameters(params)?),
            ModelKind::SirF => Model::SirF(SirF::from_parameters(params)?),
            ModelKind::SewirF => Model::SewirF(SewirF::from_parameters(params)?),
        })
    }

    pub fn kind(&self) -> ModelKind {
        match self {
            Model::Seir(_) => ModelKind::Seir,
            Model::Sir(_) => ModelKind::Sir,
            Model::SirF(_) => ModelKind::SirF,
            Model::SewirF(_) => ModelKind::SewirF,
        }
    }

    pub fn parameters(&self) -> ParameterSet {
        dispatch!(self, law => law.parameters())
    }

    /// Constant transmission value from the parameter set.
    pub fn transmission(&self) -> f64 {
        dispatch!(self, law => law.transmission())
    }

    /// Source used when a phase gives no explicit transmission source.
    pub fn default_source(&self) -> ParameterSource {
        ParameterSource::Constant(self.transmission())
    }

    /// Derivative of `x` at time `t`, with the transmission term taken
    /// from `source`.
    pub fn derivative(
        &self,
        t: f64,
        x: &StateVector,
        source: &ParameterSource,
    ) -> ModelResult<Derivative> {
        if x.kind() != self.kind() {
            return Err(ModelError::KindMismatch {
                expected: self.kind(),
                got: x.kind(),
            });
        }
        let transmission = source.value_at(t)?;
        Ok(self.rates(x.as_slice(), transmission))
    }

    /// Law evaluation on a raw slice with a resolved transmission value.
    pub fn rates(&self, x: &[f64], transmission: f64) -> Derivative {
        dispatch!(self, law => law.rates(x, transmission))
    }

    pub fn reproduction_number(&self, transmission: f64) -> f64 {
        dispatch!(self, law => law.reproduction_number(transmission))
    }

    /// Residence time in days for each rate (`1/rate` scaled by tau).
    pub fn characteristic_days(&self, tau: Tau) -> Vec<(&'static str, f64)> {
        dispatch!(self, law => law.residence_rates())
            .into_iter()
            .map(|(name, rate)| (name, tau.rate_to_days(rate)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_parses_common_spellings() {
        assert_eq!("SIR-F".parse::<ModelKind>().unwrap(), ModelKind::SirF);
        assert_eq!("sewir_f".parse::<ModelKind>().unwrap(), ModelKind::SewirF);
        assert_eq!("seir".parse::<ModelKind>().unwrap(), ModelKind::Seir);
        assert!("SIRD".parse::<ModelKind>().is_err());
    }

    #[test]
    fn example_parameters_compile_for_every_kind() {
        for kind in ModelKind::ALL {
            let model = Model::compile(kind, &kind.example_parameters()).unwrap();
            assert_eq!(model.kind(), kind);
            assert_eq!(model.parameters(), kind.example_parameters());
        }
    }

    #[test]
    fn example_states_sum_to_one() {
        for kind in ModelKind::ALL {
            let x = kind.example_state().unwrap();
            assert_eq!(x.len(), kind.len());
            assert!((x.total() + x.recovered() - 1.0).abs() < 1e-15);
            assert!(x.recovered().abs() < 1e-15);
        }
    }

    #[test]
    fn derivative_rejects_foreign_state() {
        let model = Model::compile(ModelKind::Sir, &ModelKind::Sir.example_parameters()).unwrap();
        let x = ModelKind::Seir.example_state().unwrap();
        let err = model
            .derivative(0.0, &x, &model.default_source())
            .unwrap_err();
        assert!(matches!(err, ModelError::KindMismatch { .. }));
    }

    #[test]
    fn seir_days_are_reciprocal_rates() {
        let model = Model::compile(ModelKind::Seir, &ModelKind::Seir.example_parameters()).unwrap();
        let days = model.characteristic_days(Tau::default());
        let gamma_days = days.iter().find(|(n, _)| *n == "gamma").unwrap().1;
        let sigma_days = days.iter().find(|(n, _)| *n == "sigma").unwrap().1;
        assert!((gamma_days - 18.0).abs() < 1e-9);
        assert!((sigma_days - 5.2).abs() < 1e-9);
    }
}
