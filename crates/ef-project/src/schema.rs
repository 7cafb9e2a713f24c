//! Scenario schema definitions.

use ef_core::Tolerances;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScenarioDef {
    pub version: u32,
    pub name: String,
    /// Model variant label, e.g. `SEIR`, `SIR-F`.
    pub model: String,
    pub population: f64,
    #[serde(default = "default_tau_minutes")]
    pub tau_minutes: f64,
    pub initial: InitialDef,
    pub grid: GridDef,
    #[serde(default)]
    pub solver: SolverDef,
    /// Base parameter set; empty means the model's preset values.
    #[serde(default)]
    pub parameters: BTreeMap<String, f64>,
    #[serde(default)]
    pub phases: Vec<ScenarioPhaseDef>,
    #[serde(default)]
    pub reporting: ReportingDef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sweep: Option<SweepDef>,
}

fn default_tau_minutes() -> f64 {
    1440.0
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum InitialMode {
    /// Values are population fractions.
    #[default]
    Fractions,
    /// Values are head counts, divided by `population`.
    Counts,
}

/// Initial compartment values keyed by compartment name. A missing
/// `susceptible` entry takes the remainder.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InitialDef {
    #[serde(default)]
    pub mode: InitialMode,
    pub values: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GridDef {
    #[serde(default)]
    pub start: f64,
    pub end: f64,
    pub points: usize,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum SolverMethod {
    #[default]
    DormandPrince,
    Rk4,
    ForwardEuler,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SolverDef {
    #[serde(default)]
    pub method: SolverMethod,
    #[serde(default = "default_tolerances")]
    pub tolerances: Tolerances,
    #[serde(default = "default_max_steps")]
    pub max_steps: usize,
    #[serde(default = "default_max_dt")]
    pub max_dt: f64,
}

impl Default for SolverDef {
    fn default() -> Self {
        Self {
            method: SolverMethod::default(),
            tolerances: default_tolerances(),
            max_steps: default_max_steps(),
            max_dt: default_max_dt(),
        }
    }
}

fn default_tolerances() -> Tolerances {
    Tolerances::default()
}

fn default_max_steps() -> usize {
    100_000
}

fn default_max_dt() -> f64 {
    1.0
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScenarioPhaseDef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<f64>,
    /// Absolute end time; exactly one of `end` and `days` is given.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub days: Option<f64>,
    /// Overrides on top of the previous phase's parameters.
    #[serde(default)]
    pub parameters: BTreeMap<String, f64>,
    /// Use `parameters` as the complete set instead of overrides.
    #[serde(default)]
    pub replace_parameters: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transmission: Option<TransmissionDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum TransmissionDef {
    Constant {
        value: f64,
    },
    Step {
        before: f64,
        after: f64,
        at: f64,
    },
    Piecewise {
        initial: f64,
        #[serde(default)]
        breakpoints: Vec<BreakpointDef>,
    },
    Mitigating {
        #[serde(default = "default_mitigation_r0")]
        r0: f64,
        #[serde(default = "default_mitigation_eta")]
        eta: f64,
        #[serde(default = "default_mitigation_r_bar")]
        r_bar: f64,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BreakpointDef {
    pub t: f64,
    pub value: f64,
}

fn default_mitigation_r0() -> f64 {
    3.0
}

fn default_mitigation_eta() -> f64 {
    1.0
}

fn default_mitigation_r_bar() -> f64 {
    1.6
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReportingDef {
    /// Applied to cumulative cases by variants without a Fatal compartment.
    #[serde(default = "default_fatality_rate")]
    pub fatality_rate: f64,
}

impl Default for ReportingDef {
    fn default() -> Self {
        Self {
            fatality_rate: default_fatality_rate(),
        }
    }
}

fn default_fatality_rate() -> f64 {
    0.01
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum SweepDef {
    /// One run per value of the transmission parameter.
    Transmission { values: Vec<f64> },
    /// One run per decay rate of a mitigating R0 path.
    Mitigation {
        etas: Vec<f64>,
        #[serde(default = "default_mitigation_r0")]
        r0: f64,
        #[serde(default = "default_mitigation_r_bar")]
        r_bar: f64,
    },
}

impl SweepDef {
    pub fn values(&self) -> &[f64] {
        match self {
            SweepDef::Transmission { values } => values,
            SweepDef::Mitigation { etas, .. } => etas,
        }
    }
}
