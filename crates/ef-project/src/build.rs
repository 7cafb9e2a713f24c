//! Conversion of a validated scenario into simulation inputs.

use crate::schema::{InitialMode, ScenarioDef, ScenarioPhaseDef, SolverMethod, SweepDef, TransmissionDef};
use crate::{ProjectError, ProjectResult};
use ef_core::Tau;
use ef_models::state::ensure_distinct;
use ef_models::{Compartment, ModelKind, ParameterSet, ParameterSource, StateVector};
use ef_sim::{
    IntegratorType, ParameterUpdate, PhaseDef, PhasePlan, PhasePlanBuilder, SimOptions, TimeGrid,
    mitigation_sweep, transmission_sweep,
};
use std::collections::BTreeMap;

pub fn model_kind(scenario: &ScenarioDef) -> ProjectResult<ModelKind> {
    Ok(scenario.model.parse::<ModelKind>()?)
}

pub fn tau(scenario: &ScenarioDef) -> ProjectResult<Tau> {
    Ok(Tau::from_minutes(scenario.tau_minutes)?)
}

pub fn time_grid(scenario: &ScenarioDef) -> ProjectResult<TimeGrid> {
    let g = &scenario.grid;
    Ok(TimeGrid::linspace(g.start, g.end, g.points)?)
}

pub fn sim_options(scenario: &ScenarioDef) -> SimOptions {
    let solver = &scenario.solver;
    SimOptions {
        integrator: match solver.method {
            SolverMethod::DormandPrince => IntegratorType::DormandPrince,
            SolverMethod::Rk4 => IntegratorType::Rk4,
            SolverMethod::ForwardEuler => IntegratorType::ForwardEuler,
        },
        tolerances: solver.tolerances,
        max_steps: solver.max_steps,
        max_dt: solver.max_dt,
        ..SimOptions::default()
    }
}

/// Initial state from fractions or counts. Without an explicit
/// `susceptible` value, Susceptible is the remainder.
pub fn initial_state(scenario: &ScenarioDef, kind: ModelKind) -> ProjectResult<StateVector> {
    let scale = match scenario.initial.mode {
        InitialMode::Fractions => 1.0,
        InitialMode::Counts => scenario.population,
    };
    let mut entries = Vec::with_capacity(scenario.initial.values.len());
    for (name, value) in &scenario.initial.values {
        let compartment = Compartment::from_name(name).ok_or_else(|| {
            ProjectError::Build {
                what: format!("unknown compartment '{name}'"),
            }
        })?;
        entries.push((compartment, value / scale));
    }

    if entries.iter().any(|(c, _)| *c == Compartment::Susceptible) {
        ensure_distinct(entries.iter().map(|(c, _)| *c))?;
        let mut values = vec![0.0; kind.len()];
        for (c, v) in &entries {
            match kind.index_of(*c) {
                Some(idx) => values[idx] = *v,
                None if *c == Compartment::Recovered => {}
                None => {
                    return Err(ProjectError::Build {
                        what: format!("{kind} model has no {c} compartment"),
                    });
                }
            }
        }
        Ok(StateVector::new(kind, values)?)
    } else {
        Ok(StateVector::from_seeds(kind, &entries)?)
    }
}

fn parameter_set(values: &BTreeMap<String, f64>) -> ParameterSet {
    values.iter().map(|(k, v)| (k.clone(), *v)).collect()
}

fn transmission_source(def: &TransmissionDef) -> ProjectResult<ParameterSource> {
    Ok(match def {
        TransmissionDef::Constant { value } => ParameterSource::constant(*value)?,
        TransmissionDef::Step { before, after, at } => {
            ParameterSource::step(*before, *after, *at)?
        }
        TransmissionDef::Piecewise {
            initial,
            breakpoints,
        } => ParameterSource::piecewise(
            *initial,
            breakpoints.iter().map(|bp| (bp.t, bp.value)).collect(),
        )?,
        TransmissionDef::Mitigating { r0, eta, r_bar } => {
            ParameterSource::mitigating(*r0, *eta, *r_bar)?
        }
    })
}

fn phase_def(def: &ScenarioPhaseDef) -> ProjectResult<PhaseDef> {
    let mut phase = match (def.end, def.days) {
        (Some(end), None) => PhaseDef::until(end),
        (None, Some(days)) => PhaseDef::days(days),
        _ => {
            return Err(ProjectError::Build {
                what: "a phase needs exactly one of end and days".to_string(),
            });
        }
    };
    phase.name = def.name.clone();
    phase.start = def.start;
    let params = parameter_set(&def.parameters);
    phase.parameters = if def.replace_parameters {
        ParameterUpdate::Replace(params)
    } else {
        ParameterUpdate::Inherit(params)
    };
    phase.transmission = def.transmission.as_ref().map(transmission_source).transpose()?;
    Ok(phase)
}

/// Build the phase plan described by `scenario`.
pub fn build_plan(scenario: &ScenarioDef) -> ProjectResult<PhasePlan> {
    let kind = model_kind(scenario)?;
    let base = if scenario.parameters.is_empty() {
        kind.example_parameters()
    } else {
        parameter_set(&scenario.parameters)
    };
    let mut builder = PhasePlanBuilder::new(kind, initial_state(scenario, kind)?, time_grid(scenario)?)
        .base_parameters(base);
    for def in &scenario.phases {
        builder.add_phase(phase_def(def)?);
    }
    Ok(builder.build()?)
}

/// Plans of the scenario's sweep, paired with the swept value.
pub fn sweep_plans(scenario: &ScenarioDef, plan: &PhasePlan) -> ProjectResult<Vec<(f64, PhasePlan)>> {
    let Some(sweep) = &scenario.sweep else {
        return Ok(Vec::new());
    };
    let plans = match sweep {
        SweepDef::Transmission { values } => transmission_sweep(plan, values)?,
        SweepDef::Mitigation { etas, r0, r_bar } => mitigation_sweep(plan, etas, *r0, *r_bar)?,
    };
    Ok(sweep.values().iter().copied().zip(plans).collect())
}
