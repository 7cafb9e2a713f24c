//! Scenario validation logic.
//!
//! Checks every field that can be checked without building models.
//! Phase contiguity and parameter completeness are checked when the plan
//! is built.

use crate::schema::{InitialMode, ScenarioDef, ScenarioPhaseDef, SweepDef, TransmissionDef};
use ef_models::{Compartment, ModelKind};

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing field: {field} in {context}")]
    MissingField { field: String, context: String },

    #[error("Unknown {what} '{name}' in {context}")]
    Unknown {
        what: String,
        name: String,
        context: String,
    },

    #[error("Unsupported version: {version}")]
    UnsupportedVersion { version: u32 },
}

fn invalid(field: impl Into<String>, value: impl ToString, reason: &str) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.into(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn non_negative(field: impl Into<String>, value: f64) -> Result<(), ValidationError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(invalid(field, value, "must be finite and non-negative"))
    }
}

fn positive(field: impl Into<String>, value: f64) -> Result<(), ValidationError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(field, value, "must be finite and positive"))
    }
}

pub fn validate_scenario(scenario: &ScenarioDef) -> Result<(), ValidationError> {
    if scenario.version > crate::migrate::LATEST_VERSION {
        return Err(ValidationError::UnsupportedVersion {
            version: scenario.version,
        });
    }

    let kind: ModelKind = scenario
        .model
        .parse()
        .map_err(|_| ValidationError::Unknown {
            what: "model".to_string(),
            name: scenario.model.clone(),
            context: format!("scenario '{}'", scenario.name),
        })?;

    positive("population", scenario.population)?;
    positive("tau_minutes", scenario.tau_minutes)?;

    let grid = &scenario.grid;
    if grid.points < 2 {
        return Err(invalid("grid.points", grid.points, "need at least 2 points"));
    }
    if !grid.start.is_finite() {
        return Err(invalid("grid.start", grid.start, "must be finite"));
    }
    if !(grid.end.is_finite() && grid.end > grid.start) {
        return Err(invalid("grid.end", grid.end, "must be after grid.start"));
    }

    validate_initial(scenario, kind)?;

    let solver = &scenario.solver;
    positive("solver.tolerances.abs", solver.tolerances.abs)?;
    non_negative("solver.tolerances.rel", solver.tolerances.rel)?;
    positive("solver.max_dt", solver.max_dt)?;
    if solver.max_steps == 0 {
        return Err(invalid("solver.max_steps", 0, "must be positive"));
    }

    validate_parameters(kind, &scenario.parameters, "parameters")?;

    if scenario.phases.is_empty() {
        return Err(ValidationError::MissingField {
            field: "phases".to_string(),
            context: format!("scenario '{}'", scenario.name),
        });
    }
    for (idx, phase) in scenario.phases.iter().enumerate() {
        validate_phase(kind, idx, phase)?;
    }

    let fatality = scenario.reporting.fatality_rate;
    if !(0.0..=1.0).contains(&fatality) {
        return Err(invalid("reporting.fatality_rate", fatality, "must be in [0, 1]"));
    }

    if let Some(sweep) = &scenario.sweep {
        validate_sweep(sweep)?;
    }

    Ok(())
}

fn validate_initial(scenario: &ScenarioDef, kind: ModelKind) -> Result<(), ValidationError> {
    let values = &scenario.initial.values;
    let mut total = 0.0;
    let mut seen = Vec::with_capacity(values.len());
    for (name, value) in values {
        let field = format!("initial.values.{name}");
        let known = Compartment::from_name(name).filter(|c| {
            *c == Compartment::Recovered || kind.index_of(*c).is_some()
        });
        let Some(compartment) = known else {
            return Err(ValidationError::Unknown {
                what: "compartment".to_string(),
                name: name.clone(),
                context: format!("initial values of a {kind} model"),
            });
        };
        if seen.contains(&compartment) {
            return Err(invalid(field.as_str(), value, "compartment is listed more than once"));
        }
        seen.push(compartment);
        non_negative(field, *value)?;
        total += value;
    }
    let capacity = match scenario.initial.mode {
        InitialMode::Fractions => 1.0,
        InitialMode::Counts => scenario.population,
    };
    if total > capacity * (1.0 + 1e-9) {
        return Err(invalid(
            "initial.values",
            total,
            "compartments exceed the whole population",
        ));
    }
    Ok(())
}

fn validate_parameters(
    kind: ModelKind,
    params: &std::collections::BTreeMap<String, f64>,
    context: &str,
) -> Result<(), ValidationError> {
    for (name, value) in params {
        if !kind.parameter_names().contains(&name.as_str()) {
            return Err(ValidationError::Unknown {
                what: "parameter".to_string(),
                name: name.clone(),
                context: format!("{context} of a {kind} model"),
            });
        }
        non_negative(format!("{context}.{name}"), *value)?;
    }
    Ok(())
}

fn validate_phase(
    kind: ModelKind,
    idx: usize,
    phase: &ScenarioPhaseDef,
) -> Result<(), ValidationError> {
    let context = format!("phases[{idx}]");
    match (phase.end, phase.days) {
        (None, None) => {
            return Err(ValidationError::MissingField {
                field: "end or days".to_string(),
                context,
            });
        }
        (Some(_), Some(_)) => {
            return Err(invalid(
                format!("{context}.days"),
                "both",
                "give either end or days, not both",
            ));
        }
        (Some(end), None) => {
            if !end.is_finite() {
                return Err(invalid(format!("{context}.end"), end, "must be finite"));
            }
        }
        (None, Some(days)) => positive(format!("{context}.days"), days)?,
    }
    if let Some(start) = phase.start.filter(|s| !s.is_finite()) {
        return Err(invalid(format!("{context}.start"), start, "must be finite"));
    }

    validate_parameters(kind, &phase.parameters, &format!("{context}.parameters"))?;

    match &phase.transmission {
        None => {}
        Some(TransmissionDef::Constant { value }) => {
            non_negative(format!("{context}.transmission.value"), *value)?;
        }
        Some(TransmissionDef::Step { before, after, at }) => {
            non_negative(format!("{context}.transmission.before"), *before)?;
            non_negative(format!("{context}.transmission.after"), *after)?;
            if !at.is_finite() {
                return Err(invalid(format!("{context}.transmission.at"), at, "must be finite"));
            }
        }
        Some(TransmissionDef::Piecewise {
            initial,
            breakpoints,
        }) => {
            non_negative(format!("{context}.transmission.initial"), *initial)?;
            for (i, bp) in breakpoints.iter().enumerate() {
                non_negative(format!("{context}.transmission.breakpoints[{i}].value"), bp.value)?;
                if !bp.t.is_finite() {
                    return Err(invalid(
                        format!("{context}.transmission.breakpoints[{i}].t"),
                        bp.t,
                        "must be finite",
                    ));
                }
            }
            if breakpoints.windows(2).any(|w| w[1].t <= w[0].t) {
                return Err(invalid(
                    format!("{context}.transmission.breakpoints"),
                    breakpoints.len(),
                    "times must be strictly increasing",
                ));
            }
        }
        Some(TransmissionDef::Mitigating { r0, eta, r_bar }) => {
            non_negative(format!("{context}.transmission.r0"), *r0)?;
            positive(format!("{context}.transmission.eta"), *eta)?;
            non_negative(format!("{context}.transmission.r_bar"), *r_bar)?;
        }
    }
    Ok(())
}

fn validate_sweep(sweep: &SweepDef) -> Result<(), ValidationError> {
    if sweep.values().is_empty() {
        let field = match sweep {
            SweepDef::Transmission { .. } => "values",
            SweepDef::Mitigation { .. } => "etas",
        };
        return Err(ValidationError::MissingField {
            field: field.to_string(),
            context: "sweep".to_string(),
        });
    }
    match sweep {
        SweepDef::Transmission { values } => {
            for (i, v) in values.iter().enumerate() {
                non_negative(format!("sweep.values[{i}]"), *v)?;
            }
        }
        SweepDef::Mitigation { etas, r0, r_bar } => {
            for (i, v) in etas.iter().enumerate() {
                positive(format!("sweep.etas[{i}]"), *v)?;
            }
            non_negative("sweep.r0", *r0)?;
            non_negative("sweep.r_bar", *r_bar)?;
        }
    }
    Ok(())
}
