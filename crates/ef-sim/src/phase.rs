//! Phase plans: contiguous time intervals with their own parameters.
//!
//! A plan is built once from ordered `PhaseDef`s and is immutable; edits
//! produce a new plan. Each phase's parameter set is resolved from the
//! previous phase (or the base set) plus its own overrides, and compiled
//! into a typed `Model` before anything integrates.

use crate::error::{SimError, SimResult};
use crate::grid::TimeGrid;
use ef_core::Tau;
use ef_models::{Model, ModelKind, ParameterSet, ParameterSource, StateVector};

/// Bounds closer than this are treated as equal.
const BOUNDARY_EPS: f64 = 1e-9;

/// How a phase's end time is given.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PhaseEnd {
    /// Absolute end time (days since the grid origin).
    Until(f64),
    /// Duration from the phase start.
    Days(f64),
}

/// How a phase's parameter set is derived.
#[derive(Clone, Debug, PartialEq)]
pub enum ParameterUpdate {
    /// Previous phase's parameters with these values replaced.
    Inherit(ParameterSet),
    /// A complete set of its own.
    Replace(ParameterSet),
}

impl Default for ParameterUpdate {
    fn default() -> Self {
        ParameterUpdate::Inherit(ParameterSet::new())
    }
}

/// User-facing phase definition.
#[derive(Clone, Debug, PartialEq)]
pub struct PhaseDef {
    pub name: Option<String>,
    /// Explicit start; defaults to the previous phase's end.
    pub start: Option<f64>,
    pub end: PhaseEnd,
    pub parameters: ParameterUpdate,
    /// Transmission source; defaults to the constant transmission parameter.
    pub transmission: Option<ParameterSource>,
}

impl PhaseDef {
    pub fn until(end: f64) -> Self {
        Self::ending(PhaseEnd::Until(end))
    }

    pub fn days(days: f64) -> Self {
        Self::ending(PhaseEnd::Days(days))
    }

    fn ending(end: PhaseEnd) -> Self {
        Self {
            name: None,
            start: None,
            end,
            parameters: ParameterUpdate::default(),
            transmission: None,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn starting_at(mut self, start: f64) -> Self {
        self.start = Some(start);
        self
    }

    /// Set one named rate, in the override set or the replacement set.
    pub fn with_parameter(mut self, name: impl Into<String>, value: f64) -> Self {
        self.set_parameter(name, value);
        self
    }

    pub fn set_parameter(&mut self, name: impl Into<String>, value: f64) {
        match &mut self.parameters {
            ParameterUpdate::Inherit(set) | ParameterUpdate::Replace(set) => {
                set.insert(name, value);
            }
        }
    }

    pub fn replacing(mut self, parameters: ParameterSet) -> Self {
        self.parameters = ParameterUpdate::Replace(parameters);
        self
    }

    pub fn with_transmission(mut self, source: ParameterSource) -> Self {
        self.transmission = Some(source);
        self
    }
}

/// A resolved phase: absolute bounds, full parameter set, compiled model.
#[derive(Clone, Debug, PartialEq)]
pub struct Phase {
    pub index: usize,
    pub name: String,
    pub start: f64,
    pub end: f64,
    pub parameters: ParameterSet,
    pub model: Model,
    pub source: ParameterSource,
}

impl Phase {
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Integrating `self` and `other` from the same state gives the same
    /// segment.
    pub fn same_dynamics(&self, other: &Phase) -> bool {
        self == other
    }
}

/// Per-phase description for reports.
#[derive(Clone, Debug, PartialEq)]
pub struct PhaseSummary {
    pub index: usize,
    pub name: String,
    pub start: f64,
    pub end: f64,
    pub model: ModelKind,
    pub transmission: String,
    /// Reproduction number at the phase start.
    pub reproduction_number: f64,
    pub parameters: ParameterSet,
    /// Characteristic days per rate (`tau / rate`).
    pub days: Vec<(&'static str, f64)>,
}

/// Incremental plan builder.
///
/// Add phases in order, then call `build()` to validate and freeze them
/// into an immutable `PhasePlan`.
#[derive(Clone, Debug)]
pub struct PhasePlanBuilder {
    kind: ModelKind,
    initial: StateVector,
    grid: TimeGrid,
    base: ParameterSet,
    defs: Vec<PhaseDef>,
}

impl PhasePlanBuilder {
    pub fn new(kind: ModelKind, initial: StateVector, grid: TimeGrid) -> Self {
        Self {
            kind,
            initial,
            grid,
            base: ParameterSet::new(),
            defs: Vec::new(),
        }
    }

    /// Parameters the first phase inherits from.
    pub fn base_parameters(mut self, base: ParameterSet) -> Self {
        self.base = base;
        self
    }

    pub fn phase(mut self, def: PhaseDef) -> Self {
        self.defs.push(def);
        self
    }

    /// Append a phase and return its index.
    pub fn add_phase(&mut self, def: PhaseDef) -> usize {
        self.defs.push(def);
        self.defs.len() - 1
    }

    pub fn build(self) -> SimResult<PhasePlan> {
        PhasePlan::resolve(self.kind, self.initial, self.grid, self.base, self.defs)
    }
}

/// Validated, ordered and contiguous phases of one scenario.
#[derive(Clone, Debug, PartialEq)]
pub struct PhasePlan {
    kind: ModelKind,
    initial: StateVector,
    grid: TimeGrid,
    base: ParameterSet,
    defs: Vec<PhaseDef>,
    phases: Vec<Phase>,
}

impl PhasePlan {
    fn resolve(
        kind: ModelKind,
        initial: StateVector,
        grid: TimeGrid,
        base: ParameterSet,
        defs: Vec<PhaseDef>,
    ) -> SimResult<Self> {
        if initial.kind() != kind {
            return Err(SimError::config(format!(
                "initial state is {} but the plan uses {kind}",
                initial.kind()
            )));
        }
        if defs.is_empty() {
            return Err(SimError::config("a plan needs at least one phase"));
        }

        let mut phases: Vec<Phase> = Vec::with_capacity(defs.len());
        let mut prev_end = grid.start();
        let mut prev_params = base.clone();

        for (index, def) in defs.iter().enumerate() {
            let start = match def.start {
                Some(s) if !s.is_finite() => {
                    return Err(SimError::config(format!(
                        "phase {index} start {s} is not finite"
                    )));
                }
                Some(s) if s < prev_end - BOUNDARY_EPS => {
                    return Err(SimError::config(if index == 0 {
                        format!("phase 0 starts at {s}, before the grid start {prev_end}")
                    } else {
                        format!(
                            "phase {index} starts at {s}, overlapping phase {} which ends at {prev_end}",
                            index - 1
                        )
                    }));
                }
                Some(s) if s > prev_end + BOUNDARY_EPS => {
                    return Err(SimError::config(if index == 0 {
                        format!("phase 0 starts at {s}, after the grid start {prev_end}")
                    } else {
                        format!(
                            "gap between phase {} ending at {prev_end} and phase {index} starting at {s}",
                            index - 1
                        )
                    }));
                }
                _ => prev_end,
            };

            let end = match def.end {
                PhaseEnd::Until(t) => t,
                PhaseEnd::Days(d) => start + d,
            };
            if !end.is_finite() || end <= start + BOUNDARY_EPS {
                return Err(SimError::config(format!(
                    "phase {index} ends at {end}, not after its start {start}"
                )));
            }
            if end > grid.end() + BOUNDARY_EPS {
                return Err(SimError::config(format!(
                    "phase {index} ends at {end}, past the grid end {}",
                    grid.end()
                )));
            }
            let end = end.min(grid.end());

            let parameters = match &def.parameters {
                ParameterUpdate::Inherit(overrides) => prev_params.merged(overrides),
                ParameterUpdate::Replace(set) => set.clone(),
            };
            let model = Model::compile(kind, &parameters)
                .map_err(|source| SimError::InvalidPhase { phase: index, source })?;
            let source = match &def.transmission {
                Some(s) => s.clone(),
                None => model.default_source(),
            };
            if !source.is_time_varying() {
                source
                    .value_at(start)
                    .map_err(|source| SimError::InvalidPhase { phase: index, source })?;
            }

            phases.push(Phase {
                index,
                name: def.name.clone().unwrap_or_else(|| ordinal(index)),
                start,
                end,
                parameters: parameters.clone(),
                model,
                source,
            });
            prev_end = end;
            prev_params = parameters;
        }

        Ok(Self {
            kind,
            initial,
            grid,
            base,
            defs,
            phases,
        })
    }

    pub fn kind(&self) -> ModelKind {
        self.kind
    }

    pub fn initial(&self) -> &StateVector {
        &self.initial
    }

    pub fn grid(&self) -> &TimeGrid {
        &self.grid
    }

    pub fn base_parameters(&self) -> &ParameterSet {
        &self.base
    }

    pub fn definitions(&self) -> &[PhaseDef] {
        &self.defs
    }

    pub fn phases(&self) -> &[Phase] {
        &self.phases
    }

    pub fn len(&self) -> usize {
        self.phases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phases.is_empty()
    }

    /// End time of the last phase.
    pub fn end(&self) -> f64 {
        self.phases.last().map_or(self.grid.start(), |p| p.end)
    }

    /// Rebuild with new base parameters and definitions, same initial state
    /// and grid.
    pub fn with_phases(&self, base: ParameterSet, defs: Vec<PhaseDef>) -> SimResult<Self> {
        Self::resolve(self.kind, self.initial.clone(), self.grid.clone(), base, defs)
    }

    pub fn with_base_parameters(&self, base: ParameterSet) -> SimResult<Self> {
        self.with_phases(base, self.defs.clone())
    }

    /// New plan with phase `index` edited; later phases re-resolve their
    /// inherited parameters.
    pub fn edit_phase(&self, index: usize, edit: impl FnOnce(&mut PhaseDef)) -> SimResult<Self> {
        let mut defs = self.defs.clone();
        let def = defs.get_mut(index).ok_or_else(|| {
            SimError::config(format!("no phase {index} (plan has {})", self.len()))
        })?;
        edit(def);
        self.with_phases(self.base.clone(), defs)
    }

    /// Keep the first `n` phases.
    pub fn truncate(&self, n: usize) -> SimResult<Self> {
        if n == 0 || n > self.len() {
            return Err(SimError::config(format!(
                "cannot keep {n} of {} phases",
                self.len()
            )));
        }
        self.with_phases(self.base.clone(), self.defs[..n].to_vec())
    }

    /// Append a phase after the last one.
    pub fn extend(&self, def: PhaseDef) -> SimResult<Self> {
        let mut defs = self.defs.clone();
        defs.push(def);
        self.with_phases(self.base.clone(), defs)
    }

    pub fn summary(&self, tau: Tau) -> SimResult<Vec<PhaseSummary>> {
        self.phases
            .iter()
            .map(|p| {
                let value = p
                    .source
                    .value_at(p.start)
                    .map_err(|source| SimError::InvalidPhase {
                        phase: p.index,
                        source,
                    })?;
                Ok(PhaseSummary {
                    index: p.index,
                    name: p.name.clone(),
                    start: p.start,
                    end: p.end,
                    model: self.kind,
                    transmission: p.source.describe(),
                    reproduction_number: p.model.reproduction_number(value),
                    parameters: p.parameters.clone(),
                    days: p.model.characteristic_days(tau),
                })
            })
            .collect()
    }
}

/// "0th", "1st", "2nd", ... phase names.
fn ordinal(n: usize) -> String {
    let suffix = match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{n}{suffix}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use ef_models::ModelError;

    fn builder() -> PhasePlanBuilder {
        let kind = ModelKind::Seir;
        PhasePlanBuilder::new(
            kind,
            kind.example_state().unwrap(),
            TimeGrid::linspace(0.0, 100.0, 101).unwrap(),
        )
        .base_parameters(kind.example_parameters())
    }

    #[test]
    fn inherits_and_overrides() {
        let plan = builder()
            .phase(PhaseDef::until(30.0).with_parameter("r0", 0.5))
            .phase(PhaseDef::days(20.0))
            .phase(PhaseDef::until(100.0).with_parameter("r0", 2.0))
            .build()
            .unwrap();
        let p = plan.phases();
        assert_eq!(p[0].parameters.get("r0"), Some(0.5));
        assert_eq!(p[1].parameters.get("r0"), Some(0.5));
        assert_eq!((p[1].start, p[1].end), (30.0, 50.0));
        assert_eq!(p[2].parameters.get("r0"), Some(2.0));
        assert_eq!(p[2].parameters.get("gamma"), Some(1.0 / 18.0));
        assert_eq!(p[1].name, "1st");
    }

    #[test]
    fn overlapping_phases_rejected() {
        let err = builder()
            .phase(PhaseDef::until(40.0))
            .phase(PhaseDef::until(100.0).starting_at(30.0))
            .build()
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(err.to_string().contains("overlapping"));
    }

    #[test]
    fn gaps_and_bad_ends_rejected() {
        let gap = builder()
            .phase(PhaseDef::until(30.0))
            .phase(PhaseDef::until(60.0).starting_at(35.0))
            .build();
        assert!(matches!(gap, Err(SimError::Configuration { .. })));

        let backwards = builder()
            .phase(PhaseDef::until(30.0))
            .phase(PhaseDef::until(20.0))
            .build();
        assert!(matches!(backwards, Err(SimError::Configuration { .. })));

        let past_grid = builder().phase(PhaseDef::until(120.0)).build();
        assert!(matches!(past_grid, Err(SimError::Configuration { .. })));

        let late_start = builder().phase(PhaseDef::until(50.0).starting_at(5.0)).build();
        assert!(matches!(late_start, Err(SimError::Configuration { .. })));

        assert!(builder().build().is_err());
    }

    #[test]
    fn missing_rate_is_reported_per_phase() {
        let kind = ModelKind::Seir;
        let err = PhasePlanBuilder::new(
            kind,
            kind.example_state().unwrap(),
            TimeGrid::linspace(0.0, 10.0, 11).unwrap(),
        )
        .phase(PhaseDef::until(10.0).replacing(ParameterSet::new().with("r0", 1.6)))
        .build()
        .unwrap_err();
        assert!(matches!(
            err,
            SimError::InvalidPhase {
                phase: 0,
                source: ModelError::MissingParameter { .. }
            }
        ));
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn edit_reresolves_downstream() {
        let plan = builder()
            .phase(PhaseDef::until(30.0))
            .phase(PhaseDef::until(100.0))
            .build()
            .unwrap();
        let edited = plan
            .edit_phase(0, |def| def.set_parameter("sigma", 0.5))
            .unwrap();
        assert_eq!(edited.phases()[1].parameters.get("sigma"), Some(0.5));
        assert!(plan.edit_phase(5, |_| {}).is_err());
        // Original plan is untouched.
        assert_eq!(plan.phases()[1].parameters.get("sigma"), Some(1.0 / 5.2));
    }

    #[test]
    fn truncate_and_extend() {
        let plan = builder()
            .phase(PhaseDef::until(30.0))
            .phase(PhaseDef::until(60.0))
            .build()
            .unwrap();
        let short = plan.truncate(1).unwrap();
        assert_eq!(short.len(), 1);
        let longer = short.extend(PhaseDef::until(100.0)).unwrap();
        assert_eq!(longer.end(), 100.0);
        assert!(plan.truncate(0).is_err());
    }

    #[test]
    fn summary_reports_reproduction_number() {
        let plan = builder()
            .phase(PhaseDef::until(30.0).with_parameter("r0", 0.5))
            .phase(
                PhaseDef::until(100.0)
                    .with_transmission(ParameterSource::step(0.5, 2.0, 30.0).unwrap()),
            )
            .build()
            .unwrap();
        let rows = plan.summary(Tau::default()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].reproduction_number, 0.5);
        assert_eq!(rows[1].reproduction_number, 2.0);
        assert!(rows[0].days.iter().any(|(name, _)| *name == "gamma"));
    }

    #[test]
    fn ordinals() {
        assert_eq!(ordinal(0), "0th");
        assert_eq!(ordinal(2), "2nd");
        assert_eq!(ordinal(3), "3rd");
        assert_eq!(ordinal(11), "11th");
        assert_eq!(ordinal(21), "21st");
    }
}
