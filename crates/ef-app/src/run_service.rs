//! Run execution: scenario -> plan -> composition.

use std::path::Path;
use std::time::Instant;

use ef_models::Compartment;
use ef_project::schema::ScenarioDef;
use ef_sim::{
    Composition, IntegratorType, Peak, PhasePlan, SimOptions, Trajectory, compose, recompose, sweep,
};
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::scenario_service;

/// Overrides applied on top of the scenario's solver settings.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub integrator: Option<IntegratorType>,
    pub skip_invariant_checks: bool,
}

/// Request to execute a scenario file.
pub struct RunRequest<'a> {
    pub scenario_path: &'a Path,
    pub options: RunOptions,
}

/// Timing and step counts for a run.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct RunTimingSummary {
    pub build_time_s: f64,
    pub solve_time_s: f64,
    pub total_time_s: f64,
    pub accepted_steps: usize,
    pub rejected_steps: usize,
    pub rhs_evals: usize,
    /// Phases taken over from a previous run without integrating.
    pub reused_phases: usize,
}

#[derive(Debug, Clone)]
pub struct RunResponse {
    pub scenario: ScenarioDef,
    pub composition: Composition,
    pub trajectory: Trajectory,
    pub timing: RunTimingSummary,
}

/// Outcome of one sweep member.
#[derive(Debug, Clone, serde::Serialize)]
pub struct SweepPoint {
    pub value: f64,
    pub peak_infected_t: f64,
    pub peak_infected: f64,
    pub final_cumulative: f64,
    pub final_deaths: f64,
}

pub fn sim_options(scenario: &ScenarioDef, options: &RunOptions) -> SimOptions {
    let mut opts = ef_project::sim_options(scenario);
    if let Some(integrator) = options.integrator {
        opts.integrator = integrator;
    }
    if options.skip_invariant_checks {
        opts.check_invariants = false;
    }
    opts
}

/// Load a scenario file and run it.
pub fn run(request: &RunRequest<'_>) -> AppResult<RunResponse> {
    let scenario = scenario_service::load_scenario(request.scenario_path)?;
    run_scenario(&scenario, &request.options)
}

pub fn run_scenario(scenario: &ScenarioDef, options: &RunOptions) -> AppResult<RunResponse> {
    let total_start = Instant::now();
    let plan = ef_project::build_plan(scenario)?;
    let build_time_s = total_start.elapsed().as_secs_f64();

    let opts = sim_options(scenario, options);
    let solve_start = Instant::now();
    let composition = compose(&plan, &opts)?;
    let solve_time_s = solve_start.elapsed().as_secs_f64();

    finish(scenario.clone(), composition, build_time_s, solve_time_s, total_start)
}

/// Re-run after a plan edit, reusing every unchanged leading phase of
/// `previous`.
pub fn rerun(previous: &RunResponse, plan: &PhasePlan) -> AppResult<RunResponse> {
    let total_start = Instant::now();
    let opts = previous.composition.options().clone();
    let composition = recompose(plan, &previous.composition, &opts)?;
    let solve_time_s = total_start.elapsed().as_secs_f64();
    finish(previous.scenario.clone(), composition, 0.0, solve_time_s, total_start)
}

/// Multiply one named rate of one phase by `ratio` and re-run from that
/// phase on. Later phases inheriting the rate follow the change. Scaling the
/// transmission parameter of a phase with its own transmission source
/// scales that source too.
pub fn adjust_rate(
    previous: &RunResponse,
    phase: usize,
    parameter: &str,
    ratio: f64,
) -> AppResult<RunResponse> {
    let plan = previous.composition.plan();
    let current = plan.phases().get(phase).ok_or_else(|| {
        AppError::InvalidInput(format!("no phase {phase} (scenario has {})", plan.len()))
    })?;
    let scaled = current.parameters.with_scaled(parameter, ratio)?;
    let value = scaled.get(parameter).ok_or_else(|| {
        AppError::InvalidInput(format!("phase {phase} has no parameter '{parameter}'"))
    })?;
    let source = match &plan.definitions()[phase].transmission {
        Some(source) if parameter == plan.kind().transmission_parameter() => {
            Some(source.scaled(ratio)?)
        }
        _ => None,
    };
    let edited = plan.edit_phase(phase, |def| {
        def.set_parameter(parameter, value);
        if source.is_some() {
            def.transmission = source;
        }
    })?;
    rerun(previous, &edited)
}

fn finish(
    scenario: ScenarioDef,
    composition: Composition,
    build_time_s: f64,
    solve_time_s: f64,
    total_start: Instant,
) -> AppResult<RunResponse> {
    let trajectory = composition.trajectory()?;
    let stats = composition.stats();
    let timing = RunTimingSummary {
        build_time_s,
        solve_time_s,
        total_time_s: total_start.elapsed().as_secs_f64(),
        accepted_steps: stats.accepted,
        rejected_steps: stats.rejected,
        rhs_evals: stats.rhs_evals,
        reused_phases: composition.reused(),
    };
    info!(
        scenario = %scenario.name,
        points = trajectory.len(),
        accepted = stats.accepted,
        reused = timing.reused_phases,
        "run finished"
    );
    Ok(RunResponse {
        scenario,
        composition,
        trajectory,
        timing,
    })
}

/// Run the scenario's sweep in parallel; points follow the sweep values.
pub fn run_sweep(scenario: &ScenarioDef, options: &RunOptions) -> AppResult<Vec<SweepPoint>> {
    if scenario.sweep.is_none() {
        return Err(AppError::InvalidInput(format!(
            "scenario '{}' has no sweep",
            scenario.name
        )));
    }
    let plan = ef_project::build_plan(scenario)?;
    let members = ef_project::sweep_plans(scenario, &plan)?;
    let plans: Vec<PhasePlan> = members.iter().map(|(_, p)| p.clone()).collect();
    let opts = sim_options(scenario, options);

    let results = sweep(&plans, &opts);
    members
        .iter()
        .zip(results)
        .map(|((value, _), result)| {
            let trajectory = result?.trajectory()?;
            sweep_point(scenario, *value, &trajectory)
        })
        .collect()
}

fn sweep_point(scenario: &ScenarioDef, value: f64, trajectory: &Trajectory) -> AppResult<SweepPoint> {
    let peak: Peak = trajectory
        .peak(Compartment::Infected)
        .ok_or_else(|| AppError::InvalidInput("model has no infected compartment".to_string()))?;
    let final_cumulative = trajectory.final_state().cumulative_cases();
    let deaths = trajectory.deaths(scenario.population, scenario.reporting.fatality_rate)?;
    Ok(SweepPoint {
        value,
        peak_infected_t: peak.t,
        peak_infected: peak.value,
        final_cumulative,
        final_deaths: deaths.last().copied().unwrap_or(0.0),
    })
}
