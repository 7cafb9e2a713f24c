//! Query helpers for extracting data from finished runs.

use ef_models::{Compartment, ModelKind};
use ef_project::schema::ScenarioDef;
use ef_sim::{Peak, Trajectory};

use crate::error::{AppError, AppResult};

/// How series values are reported.
#[derive(Debug, Clone, Copy)]
pub struct Reporting {
    pub population: f64,
    pub fatality_rate: f64,
    /// Absolute counts instead of fractions.
    pub counts: bool,
}

impl Reporting {
    pub fn from_scenario(scenario: &ScenarioDef, counts: bool) -> Self {
        Self {
            population: scenario.population,
            fatality_rate: scenario.reporting.fatality_rate,
            counts,
        }
    }

    fn scale(&self) -> f64 {
        if self.counts { self.population } else { 1.0 }
    }
}

/// Summary of a run's time range and outcome.
#[derive(Debug, Clone, serde::Serialize)]
pub struct RunSummary {
    pub model: String,
    pub time_range: (f64, f64),
    pub record_count: usize,
    pub peak_infected: Option<(f64, f64)>,
    pub final_values: Vec<(String, f64)>,
    pub final_cumulative: f64,
    pub final_deaths: f64,
}

pub fn get_run_summary(trajectory: &Trajectory, reporting: &Reporting) -> AppResult<RunSummary> {
    let scale = reporting.scale();
    let final_state = trajectory.final_state();
    let final_values = trajectory
        .kind()
        .compartments()
        .iter()
        .chain(std::iter::once(&Compartment::Recovered))
        .filter_map(|c| final_state.get(*c).map(|v| (c.name().to_string(), v * scale)))
        .collect();
    let deaths = trajectory.deaths(scale, reporting.fatality_rate)?;

    Ok(RunSummary {
        model: trajectory.kind().name().to_string(),
        time_range: (trajectory.start_time(), trajectory.end_time()),
        record_count: trajectory.len(),
        peak_infected: trajectory
            .peak(Compartment::Infected)
            .map(|Peak { t, value, .. }| (t, value * scale)),
        final_values,
        final_cumulative: final_state.cumulative_cases() * scale,
        final_deaths: deaths.last().copied().unwrap_or(0.0),
    })
}

/// Variables `extract_series` understands for a model.
pub fn list_variables(kind: ModelKind) -> Vec<String> {
    kind.compartments()
        .iter()
        .map(|c| c.name().to_string())
        .chain(["recovered", "cumulative", "deaths"].map(String::from))
        .collect()
}

/// Time series of one variable: a compartment name, `cumulative` or
/// `deaths`.
pub fn extract_series(
    trajectory: &Trajectory,
    variable: &str,
    reporting: &Reporting,
) -> AppResult<Vec<(f64, f64)>> {
    let scale = reporting.scale();
    let values = match variable.to_ascii_lowercase().as_str() {
        "cumulative" | "confirmed" => trajectory.cumulative_cases(),
        "deaths" => return zip_times(trajectory, trajectory.deaths(scale, reporting.fatality_rate)?),
        name => {
            let compartment = Compartment::from_name(name).ok_or_else(|| {
                AppError::InvalidInput(format!("Unknown variable: {variable}"))
            })?;
            trajectory.series(compartment).ok_or_else(|| {
                AppError::InvalidInput(format!(
                    "{} model has no {compartment} compartment",
                    trajectory.kind()
                ))
            })?
        }
    };
    zip_times(trajectory, values.into_iter().map(|v| v * scale).collect())
}

fn zip_times(trajectory: &Trajectory, values: Vec<f64>) -> AppResult<Vec<(f64, f64)>> {
    Ok(trajectory.times().iter().copied().zip(values).collect())
}

/// Whole trajectory as CSV: time, modeled compartments, recovered,
/// cumulative.
pub fn trajectory_csv(trajectory: &Trajectory, reporting: &Reporting) -> AppResult<String> {
    let scale = reporting.scale();
    let mut csv = String::from("time_days");
    for c in trajectory.kind().compartments() {
        csv.push(',');
        csv.push_str(c.name());
    }
    csv.push_str(",recovered,cumulative\n");

    let rows = trajectory.to_counts(scale)?;
    for ((t, x), row) in trajectory.iter().zip(rows) {
        csv.push_str(&t.to_string());
        for v in row {
            csv.push(',');
            csv.push_str(&v.to_string());
        }
        csv.push(',');
        csv.push_str(&(x.cumulative_cases() * scale).to_string());
        csv.push('\n');
    }
    Ok(csv)
}
