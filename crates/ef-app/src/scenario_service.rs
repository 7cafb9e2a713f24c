//! Scenario loading, saving, validation and introspection.

use std::path::Path;

use ef_project::schema::ScenarioDef;
use ef_sim::PhaseSummary;

use crate::error::{AppError, AppResult};

/// Summary of a scenario for listing.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ScenarioSummary {
    pub name: String,
    pub model: String,
    pub population: f64,
    pub time_range: (f64, f64),
    pub grid_points: usize,
    pub phase_count: usize,
    pub has_sweep: bool,
}

/// Load, migrate and validate a scenario (`.json` or YAML).
pub fn load_scenario(path: &Path) -> AppResult<ScenarioDef> {
    if !path.exists() {
        return Err(AppError::ScenarioFileRead {
            path: path.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        });
    }
    Ok(ef_project::load(path)?)
}

pub fn save_scenario(path: &Path, scenario: &ScenarioDef) -> AppResult<()> {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("json") => ef_project::save_json(path, scenario)?,
        _ => ef_project::save_yaml(path, scenario)?,
    }
    Ok(())
}

/// Field validation plus a dry build of the phase plan, so ordering and
/// parameter errors surface without integrating anything.
pub fn validate_scenario(scenario: &ScenarioDef) -> AppResult<()> {
    ef_project::validate_scenario(scenario).map_err(|e| AppError::Validation(e.to_string()))?;
    ef_project::build_plan(scenario)?;
    Ok(())
}

pub fn summarize(scenario: &ScenarioDef) -> ScenarioSummary {
    ScenarioSummary {
        name: scenario.name.clone(),
        model: scenario.model.clone(),
        population: scenario.population,
        time_range: (scenario.grid.start, scenario.grid.end),
        grid_points: scenario.grid.points,
        phase_count: scenario.phases.len(),
        has_sweep: scenario.sweep.is_some(),
    }
}

/// Per-phase rows: bounds, parameters, R0 and characteristic days.
pub fn phase_table(scenario: &ScenarioDef) -> AppResult<Vec<PhaseSummary>> {
    let plan = ef_project::build_plan(scenario)?;
    let tau = ef_project::tau(scenario)?;
    Ok(plan.summary(tau)?)
}
