//! Shared application service layer for epiflow.
//!
//! Scenario loading and validation, run execution with phase reuse,
//! sweeps, and result queries. The CLI is a thin layer over this crate.

pub mod error;
pub mod query;
pub mod run_service;
pub mod scenario_service;

pub use error::{AppError, AppResult};
pub use query::{
    RunSummary, Reporting, extract_series, get_run_summary, list_variables, trajectory_csv,
};
pub use run_service::{
    RunOptions, RunRequest, RunResponse, RunTimingSummary, SweepPoint, adjust_rate, rerun, run,
    run_scenario, run_sweep,
};
pub use scenario_service::{
    ScenarioSummary, load_scenario, phase_table, save_scenario, summarize, validate_scenario,
};
