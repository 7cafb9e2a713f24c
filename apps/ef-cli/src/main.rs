use clap::{Parser, Subcommand, ValueEnum};
use ef_app::{
    AppError, AppResult, Reporting, RunOptions, RunRequest, RunResponse, RunTimingSummary, query,
    run_service, scenario_service,
};
use ef_sim::IntegratorType;
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ef-cli")]
#[command(about = "EpiFlow CLI - phase-dependent compartmental epidemic simulation", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate scenario file syntax, fields and phase ordering
    Validate {
        /// Path to the scenario file (YAML or JSON)
        scenario_path: PathBuf,
    },
    /// Show a scenario and its phase table
    Summary {
        /// Path to the scenario file (YAML or JSON)
        scenario_path: PathBuf,
    },
    /// Run a scenario and write the trajectory as CSV
    Run {
        /// Path to the scenario file (YAML or JSON)
        scenario_path: PathBuf,
        #[command(flatten)]
        run: RunArgs,
        /// Output CSV file path (optional, defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Export one variable's time series from a run
    Series {
        /// Path to the scenario file (YAML or JSON)
        scenario_path: PathBuf,
        /// Variable name (e.g., infected, exposed, cumulative, deaths)
        variable: String,
        #[command(flatten)]
        run: RunArgs,
        /// Output CSV file path (optional, defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Run the scenario's parameter sweep
    Sweep {
        /// Path to the scenario file (YAML or JSON)
        scenario_path: PathBuf,
        #[command(flatten)]
        run: RunArgs,
        /// Output JSON file path (optional, defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Scale one rate of one phase and re-run from that phase on
    Adjust {
        /// Path to the scenario file (YAML or JSON)
        scenario_path: PathBuf,
        /// Zero-based phase index
        phase: usize,
        /// Parameter name (e.g., r0, gamma)
        parameter: String,
        /// Multiplier applied to the current value
        ratio: f64,
        #[command(flatten)]
        run: RunArgs,
    },
}

#[derive(clap::Args)]
struct RunArgs {
    /// Override the scenario's integrator
    #[arg(long, value_enum)]
    integrator: Option<IntegratorArg>,
    /// Report absolute counts instead of population fractions
    #[arg(long)]
    counts: bool,
    /// Skip the bounds and conservation checks after each step
    #[arg(long)]
    no_invariant_checks: bool,
}

impl RunArgs {
    fn options(&self) -> RunOptions {
        RunOptions {
            integrator: self.integrator.map(Into::into),
            skip_invariant_checks: self.no_invariant_checks,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum IntegratorArg {
    DormandPrince,
    Rk4,
    Euler,
}

impl From<IntegratorArg> for IntegratorType {
    fn from(arg: IntegratorArg) -> Self {
        match arg {
            IntegratorArg::DormandPrince => IntegratorType::DormandPrince,
            IntegratorArg::Rk4 => IntegratorType::Rk4,
            IntegratorArg::Euler => IntegratorType::ForwardEuler,
        }
    }
}

fn main() -> AppResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { scenario_path } => cmd_validate(&scenario_path),
        Commands::Summary { scenario_path } => cmd_summary(&scenario_path),
        Commands::Run {
            scenario_path,
            run,
            output,
        } => cmd_run(&scenario_path, &run, output.as_deref()),
        Commands::Series {
            scenario_path,
            variable,
            run,
            output,
        } => cmd_series(&scenario_path, &variable, &run, output.as_deref()),
        Commands::Sweep {
            scenario_path,
            run,
            output,
        } => cmd_sweep(&scenario_path, &run, output.as_deref()),
        Commands::Adjust {
            scenario_path,
            phase,
            parameter,
            ratio,
            run,
        } => cmd_adjust(&scenario_path, phase, &parameter, ratio, &run),
    }
}

fn cmd_validate(scenario_path: &Path) -> AppResult<()> {
    eprintln!("Validating scenario: {}", scenario_path.display());
    let scenario = scenario_service::load_scenario(scenario_path)?;
    scenario_service::validate_scenario(&scenario)?;
    eprintln!("✓ Scenario is valid");
    Ok(())
}

fn cmd_summary(scenario_path: &Path) -> AppResult<()> {
    let scenario = scenario_service::load_scenario(scenario_path)?;
    let summary = scenario_service::summarize(&scenario);
    println!("Scenario: {} ({})", summary.name, summary.model);
    println!("  Population: {}", summary.population);
    println!(
        "  Grid: {} to {} days, {} points",
        summary.time_range.0, summary.time_range.1, summary.grid_points
    );
    if summary.has_sweep {
        println!("  Sweep: defined");
    }

    println!("\nPhases:");
    for row in scenario_service::phase_table(&scenario)? {
        println!(
            "  [{}] {:<16} {:>7.1} .. {:<7.1} Rt={:.2}  {}",
            row.index, row.name, row.start, row.end, row.reproduction_number, row.transmission
        );
        let params: Vec<String> = row
            .parameters
            .iter()
            .map(|(name, value)| format!("{name}={value:.4}"))
            .collect();
        println!("      {}", params.join("  "));
        let days: Vec<String> = row
            .days
            .iter()
            .map(|(name, d)| format!("1/{name}={d:.1}d"))
            .collect();
        if !days.is_empty() {
            println!("      {}", days.join("  "));
        }
    }
    Ok(())
}

fn cmd_run(scenario_path: &Path, args: &RunArgs, output: Option<&Path>) -> AppResult<()> {
    eprintln!("Running scenario: {}", scenario_path.display());
    let response = run_service::run(&RunRequest {
        scenario_path,
        options: args.options(),
    })?;
    eprintln!("✓ Simulation completed");
    print_run_summary(&response, args.counts)?;

    let reporting = Reporting::from_scenario(&response.scenario, args.counts);
    let csv = query::trajectory_csv(&response.trajectory, &reporting)?;
    write_output(output, &csv)
}

fn cmd_series(
    scenario_path: &Path,
    variable: &str,
    args: &RunArgs,
    output: Option<&Path>,
) -> AppResult<()> {
    let response = run_service::run(&RunRequest {
        scenario_path,
        options: args.options(),
    })?;
    let reporting = Reporting::from_scenario(&response.scenario, args.counts);
    let series = query::extract_series(&response.trajectory, variable, &reporting)?;

    let mut csv = format!("time_days,{variable}\n");
    for (t, value) in series {
        csv.push_str(&format!("{t},{value}\n"));
    }
    write_output(output, &csv)
}

fn cmd_sweep(scenario_path: &Path, args: &RunArgs, output: Option<&Path>) -> AppResult<()> {
    let scenario = scenario_service::load_scenario(scenario_path)?;
    eprintln!("Running sweep for scenario: {}", scenario.name);
    let points = run_service::run_sweep(&scenario, &args.options())?;
    eprintln!("✓ {} runs completed", points.len());

    for p in &points {
        eprintln!(
            "  value={:<8.4} peak I={:.4e} at t={:.1}  final cumulative={:.4}  deaths={:.0}",
            p.value, p.peak_infected, p.peak_infected_t, p.final_cumulative, p.final_deaths
        );
    }
    let json = serde_json::to_string_pretty(&points)
        .map_err(|e| AppError::InvalidInput(format!("Failed to encode sweep: {e}")))?;
    write_output(output, &json)
}

fn cmd_adjust(
    scenario_path: &Path,
    phase: usize,
    parameter: &str,
    ratio: f64,
    args: &RunArgs,
) -> AppResult<()> {
    let base = run_service::run(&RunRequest {
        scenario_path,
        options: args.options(),
    })?;
    eprintln!("Baseline:");
    print_run_summary(&base, args.counts)?;

    let adjusted = run_service::adjust_rate(&base, phase, parameter, ratio)?;
    eprintln!("\nPhase {phase}: {parameter} x {ratio}");
    print_run_summary(&adjusted, args.counts)?;
    Ok(())
}

fn print_run_summary(response: &RunResponse, counts: bool) -> AppResult<()> {
    let reporting = Reporting::from_scenario(&response.scenario, counts);
    let summary = query::get_run_summary(&response.trajectory, &reporting)?;
    eprintln!(
        "  {} model, t = {} .. {} days, {} points",
        summary.model, summary.time_range.0, summary.time_range.1, summary.record_count
    );
    if let Some((t, value)) = summary.peak_infected {
        eprintln!("  Peak infected: {value:.4e} at day {t:.1}");
    }
    for (name, value) in &summary.final_values {
        eprintln!("  Final {name}: {value:.4e}");
    }
    eprintln!("  Final cumulative: {:.4e}", summary.final_cumulative);
    eprintln!("  Final deaths: {:.0}", summary.final_deaths);
    print_timing_summary(&response.timing);
    Ok(())
}

fn print_timing_summary(timing: &RunTimingSummary) {
    let total = timing.total_time_s.max(1.0e-12);
    let solve_pct = 100.0 * timing.solve_time_s / total;

    eprintln!("Timing summary:");
    if timing.build_time_s > 0.0 {
        eprintln!("  Build:   {:.3}s", timing.build_time_s);
    }
    eprintln!("  Solve:   {:.3}s ({:.1}%)", timing.solve_time_s, solve_pct);
    eprintln!("  Total:   {:.3}s", timing.total_time_s);
    eprintln!(
        "  Steps:   {} accepted, {} rejected, {} rhs evaluations",
        timing.accepted_steps, timing.rejected_steps, timing.rhs_evals
    );
    if timing.reused_phases > 0 {
        eprintln!("  Reused phases: {}", timing.reused_phases);
    }
}

fn write_output(output: Option<&Path>, content: &str) -> AppResult<()> {
    match output {
        Some(path) => {
            fs::write(path, content)?;
            eprintln!("✓ Written to {}", path.display());
        }
        None => print!("{content}"),
    }
    Ok(())
}
