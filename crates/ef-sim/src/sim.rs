//! Grid integration and result recording.

use crate::error::{SimError, SimResult};
use crate::grid::TimeGrid;
use crate::integrator::{DormandPrince, ForwardEuler, Integrator, RK4, StepStats};
use crate::model::TransientModel;
use ef_core::Tolerances;
use tracing::debug;

/// Integrator selection for simulation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum IntegratorType {
    /// Adaptive Dormand-Prince 5(4) (default).
    #[default]
    DormandPrince,
    /// 4th-order Runge-Kutta, fixed step (4 rhs calls per step).
    Rk4,
    /// Forward Euler (1st-order, 1 rhs call per step).
    ForwardEuler,
}

/// Options for simulation runs.
#[derive(Clone, Debug, PartialEq)]
pub struct SimOptions {
    /// Integrator type (default: Dormand-Prince)
    pub integrator: IntegratorType,
    /// Error tolerances for the adaptive integrator
    pub tolerances: Tolerances,
    /// Maximum number of step attempts per run (safety limit)
    pub max_steps: usize,
    /// Largest step in days; fixed-step methods use at most this
    pub max_dt: f64,
    /// First trial step of the adaptive integrator (days)
    pub initial_step: Option<f64>,
    /// Check model invariants at every grid point
    pub check_invariants: bool,
    /// Tolerance of the invariant checks
    pub invariant_tol: f64,
}

impl Default for SimOptions {
    fn default() -> Self {
        Self {
            integrator: IntegratorType::default(),
            tolerances: Tolerances::default(),
            max_steps: 100_000,
            max_dt: 1.0,
            initial_step: None,
            check_invariants: true,
            invariant_tol: 1e-6,
        }
    }
}

impl SimOptions {
    pub fn with_integrator(mut self, integrator: IntegratorType) -> Self {
        self.integrator = integrator;
        self
    }

    pub fn validate(&self) -> SimResult<()> {
        if !(self.tolerances.abs > 0.0 && self.tolerances.abs.is_finite()) {
            return Err(SimError::config("absolute tolerance must be positive"));
        }
        if !(self.tolerances.rel >= 0.0 && self.tolerances.rel.is_finite()) {
            return Err(SimError::config("relative tolerance must be non-negative"));
        }
        if self.max_steps == 0 {
            return Err(SimError::config("max_steps must be positive"));
        }
        if !(self.max_dt > 0.0) {
            return Err(SimError::config("max_dt must be positive"));
        }
        if matches!(self.initial_step, Some(h) if !(h > 0.0 && h.is_finite())) {
            return Err(SimError::config("initial_step must be positive"));
        }
        if !(self.invariant_tol > 0.0 && self.invariant_tol.is_finite()) {
            return Err(SimError::config("invariant_tol must be positive"));
        }
        Ok(())
    }
}

/// Record of simulation results.
#[derive(Clone, Debug)]
pub struct SimRecord<S> {
    /// Time points (days), equal to the grid
    pub t: Vec<f64>,
    /// State snapshots, one per grid point
    pub x: Vec<S>,
    pub stats: StepStats,
}

/// Integrate `model` from `x0` over `grid`, recording one state per grid
/// point. The first recorded state is `x0` itself.
pub fn integrate<M: TransientModel>(
    model: &M,
    x0: &M::State,
    grid: &TimeGrid,
    opts: &SimOptions,
) -> SimResult<SimRecord<M::State>> {
    opts.validate()?;

    let points = grid.points();
    let mut stats = StepStats::default();
    let mut t_record = Vec::with_capacity(points.len());
    let mut x_record = Vec::with_capacity(points.len());

    check_finite(model, grid.start(), x0)?;
    if opts.check_invariants {
        model.check_invariants(grid.start(), x0, opts.invariant_tol)?;
    }
    t_record.push(grid.start());
    x_record.push(x0.clone());

    let dp = DormandPrince {
        tol: opts.tolerances,
        max_dt: opts.max_dt,
        ..DormandPrince::default()
    };
    let mut h = opts
        .initial_step
        .unwrap_or_else(|| (0.1 * (points[1] - points[0])).min(opts.max_dt));

    let mut x = x0.clone();
    for pair in points.windows(2) {
        let (t0, t1) = (pair[0], pair[1]);
        x = match opts.integrator {
            IntegratorType::DormandPrince => {
                dp.advance(model, t0, &x, t1, &mut h, &mut stats, opts.max_steps)?
            }
            IntegratorType::Rk4 => fixed_steps(&RK4, model, t0, &x, t1, opts, &mut stats)?,
            IntegratorType::ForwardEuler => {
                fixed_steps(&ForwardEuler, model, t0, &x, t1, opts, &mut stats)?
            }
        };
        if opts.check_invariants {
            model.check_invariants(t1, &x, opts.invariant_tol)?;
        }
        t_record.push(t1);
        x_record.push(x.clone());
    }

    debug!(
        points = points.len(),
        accepted = stats.accepted,
        rejected = stats.rejected,
        rhs_evals = stats.rhs_evals,
        "integration finished"
    );

    Ok(SimRecord {
        t: t_record,
        x: x_record,
        stats,
    })
}

/// Cover `[t0, t1]` with equal steps no larger than `max_dt`.
fn fixed_steps<I: Integrator, M: TransientModel>(
    integrator: &I,
    model: &M,
    t0: f64,
    x0: &M::State,
    t1: f64,
    opts: &SimOptions,
    stats: &mut StepStats,
) -> SimResult<M::State> {
    let n = ((t1 - t0) / opts.max_dt).ceil().max(1.0) as usize;
    let dt = (t1 - t0) / n as f64;
    let mut x = x0.clone();
    for i in 0..n {
        if stats.attempts() >= opts.max_steps {
            return Err(SimError::StepLimit {
                phase: 0,
                t: t0 + i as f64 * dt,
                max_steps: opts.max_steps,
            });
        }
        let t = t0 + i as f64 * dt;
        x = integrator.step(model, t, &x, dt)?;
        stats.accepted += 1;
        stats.rhs_evals += I::RHS_PER_STEP;
        check_finite(model, t + dt, &x)?;
    }
    Ok(x)
}

fn check_finite<M: TransientModel>(model: &M, t: f64, x: &M::State) -> SimResult<()> {
    if model.components(x).iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(SimError::instability(t, "non-finite state"))
    }
}
