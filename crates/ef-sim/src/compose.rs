//! Phase composition: integrate phases in order, chaining end-state to
//! start-state, and concatenate their trajectories.
//!
//! Segments are shared behind `Arc` and never mutated. `recompose` reuses
//! every leading segment whose inputs are unchanged and integrates forward
//! from the first changed phase.

use std::sync::Arc;

use crate::error::SimResult;
use crate::integrator::StepStats;
use crate::model::PhaseModel;
use crate::phase::{Phase, PhasePlan};
use crate::sim::{SimOptions, integrate};
use crate::trajectory::Trajectory;
use ef_models::StateVector;
use tracing::{debug, info};

/// One integrated phase.
#[derive(Clone, Debug, PartialEq)]
pub struct PhaseSegment {
    phase: Phase,
    trajectory: Trajectory,
    stats: StepStats,
}

impl PhaseSegment {
    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn trajectory(&self) -> &Trajectory {
        &self.trajectory
    }

    pub fn stats(&self) -> StepStats {
        self.stats
    }

    pub fn start_state(&self) -> &StateVector {
        self.trajectory.initial_state()
    }

    pub fn end_state(&self) -> &StateVector {
        self.trajectory.final_state()
    }
}

/// Result of composing a plan.
#[derive(Clone, Debug)]
pub struct Composition {
    plan: PhasePlan,
    opts: SimOptions,
    segments: Vec<Arc<PhaseSegment>>,
    reused: usize,
}

impl Composition {
    pub fn plan(&self) -> &PhasePlan {
        &self.plan
    }

    pub fn options(&self) -> &SimOptions {
        &self.opts
    }

    pub fn segments(&self) -> &[Arc<PhaseSegment>] {
        &self.segments
    }

    /// Number of leading segments taken from a previous composition.
    pub fn reused(&self) -> usize {
        self.reused
    }

    /// Full-scenario trajectory; each phase boundary appears once.
    pub fn trajectory(&self) -> SimResult<Trajectory> {
        Trajectory::concat(self.segments.iter().map(|s| s.trajectory()))
    }

    pub fn final_state(&self) -> &StateVector {
        match self.segments.last() {
            Some(s) => s.end_state(),
            None => self.plan.initial(),
        }
    }

    /// `(time, state)` at the start of every phase after the first.
    pub fn boundary_states(&self) -> Vec<(f64, &StateVector)> {
        self.segments
            .iter()
            .skip(1)
            .map(|s| (s.phase().start, s.start_state()))
            .collect()
    }

    pub fn stats(&self) -> StepStats {
        self.segments.iter().fold(StepStats::default(), |mut acc, s| {
            acc.merge(s.stats());
            acc
        })
    }
}

/// Integrate every phase of `plan` in order.
pub fn compose(plan: &PhasePlan, opts: &SimOptions) -> SimResult<Composition> {
    compose_from(plan, opts, Vec::new())
}

/// Compose `plan`, sharing the leading segments of `previous` whose phase,
/// initial state, grid and options are unchanged.
pub fn recompose(
    plan: &PhasePlan,
    previous: &Composition,
    opts: &SimOptions,
) -> SimResult<Composition> {
    let compatible = previous.opts == *opts
        && previous.plan.initial() == plan.initial()
        && previous.plan.grid() == plan.grid();
    let kept: Vec<Arc<PhaseSegment>> = if compatible {
        previous
            .segments
            .iter()
            .zip(plan.phases())
            .take_while(|(seg, phase)| seg.phase().same_dynamics(phase))
            .map(|(seg, _)| Arc::clone(seg))
            .collect()
    } else {
        Vec::new()
    };
    compose_from(plan, opts, kept)
}

fn compose_from(
    plan: &PhasePlan,
    opts: &SimOptions,
    mut segments: Vec<Arc<PhaseSegment>>,
) -> SimResult<Composition> {
    opts.validate()?;
    let reused = segments.len();
    info!(
        model = %plan.kind(),
        phases = plan.len(),
        reused,
        "composing phase plan"
    );

    let mut x = match segments.last() {
        Some(s) => s.end_state().clone(),
        None => plan.initial().clone(),
    };
    for phase in &plan.phases()[reused..] {
        let segment = run_phase(plan, phase, &x, opts)?;
        x = segment.end_state().clone();
        segments.push(Arc::new(segment));
    }

    Ok(Composition {
        plan: plan.clone(),
        opts: opts.clone(),
        segments,
        reused,
    })
}

fn run_phase(
    plan: &PhasePlan,
    phase: &Phase,
    x0: &StateVector,
    opts: &SimOptions,
) -> SimResult<PhaseSegment> {
    let in_phase = |e: crate::error::SimError| e.in_phase(phase.index);
    let grid = plan.grid().window(phase.start, phase.end)?;
    let model = PhaseModel::new(&phase.model, &phase.source);
    let record = integrate(&model, x0, &grid, opts).map_err(in_phase)?;
    let stats = record.stats;
    debug!(
        phase = phase.index,
        name = %phase.name,
        start = phase.start,
        end = phase.end,
        accepted = stats.accepted,
        rejected = stats.rejected,
        "phase integrated"
    );
    Ok(PhaseSegment {
        phase: phase.clone(),
        trajectory: Trajectory::from_record(plan.kind(), record)?,
        stats,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::TimeGrid;
    use crate::phase::{PhaseDef, PhasePlanBuilder};
    use ef_models::{Compartment, ModelKind};

    fn plan() -> PhasePlan {
        let kind = ModelKind::Sir;
        PhasePlanBuilder::new(
            kind,
            kind.example_state().unwrap(),
            TimeGrid::linspace(0.0, 60.0, 61).unwrap(),
        )
        .base_parameters(kind.example_parameters())
        .phase(PhaseDef::until(20.0))
        .phase(PhaseDef::until(40.0).with_parameter("rho", 0.1))
        .phase(PhaseDef::until(60.0))
        .build()
        .unwrap()
    }

    #[test]
    fn trajectory_covers_grid_once() {
        let c = compose(&plan(), &SimOptions::default()).unwrap();
        let traj = c.trajectory().unwrap();
        assert_eq!(traj.len(), 61);
        assert_eq!(c.segments().len(), 3);
        assert_eq!(c.reused(), 0);
    }

    #[test]
    fn segments_chain_end_to_start() {
        let c = compose(&plan(), &SimOptions::default()).unwrap();
        for pair in c.segments().windows(2) {
            assert_eq!(pair[0].end_state(), pair[1].start_state());
        }
        assert_eq!(c.boundary_states().len(), 2);
    }

    #[test]
    fn recompose_shares_unchanged_prefix() {
        let opts = SimOptions::default();
        let first = compose(&plan(), &opts).unwrap();
        let edited = plan()
            .edit_phase(2, |def| def.set_parameter("rho", 0.3))
            .unwrap();
        let second = recompose(&edited, &first, &opts).unwrap();
        assert_eq!(second.reused(), 2);
        assert!(Arc::ptr_eq(&first.segments()[0], &second.segments()[0]));
        assert!(Arc::ptr_eq(&first.segments()[1], &second.segments()[1]));
        assert!(!Arc::ptr_eq(&first.segments()[2], &second.segments()[2]));

        let fresh = compose(&edited, &opts).unwrap();
        assert_eq!(
            fresh.trajectory().unwrap(),
            second.trajectory().unwrap()
        );
        // The earlier composition still holds its own last phase.
        let peak_before = first.trajectory().unwrap().peak(Compartment::Infected);
        assert_eq!(
            peak_before,
            compose(&plan(), &opts)
                .unwrap()
                .trajectory()
                .unwrap()
                .peak(Compartment::Infected)
        );
    }

    #[test]
    fn recompose_with_new_options_starts_over() {
        let first = compose(&plan(), &SimOptions::default()).unwrap();
        let opts = SimOptions {
            max_dt: 0.5,
            ..SimOptions::default()
        };
        let second = recompose(&plan(), &first, &opts).unwrap();
        assert_eq!(second.reused(), 0);
    }
}
