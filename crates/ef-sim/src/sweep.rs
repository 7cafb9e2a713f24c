//! Parallel parameter sweeps.
//!
//! Runs share nothing mutable, so they are evaluated with rayon and
//! collected in the caller's order.

use crate::compose::{Composition, compose};
use crate::error::SimResult;
use crate::phase::{ParameterUpdate, PhasePlan};
use crate::sim::SimOptions;
use ef_models::ParameterSource;
use rayon::prelude::*;
use tracing::info;

/// Compose every plan; result `i` belongs to `plans[i]`.
pub fn sweep(plans: &[PhasePlan], opts: &SimOptions) -> Vec<SimResult<Composition>> {
    info!(runs = plans.len(), "starting sweep");
    plans.par_iter().map(|plan| compose(plan, opts)).collect()
}

/// One plan per value, with the transmission parameter set to that value in
/// every phase and explicit transmission sources removed.
pub fn transmission_sweep(plan: &PhasePlan, values: &[f64]) -> SimResult<Vec<PhasePlan>> {
    let name = plan.kind().transmission_parameter();
    values
        .iter()
        .map(|&value| {
            let base = plan.base_parameters().clone().with(name, value);
            let defs = plan
                .definitions()
                .iter()
                .cloned()
                .map(|mut def| {
                    def.transmission = None;
                    match &mut def.parameters {
                        ParameterUpdate::Inherit(set) => {
                            if set.contains(name) {
                                set.insert(name, value);
                            }
                        }
                        ParameterUpdate::Replace(set) => {
                            set.insert(name, value);
                        }
                    }
                    def
                })
                .collect();
            plan.with_phases(base, defs)
        })
        .collect()
}

/// One plan per decay rate `eta`, every phase driven by
/// `r0 * e^(-eta t) + (1 - e^(-eta t)) * r_bar`.
pub fn mitigation_sweep(
    plan: &PhasePlan,
    etas: &[f64],
    r0: f64,
    r_bar: f64,
) -> SimResult<Vec<PhasePlan>> {
    etas.iter()
        .map(|&eta| {
            let source = ParameterSource::mitigating(r0, eta, r_bar)?;
            let defs = plan
                .definitions()
                .iter()
                .cloned()
                .map(|def| def.with_transmission(source.clone()))
                .collect();
            plan.with_phases(plan.base_parameters().clone(), defs)
        })
        .collect()
}
