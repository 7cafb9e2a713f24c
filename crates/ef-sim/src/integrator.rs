//! Time integrators: fixed-step RK4 / forward Euler and adaptive
//! Dormand-Prince 5(4).

use crate::error::{SimError, SimResult};
use crate::model::TransientModel;
use ef_core::Tolerances;

/// Trait for fixed-step time integrators.
pub trait Integrator {
    /// Right-hand side evaluations per step.
    const RHS_PER_STEP: usize;

    /// Advance state by one time step using the transient model.
    fn step<M: TransientModel>(
        &self,
        model: &M,
        t: f64,
        x: &M::State,
        dt: f64,
    ) -> SimResult<M::State>;
}

/// Classical RK4 (Runge-Kutta 4th order) integrator.
#[derive(Clone, Debug)]
pub struct RK4;

impl Integrator for RK4 {
    const RHS_PER_STEP: usize = 4;

    fn step<M: TransientModel>(
        &self,
        model: &M,
        t: f64,
        x: &M::State,
        dt: f64,
    ) -> SimResult<M::State> {
        let k1 = model.rhs(t, x)?;

        let x2 = model.add(x, &model.scale(&k1, 0.5 * dt));
        let k2 = model.rhs(t + 0.5 * dt, &x2)?;

        let x3 = model.add(x, &model.scale(&k2, 0.5 * dt));
        let k3 = model.rhs(t + 0.5 * dt, &x3)?;

        let x4 = model.add(x, &model.scale(&k3, dt));
        let k4 = model.rhs(t + dt, &x4)?;

        // Combine: x_new = x + (dt/6) * (k1 + 2*k2 + 2*k3 + k4)
        let k_sum = model.add(
            &model.add(&k1, &model.scale(&k2, 2.0)),
            &model.add(&model.scale(&k3, 2.0), &k4),
        );

        Ok(model.add(x, &model.scale(&k_sum, dt / 6.0)))
    }
}

/// Forward Euler (explicit, 1st order, fast for testing).
/// Calls rhs() once per step instead of 4 times (RK4).
#[derive(Clone, Debug)]
pub struct ForwardEuler;

impl Integrator for ForwardEuler {
    const RHS_PER_STEP: usize = 1;

    fn step<M: TransientModel>(
        &self,
        model: &M,
        t: f64,
        x: &M::State,
        dt: f64,
    ) -> SimResult<M::State> {
        let xdot = model.rhs(t, x)?;
        Ok(model.add(x, &model.scale(&xdot, dt)))
    }
}

/// Counters accumulated over an integration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StepStats {
    pub accepted: usize,
    pub rejected: usize,
    pub rhs_evals: usize,
}

impl StepStats {
    pub fn attempts(&self) -> usize {
        self.accepted + self.rejected
    }

    pub fn merge(&mut self, other: StepStats) {
        self.accepted += other.accepted;
        self.rejected += other.rejected;
        self.rhs_evals += other.rhs_evals;
    }
}

// Dormand-Prince 5(4) tableau.
const C2: f64 = 1.0 / 5.0;
const C3: f64 = 3.0 / 10.0;
const C4: f64 = 4.0 / 5.0;
const C5: f64 = 8.0 / 9.0;

const A21: f64 = 1.0 / 5.0;
const A31: f64 = 3.0 / 40.0;
const A32: f64 = 9.0 / 40.0;
const A41: f64 = 44.0 / 45.0;
const A42: f64 = -56.0 / 15.0;
const A43: f64 = 32.0 / 9.0;
const A51: f64 = 19372.0 / 6561.0;
const A52: f64 = -25360.0 / 2187.0;
const A53: f64 = 64448.0 / 6561.0;
const A54: f64 = -212.0 / 729.0;
const A61: f64 = 9017.0 / 3168.0;
const A62: f64 = -355.0 / 33.0;
const A63: f64 = 46732.0 / 5247.0;
const A64: f64 = 49.0 / 176.0;
const A65: f64 = -5103.0 / 18656.0;

// 5th order weights (also the last stage row, FSAL).
const B1: f64 = 35.0 / 384.0;
const B3: f64 = 500.0 / 1113.0;
const B4: f64 = 125.0 / 192.0;
const B5: f64 = -2187.0 / 6784.0;
const B6: f64 = 11.0 / 84.0;

// 5th minus 4th order weights.
const E1: f64 = 71.0 / 57600.0;
const E3: f64 = -71.0 / 16695.0;
const E4: f64 = 71.0 / 1920.0;
const E5: f64 = -17253.0 / 339200.0;
const E6: f64 = 22.0 / 525.0;
const E7: f64 = -1.0 / 40.0;

/// Result of one trial step.
#[derive(Clone, Debug)]
pub struct Trial<S> {
    /// 5th order solution at t + h.
    pub x: S,
    /// Derivative at (t + h, x), reused as the first stage of the next step.
    pub k_end: S,
    /// RMS error normalized by the tolerances; the step is acceptable at <= 1.
    pub error: f64,
}

/// Adaptive explicit Runge-Kutta 5(4) with embedded error estimate.
#[derive(Clone, Debug, PartialEq)]
pub struct DormandPrince {
    pub tol: Tolerances,
    pub safety: f64,
    /// Smallest step-size factor applied after a step.
    pub min_factor: f64,
    /// Largest step-size factor applied after a step.
    pub max_factor: f64,
    pub max_dt: f64,
    pub min_dt: f64,
}

impl Default for DormandPrince {
    fn default() -> Self {
        Self {
            tol: Tolerances::default(),
            safety: 0.9,
            min_factor: 0.2,
            max_factor: 5.0,
            max_dt: f64::INFINITY,
            min_dt: 1e-12,
        }
    }
}

impl DormandPrince {
    pub fn new(tol: Tolerances) -> Self {
        Self {
            tol,
            ..Self::default()
        }
    }

    /// Attempt one step of size `h` from `(t, x)`, given `k1 = f(t, x)`.
    pub fn try_step<M: TransientModel>(
        &self,
        model: &M,
        t: f64,
        x: &M::State,
        k1: &M::State,
        h: f64,
    ) -> SimResult<Trial<M::State>> {
        let k2 = model.rhs(t + C2 * h, &combine(model, x, h, &[(A21, k1)]))?;
        let k3 = model.rhs(t + C3 * h, &combine(model, x, h, &[(A31, k1), (A32, &k2)]))?;
        let k4 = model.rhs(
            t + C4 * h,
            &combine(model, x, h, &[(A41, k1), (A42, &k2), (A43, &k3)]),
        )?;
        let k5 = model.rhs(
            t + C5 * h,
            &combine(model, x, h, &[(A51, k1), (A52, &k2), (A53, &k3), (A54, &k4)]),
        )?;
        let k6 = model.rhs(
            t + h,
            &combine(
                model,
                x,
                h,
                &[(A61, k1), (A62, &k2), (A63, &k3), (A64, &k4), (A65, &k5)],
            ),
        )?;
        let x_new = combine(
            model,
            x,
            h,
            &[(B1, k1), (B3, &k3), (B4, &k4), (B5, &k5), (B6, &k6)],
        );
        let k7 = model.rhs(t + h, &x_new)?;

        let err = combine(
            model,
            &model.scale(k1, h * E1),
            h,
            &[(E3, &k3), (E4, &k4), (E5, &k5), (E6, &k6), (E7, &k7)],
        );
        let error = error_norm(model, &err, x, &x_new, self.tol);

        Ok(Trial {
            x: x_new,
            k_end: k7,
            error,
        })
    }

    /// Step-size multiplier suggested by a normalized error.
    fn factor(&self, error: f64) -> f64 {
        if error == 0.0 {
            self.max_factor
        } else {
            (self.safety * error.powf(-0.2)).clamp(self.min_factor, self.max_factor)
        }
    }

    /// Integrate from `t0` to exactly `t1`.
    ///
    /// `h` carries the proposed step size in and out so consecutive grid
    /// intervals continue with the step size the controller settled on.
    pub fn advance<M: TransientModel>(
        &self,
        model: &M,
        t0: f64,
        x0: &M::State,
        t1: f64,
        h: &mut f64,
        stats: &mut StepStats,
        max_steps: usize,
    ) -> SimResult<M::State> {
        let mut t = t0;
        let mut x = x0.clone();
        let mut k1 = model.rhs(t, &x)?;
        stats.rhs_evals += 1;

        while t < t1 {
            if stats.attempts() >= max_steps {
                return Err(SimError::StepLimit {
                    phase: 0,
                    t,
                    max_steps,
                });
            }

            let remaining = t1 - t;
            let h_try = h.min(self.max_dt).min(remaining);
            let clipped = h_try < *h;

            let trial = self.try_step(model, t, &x, &k1, h_try)?;
            stats.rhs_evals += 6;
            let factor = self.factor(trial.error);

            if trial.error <= 1.0 {
                t = if h_try >= remaining { t1 } else { t + h_try };
                x = trial.x;
                k1 = trial.k_end;
                stats.accepted += 1;
                if model.components(&x).iter().any(|v| !v.is_finite()) {
                    return Err(SimError::instability(t, "non-finite state"));
                }
                let next = h_try * factor;
                *h = if clipped { h.max(next) } else { next };
            } else {
                stats.rejected += 1;
                *h = h_try * factor.min(1.0);
                if stats.rejected % 50 == 0 {
                    tracing::warn!(t, h = *h, error = trial.error, "repeated step rejections");
                }
                if !h.is_finite() || *h < self.min_dt {
                    return Err(SimError::instability(t, format!("step size underflow (h={h})")));
                }
            }
        }

        Ok(x)
    }
}

/// `x + h * sum(c_i * k_i)`.
fn combine<M: TransientModel>(
    model: &M,
    x: &M::State,
    h: f64,
    terms: &[(f64, &M::State)],
) -> M::State {
    terms
        .iter()
        .fold(x.clone(), |acc, (c, k)| model.add(&acc, &model.scale(k, h * c)))
}

/// RMS of `err` scaled by the tolerance of each component.
fn error_norm<M: TransientModel>(
    model: &M,
    err: &M::State,
    x_old: &M::State,
    x_new: &M::State,
    tol: Tolerances,
) -> f64 {
    let e = model.components(err);
    if e.is_empty() {
        return 0.0;
    }
    let a = model.components(x_old);
    let b = model.components(x_new);
    let sum: f64 = e
        .iter()
        .zip(a.iter().zip(b.iter()))
        .map(|(e, (a, b))| {
            let scaled = e / tol.scale(a.abs().max(b.abs()));
            scaled * scaled
        })
        .sum();
    (sum / e.len() as f64).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// dx/dt = -x, exact solution e^-t.
    struct Decay;

    impl TransientModel for Decay {
        type State = f64;

        fn rhs(&self, _t: f64, x: &f64) -> SimResult<f64> {
            Ok(-x)
        }

        fn add(&self, a: &f64, b: &f64) -> f64 {
            a + b
        }

        fn scale(&self, a: &f64, scale: f64) -> f64 {
            a * scale
        }

        fn components<'a>(&self, x: &'a f64) -> &'a [f64] {
            std::slice::from_ref(x)
        }
    }

    #[test]
    fn rk4_step_is_fourth_order() {
        let x = RK4.step(&Decay, 0.0, &1.0, 0.1).unwrap();
        assert!((x - (-0.1_f64).exp()).abs() < 1e-7);
    }

    #[test]
    fn euler_step() {
        let x = ForwardEuler.step(&Decay, 0.0, &1.0, 0.1).unwrap();
        assert!((x - 0.9).abs() < 1e-15);
    }

    #[test]
    fn dormand_prince_hits_tolerance() {
        let dp = DormandPrince::default();
        let mut h = 1.0;
        let mut stats = StepStats::default();
        let x = dp
            .advance(&Decay, 0.0, &1.0, 5.0, &mut h, &mut stats, 10_000)
            .unwrap();
        assert!((x - (-5.0_f64).exp()).abs() < 1e-8);
        assert!(stats.accepted > 0);
        assert_eq!(stats.rhs_evals, 1 + 6 * stats.attempts());
    }

    #[test]
    fn dormand_prince_respects_step_limit() {
        let dp = DormandPrince {
            max_dt: 0.01,
            ..DormandPrince::default()
        };
        let mut h = 1.0;
        let mut stats = StepStats::default();
        let err = dp
            .advance(&Decay, 0.0, &1.0, 5.0, &mut h, &mut stats, 10)
            .unwrap_err();
        assert!(matches!(err, SimError::StepLimit { max_steps: 10, .. }));
    }

    #[test]
    fn error_estimate_shrinks_with_step() {
        let dp = DormandPrince::default();
        let k1 = -1.0;
        let big = dp.try_step(&Decay, 0.0, &1.0, &k1, 1.0).unwrap();
        let small = dp.try_step(&Decay, 0.0, &1.0, &k1, 0.1).unwrap();
        assert!(small.error < big.error);
    }
}
