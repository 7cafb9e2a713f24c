//! Transmission parameter sources: constant or a function of time.

use crate::error::{ModelError, ModelResult};
use core::fmt;
use ef_core::{ensure_finite, ensure_non_negative, ensure_positive};
use std::sync::Arc;

/// Pure function of time returning a rate.
pub type RateFn = dyn Fn(f64) -> f64 + Send + Sync;

/// Shareable time-varying rate with a human-readable label.
#[derive(Clone)]
pub struct TimeFn {
    label: String,
    f: Arc<RateFn>,
}

impl TimeFn {
    pub fn new(label: impl Into<String>, f: impl Fn(f64) -> f64 + Send + Sync + 'static) -> Self {
        Self {
            label: label.into(),
            f: Arc::new(f),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn eval(&self, t: f64) -> f64 {
        (self.f)(t)
    }
}

impl fmt::Debug for TimeFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TimeFn({})", self.label)
    }
}

/// Two time functions are equal only if they share the same closure.
impl PartialEq for TimeFn {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.f, &other.f)
    }
}

/// Source of the transmission term of a derivative law.
///
/// Resolved once per derivative evaluation: a constant is returned as is,
/// a time-varying source is called with the absolute simulation time
/// (days since the start of the grid).
#[derive(Clone, Debug, PartialEq)]
pub enum ParameterSource {
    Constant(f64),
    TimeVarying(TimeFn),
}

impl ParameterSource {
    pub fn constant(value: f64) -> ModelResult<Self> {
        ensure_non_negative(value, "transmission")?;
        Ok(Self::Constant(value))
    }

    pub fn from_fn(
        label: impl Into<String>,
        f: impl Fn(f64) -> f64 + Send + Sync + 'static,
    ) -> Self {
        Self::TimeVarying(TimeFn::new(label, f))
    }

    /// `before` until `switch_at`, `after` from then on.
    pub fn step(before: f64, after: f64, switch_at: f64) -> ModelResult<Self> {
        ensure_non_negative(before, "step value before switch")?;
        ensure_non_negative(after, "step value after switch")?;
        ensure_finite(switch_at, "step switch time")?;
        Ok(Self::from_fn(
            format!("step({before} -> {after} @ t={switch_at})"),
            move |t| if t < switch_at { before } else { after },
        ))
    }

    /// `initial` until the first breakpoint, then the value of the latest
    /// breakpoint whose time is <= t.
    pub fn piecewise(initial: f64, breakpoints: Vec<(f64, f64)>) -> ModelResult<Self> {
        ensure_non_negative(initial, "piecewise initial value")?;
        for (t, v) in &breakpoints {
            ensure_finite(*t, "piecewise breakpoint time")?;
            ensure_non_negative(*v, "piecewise breakpoint value")?;
        }
        if breakpoints.windows(2).any(|w| w[1].0 <= w[0].0) {
            return Err(ModelError::Core(ef_core::CoreError::InvalidArg {
                what: "piecewise breakpoints must be strictly increasing in time",
            }));
        }
        let label = format!("piecewise({initial}, {} breakpoints)", breakpoints.len());
        Ok(Self::from_fn(label, move |t| {
            breakpoints
                .iter()
                .take_while(|(bt, _)| *bt <= t)
                .last()
                .map_or(initial, |(_, v)| *v)
        }))
    }

    /// Exponential relaxation from `r0` towards `r_bar` at speed `eta`:
    /// `r0 e^(-eta t) + (1 - e^(-eta t)) r_bar`.
    pub fn mitigating(r0: f64, eta: f64, r_bar: f64) -> ModelResult<Self> {
        ensure_non_negative(r0, "mitigating r0")?;
        ensure_positive(eta, "mitigating eta")?;
        ensure_non_negative(r_bar, "mitigating r_bar")?;
        Ok(Self::from_fn(
            format!("mitigating(r0={r0}, eta={eta}, r_bar={r_bar})"),
            move |t| {
                let decay = (-eta * t).exp();
                r0 * decay + (1.0 - decay) * r_bar
            },
        ))
    }

    pub fn is_time_varying(&self) -> bool {
        matches!(self, Self::TimeVarying(_))
    }

    /// Rate at time `t`; negative or non-finite values are rejected.
    pub fn value_at(&self, t: f64) -> ModelResult<f64> {
        let value = match self {
            Self::Constant(v) => *v,
            Self::TimeVarying(f) => f.eval(t),
        };
        if value.is_finite() && value >= 0.0 {
            Ok(value)
        } else {
            Err(ModelError::InvalidRate { t, value })
        }
    }

    /// The same source multiplied by `ratio` at every time.
    pub fn scaled(&self, ratio: f64) -> ModelResult<Self> {
        ensure_non_negative(ratio, "scale ratio")?;
        Ok(match self {
            Self::Constant(v) => Self::Constant(v * ratio),
            Self::TimeVarying(f) => {
                let inner = f.clone();
                Self::from_fn(format!("{ratio} x {}", f.label()), move |t| {
                    ratio * inner.eval(t)
                })
            }
        })
    }

    pub fn describe(&self) -> String {
        match self {
            Self::Constant(v) => format!("{v}"),
            Self::TimeVarying(f) => f.label().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_switches_at_boundary() {
        let s = ParameterSource::step(0.5, 2.0, 30.0).unwrap();
        assert_eq!(s.value_at(0.0).unwrap(), 0.5);
        assert_eq!(s.value_at(29.999).unwrap(), 0.5);
        assert_eq!(s.value_at(30.0).unwrap(), 2.0);
        assert!(s.is_time_varying());
    }

    #[test]
    fn piecewise_picks_latest_breakpoint() {
        let s = ParameterSource::piecewise(1.0, vec![(10.0, 2.0), (20.0, 0.5)]).unwrap();
        assert_eq!(s.value_at(5.0).unwrap(), 1.0);
        assert_eq!(s.value_at(10.0).unwrap(), 2.0);
        assert_eq!(s.value_at(25.0).unwrap(), 0.5);
        assert!(ParameterSource::piecewise(1.0, vec![(10.0, 2.0), (10.0, 0.5)]).is_err());
    }

    #[test]
    fn mitigating_relaxes_towards_r_bar() {
        let s = ParameterSource::mitigating(3.0, 1.0, 1.6).unwrap();
        assert!((s.value_at(0.0).unwrap() - 3.0).abs() < 1e-12);
        assert!((s.value_at(50.0).unwrap() - 1.6).abs() < 1e-12);
        let mid = s.value_at(1.0).unwrap();
        assert!(mid < 3.0 && mid > 1.6);
    }

    #[test]
    fn negative_values_are_rejected() {
        assert!(ParameterSource::constant(-0.1).is_err());
        assert!(ParameterSource::Constant(-0.1).value_at(0.0).is_err());
        let bad = ParameterSource::from_fn("bad", |t| 1.0 - t);
        assert!(bad.value_at(0.5).is_ok());
        let err = bad.value_at(2.0).unwrap_err();
        assert!(matches!(err, ModelError::InvalidRate { t, .. } if t == 2.0));
        let nan = ParameterSource::from_fn("nan", |_| f64::NAN);
        assert!(nan.value_at(0.0).is_err());
    }

    #[test]
    fn scaled_source_multiplies_every_value() {
        let s = ParameterSource::step(0.5, 2.0, 30.0).unwrap();
        let half = s.scaled(0.5).unwrap();
        assert!(half.is_time_varying());
        assert_eq!(half.value_at(10.0).unwrap(), 0.25);
        assert_eq!(half.value_at(40.0).unwrap(), 1.0);
        assert_eq!(
            ParameterSource::Constant(1.6).scaled(2.0).unwrap(),
            ParameterSource::Constant(3.2)
        );
        assert!(s.scaled(-1.0).is_err());
    }

    #[test]
    fn equality_is_by_identity_for_closures() {
        let a = ParameterSource::step(0.5, 2.0, 30.0).unwrap();
        let b = a.clone();
        let c = ParameterSource::step(0.5, 2.0, 30.0).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(ParameterSource::Constant(1.6), ParameterSource::Constant(1.6));
    }
}
