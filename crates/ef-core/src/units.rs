// ef-core/src/units.rs

use crate::{CoreResult, ensure_positive};
use uom::si::f64::Time as UomTime;

pub type Time = UomTime;

/// Minutes per day, the default tau.
pub const MINUTES_PER_DAY: f64 = 1440.0;

#[inline]
pub fn minutes(v: f64) -> Time {
    use uom::si::time::minute;
    Time::new::<minute>(v)
}

#[inline]
pub fn days(v: f64) -> Time {
    use uom::si::time::day;
    Time::new::<day>(v)
}

#[inline]
pub fn in_days(t: Time) -> f64 {
    use uom::si::time::day;
    t.get::<day>()
}

#[inline]
pub fn in_minutes(t: Time) -> f64 {
    use uom::si::time::minute;
    t.get::<minute>()
}

/// Length of one model time step.
///
/// Rates of the CovsirPhy-style models are expressed per tau; tau itself is
/// carried through the simulation core without interpretation and only used
/// when converting rates into day counts for reporting.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tau(Time);

impl Tau {
    pub fn from_minutes(v: f64) -> CoreResult<Self> {
        ensure_positive(v, "tau minutes")?;
        Ok(Self(minutes(v)))
    }

    pub fn minutes(&self) -> f64 {
        in_minutes(self.0)
    }

    pub fn days(&self) -> f64 {
        in_days(self.0)
    }

    /// Days covered by `steps` model steps.
    pub fn steps_to_days(&self, steps: f64) -> f64 {
        steps * self.days()
    }

    /// Average residence time, in days, for a per-tau `rate`.
    pub fn rate_to_days(&self, rate: f64) -> f64 {
        self.days() / rate
    }
}

impl Default for Tau {
    fn default() -> Self {
        Self(minutes(MINUTES_PER_DAY))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_tau_is_one_day() {
        let tau = Tau::default();
        assert!((tau.days() - 1.0).abs() < 1e-12);
        assert!((tau.minutes() - 1440.0).abs() < 1e-9);
    }

    #[test]
    fn rate_to_days_uses_tau() {
        let tau = Tau::from_minutes(720.0).unwrap();
        assert!((tau.rate_to_days(0.25) - 2.0).abs() < 1e-12);
        assert!((tau.steps_to_days(10.0) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn tau_rejects_non_positive() {
        assert!(Tau::from_minutes(0.0).is_err());
        assert!(Tau::from_minutes(-5.0).is_err());
    }

    #[test]
    fn constructors_smoke() {
        assert!((in_days(minutes(2880.0)) - 2.0).abs() < 1e-12);
        assert!((in_minutes(days(0.5)) - 720.0).abs() < 1e-9);
    }
}
