use crate::{CoreError, CoreResult};

/// Floating point type used throughout system
pub type Real = f64;

/// Absolute + relative tolerance pair.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tolerances {
    pub abs: Real,
    pub rel: Real,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            abs: 1e-10,
            rel: 1e-8,
        }
    }
}

impl Tolerances {
    /// Error scale for a component whose magnitude is `magnitude`.
    pub fn scale(&self, magnitude: Real) -> Real {
        self.abs + self.rel * magnitude.abs()
    }
}

pub fn nearly_equal(a: Real, b: Real, tol: Tolerances) -> bool {
    let diff = (a - b).abs();
    if diff <= tol.abs {
        return true;
    }
    diff <= tol.rel * a.abs().max(b.abs())
}

pub fn ensure_finite(v: Real, what: &'static str) -> CoreResult<Real> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(CoreError::NonFinite { what, value: v })
    }
}

/// Finite and strictly positive.
pub fn ensure_positive(v: Real, what: &'static str) -> CoreResult<Real> {
    ensure_finite(v, what)?;
    if v > 0.0 {
        Ok(v)
    } else {
        Err(CoreError::OutOfRange {
            what,
            value: v,
            expected: "> 0",
        })
    }
}

/// Finite and >= 0.
pub fn ensure_non_negative(v: Real, what: &'static str) -> CoreResult<Real> {
    ensure_finite(v, what)?;
    if v >= 0.0 {
        Ok(v)
    } else {
        Err(CoreError::OutOfRange {
            what,
            value: v,
            expected: ">= 0",
        })
    }
}

/// Finite and within [0, 1].
pub fn ensure_fraction(v: Real, what: &'static str) -> CoreResult<Real> {
    ensure_finite(v, what)?;
    if (0.0..=1.0).contains(&v) {
        Ok(v)
    } else {
        Err(CoreError::OutOfRange {
            what,
            value: v,
            expected: "within [0, 1]",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nearly_equal_basic() {
        let tol = Tolerances {
            abs: 1e-12,
            rel: 1e-9,
        };
        assert!(nearly_equal(1.0, 1.0 + 1e-12, tol));
        assert!(nearly_equal(0.0, 1e-13, tol));
        assert!(!nearly_equal(1.0, 1.0 + 1e-6, tol));
    }

    #[test]
    fn ensure_finite_detects_nan() {
        let err = ensure_finite(Real::NAN, "test").unwrap_err();
        let msg = format!("{err}");
        assert!(msg.contains("Non-finite"));
    }

    #[test]
    fn ensure_positive_rejects_zero_and_negative() {
        assert!(ensure_positive(0.5, "rate").is_ok());
        assert!(ensure_positive(0.0, "rate").is_err());
        assert!(ensure_positive(-1.0, "rate").is_err());
        assert!(ensure_positive(Real::INFINITY, "rate").is_err());
    }

    #[test]
    fn ensure_fraction_bounds() {
        assert!(ensure_fraction(0.0, "theta").is_ok());
        assert!(ensure_fraction(1.0, "theta").is_ok());
        assert!(ensure_fraction(1.0 + 1e-9, "theta").is_err());
        assert!(ensure_non_negative(0.0, "kappa").is_ok());
        assert!(ensure_non_negative(-1e-12, "kappa").is_err());
    }

    #[test]
    fn tolerance_scale_grows_with_magnitude() {
        let tol = Tolerances::default();
        assert!(tol.scale(1.0) > tol.scale(1e-6));
        assert_eq!(tol.scale(0.0), tol.abs);
    }
}
