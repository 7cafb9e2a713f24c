//! Behavioural adjustments of named rates.
//!
//! Scenario edits re-derive a rate from the previous one through a ratio
//! instead of re-estimating it: fewer outings scale the transmission rate,
//! better hygiene scales the recovery rate.

use crate::error::ModelResult;
use ef_core::{CoreError, ensure_fraction, ensure_non_negative, ensure_positive};

/// Share of a population and how many days a week it goes out.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GoOutGroup {
    pub portion: f64,
    pub days_per_week: f64,
}

/// Population-weighted days per week spent outside.
pub fn go_out_days(groups: &[GoOutGroup]) -> ModelResult<f64> {
    let mut total = 0.0;
    for g in groups {
        ensure_fraction(g.portion, "group portion")?;
        ensure_non_negative(g.days_per_week, "days per week")?;
        if g.days_per_week > 7.0 {
            return Err(CoreError::OutOfRange {
                what: "days per week",
                value: g.days_per_week,
                expected: "<= 7",
            }
            .into());
        }
        total += g.portion * g.days_per_week;
    }
    Ok(total)
}

/// Ratio applied to the transmission rate when outings change:
/// `rho_after = rho_before * contact_ratio(before, after)`.
pub fn contact_ratio(go_out_before: f64, go_out_after: f64) -> ModelResult<f64> {
    ensure_positive(go_out_before, "go-out days before")?;
    ensure_non_negative(go_out_after, "go-out days after")?;
    Ok(go_out_after / go_out_before)
}

/// Ratio applied to sigma when hygiene changes, with `h` the share of
/// people lacking hygiene and `s` the share of those who spread:
/// `(1 - h_after s_after) / (1 - h_before s_before)`.
pub fn hygiene_sigma_ratio(
    h_before: f64,
    s_before: f64,
    h_after: f64,
    s_after: f64,
) -> ModelResult<f64> {
    for (v, what) in [
        (h_before, "h before"),
        (s_before, "s before"),
        (h_after, "h after"),
        (s_after, "s after"),
    ] {
        ensure_fraction(v, what)?;
    }
    let denominator = 1.0 - h_before * s_before;
    ensure_positive(denominator, "1 - h_before * s_before")?;
    Ok((1.0 - h_after * s_after) / denominator)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn go_out_days_weighted_sum() {
        let groups = [
            GoOutGroup {
                portion: 0.25,
                days_per_week: 5.0,
            },
            GoOutGroup {
                portion: 0.75,
                days_per_week: 2.0,
            },
        ];
        assert!((go_out_days(&groups).unwrap() - 2.75).abs() < 1e-12);
        let bad = [GoOutGroup {
            portion: 0.5,
            days_per_week: 8.0,
        }];
        assert!(go_out_days(&bad).is_err());
    }

    #[test]
    fn contact_ratio_halving() {
        assert!((contact_ratio(4.0, 2.0).unwrap() - 0.5).abs() < 1e-15);
        assert!(contact_ratio(0.0, 2.0).is_err());
    }

    #[test]
    fn hygiene_ratio_above_one_when_hygiene_improves() {
        let r = hygiene_sigma_ratio(0.5, 0.5, 0.05, 0.5).unwrap();
        assert!((r - (1.0 - 0.025) / 0.75).abs() < 1e-12);
        assert!(r > 1.0);
        assert!(hygiene_sigma_ratio(1.0, 1.0, 0.5, 0.5).is_err());
    }
}
