//! Strictly increasing time grids.

use crate::error::{SimError, SimResult};

/// Points closer than this to a phase boundary are merged into it.
const BOUNDARY_EPS: f64 = 1e-9;

/// Output times of an integration, in days.
#[derive(Clone, Debug, PartialEq)]
pub struct TimeGrid {
    points: Vec<f64>,
}

impl TimeGrid {
    /// Validate an explicit list of points.
    pub fn new(points: Vec<f64>) -> SimResult<Self> {
        if points.len() < 2 {
            return Err(SimError::config("time grid needs at least 2 points"));
        }
        if let Some(bad) = points.iter().find(|p| !p.is_finite()) {
            return Err(SimError::config(format!("time grid point {bad} is not finite")));
        }
        if let Some(w) = points.windows(2).find(|w| w[1] <= w[0]) {
            return Err(SimError::config(format!(
                "time grid must be strictly increasing ({} then {})",
                w[0], w[1]
            )));
        }
        Ok(Self { points })
    }

    /// `n` evenly spaced points from `start` to `end` inclusive.
    pub fn linspace(start: f64, end: f64, n: usize) -> SimResult<Self> {
        if n < 2 {
            return Err(SimError::config("time grid needs at least 2 points"));
        }
        if !(start.is_finite() && end.is_finite()) || end <= start {
            return Err(SimError::config(format!(
                "time grid end ({end}) must be after start ({start})"
            )));
        }
        let span = end - start;
        let last = (n - 1) as f64;
        let mut points: Vec<f64> = (0..n).map(|i| start + span * (i as f64) / last).collect();
        points[n - 1] = end;
        Self::new(points)
    }

    pub fn points(&self) -> &[f64] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn start(&self) -> f64 {
        self.points[0]
    }

    pub fn end(&self) -> f64 {
        self.points[self.points.len() - 1]
    }

    /// Sub-grid covering `[start, end]`: both bounds plus every interior
    /// point of `self` strictly between them.
    pub fn window(&self, start: f64, end: f64) -> SimResult<Self> {
        if end <= start {
            return Err(SimError::config(format!(
                "window end ({end}) must be after start ({start})"
            )));
        }
        let mut points = vec![start];
        points.extend(
            self.points
                .iter()
                .copied()
                .filter(|p| *p > start + BOUNDARY_EPS && *p < end - BOUNDARY_EPS),
        );
        points.push(end);
        Self::new(points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linspace_reference_grid() {
        let g = TimeGrid::linspace(0.0, 550.0, 1000).unwrap();
        assert_eq!(g.len(), 1000);
        assert_eq!(g.start(), 0.0);
        assert_eq!(g.end(), 550.0);
        let dt = 550.0 / 999.0;
        assert!((g.points()[1] - dt).abs() < 1e-12);
    }

    #[test]
    fn rejects_bad_grids() {
        assert!(TimeGrid::new(vec![0.0]).is_err());
        assert!(TimeGrid::new(vec![0.0, 1.0, 1.0]).is_err());
        assert!(TimeGrid::new(vec![0.0, f64::NAN]).is_err());
        assert!(TimeGrid::linspace(5.0, 5.0, 10).is_err());
        assert!(TimeGrid::linspace(0.0, 5.0, 1).is_err());
    }

    #[test]
    fn window_adds_bounds_and_keeps_interior() {
        let g = TimeGrid::linspace(0.0, 10.0, 11).unwrap();
        let w = g.window(2.5, 5.0).unwrap();
        assert_eq!(w.points(), &[2.5, 3.0, 4.0, 5.0]);
        let exact = g.window(2.0, 4.0).unwrap();
        assert_eq!(exact.points(), &[2.0, 3.0, 4.0]);
    }
}
