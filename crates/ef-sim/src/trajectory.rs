//! Time series of states produced by integration.

use crate::error::{SimError, SimResult};
use crate::sim::SimRecord;
use ef_models::{Compartment, ModelKind, StateVector};

/// Times closer than this are the same point.
const TIME_EPS: f64 = 1e-9;

/// Ordered `(time, state)` pairs of one model variant. Never empty.
#[derive(Clone, Debug, PartialEq)]
pub struct Trajectory {
    kind: ModelKind,
    t: Vec<f64>,
    x: Vec<StateVector>,
}

/// Maximum of one compartment series.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Peak {
    pub t: f64,
    pub value: f64,
    pub index: usize,
}

impl Trajectory {
    pub fn new(kind: ModelKind, t: Vec<f64>, x: Vec<StateVector>) -> SimResult<Self> {
        if t.is_empty() {
            return Err(SimError::config("trajectory needs at least one point"));
        }
        if t.len() != x.len() {
            return Err(SimError::config(format!(
                "trajectory has {} times but {} states",
                t.len(),
                x.len()
            )));
        }
        if let Some(bad) = x.iter().find(|s| s.kind() != kind) {
            return Err(SimError::config(format!(
                "{} state in a {kind} trajectory",
                bad.kind()
            )));
        }
        Ok(Self { kind, t, x })
    }

    pub fn from_record(kind: ModelKind, record: SimRecord<StateVector>) -> SimResult<Self> {
        Self::new(kind, record.t, record.x)
    }

    /// Join consecutive trajectories. Each boundary state appears once; the
    /// later segment's first point must sit on the earlier segment's last time.
    pub fn concat<'a>(parts: impl IntoIterator<Item = &'a Trajectory>) -> SimResult<Self> {
        let mut parts = parts.into_iter();
        let first = parts
            .next()
            .ok_or_else(|| SimError::config("nothing to concatenate"))?;
        let mut out = first.clone();
        for part in parts {
            if part.kind != out.kind {
                return Err(SimError::config(format!(
                    "cannot join {} and {} trajectories",
                    out.kind, part.kind
                )));
            }
            let end = out.end_time();
            if (part.start_time() - end).abs() > TIME_EPS {
                return Err(SimError::config(format!(
                    "segment starts at {} but previous ends at {end}",
                    part.start_time()
                )));
            }
            out.t.extend_from_slice(&part.t[1..]);
            out.x.extend_from_slice(&part.x[1..]);
        }
        Ok(out)
    }

    pub fn kind(&self) -> ModelKind {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.t.len()
    }

    pub fn is_empty(&self) -> bool {
        self.t.is_empty()
    }

    pub fn times(&self) -> &[f64] {
        &self.t
    }

    pub fn states(&self) -> &[StateVector] {
        &self.x
    }

    pub fn iter(&self) -> impl Iterator<Item = (f64, &StateVector)> {
        self.t.iter().copied().zip(self.x.iter())
    }

    pub fn start_time(&self) -> f64 {
        self.t[0]
    }

    pub fn end_time(&self) -> f64 {
        self.t[self.t.len() - 1]
    }

    pub fn initial_state(&self) -> &StateVector {
        &self.x[0]
    }

    pub fn final_state(&self) -> &StateVector {
        &self.x[self.x.len() - 1]
    }

    /// State recorded at `t`, if `t` is one of the recorded times.
    pub fn at(&self, t: f64) -> Option<&StateVector> {
        self.t
            .iter()
            .position(|ti| (ti - t).abs() <= TIME_EPS)
            .map(|i| &self.x[i])
    }

    /// Fraction series of one compartment; `None` if the variant lacks it.
    pub fn series(&self, compartment: Compartment) -> Option<Vec<f64>> {
        if compartment != Compartment::Recovered && self.kind.index_of(compartment).is_none() {
            return None;
        }
        self.x.iter().map(|s| s.get(compartment)).collect()
    }

    pub fn recovered(&self) -> Vec<f64> {
        self.x.iter().map(StateVector::recovered).collect()
    }

    /// Fraction that has ever left the pre-confirmed compartments.
    pub fn cumulative_cases(&self) -> Vec<f64> {
        self.x.iter().map(StateVector::cumulative_cases).collect()
    }

    pub fn peak(&self, compartment: Compartment) -> Option<Peak> {
        let series = self.series(compartment)?;
        series
            .iter()
            .enumerate()
            .fold(None, |best: Option<Peak>, (index, &value)| match best {
                Some(b) if b.value >= value => Some(b),
                _ => Some(Peak {
                    t: self.t[index],
                    value,
                    index,
                }),
            })
    }

    /// Absolute counts per point, compartments in model order then Recovered.
    pub fn to_counts(&self, population: f64) -> SimResult<Vec<Vec<f64>>> {
        check_population(population)?;
        Ok(self.x.iter().map(|s| s.to_counts(population)).collect())
    }

    /// Cumulative deaths per point.
    ///
    /// Variants with a Fatal compartment report `F * population`; the others
    /// apply `fatality_rate` to cumulative cases.
    pub fn deaths(&self, population: f64, fatality_rate: f64) -> SimResult<Vec<f64>> {
        check_population(population)?;
        check_fatality(fatality_rate)?;
        if self.kind.index_of(Compartment::Fatal).is_some() {
            return Ok(self
                .x
                .iter()
                .map(|s| s.get(Compartment::Fatal).unwrap_or(0.0) * population)
                .collect());
        }
        Ok(self
            .x
            .iter()
            .map(|s| s.cumulative_cases() * fatality_rate * population)
            .collect())
    }

    /// Deaths per day: `I * fatality_rate * removal_rate * population`.
    pub fn daily_deaths(
        &self,
        population: f64,
        fatality_rate: f64,
        removal_rate: f64,
    ) -> SimResult<Vec<f64>> {
        check_population(population)?;
        check_fatality(fatality_rate)?;
        if !(removal_rate >= 0.0 && removal_rate.is_finite()) {
            return Err(SimError::config(format!(
                "removal rate must be non-negative, got {removal_rate}"
            )));
        }
        let scale = fatality_rate * removal_rate * population;
        Ok(self
            .x
            .iter()
            .map(|s| s.get(Compartment::Infected).unwrap_or(0.0) * scale)
            .collect())
    }
}

fn check_population(population: f64) -> SimResult<()> {
    if population > 0.0 && population.is_finite() {
        Ok(())
    } else {
        Err(SimError::config(format!(
            "population must be positive, got {population}"
        )))
    }
}

fn check_fatality(rate: f64) -> SimResult<()> {
    if (0.0..=1.0).contains(&rate) {
        Ok(())
    } else {
        Err(SimError::config(format!(
            "fatality rate must be in [0, 1], got {rate}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sir(s: f64, i: f64) -> StateVector {
        StateVector::new(ModelKind::Sir, vec![s, i]).unwrap()
    }

    fn sample() -> Trajectory {
        Trajectory::new(
            ModelKind::Sir,
            vec![0.0, 1.0, 2.0, 3.0],
            vec![sir(0.99, 0.01), sir(0.9, 0.05), sir(0.8, 0.04), sir(0.75, 0.02)],
        )
        .unwrap()
    }

    #[test]
    fn rejects_mismatched_lengths() {
        let err = Trajectory::new(ModelKind::Sir, vec![0.0, 1.0], vec![sir(1.0, 0.0)]);
        assert!(err.is_err());
        assert!(Trajectory::new(ModelKind::Sir, vec![], vec![]).is_err());
    }

    #[test]
    fn peak_and_series() {
        let traj = sample();
        let peak = traj.peak(Compartment::Infected).unwrap();
        assert_eq!(peak.index, 1);
        assert_eq!(peak.t, 1.0);
        assert!(traj.series(Compartment::Exposed).is_none());
        let r = traj.series(Compartment::Recovered).unwrap();
        assert!((r[3] - 0.23).abs() < 1e-12);
    }

    #[test]
    fn concat_shares_boundary() {
        let traj = sample();
        let tail = Trajectory::new(
            ModelKind::Sir,
            vec![3.0, 4.0],
            vec![sir(0.75, 0.02), sir(0.74, 0.01)],
        )
        .unwrap();
        let joined = Trajectory::concat([&traj, &tail]).unwrap();
        assert_eq!(joined.times(), &[0.0, 1.0, 2.0, 3.0, 4.0]);
        assert_eq!(joined.at(3.0), Some(&sir(0.75, 0.02)));
    }

    #[test]
    fn concat_rejects_gap() {
        let traj = sample();
        let tail = Trajectory::new(ModelKind::Sir, vec![5.0], vec![sir(0.7, 0.0)]).unwrap();
        assert!(Trajectory::concat([&traj, &tail]).is_err());
    }

    #[test]
    fn deaths_from_cumulative_cases() {
        let traj = sample();
        let deaths = traj.deaths(1000.0, 0.01).unwrap();
        assert!((deaths[3] - 0.25 * 0.01 * 1000.0).abs() < 1e-9);
        assert!(traj.deaths(1000.0, 1.5).is_err());
        assert!(traj.deaths(0.0, 0.01).is_err());
    }

    #[test]
    fn deaths_from_fatal_compartment() {
        let x = StateVector::new(ModelKind::SirF, vec![0.9, 0.05, 0.01]).unwrap();
        let traj = Trajectory::new(ModelKind::SirF, vec![0.0], vec![x]).unwrap();
        let deaths = traj.deaths(1e6, 0.5).unwrap();
        assert!((deaths[0] - 1e4).abs() < 1e-6);
    }

    #[test]
    fn counts_append_recovered() {
        let counts = sample().to_counts(100.0).unwrap();
        assert_eq!(counts[0].len(), 3);
        assert!((counts[0].iter().sum::<f64>() - 100.0).abs() < 1e-9);
    }
}
