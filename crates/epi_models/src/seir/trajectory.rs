//! Simulated compartment trajectory.

use super::EpidemicParameters;
use crate::indicators::IndicatorSeries;

/// Daily S/E/I/R counts for one simulation, with derived indicators.
///
/// Built only by [`Simulator::simulate`](super::Simulator::simulate);
/// immutable afterwards.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct CompartmentTrajectory {
    t: Vec<f64>,
    s: Vec<f64>,
    e: Vec<f64>,
    i: Vec<f64>,
    r: Vec<f64>,
    population: u64,
    params: EpidemicParameters,
    indicators: IndicatorSeries,
}

impl CompartmentTrajectory {
    pub(crate) fn new(
        t: Vec<f64>,
        s: Vec<f64>,
        e: Vec<f64>,
        i: Vec<f64>,
        r: Vec<f64>,
        population: u64,
        params: EpidemicParameters,
    ) -> Self {
        let indicators = IndicatorSeries::derive(&s, &e, &r);
        Self {
            t,
            s,
            e,
            i,
            r,
            population,
            params,
            indicators,
        }
    }

    /// Number of grid points.
    pub fn len(&self) -> usize {
        self.t.len()
    }

    /// True when the trajectory has no grid points.
    pub fn is_empty(&self) -> bool {
        self.t.is_empty()
    }

    /// Output times.
    pub fn t(&self) -> &[f64] {
        &self.t
    }

    /// Susceptible counts.
    pub fn s(&self) -> &[f64] {
        &self.s
    }

    /// Exposed counts.
    pub fn e(&self) -> &[f64] {
        &self.e
    }

    /// Infectious counts.
    pub fn i(&self) -> &[f64] {
        &self.i
    }

    /// Recovered counts.
    pub fn r(&self) -> &[f64] {
        &self.r
    }

    /// Population the compartments are scaled to.
    pub fn population(&self) -> u64 {
        self.population
    }

    /// Parameters that produced this trajectory, with `tmax` filled in.
    pub fn params(&self) -> &EpidemicParameters {
        &self.params
    }

    /// Derived incidence and Rt series.
    pub fn indicators(&self) -> &IndicatorSeries {
        &self.indicators
    }

    /// `S + E + I + R` at grid point `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.len()`.
    pub fn total_at(&self, index: usize) -> f64 {
        self.s[index] + self.e[index] + self.i[index] + self.r[index]
    }

    /// Day index and size of the largest infectious compartment.
    ///
    /// Returns `None` for an empty trajectory.
    pub fn peak_prevalence(&self) -> Option<(usize, f64)> {
        self.i
            .iter()
            .copied()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(&b.1))
    }
}
