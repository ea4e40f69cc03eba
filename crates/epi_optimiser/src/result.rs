//! Calibration output.

use std::fmt;
use std::time::Duration;

use epi_core::math::stats::relative_error;
use epi_models::seir::EpidemicParameters;

/// Best-fit parameters and how well they explain the observations.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct CalibrationResult {
    /// Best-fit parameters; `tmax` is the observed series length.
    pub params: EpidemicParameters,
    /// `1 - loss` at the optimum, i.e. the R² of the best fit on the
    /// non-missing observations. At most 1; higher is better.
    pub score: f64,
    /// Objective and residual evaluations, each one simulation.
    pub evaluations: usize,
    /// Annealing iterations across all chains.
    pub iterations: usize,
    /// Non-missing observations the fit used.
    pub observations: usize,
    /// Wall-clock time spent calibrating.
    pub elapsed: Duration,
}

impl CalibrationResult {
    /// Elementwise relative error against known parameters, in
    /// [`EpidemicParameters::as_array`] order.
    pub fn parameter_errors(&self, truth: &EpidemicParameters) -> Vec<f64> {
        // Both arrays have the same fixed length
        relative_error(&truth.as_array(), &self.params.as_array()).unwrap_or_default()
    }
}

impl fmt::Display for CalibrationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (score {:.4}, {} observations, {} evaluations, {:.2?})",
            self.params, self.score, self.observations, self.evaluations, self.elapsed
        )
    }
}
