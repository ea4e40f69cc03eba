//! SEIR parameter calibration against an observed incidence series.
//!
//! # Objective
//!
//! For a candidate `x` and an observed series `y` of length `n`:
//!
//! ```text
//! loss(x) = 1 - R²(y, daily_incidence(simulate(x, tmax = n)))
//! ```
//!
//! with R² restricted to the days where `y` is not missing. The loss is
//! `-R²` shifted by a constant, so both share a minimiser; the reported
//! score `1 - loss` is the R² of the best fit. Candidates that cannot be
//! simulated score `+∞`.
//!
//! # Search
//!
//! A global optimiser explores the search box first. The loss is also a sum
//! of squares,
//!
//! ```text
//! loss(x) = Σ_i r_i(x)²,   r_i(x) = (predicted_i - y_i) / sqrt(SS_tot)
//! ```
//!
//! so the global optimum is then refined by box-constrained
//! Levenberg–Marquardt on the residuals `r`. The refined point replaces the
//! global one only if its loss is lower.

use std::time::Instant;

use epi_core::math::ode::{DormandPrince, OdeIntegrator};
use epi_core::math::optimisers::{
    GlobalOptimiser, LMConfig, LevenbergMarquardt, SimulatedAnnealing,
};
use epi_core::math::stats::r_squared;
use epi_core::types::{observed_count, observed_sum};
use epi_models::seir::{EpidemicParameters, Simulator};
use tracing::{debug, info, warn};

use crate::{CalibrationConfig, CalibrationError, CalibrationResult, SearchSpace};

/// Fits [`EpidemicParameters`] to observed daily incidence.
///
/// # Example
///
/// ```
/// use epi_core::types::from_dense;
/// use epi_models::seir::{EpidemicParameters, Simulator};
/// use epi_optimiser::{CalibrationConfig, Calibrator};
///
/// let simulator = Simulator::new(10_000).unwrap();
/// let truth = EpidemicParameters::default().with_tmax(60);
/// let trajectory = simulator.simulate(&truth).unwrap();
/// let observed = from_dense(trajectory.indicators().daily_incidence());
///
/// let config = CalibrationConfig::builder()
///     .restarts(2)
///     .max_iterations(200)
///     .max_polish_evaluations(300)
///     .build()
///     .unwrap();
/// let result = Calibrator::new(&simulator, config)
///     .unwrap()
///     .calibrate(&observed)
///     .unwrap();
///
/// assert!(result.score <= 1.0);
/// assert_eq!(result.params.tmax, Some(60));
/// ```
#[derive(Debug, Clone)]
pub struct Calibrator<'a, I = DormandPrince, O = SimulatedAnnealing> {
    simulator: &'a Simulator<I>,
    optimiser: O,
    refinement: Option<LevenbergMarquardt>,
    search_space: SearchSpace,
}

impl<'a, I> Calibrator<'a, I, SimulatedAnnealing>
where
    I: OdeIntegrator + Sync,
{
    /// Calibrator driving `simulator` with simulated annealing.
    ///
    /// # Errors
    ///
    /// [`CalibrationError::InvalidConfig`] if `config` fails validation.
    pub fn new(
        simulator: &'a Simulator<I>,
        config: CalibrationConfig,
    ) -> Result<Self, CalibrationError> {
        config.validate()?;
        Ok(Self {
            simulator,
            optimiser: SimulatedAnnealing::new(config.annealing()),
            refinement: config.refinement().map(LevenbergMarquardt::new),
            search_space: config.bounds,
        })
    }
}

impl<'a, I, O> Calibrator<'a, I, O>
where
    I: OdeIntegrator + Sync,
    O: GlobalOptimiser + Sync,
{
    /// Calibrator with a custom global optimiser and no least-squares
    /// refinement.
    ///
    /// # Errors
    ///
    /// [`CalibrationError::InvalidConfig`] if `search_space` is invalid.
    pub fn with_optimiser(
        simulator: &'a Simulator<I>,
        optimiser: O,
        search_space: SearchSpace,
    ) -> Result<Self, CalibrationError> {
        search_space.validate()?;
        Ok(Self {
            simulator,
            optimiser,
            refinement: None,
            search_space,
        })
    }

    /// Refine the global optimum with Levenberg–Marquardt, or switch the
    /// refinement off with `None`.
    pub fn with_refinement(mut self, config: Option<LMConfig>) -> Self {
        self.refinement = config.map(LevenbergMarquardt::new);
        self
    }

    /// Search box in use.
    pub fn search_space(&self) -> &SearchSpace {
        &self.search_space
    }

    /// Optimiser in use.
    pub fn optimiser(&self) -> &O {
        &self.optimiser
    }

    /// Least-squares refinement in use, if any.
    pub fn refinement(&self) -> Option<&LevenbergMarquardt> {
        self.refinement.as_ref()
    }

    /// Loss of one candidate, `1 - R²`.
    ///
    /// # Errors
    ///
    /// Model errors for candidates that cannot be simulated, statistics
    /// errors if no observation is usable.
    pub fn loss(&self, x: &[f64], observed: &[Option<f64>]) -> Result<f64, CalibrationError> {
        let params = EpidemicParameters::from_slice(x, Some(observed.len()))?;
        let trajectory = self.simulator.simulate(&params)?;
        let r2 = r_squared(observed, trajectory.indicators().daily_incidence())?;
        Ok(1.0 - r2)
    }

    /// Residuals `(predicted - observed) / sqrt(SS_tot)` over the
    /// non-missing days, in day order. Their sum of squares is
    /// [`loss`](Self::loss) unless every observed value is equal, in which
    /// case the residuals are left unscaled.
    ///
    /// # Errors
    ///
    /// As for [`loss`](Self::loss).
    pub fn residuals(
        &self,
        x: &[f64],
        observed: &[Option<f64>],
    ) -> Result<Vec<f64>, CalibrationError> {
        let spread = total_spread(observed)
            .ok_or_else(|| CalibrationError::insufficient_data(0, observed.len()))?;
        let scale = if spread > 0.0 { spread } else { 1.0 };
        self.scaled_residuals(x, observed, scale)
    }

    fn scaled_residuals(
        &self,
        x: &[f64],
        observed: &[Option<f64>],
        scale: f64,
    ) -> Result<Vec<f64>, CalibrationError> {
        let params = EpidemicParameters::from_slice(x, Some(observed.len()))?;
        let trajectory = self.simulator.simulate(&params)?;
        Ok(observed
            .iter()
            .zip(trajectory.indicators().daily_incidence())
            .filter_map(|(y, &p)| y.map(|y| (p - y) / scale))
            .collect())
    }

    /// Levenberg–Marquardt from `start`; returns the refined point, its
    /// loss and the evaluations spent, or `None` if nothing improved.
    fn refine(
        &self,
        solver: &LevenbergMarquardt,
        start: &[f64],
        start_loss: f64,
        observed: &[Option<f64>],
    ) -> Option<(Vec<f64>, f64, usize)> {
        let spread = total_spread(observed).filter(|&s| s > 0.0)?;
        let bounds = self.search_space.bounds();
        let residuals =
            |x: &[f64]| self.scaled_residuals(x, observed, spread).unwrap_or_default();
        let refined = match solver.solve(residuals, start.to_vec(), &bounds) {
            Ok(refined) => refined,
            Err(e) => {
                warn!(error = %e, "least-squares refinement failed");
                return None;
            }
        };

        let loss = self.loss(&refined.params, observed).unwrap_or(f64::INFINITY);
        debug!(
            start = start_loss,
            refined = loss,
            iterations = refined.iterations,
            evaluations = refined.evaluations,
            converged = refined.converged,
            "least-squares refinement finished"
        );
        (loss < start_loss).then_some((refined.params, loss, refined.evaluations))
    }

    /// Fit parameters to `observed`, a daily series whose missing days are
    /// `None`. Simulations run over `observed.len()` days.
    ///
    /// # Errors
    ///
    /// - [`CalibrationError::InsufficientData`] if `observed` is empty or
    ///   entirely missing
    /// - [`CalibrationError::Optimiser`] if no candidate could be scored
    pub fn calibrate(
        &self,
        observed: &[Option<f64>],
    ) -> Result<CalibrationResult, CalibrationError> {
        let length = observed.len();
        let observations = observed_count(observed);
        if observations == 0 {
            return Err(CalibrationError::insufficient_data(observations, length));
        }

        info!(
            days = length,
            observations,
            population = self.simulator.population(),
            "starting calibration"
        );
        let start = Instant::now();

        let bounds = self.search_space.bounds();
        let optimum = self.optimiser.minimise(
            |x: &[f64]| self.loss(x, observed).unwrap_or(f64::INFINITY),
            &bounds,
        )?;

        let mut best = optimum.params;
        let mut loss = optimum.value;
        let mut evaluations = optimum.evaluations;
        let refined = self
            .refinement
            .as_ref()
            .and_then(|solver| self.refine(solver, &best, loss, observed));
        if let Some((point, refined_loss, used)) = refined {
            best = point;
            loss = refined_loss;
            evaluations += used;
        }

        let params = EpidemicParameters::from_slice(&best, Some(length))?;
        let score = 1.0 - loss;
        let elapsed = start.elapsed();

        debug!(%params, loss, "best candidate");
        info!(
            score,
            evaluations,
            iterations = optimum.iterations,
            elapsed_ms = elapsed.as_millis() as u64,
            "calibration finished"
        );

        Ok(CalibrationResult {
            params,
            score,
            evaluations,
            iterations: optimum.iterations,
            observations,
            elapsed,
        })
    }
}

/// Square root of the total sum of squares of the non-missing days, or
/// `None` if every day is missing.
fn total_spread(observed: &[Option<f64>]) -> Option<f64> {
    let count = observed_count(observed);
    if count == 0 {
        return None;
    }
    let mean = observed_sum(observed) / count as f64;
    let ss_tot: f64 = observed.iter().flatten().map(|y| (y - mean) * (y - mean)).sum();
    Some(ss_tot.sqrt())
}

/// Calibration as an operation on the simulator itself.
///
/// # Example
///
/// ```
/// use epi_models::seir::Simulator;
/// use epi_optimiser::{Calibrate, CalibrationError};
///
/// let simulator = Simulator::new(1_000).unwrap();
/// assert!(matches!(
///     simulator.calibrate(&[None, None, None]),
///     Err(CalibrationError::InsufficientData { .. })
/// ));
/// ```
pub trait Calibrate {
    /// Calibrate with [`CalibrationConfig::default`].
    ///
    /// # Errors
    ///
    /// See [`Calibrator::calibrate`].
    fn calibrate(&self, observed: &[Option<f64>]) -> Result<CalibrationResult, CalibrationError> {
        self.calibrate_with(observed, CalibrationConfig::default())
    }

    /// Calibrate with an explicit configuration.
    ///
    /// # Errors
    ///
    /// See [`Calibrator::new`] and [`Calibrator::calibrate`].
    fn calibrate_with(
        &self,
        observed: &[Option<f64>],
        config: CalibrationConfig,
    ) -> Result<CalibrationResult, CalibrationError>;
}

impl<I> Calibrate for Simulator<I>
where
    I: OdeIntegrator + Sync,
{
    fn calibrate_with(
        &self,
        observed: &[Option<f64>],
        config: CalibrationConfig,
    ) -> Result<CalibrationResult, CalibrationError> {
        Calibrator::new(self, config)?.calibrate(observed)
    }
}
