//! Bounded optimisation: gradient-free global search and local least squares.
//!
//! Calibration objectives built on ODE simulations are non-convex, often
//! multi-modal and only piecewise smooth, so the calibration layer consumes
//! optimisation through the [`GlobalOptimiser`] trait, which assumes nothing
//! beyond a box-bounded search space and a real-valued objective.
//!
//! ## Available Optimisers
//!
//! - [`SimulatedAnnealing`]: multi-restart annealing in the unit hypercube
//!   with a bounded pattern-search polish
//! - [`LevenbergMarquardt`]: box-constrained nonlinear least squares for
//!   refining a global optimum when the objective is a sum of squares
//!
//! ## Example
//!
//! ```
//! use epi_core::math::optimisers::{
//!     AnnealingConfig, GlobalOptimiser, ParameterBounds, SimulatedAnnealing,
//! };
//!
//! let optimiser = SimulatedAnnealing::new(AnnealingConfig::fast().with_seed(7));
//! let bounds = [ParameterBounds::new(-5.0, 5.0), ParameterBounds::new(-5.0, 5.0)];
//!
//! let result = optimiser
//!     .minimise(|x: &[f64]| (x[0] - 1.0).powi(2) + (x[1] + 2.0).powi(2), &bounds)
//!     .unwrap();
//!
//! assert!((result.params[0] - 1.0).abs() < 1e-3);
//! assert!((result.params[1] + 2.0).abs() < 1e-3);
//! ```

mod annealing;
mod levenberg_marquardt;

pub use annealing::{AnnealingConfig, SimulatedAnnealing};
pub use levenberg_marquardt::{LMConfig, LMResult, LevenbergMarquardt};

use crate::types::OptimiserError;

/// Bounds for a single parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ParameterBounds {
    /// Minimum allowed value.
    pub min: f64,
    /// Maximum allowed value.
    pub max: f64,
}

impl ParameterBounds {
    /// Create new bounds.
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Create bounds for a parameter in [0, 1].
    pub fn unit_interval() -> Self {
        Self { min: 0.0, max: 1.0 }
    }

    /// Width of the interval.
    pub fn width(&self) -> f64 {
        self.max - self.min
    }

    /// Check if a value is within bounds.
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// Clamp a value to bounds.
    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }

    /// Map a unit-interval coordinate onto the bounds.
    pub fn from_unit(&self, u: f64) -> f64 {
        self.clamp(self.min + u * self.width())
    }
}

/// Check that every interval is finite with `min < max`.
///
/// # Errors
///
/// [`OptimiserError::EmptySearchSpace`] for no bounds,
/// [`OptimiserError::InvalidBounds`] for the first bad interval.
pub fn validate_bounds(bounds: &[ParameterBounds]) -> Result<(), OptimiserError> {
    if bounds.is_empty() {
        return Err(OptimiserError::EmptySearchSpace);
    }
    for (index, b) in bounds.iter().enumerate() {
        if !b.min.is_finite() || !b.max.is_finite() || b.min >= b.max {
            return Err(OptimiserError::InvalidBounds {
                index,
                lower: b.min,
                upper: b.max,
            });
        }
    }
    Ok(())
}

/// Result of a global optimisation run.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimisationResult {
    /// Best parameters found, inside the bounds.
    pub params: Vec<f64>,
    /// Objective value at `params`.
    pub value: f64,
    /// Total objective evaluations across all restarts.
    pub evaluations: usize,
    /// Total annealing iterations across all restarts.
    pub iterations: usize,
}

/// Bounded, gradient-free global minimiser.
///
/// The objective may be evaluated from several threads at once, hence the
/// `Sync` bound. Non-finite objective values are treated as `+∞`.
pub trait GlobalOptimiser {
    /// Minimise `objective` over the box described by `bounds`.
    ///
    /// # Errors
    ///
    /// Returns [`OptimiserError`] if the bounds are invalid or no candidate
    /// produced a finite objective value.
    fn minimise<F>(
        &self,
        objective: F,
        bounds: &[ParameterBounds],
    ) -> Result<OptimisationResult, OptimiserError>
    where
        F: Fn(&[f64]) -> f64 + Sync;
}
