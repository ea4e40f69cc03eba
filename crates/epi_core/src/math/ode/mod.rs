//! Ordinary differential equation integration.
//!
//! The model layer consumes integration through the [`OdeIntegrator`] trait:
//! a right-hand side `f(t, y, dy)`, an initial state and a time grid go in,
//! and the state at every grid point comes out. Any integrator satisfying
//! that contract can be substituted.
//!
//! ## Available Integrators
//!
//! - [`DormandPrince`]: explicit Runge–Kutta 5(4) with adaptive step-size
//!   control and FSAL stage reuse
//!
//! ## Configuration
//!
//! [`OdeConfig`] controls relative/absolute tolerance, the step budget and
//! optional initial/maximum step sizes.
//!
//! ## Example
//!
//! ```
//! use epi_core::math::ode::{DormandPrince, OdeConfig, OdeIntegrator};
//!
//! // Logistic growth dy/dt = y (1 - y)
//! let integrator = DormandPrince::new(OdeConfig::high_precision());
//! let grid: Vec<f64> = (0..=10).map(|k| k as f64).collect();
//! let states = integrator
//!     .integrate(|_t, y, dy| dy[0] = y[0] * (1.0 - y[0]), &[0.1], &grid)
//!     .unwrap();
//!
//! let exact = 1.0 / (1.0 + 9.0 * (-10.0_f64).exp());
//! assert!((states[10][0] - exact).abs() < 1e-9);
//! ```

mod config;
mod dormand_prince;

pub use config::OdeConfig;
pub use dormand_prince::DormandPrince;

use crate::types::OdeError;

/// Deterministic integrator for systems `dy/dt = f(t, y)`.
///
/// Implementations must return one state vector per grid point, the first
/// being `y0` itself, and must produce identical output for identical input.
pub trait OdeIntegrator {
    /// Integrate from `t_grid[0]` through every point of `t_grid`.
    ///
    /// # Arguments
    ///
    /// * `rhs` - Derivative function writing `f(t, y)` into its third argument
    /// * `y0` - State at `t_grid[0]`
    /// * `t_grid` - Strictly increasing output times
    ///
    /// # Errors
    ///
    /// Returns [`OdeError`] if the grid or initial state is invalid, or the
    /// integration fails to make progress.
    fn integrate<F>(&self, rhs: F, y0: &[f64], t_grid: &[f64]) -> Result<Vec<Vec<f64>>, OdeError>
    where
        F: FnMut(f64, &[f64], &mut [f64]);
}

/// Uniform grid of `points` values spanning `[start, end]` inclusive.
///
/// With a single point the grid is `[start]`.
///
/// # Examples
/// ```
/// use epi_core::math::ode::linspace;
///
/// assert_eq!(linspace(0.0, 4.0, 3), vec![0.0, 2.0, 4.0]);
/// assert_eq!(linspace(0.0, 1.0, 1), vec![0.0]);
/// assert!(linspace(0.0, 1.0, 0).is_empty());
/// ```
pub fn linspace(start: f64, end: f64, points: usize) -> Vec<f64> {
    match points {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (points - 1) as f64;
            (0..points)
                .map(|k| {
                    if k == points - 1 {
                        end
                    } else {
                        start + step * k as f64
                    }
                })
                .collect()
        }
    }
}

pub(crate) fn validate_problem(y0: &[f64], t_grid: &[f64]) -> Result<(), OdeError> {
    if t_grid.is_empty() {
        return Err(OdeError::InvalidGrid("time grid is empty".to_string()));
    }
    if t_grid.iter().any(|t| !t.is_finite()) {
        return Err(OdeError::InvalidGrid(
            "time grid contains non-finite values".to_string(),
        ));
    }
    if let Some(k) = t_grid.windows(2).position(|w| w[1] <= w[0]) {
        return Err(OdeError::InvalidGrid(format!(
            "time grid is not strictly increasing at index {}",
            k + 1
        )));
    }
    if y0.is_empty() {
        return Err(OdeError::InvalidInitialState("state is empty".to_string()));
    }
    if y0.iter().any(|v| !v.is_finite()) {
        return Err(OdeError::InvalidInitialState(
            "state contains non-finite values".to_string(),
        ));
    }
    Ok(())
}
