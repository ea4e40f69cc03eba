//! Box-constrained Levenberg–Marquardt least squares.
//!
//! # Algorithm
//!
//! Each iteration solves the Marquardt-scaled normal equations
//!
//! ```text
//! (JᵀJ + λ diag(JᵀJ)) δ = -Jᵀr
//! p_{n+1} = clamp(p_n + δ, bounds)
//! ```
//!
//! where `J` is a finite-difference Jacobian of the residuals `r`. A trial
//! point is accepted only if it lowers `‖r‖²`; `λ` shrinks after an accepted
//! step and grows after a rejected one. Finite-difference steps are a fixed
//! fraction of each interval's width, so the solver behaves the same on
//! parameters of very different magnitude.
//!
//! Residual vectors containing non-finite values, or whose length differs
//! from the initial residual vector, count as infeasible.
//!
//! # Example
//!
//! ```
//! use epi_core::math::optimisers::{LevenbergMarquardt, LMConfig, ParameterBounds};
//!
//! // Fit y = a * exp(-b * x)
//! let x = [0.0, 1.0, 2.0, 3.0, 4.0];
//! let y: Vec<f64> = x.iter().map(|&t: &f64| 2.0 * (-0.5 * t).exp()).collect();
//! let residuals = |p: &[f64]| -> Vec<f64> {
//!     x.iter().zip(&y).map(|(&t, &obs)| p[0] * (-p[1] * t).exp() - obs).collect()
//! };
//!
//! let bounds = [ParameterBounds::new(0.0, 5.0), ParameterBounds::new(0.0, 2.0)];
//! let result = LevenbergMarquardt::new(LMConfig::default())
//!     .solve(residuals, vec![1.0, 1.0], &bounds)
//!     .unwrap();
//!
//! assert!(result.converged);
//! assert!((result.params[0] - 2.0).abs() < 1e-6);
//! assert!((result.params[1] - 0.5).abs() < 1e-6);
//! ```

use tracing::debug;

use super::{validate_bounds, ParameterBounds};
use crate::types::OptimiserError;

/// Configuration for [`LevenbergMarquardt`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LMConfig {
    /// Stop once the residual sum of squares falls to this value.
    pub tolerance: f64,
    /// Maximum number of Jacobian evaluations.
    pub max_iterations: usize,
    /// Initial damping factor.
    pub initial_lambda: f64,
    /// Factor applied to lambda on a rejected step.
    pub lambda_up: f64,
    /// Factor applied to lambda on an accepted step.
    pub lambda_down: f64,
    /// Lower limit for lambda.
    pub min_lambda: f64,
    /// Give up once lambda exceeds this.
    pub max_lambda: f64,
    /// Stop once an accepted step moves every parameter by less than this
    /// fraction of its interval width.
    pub param_tolerance: f64,
    /// Finite-difference step as a fraction of each interval width.
    pub fd_step: f64,
}

impl Default for LMConfig {
    fn default() -> Self {
        Self {
            tolerance: 1e-24,
            max_iterations: 200,
            initial_lambda: 1e-3,
            lambda_up: 10.0,
            lambda_down: 0.1,
            min_lambda: 1e-12,
            max_lambda: 1e12,
            param_tolerance: 1e-12,
            fd_step: 1e-6,
        }
    }
}

impl LMConfig {
    /// Set the iteration limit.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// [`OptimiserError::InvalidConfig`] for zero iterations, non-positive
    /// damping settings or a finite-difference step outside `(0, 0.5)`.
    pub fn validate(&self) -> Result<(), OptimiserError> {
        if self.max_iterations == 0 {
            return Err(OptimiserError::InvalidConfig(
                "max_iterations must be > 0".to_string(),
            ));
        }
        if !(self.initial_lambda > 0.0
            && self.min_lambda > 0.0
            && self.min_lambda <= self.max_lambda)
        {
            return Err(OptimiserError::InvalidConfig(format!(
                "lambda settings must satisfy 0 < min_lambda <= max_lambda and initial_lambda > 0, got {} / {} / {}",
                self.min_lambda, self.initial_lambda, self.max_lambda
            )));
        }
        if !(self.lambda_up > 1.0 && self.lambda_down > 0.0 && self.lambda_down < 1.0) {
            return Err(OptimiserError::InvalidConfig(format!(
                "need lambda_up > 1 and 0 < lambda_down < 1, got {} and {}",
                self.lambda_up, self.lambda_down
            )));
        }
        if !(self.fd_step > 0.0 && self.fd_step < 0.5) {
            return Err(OptimiserError::InvalidConfig(format!(
                "fd_step must be in (0, 0.5), got {}",
                self.fd_step
            )));
        }
        Ok(())
    }
}

/// Result of a [`LevenbergMarquardt`] run.
#[derive(Debug, Clone, PartialEq)]
pub struct LMResult {
    /// Final parameters, inside the bounds.
    pub params: Vec<f64>,
    /// Residual sum of squares at `params`.
    pub residual_ss: f64,
    /// Jacobian evaluations performed.
    pub iterations: usize,
    /// Residual evaluations performed, finite differences included.
    pub evaluations: usize,
    /// Whether a tolerance was met before the iteration or damping limits.
    pub converged: bool,
}

/// Box-constrained Levenberg–Marquardt solver.
///
/// See the [module documentation](self) for the algorithm.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LevenbergMarquardt {
    config: LMConfig,
}

/// Counts residual evaluations and screens out infeasible vectors.
struct Residuals<'a, F> {
    function: &'a F,
    len: usize,
    evaluations: usize,
}

impl<'a, F> Residuals<'a, F>
where
    F: Fn(&[f64]) -> Vec<f64>,
{
    fn eval(&mut self, params: &[f64]) -> Option<Vec<f64>> {
        self.evaluations += 1;
        let r = (self.function)(params);
        (r.len() == self.len && r.iter().all(|v| v.is_finite())).then_some(r)
    }
}

impl LevenbergMarquardt {
    /// Create a solver with the given configuration.
    pub fn new(config: LMConfig) -> Self {
        Self { config }
    }

    /// Get the configuration.
    pub fn config(&self) -> &LMConfig {
        &self.config
    }

    /// Minimise `‖residuals(p)‖²` over the box, starting from `initial`.
    ///
    /// `initial` is clamped into the bounds first.
    ///
    /// # Errors
    ///
    /// - [`OptimiserError::InvalidBounds`] / [`OptimiserError::EmptySearchSpace`]
    ///   for unusable bounds, or [`OptimiserError::InvalidConfig`] if
    ///   `initial` has the wrong length or the configuration is invalid
    /// - [`OptimiserError::NonFiniteObjective`] if the starting point is
    ///   infeasible
    pub fn solve<F>(
        &self,
        residuals: F,
        initial: Vec<f64>,
        bounds: &[ParameterBounds],
    ) -> Result<LMResult, OptimiserError>
    where
        F: Fn(&[f64]) -> Vec<f64>,
    {
        validate_bounds(bounds)?;
        self.config.validate()?;
        if initial.len() != bounds.len() {
            return Err(OptimiserError::InvalidConfig(format!(
                "initial point has {} parameters, bounds have {}",
                initial.len(),
                bounds.len()
            )));
        }

        let cfg = &self.config;
        let mut params: Vec<f64> = initial
            .iter()
            .zip(bounds)
            .map(|(&p, b)| b.clamp(p))
            .collect();

        let first = residuals(&params);
        let mut evaluator = Residuals {
            function: &residuals,
            len: first.len(),
            evaluations: 1,
        };
        if first.is_empty() || first.iter().any(|v| !v.is_finite()) {
            return Err(OptimiserError::NonFiniteObjective { evaluations: 1 });
        }

        let mut r = first;
        let mut ss = sum_of_squares(&r);
        let mut lambda = cfg.initial_lambda;
        let mut iterations = 0;
        let mut converged = false;

        'outer: while iterations < cfg.max_iterations {
            if ss <= cfg.tolerance {
                converged = true;
                break;
            }

            iterations += 1;
            let jacobian = self.jacobian(&mut evaluator, &params, bounds);
            let (jtj, jtr) = normal_equations(&jacobian, &r);

            loop {
                let Some(delta) = damped_step(&jtj, &jtr, lambda) else {
                    lambda *= cfg.lambda_up;
                    if lambda > cfg.max_lambda {
                        break 'outer;
                    }
                    continue;
                };

                let trial: Vec<f64> = params
                    .iter()
                    .zip(&delta)
                    .zip(bounds)
                    .map(|((&p, &d), b)| b.clamp(p + d))
                    .collect();
                let moved = trial
                    .iter()
                    .zip(&params)
                    .zip(bounds)
                    .map(|((&t, &p), b)| (t - p).abs() / b.width())
                    .fold(0.0, f64::max);
                if moved == 0.0 {
                    converged = true;
                    break 'outer;
                }

                let accepted = evaluator.eval(&trial).and_then(|trial_r| {
                    let trial_ss = sum_of_squares(&trial_r);
                    (trial_ss < ss).then_some((trial_r, trial_ss))
                });

                match accepted {
                    Some((trial_r, trial_ss)) => {
                        params = trial;
                        r = trial_r;
                        ss = trial_ss;
                        lambda = (lambda * cfg.lambda_down).max(cfg.min_lambda);
                        if moved < cfg.param_tolerance {
                            converged = true;
                            break 'outer;
                        }
                        break;
                    }
                    None => {
                        lambda *= cfg.lambda_up;
                        if lambda > cfg.max_lambda {
                            break 'outer;
                        }
                    }
                }
            }
        }

        if ss <= cfg.tolerance {
            converged = true;
        }

        debug!(
            residual_ss = ss,
            iterations,
            evaluations = evaluator.evaluations,
            converged,
            lambda,
            "levenberg-marquardt finished"
        );

        Ok(LMResult {
            params,
            residual_ss: ss,
            iterations,
            evaluations: evaluator.evaluations,
            converged,
        })
    }

    /// Central differences, one-sided against a bound. Columns whose
    /// neighbours are all infeasible are left at zero, freezing that
    /// parameter for the step.
    fn jacobian<F>(
        &self,
        evaluator: &mut Residuals<'_, F>,
        params: &[f64],
        bounds: &[ParameterBounds],
    ) -> Vec<Vec<f64>>
    where
        F: Fn(&[f64]) -> Vec<f64>,
    {
        let mut jacobian = vec![vec![0.0; params.len()]; evaluator.len];
        let mut shifted = params.to_vec();

        for (j, b) in bounds.iter().enumerate() {
            let h = self.config.fd_step * b.width();
            let up = (params[j] + h).min(b.max);
            let down = (params[j] - h).max(b.min);

            shifted[j] = up;
            let r_up = evaluator.eval(&shifted);
            shifted[j] = down;
            let r_down = evaluator.eval(&shifted);
            shifted[j] = params[j];

            let (Some(r_up), Some(r_down)) = (r_up, r_down) else {
                continue;
            };
            let span = up - down;
            for (row, (hi, lo)) in jacobian.iter_mut().zip(r_up.iter().zip(&r_down)) {
                row[j] = (hi - lo) / span;
            }
        }

        jacobian
    }
}

/// `JᵀJ` and `Jᵀr`.
fn normal_equations(jacobian: &[Vec<f64>], r: &[f64]) -> (Vec<Vec<f64>>, Vec<f64>) {
    let n = jacobian.first().map_or(0, Vec::len);
    let mut jtj = vec![vec![0.0; n]; n];
    let mut jtr = vec![0.0; n];

    for (row, &ri) in jacobian.iter().zip(r) {
        for i in 0..n {
            jtr[i] += row[i] * ri;
            for j in 0..=i {
                jtj[i][j] += row[i] * row[j];
            }
        }
    }
    for i in 0..n {
        for j in 0..i {
            jtj[j][i] = jtj[i][j];
        }
    }
    (jtj, jtr)
}

/// Solve `(JᵀJ + λ diag(JᵀJ)) δ = -Jᵀr`. Zero diagonal entries are
/// replaced by one so frozen parameters get a zero step.
fn damped_step(jtj: &[Vec<f64>], jtr: &[f64], lambda: f64) -> Option<Vec<f64>> {
    let mut a = jtj.to_vec();
    for (i, row) in a.iter_mut().enumerate() {
        let scale = if jtj[i][i] > 0.0 { jtj[i][i] } else { 1.0 };
        row[i] += lambda * scale;
    }
    let b: Vec<f64> = jtr.iter().map(|v| -v).collect();
    solve_cholesky(&a, &b)
}

#[inline]
fn sum_of_squares(v: &[f64]) -> f64 {
    v.iter().map(|x| x * x).sum()
}

/// Solve `Ax = b` for symmetric positive definite `A`.
fn solve_cholesky(a: &[Vec<f64>], b: &[f64]) -> Option<Vec<f64>> {
    let n = b.len();
    if n == 0 || a.len() != n {
        return None;
    }

    let mut l = vec![vec![0.0; n]; n];
    for i in 0..n {
        for j in 0..=i {
            let mut sum = a[i][j];
            for k in 0..j {
                sum -= l[i][k] * l[j][k];
            }
            if i == j {
                if !(sum > 0.0) {
                    return None;
                }
                l[i][j] = sum.sqrt();
            } else {
                l[i][j] = sum / l[j][j];
            }
        }
    }

    let mut y = vec![0.0; n];
    for i in 0..n {
        let mut sum = b[i];
        for j in 0..i {
            sum -= l[i][j] * y[j];
        }
        y[i] = sum / l[i][i];
    }

    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        let mut sum = y[i];
        for j in (i + 1)..n {
            sum -= l[j][i] * x[j];
        }
        x[i] = sum / l[i][i];
    }

    x.iter().all(|v| v.is_finite()).then_some(x)
}
