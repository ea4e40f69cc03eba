//! Dormand–Prince 5(4) adaptive Runge–Kutta integrator.
//!
//! # Algorithm
//!
//! Each step evaluates seven stages. The fifth-order solution advances the
//! state; the embedded fourth-order solution provides a local error
//! estimate used to accept or reject the step and choose the next one:
//!
//! ```text
//! err  = sqrt(mean((e_i / (atol + rtol * max(|y_i|, |y_new_i|)))^2))
//! h'   = h * clamp(0.9 * err^(-1/5), 0.2, 10)
//! ```
//!
//! The last stage of an accepted step equals the first stage of the next
//! (first-same-as-last), so accepted steps cost six evaluations.
//! Steps are truncated to land exactly on every output grid point.

use super::config::OdeConfig;
use super::{validate_problem, OdeIntegrator};
use crate::types::OdeError;

const STAGES: usize = 7;

const C: [f64; STAGES] = [0.0, 1.0 / 5.0, 3.0 / 10.0, 4.0 / 5.0, 8.0 / 9.0, 1.0, 1.0];

const A: [[f64; STAGES - 1]; STAGES] = [
    [0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
    [1.0 / 5.0, 0.0, 0.0, 0.0, 0.0, 0.0],
    [3.0 / 40.0, 9.0 / 40.0, 0.0, 0.0, 0.0, 0.0],
    [44.0 / 45.0, -56.0 / 15.0, 32.0 / 9.0, 0.0, 0.0, 0.0],
    [
        19372.0 / 6561.0,
        -25360.0 / 2187.0,
        64448.0 / 6561.0,
        -212.0 / 729.0,
        0.0,
        0.0,
    ],
    [
        9017.0 / 3168.0,
        -355.0 / 33.0,
        46732.0 / 5247.0,
        49.0 / 176.0,
        -5103.0 / 18656.0,
        0.0,
    ],
    // Fifth-order weights
    [
        35.0 / 384.0,
        0.0,
        500.0 / 1113.0,
        125.0 / 192.0,
        -2187.0 / 6784.0,
        11.0 / 84.0,
    ],
];

// Difference between fifth- and fourth-order weights
const E: [f64; STAGES] = [
    71.0 / 57600.0,
    0.0,
    -71.0 / 16695.0,
    71.0 / 1920.0,
    -17253.0 / 339200.0,
    22.0 / 525.0,
    -1.0 / 40.0,
];

const SAFETY: f64 = 0.9;
const MIN_FACTOR: f64 = 0.2;
const MAX_FACTOR: f64 = 10.0;

/// Adaptive explicit Runge–Kutta 5(4) integrator.
///
/// # Example
///
/// ```
/// use epi_core::math::ode::{DormandPrince, OdeIntegrator};
///
/// // Harmonic oscillator: y'' = -y
/// let integrator = DormandPrince::default();
/// let grid = [0.0, std::f64::consts::PI];
/// let states = integrator
///     .integrate(|_t, y, dy| { dy[0] = y[1]; dy[1] = -y[0]; }, &[1.0, 0.0], &grid)
///     .unwrap();
/// assert!((states[1][0] + 1.0).abs() < 1e-6);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DormandPrince {
    config: OdeConfig,
}

struct Workspace {
    k: Vec<Vec<f64>>,
    ytmp: Vec<f64>,
    y_new: Vec<f64>,
}

impl Workspace {
    fn new(n: usize) -> Self {
        Self {
            k: vec![vec![0.0; n]; STAGES],
            ytmp: vec![0.0; n],
            y_new: vec![0.0; n],
        }
    }
}

impl DormandPrince {
    /// Create an integrator with the given configuration.
    pub fn new(config: OdeConfig) -> Self {
        Self { config }
    }

    /// Get the configuration.
    pub fn config(&self) -> &OdeConfig {
        &self.config
    }

    /// Take one trial step of size `h` from `(t, y)`.
    ///
    /// Expects `ws.k[0] = f(t, y)`. Leaves the candidate state in `ws.y_new`,
    /// `f(t + h, y_new)` in `ws.k[6]`, and returns the scaled error norm.
    fn attempt<F>(&self, rhs: &mut F, t: f64, h: f64, y: &[f64], ws: &mut Workspace) -> f64
    where
        F: FnMut(f64, &[f64], &mut [f64]),
    {
        for s in 1..STAGES {
            for (j, yj) in y.iter().enumerate() {
                let increment: f64 = (0..s).map(|m| A[s][m] * ws.k[m][j]).sum();
                ws.ytmp[j] = yj + h * increment;
            }
            let (_, rest) = ws.k.split_at_mut(s);
            rhs(t + C[s] * h, &ws.ytmp, &mut rest[0]);
        }
        ws.y_new.copy_from_slice(&ws.ytmp);

        let n = y.len();
        let sum_sq: f64 = (0..n)
            .map(|j| {
                let err: f64 = h * (0..STAGES).map(|m| E[m] * ws.k[m][j]).sum::<f64>();
                let scale = self.config.atol + self.config.rtol * y[j].abs().max(ws.y_new[j].abs());
                (err / scale).powi(2)
            })
            .sum();
        (sum_sq / n as f64).sqrt()
    }

    fn initial_step(&self, t_grid: &[f64]) -> f64 {
        if let Some(h) = self.config.initial_step {
            return h;
        }
        let span = t_grid[t_grid.len() - 1] - t_grid[0];
        let first_gap = if t_grid.len() > 1 {
            t_grid[1] - t_grid[0]
        } else {
            span
        };
        (first_gap * 0.1).min(span * 1e-2).max(1e-6)
    }
}

impl OdeIntegrator for DormandPrince {
    fn integrate<F>(
        &self,
        mut rhs: F,
        y0: &[f64],
        t_grid: &[f64],
    ) -> Result<Vec<Vec<f64>>, OdeError>
    where
        F: FnMut(f64, &[f64], &mut [f64]),
    {
        validate_problem(y0, t_grid)?;

        let mut out = Vec::with_capacity(t_grid.len());
        out.push(y0.to_vec());
        if t_grid.len() == 1 {
            return Ok(out);
        }

        let mut ws = Workspace::new(y0.len());
        let mut y = y0.to_vec();
        let mut t = t_grid[0];
        rhs(t, &y, &mut ws.k[0]);

        let mut h = self.initial_step(t_grid);
        let mut steps = 0usize;

        for &t_next in &t_grid[1..] {
            while t < t_next {
                if steps >= self.config.max_steps {
                    return Err(OdeError::MaxStepsExceeded {
                        max_steps: self.config.max_steps,
                        t,
                    });
                }
                steps += 1;

                let mut h_try = h.min(self.config.max_step);
                let lands = t + h_try >= t_next;
                if lands {
                    h_try = t_next - t;
                }

                let err = self.attempt(&mut rhs, t, h_try, &y, &mut ws);

                if err.is_finite() && err <= 1.0 {
                    t = if lands { t_next } else { t + h_try };
                    std::mem::swap(&mut y, &mut ws.y_new);
                    ws.k.swap(0, STAGES - 1);
                    if y.iter().any(|v| !v.is_finite()) {
                        return Err(OdeError::NonFiniteState { t });
                    }

                    let factor = if err == 0.0 {
                        MAX_FACTOR
                    } else {
                        (SAFETY * err.powf(-0.2)).clamp(MIN_FACTOR, MAX_FACTOR)
                    };
                    let proposed = h_try * factor;
                    h = if lands { h.max(proposed) } else { proposed };
                } else {
                    let factor = if err.is_finite() {
                        (SAFETY * err.powf(-0.2)).max(MIN_FACTOR)
                    } else {
                        MIN_FACTOR
                    };
                    h = h_try * factor;
                    if h <= 16.0 * f64::EPSILON * t.abs().max(1.0) {
                        return Err(OdeError::StepSizeUnderflow { t, step: h });
                    }
                }
            }
            out.push(y.clone());
        }

        Ok(out)
    }
}
