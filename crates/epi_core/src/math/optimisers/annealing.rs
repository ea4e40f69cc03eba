//! Multi-restart simulated annealing with a bounded pattern-search polish.
//!
//! # Algorithm
//!
//! Every restart runs an independent Markov chain in the unit hypercube
//! `[0, 1]^d`, mapped affinely onto the parameter bounds:
//!
//! ```text
//! T_k    = T_0 * (T_min / T_0)^(k / (K - 1))          geometric cooling
//! u'     = reflect(u + σ_0 * sqrt(T_k / T_0) * N(0, I))
//! accept if Δf ≤ 0 or U(0, 1) < exp(-Δf / T_k)
//! ```
//!
//! The best point of each chain is then refined with a compass search whose
//! step halves whenever no coordinate move improves the objective. The
//! overall best across chains is returned.
//!
//! Chains are seeded from `seed + restart * φ`, so results do not depend on
//! whether chains run sequentially or on the rayon pool.

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use tracing::debug;

use super::{validate_bounds, GlobalOptimiser, OptimisationResult, ParameterBounds};
use crate::rng::EpiRng;
use crate::types::OptimiserError;

const SEED_STRIDE: u64 = 0x9E37_79B9_7F4A_7C15;
const POLISH_INITIAL_STEP: f64 = 0.05;
const MIN_STEP: f64 = 1e-4;

/// Configuration for [`SimulatedAnnealing`].
///
/// # Example
///
/// ```
/// use epi_core::math::optimisers::AnnealingConfig;
///
/// let config = AnnealingConfig::default().with_seed(42).with_restarts(4);
/// assert_eq!(config.seed, 42);
/// assert_eq!(config.restarts, 4);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AnnealingConfig {
    /// Base seed; chain `r` uses `seed + r * φ`.
    pub seed: u64,
    /// Number of independent chains.
    pub restarts: usize,
    /// Annealing iterations per chain.
    pub max_iterations: usize,
    /// Starting temperature, in objective units.
    pub initial_temperature: f64,
    /// Final temperature, in objective units.
    pub min_temperature: f64,
    /// Proposal standard deviation at `initial_temperature`, in unit-cube coordinates.
    pub initial_step: f64,
    /// Refine each chain's best point with a compass search.
    pub polish: bool,
    /// Compass search stops once its unit-cube step falls below this.
    pub polish_tolerance: f64,
    /// Evaluation budget for each compass search.
    pub max_polish_evaluations: usize,
}

impl Default for AnnealingConfig {
    fn default() -> Self {
        Self {
            seed: 0x5EED,
            restarts: 8,
            max_iterations: 2_000,
            initial_temperature: 1.0,
            min_temperature: 1e-4,
            initial_step: 0.25,
            polish: true,
            polish_tolerance: 1e-7,
            max_polish_evaluations: 2_000,
        }
    }
}

impl AnnealingConfig {
    /// Fewer chains and iterations, for tests and cheap objectives.
    pub fn fast() -> Self {
        Self {
            restarts: 4,
            max_iterations: 500,
            ..Default::default()
        }
    }

    /// Set the base seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the number of chains.
    pub fn with_restarts(mut self, restarts: usize) -> Self {
        self.restarts = restarts;
        self
    }

    /// Set the iterations per chain.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Enable or disable the compass-search polish.
    pub fn with_polish(mut self, polish: bool) -> Self {
        self.polish = polish;
        self
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`OptimiserError::InvalidConfig`] for zero chains or
    /// iterations, non-positive temperatures or step, or
    /// `min_temperature > initial_temperature`.
    pub fn validate(&self) -> Result<(), OptimiserError> {
        if self.restarts == 0 {
            return Err(OptimiserError::InvalidConfig(
                "restarts must be > 0".to_string(),
            ));
        }
        if self.max_iterations == 0 {
            return Err(OptimiserError::InvalidConfig(
                "max_iterations must be > 0".to_string(),
            ));
        }
        if !(self.initial_temperature > 0.0 && self.initial_temperature.is_finite()) {
            return Err(OptimiserError::InvalidConfig(format!(
                "initial_temperature must be positive, got {}",
                self.initial_temperature
            )));
        }
        if !(self.min_temperature > 0.0 && self.min_temperature <= self.initial_temperature) {
            return Err(OptimiserError::InvalidConfig(format!(
                "min_temperature must be in (0, {}], got {}",
                self.initial_temperature, self.min_temperature
            )));
        }
        if !(self.initial_step > 0.0 && self.initial_step.is_finite()) {
            return Err(OptimiserError::InvalidConfig(format!(
                "initial_step must be positive, got {}",
                self.initial_step
            )));
        }
        if self.polish && !(self.polish_tolerance > 0.0) {
            return Err(OptimiserError::InvalidConfig(format!(
                "polish_tolerance must be positive, got {}",
                self.polish_tolerance
            )));
        }
        Ok(())
    }
}

/// Bounded simulated annealing optimiser.
///
/// See the [module documentation](self) for the algorithm.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SimulatedAnnealing {
    config: AnnealingConfig,
}

struct ChainOutcome {
    restart: usize,
    unit_point: Vec<f64>,
    value: f64,
    evaluations: usize,
    iterations: usize,
}

/// Counts evaluations and maps unit-cube points onto the bounds.
struct Evaluator<'a, F> {
    objective: &'a F,
    bounds: &'a [ParameterBounds],
    scratch: Vec<f64>,
    evaluations: usize,
}

impl<'a, F> Evaluator<'a, F>
where
    F: Fn(&[f64]) -> f64,
{
    fn new(objective: &'a F, bounds: &'a [ParameterBounds]) -> Self {
        Self {
            objective,
            bounds,
            scratch: vec![0.0; bounds.len()],
            evaluations: 0,
        }
    }

    fn eval(&mut self, unit_point: &[f64]) -> f64 {
        for ((x, b), &u) in self.scratch.iter_mut().zip(self.bounds).zip(unit_point) {
            *x = b.from_unit(u);
        }
        self.evaluations += 1;
        let value = (self.objective)(&self.scratch);
        if value.is_nan() {
            f64::INFINITY
        } else {
            value
        }
    }
}

fn reflect(u: f64) -> f64 {
    let reflected = if u < 0.0 {
        -u
    } else if u > 1.0 {
        2.0 - u
    } else {
        u
    };
    reflected.clamp(0.0, 1.0)
}

impl SimulatedAnnealing {
    /// Create an optimiser with the given configuration.
    pub fn new(config: AnnealingConfig) -> Self {
        Self { config }
    }

    /// Get the configuration.
    pub fn config(&self) -> &AnnealingConfig {
        &self.config
    }

    fn run_chain<F>(&self, objective: &F, bounds: &[ParameterBounds], restart: usize) -> ChainOutcome
    where
        F: Fn(&[f64]) -> f64,
    {
        let cfg = &self.config;
        let seed = cfg.seed.wrapping_add((restart as u64).wrapping_mul(SEED_STRIDE));
        let mut rng = EpiRng::from_seed(seed);
        let mut evaluator = Evaluator::new(objective, bounds);
        let dim = bounds.len();

        let mut current: Vec<f64> = (0..dim).map(|_| rng.gen_uniform()).collect();
        let mut current_value = evaluator.eval(&current);
        let mut best = current.clone();
        let mut best_value = current_value;
        let mut candidate = vec![0.0; dim];

        let cooling_ratio = cfg.min_temperature / cfg.initial_temperature;
        let denominator = cfg.max_iterations.saturating_sub(1).max(1) as f64;

        for k in 0..cfg.max_iterations {
            let temperature = cfg.initial_temperature * cooling_ratio.powf(k as f64 / denominator);
            let step = (cfg.initial_step * (temperature / cfg.initial_temperature).sqrt()).max(MIN_STEP);

            for (c, &u) in candidate.iter_mut().zip(&current) {
                *c = reflect(u + step * rng.gen_normal());
            }
            let value = evaluator.eval(&candidate);
            let delta = value - current_value;
            let accept = delta <= 0.0
                || (delta.is_finite() && rng.gen_uniform() < (-delta / temperature).exp());

            if accept {
                current.copy_from_slice(&candidate);
                current_value = value;
                if value < best_value {
                    best.copy_from_slice(&candidate);
                    best_value = value;
                }
            }
        }

        let annealed_value = best_value;
        if cfg.polish && best_value.is_finite() {
            self.polish(&mut evaluator, &mut best, &mut best_value);
        }

        debug!(
            restart,
            seed,
            annealed = annealed_value,
            polished = best_value,
            evaluations = evaluator.evaluations,
            "annealing chain finished"
        );

        ChainOutcome {
            restart,
            unit_point: best,
            value: best_value,
            evaluations: evaluator.evaluations,
            iterations: cfg.max_iterations,
        }
    }

    /// Compass search around `best` in unit-cube coordinates.
    fn polish<F>(&self, evaluator: &mut Evaluator<'_, F>, best: &mut [f64], best_value: &mut f64)
    where
        F: Fn(&[f64]) -> f64,
    {
        let budget_end = evaluator.evaluations + self.config.max_polish_evaluations;
        let mut step = POLISH_INITIAL_STEP;
        let mut trial = best.to_vec();

        while step > self.config.polish_tolerance && evaluator.evaluations < budget_end {
            let mut improved = false;
            for j in 0..best.len() {
                for direction in [1.0, -1.0] {
                    let moved = (best[j] + direction * step).clamp(0.0, 1.0);
                    if moved == best[j] {
                        continue;
                    }
                    trial.copy_from_slice(best);
                    trial[j] = moved;
                    let value = evaluator.eval(&trial);
                    if value < *best_value {
                        best.copy_from_slice(&trial);
                        *best_value = value;
                        improved = true;
                        break;
                    }
                }
            }
            if !improved {
                step *= 0.5;
            }
        }
    }
}

impl GlobalOptimiser for SimulatedAnnealing {
    fn minimise<F>(
        &self,
        objective: F,
        bounds: &[ParameterBounds],
    ) -> Result<OptimisationResult, OptimiserError>
    where
        F: Fn(&[f64]) -> f64 + Sync,
    {
        validate_bounds(bounds)?;
        self.config.validate()?;

        #[cfg(feature = "parallel")]
        let outcomes: Vec<ChainOutcome> = (0..self.config.restarts)
            .into_par_iter()
            .map(|restart| self.run_chain(&objective, bounds, restart))
            .collect();

        #[cfg(not(feature = "parallel"))]
        let outcomes: Vec<ChainOutcome> = (0..self.config.restarts)
            .map(|restart| self.run_chain(&objective, bounds, restart))
            .collect();

        let evaluations = outcomes.iter().map(|o| o.evaluations).sum();
        let iterations = outcomes.iter().map(|o| o.iterations).sum();

        let best = outcomes
            .into_iter()
            .min_by(|a, b| a.value.total_cmp(&b.value).then(a.restart.cmp(&b.restart)))
            .ok_or_else(|| OptimiserError::InvalidConfig("restarts must be > 0".to_string()))?;

        if !best.value.is_finite() {
            return Err(OptimiserError::NonFiniteObjective { evaluations });
        }

        let params = bounds
            .iter()
            .zip(&best.unit_point)
            .map(|(b, &u)| b.from_unit(u))
            .collect();

        Ok(OptimisationResult {
            params,
            value: best.value,
            evaluations,
            iterations,
        })
    }
}
