//! Box bounds for the five calibrated parameters.

use epi_core::math::optimisers::{validate_bounds, ParameterBounds};
use epi_core::types::OptimiserError;
use epi_models::seir::{EpidemicParameters, PARAMETER_COUNT, PARAMETER_NAMES};
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Search box for `[alpha, beta, gamma, init_inf_frac, init_rec_frac]`.
///
/// Partially specified bounds in a configuration file fall back to the
/// defaults field by field:
///
/// ```toml
/// [bounds.beta]
/// min = 0.1
/// max = 0.8
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSpace {
    /// Incubation rate (1 / latent period).
    pub alpha: ParameterBounds,
    /// Transmission rate.
    pub beta: ParameterBounds,
    /// Recovery rate (1 / infectious period).
    pub gamma: ParameterBounds,
    /// Initial infectious fraction.
    pub init_inf_frac: ParameterBounds,
    /// Initial recovered fraction.
    pub init_rec_frac: ParameterBounds,
}

impl Default for SearchSpace {
    fn default() -> Self {
        Self {
            alpha: ParameterBounds::new(0.2, 1.0),
            beta: ParameterBounds::new(1.0 / 9.0, 0.625),
            gamma: ParameterBounds::new(1.0 / 9.0, 0.25),
            init_inf_frac: ParameterBounds::new(1e-6, 1e-3),
            init_rec_frac: ParameterBounds::new(1e-2, 0.2),
        }
    }
}

impl SearchSpace {
    /// Bounds in [`EpidemicParameters::as_array`] order.
    pub fn bounds(&self) -> [ParameterBounds; PARAMETER_COUNT] {
        [
            self.alpha,
            self.beta,
            self.gamma,
            self.init_inf_frac,
            self.init_rec_frac,
        ]
    }

    /// True when every parameter lies inside its interval.
    pub fn contains(&self, params: &EpidemicParameters) -> bool {
        self.bounds()
            .iter()
            .zip(params.as_array())
            .all(|(b, value)| b.contains(value))
    }

    /// Check every interval is finite and non-empty, rates are strictly
    /// positive and fractions non-negative.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidValue`] naming the first offending parameter.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let bounds = self.bounds();
        if let Err(OptimiserError::InvalidBounds {
            index,
            lower,
            upper,
        }) = validate_bounds(&bounds)
        {
            return Err(ConfigError::invalid_value(
                &format!("bounds.{}", PARAMETER_NAMES[index]),
                format!("need finite min < max, got [{}, {}]", lower, upper),
            ));
        }

        for (index, b) in bounds.iter().enumerate() {
            let is_rate = index < 3;
            if (is_rate && b.min <= 0.0) || b.min < 0.0 {
                return Err(ConfigError::invalid_value(
                    &format!("bounds.{}", PARAMETER_NAMES[index]),
                    format!(
                        "lower bound must be {}, got {}",
                        if is_rate { "positive" } else { "non-negative" },
                        b.min
                    ),
                ));
            }
        }
        Ok(())
    }
}
