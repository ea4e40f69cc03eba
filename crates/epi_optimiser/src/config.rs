//! Calibration configuration.
//!
//! Settings are layered, lowest to highest priority:
//!
//! 1. Default values
//! 2. TOML configuration file
//! 3. `EPI_CALIBRATION_*` environment variables
//!
//! ```toml
//! seed = 42
//! restarts = 6
//! max_iterations = 1000
//!
//! [bounds.alpha]
//! min = 0.25
//! max = 0.75
//! ```
//!
//! | Variable | Setting |
//! |----------|---------|
//! | `EPI_CALIBRATION_SEED` | `seed` |
//! | `EPI_CALIBRATION_RESTARTS` | `restarts` |
//! | `EPI_CALIBRATION_MAX_ITERATIONS` | `max_iterations` |
//! | `EPI_CALIBRATION_INITIAL_TEMPERATURE` | `initial_temperature` |
//! | `EPI_CALIBRATION_MIN_TEMPERATURE` | `min_temperature` |
//! | `EPI_CALIBRATION_POLISH` | `polish` |
//! | `EPI_CALIBRATION_MAX_POLISH_EVALUATIONS` | `max_polish_evaluations` |
//! | `EPI_CALIBRATION_REFINE` | `refine` |
//! | `EPI_CALIBRATION_MAX_REFINE_ITERATIONS` | `max_refine_iterations` |

use std::fmt::Display;
use std::path::Path;
use std::str::FromStr;

use epi_core::math::optimisers::{AnnealingConfig, LMConfig};
use serde::{Deserialize, Serialize};

use crate::{ConfigError, SearchSpace};

/// Prefix shared by every calibration environment variable.
pub const ENV_PREFIX: &str = "EPI_CALIBRATION_";

/// Settings for [`Calibrator`](crate::Calibrator).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    /// Base seed for the annealing chains.
    pub seed: u64,
    /// Independent annealing chains.
    pub restarts: usize,
    /// Annealing iterations per chain.
    pub max_iterations: usize,
    /// Starting temperature, in units of R².
    pub initial_temperature: f64,
    /// Final temperature, in units of R².
    pub min_temperature: f64,
    /// Refine each chain's best point with a compass search.
    pub polish: bool,
    /// Objective evaluations allowed per compass search.
    pub max_polish_evaluations: usize,
    /// Refine the annealed optimum by Levenberg–Marquardt least squares.
    pub refine: bool,
    /// Jacobian evaluations allowed for the refinement.
    pub max_refine_iterations: usize,
    /// Parameter search box.
    pub bounds: SearchSpace,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            seed: 0x5EED,
            restarts: 8,
            max_iterations: 1_500,
            initial_temperature: 1.0,
            min_temperature: 1e-4,
            polish: true,
            max_polish_evaluations: 2_000,
            refine: true,
            max_refine_iterations: 200,
            bounds: SearchSpace::default(),
        }
    }
}

impl CalibrationConfig {
    /// Fewer chains and iterations; enough for noise-free data.
    pub fn fast() -> Self {
        Self {
            restarts: 4,
            max_iterations: 500,
            max_polish_evaluations: 1_000,
            max_refine_iterations: 100,
            ..Default::default()
        }
    }

    /// More chains and iterations, for noisy or heavily censored data.
    pub fn thorough() -> Self {
        Self {
            restarts: 16,
            max_iterations: 4_000,
            max_polish_evaluations: 4_000,
            max_refine_iterations: 400,
            ..Default::default()
        }
    }

    /// Start building a configuration from the defaults.
    pub fn builder() -> CalibrationConfigBuilder {
        CalibrationConfigBuilder::default()
    }

    /// Parse a TOML document and validate it.
    ///
    /// # Errors
    ///
    /// [`ConfigError::FileError`] on malformed TOML, or a validation error.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config = parse_toml(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML configuration file.
    ///
    /// # Errors
    ///
    /// [`ConfigError::FileError`] if the file cannot be read or parsed, or
    /// a validation error.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config = read_file(path.as_ref())?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults overridden by `EPI_CALIBRATION_*` environment variables.
    ///
    /// # Errors
    ///
    /// [`ConfigError::EnvError`] if a variable cannot be parsed, or a
    /// validation error.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Override settings from `EPI_CALIBRATION_*` environment variables.
    ///
    /// # Errors
    ///
    /// [`ConfigError::EnvError`] if a variable cannot be parsed.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|key| std::env::var(format!("{}{}", ENV_PREFIX, key)).ok())
    }

    fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("SEED") {
            self.seed = parse_env("SEED", &value)?;
        }
        if let Some(value) = lookup("RESTARTS") {
            self.restarts = parse_env("RESTARTS", &value)?;
        }
        if let Some(value) = lookup("MAX_ITERATIONS") {
            self.max_iterations = parse_env("MAX_ITERATIONS", &value)?;
        }
        if let Some(value) = lookup("INITIAL_TEMPERATURE") {
            self.initial_temperature = parse_env("INITIAL_TEMPERATURE", &value)?;
        }
        if let Some(value) = lookup("MIN_TEMPERATURE") {
            self.min_temperature = parse_env("MIN_TEMPERATURE", &value)?;
        }
        if let Some(value) = lookup("POLISH") {
            self.polish = parse_env("POLISH", &value.to_lowercase())?;
        }
        if let Some(value) = lookup("MAX_POLISH_EVALUATIONS") {
            self.max_polish_evaluations = parse_env("MAX_POLISH_EVALUATIONS", &value)?;
        }
        if let Some(value) = lookup("REFINE") {
            self.refine = parse_env("REFINE", &value.to_lowercase())?;
        }
        if let Some(value) = lookup("MAX_REFINE_ITERATIONS") {
            self.max_refine_iterations = parse_env("MAX_REFINE_ITERATIONS", &value)?;
        }
        Ok(())
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidValue`] for zero chains or iterations,
    /// non-positive temperatures, `min_temperature > initial_temperature`,
    /// a zero refinement budget with refinement enabled, or invalid bounds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.restarts == 0 {
            return Err(ConfigError::invalid_value("restarts", "must be > 0"));
        }
        if self.max_iterations == 0 {
            return Err(ConfigError::invalid_value("max_iterations", "must be > 0"));
        }
        if !(self.initial_temperature > 0.0 && self.initial_temperature.is_finite()) {
            return Err(ConfigError::invalid_value(
                "initial_temperature",
                format!("must be positive and finite, got {}", self.initial_temperature),
            ));
        }
        if !(self.min_temperature > 0.0 && self.min_temperature <= self.initial_temperature) {
            return Err(ConfigError::invalid_value(
                "min_temperature",
                format!(
                    "must be in (0, {}], got {}",
                    self.initial_temperature, self.min_temperature
                ),
            ));
        }
        if self.refine && self.max_refine_iterations == 0 {
            return Err(ConfigError::invalid_value(
                "max_refine_iterations",
                "must be > 0 when refine is enabled",
            ));
        }
        self.bounds.validate()
    }

    /// Annealing settings derived from this configuration.
    pub fn annealing(&self) -> AnnealingConfig {
        AnnealingConfig {
            seed: self.seed,
            restarts: self.restarts,
            max_iterations: self.max_iterations,
            initial_temperature: self.initial_temperature,
            min_temperature: self.min_temperature,
            polish: self.polish,
            max_polish_evaluations: self.max_polish_evaluations,
            ..AnnealingConfig::default()
        }
    }

    /// Least-squares refinement settings, `None` when refinement is off.
    pub fn refinement(&self) -> Option<LMConfig> {
        self.refine
            .then(|| LMConfig::default().with_max_iterations(self.max_refine_iterations))
    }
}

fn parse_toml(content: &str) -> Result<CalibrationConfig, ConfigError> {
    toml::from_str(content)
        .map_err(|e| ConfigError::FileError(format!("Failed to parse TOML: {}", e)))
}

fn read_file(path: &Path) -> Result<CalibrationConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        ConfigError::FileError(format!("Failed to read {}: {}", path.display(), e))
    })?;
    parse_toml(&content)
}

fn parse_env<T>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    value.trim().parse().map_err(|e| {
        ConfigError::EnvError(format!("{}{}={:?}: {}", ENV_PREFIX, key, value, e))
    })
}

/// Builder for [`CalibrationConfig`]; validates at [`build`](Self::build).
///
/// # Example
///
/// ```
/// use epi_optimiser::CalibrationConfig;
///
/// let config = CalibrationConfig::builder()
///     .seed(7)
///     .restarts(2)
///     .max_iterations(100)
///     .build()
///     .unwrap();
/// assert_eq!(config.restarts, 2);
///
/// assert!(CalibrationConfig::builder().restarts(0).build().is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CalibrationConfigBuilder {
    config: CalibrationConfig,
}

impl CalibrationConfigBuilder {
    /// Sets the base seed.
    #[inline]
    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = seed;
        self
    }

    /// Sets the number of annealing chains.
    #[inline]
    pub fn restarts(mut self, restarts: usize) -> Self {
        self.config.restarts = restarts;
        self
    }

    /// Sets the iterations per chain.
    #[inline]
    pub fn max_iterations(mut self, max_iterations: usize) -> Self {
        self.config.max_iterations = max_iterations;
        self
    }

    /// Sets the cooling schedule endpoints.
    #[inline]
    pub fn temperatures(mut self, initial: f64, min: f64) -> Self {
        self.config.initial_temperature = initial;
        self.config.min_temperature = min;
        self
    }

    /// Enables or disables the compass-search polish.
    #[inline]
    pub fn polish(mut self, polish: bool) -> Self {
        self.config.polish = polish;
        self
    }

    /// Sets the evaluation budget of each compass search.
    #[inline]
    pub fn max_polish_evaluations(mut self, evaluations: usize) -> Self {
        self.config.max_polish_evaluations = evaluations;
        self
    }

    /// Enables or disables the least-squares refinement.
    #[inline]
    pub fn refine(mut self, refine: bool) -> Self {
        self.config.refine = refine;
        self
    }

    /// Sets the Jacobian budget of the least-squares refinement.
    #[inline]
    pub fn max_refine_iterations(mut self, iterations: usize) -> Self {
        self.config.max_refine_iterations = iterations;
        self
    }

    /// Sets the parameter search box.
    #[inline]
    pub fn bounds(mut self, bounds: SearchSpace) -> Self {
        self.config.bounds = bounds;
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// Any error from [`CalibrationConfig::validate`].
    pub fn build(self) -> Result<CalibrationConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// Build configuration from all sources.
///
/// Priority (highest to lowest):
/// 1. Environment variables
/// 2. Config file, if given
/// 3. Default values
///
/// The merged result is validated once, so an environment variable may
/// correct a value the file alone would fail on.
///
/// # Errors
///
/// [`ConfigError`] from reading the file, parsing the environment or
/// validating the merged configuration.
pub fn build_config(file: Option<&Path>) -> Result<CalibrationConfig, ConfigError> {
    let mut config = match file {
        Some(path) => read_file(path)?,
        None => CalibrationConfig::default(),
    };
    config.apply_env()?;
    config.validate()?;
    Ok(config)
}
