//! Calibration and configuration error types.

use epi_core::types::{OptimiserError, StatsError};
use epi_models::ModelError;
use thiserror::Error;

/// Configuration loading and validation errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// The configuration file could not be read or parsed.
    #[error("Configuration file error: {0}")]
    FileError(String),

    /// An environment variable held an unparseable value.
    #[error("Environment variable error: {0}")]
    EnvError(String),

    /// A setting is out of range.
    #[error("Invalid configuration value `{field}`: {message}")]
    InvalidValue {
        /// Offending setting
        field: String,
        /// What is wrong with it
        message: String,
    },
}

impl ConfigError {
    /// Create an invalid value error.
    pub fn invalid_value(field: &str, message: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// Calibration errors.
///
/// # Examples
/// ```
/// use epi_optimiser::CalibrationError;
///
/// let err = CalibrationError::insufficient_data(0, 30);
/// assert_eq!(
///     format!("{}", err),
///     "Insufficient data: 0 of 30 observations are non-missing"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CalibrationError {
    /// The observed series is empty or entirely missing.
    #[error("Insufficient data: {observed} of {length} observations are non-missing")]
    InsufficientData {
        /// Non-missing observations
        observed: usize,
        /// Series length
        length: usize,
    },

    /// The calibration configuration is invalid.
    #[error("Invalid calibration config: {0}")]
    InvalidConfig(#[from] ConfigError),

    /// The best-fit parameters could not be simulated.
    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    /// The optimiser failed.
    #[error("Optimiser error: {0}")]
    Optimiser(#[from] OptimiserError),

    /// Goodness-of-fit could not be computed.
    #[error("Statistics error: {0}")]
    Stats(#[from] StatsError),
}

impl CalibrationError {
    /// Create an insufficient data error.
    pub fn insufficient_data(observed: usize, length: usize) -> Self {
        CalibrationError::InsufficientData { observed, length }
    }
}
