//! Model and observation-noise error types.

use epi_core::types::OdeError;
use thiserror::Error;

/// Simulation errors.
///
/// # Examples
/// ```
/// use epi_models::ModelError;
///
/// let err = ModelError::invalid_parameter("population", "must be positive");
/// assert_eq!(format!("{}", err), "Invalid parameter `population`: must be positive");
/// ```
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    /// Simulation input violates a model invariant.
    #[error("Invalid parameter `{name}`: {message}")]
    InvalidParameter {
        /// Offending parameter
        name: String,
        /// What is wrong with it
        message: String,
    },

    /// The ODE integrator failed.
    #[error("Integration failed: {0}")]
    Integration(#[from] OdeError),
}

impl ModelError {
    /// Create an invalid parameter error.
    pub fn invalid_parameter(name: &str, message: impl Into<String>) -> Self {
        ModelError::InvalidParameter {
            name: name.to_string(),
            message: message.into(),
        }
    }
}

/// Observation-noise errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NoiseError {
    /// Requested noise-generation mode does not exist.
    #[error("Noise mode `{0}` is not implemented (supported: random, fixed)")]
    NotImplemented(String),

    /// Mean delay or underreporting is unusable.
    #[error("Invalid noise parameter `{name}`: {message}")]
    InvalidParameter {
        /// Offending parameter
        name: String,
        /// What is wrong with it
        message: String,
    },

    /// Explicit delay/underreporting arrays do not match the series length.
    #[error("Length mismatch: series has {expected} days, got {got}")]
    LengthMismatch {
        /// Series length
        expected: usize,
        /// Supplied array length
        got: usize,
    },
}

impl NoiseError {
    /// Create an invalid noise parameter error.
    pub fn invalid_parameter(name: &str, message: impl Into<String>) -> Self {
        NoiseError::InvalidParameter {
            name: name.to_string(),
            message: message.into(),
        }
    }
}
