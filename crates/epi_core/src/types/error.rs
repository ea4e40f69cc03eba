//! Error types for structured error handling.
//!
//! This module provides:
//! - `OdeError`: Errors from ODE integration
//! - `OptimiserError`: Errors from bounded global optimisation
//! - `StatsError`: Errors from goodness-of-fit statistics

use thiserror::Error;

/// ODE integration errors.
///
/// # Examples
/// ```
/// use epi_core::types::OdeError;
///
/// let err = OdeError::StepSizeUnderflow { t: 3.5, step: 1e-18 };
/// assert!(format!("{}", err).contains("3.5"));
/// ```
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OdeError {
    /// Time grid is empty, non-finite or not strictly increasing.
    #[error("Invalid time grid: {0}")]
    InvalidGrid(String),

    /// Initial state is empty or contains non-finite values.
    #[error("Invalid initial state: {0}")]
    InvalidInitialState(String),

    /// Adaptive step size shrank below the representable minimum.
    #[error("Step size underflow at t = {t} (step = {step:e})")]
    StepSizeUnderflow {
        /// Time at which the step collapsed
        t: f64,
        /// Rejected step size
        step: f64,
    },

    /// Step budget exhausted before reaching the end of the grid.
    #[error("Maximum number of steps ({max_steps}) exceeded at t = {t}")]
    MaxStepsExceeded {
        /// Configured step budget
        max_steps: usize,
        /// Time reached
        t: f64,
    },

    /// State became NaN or infinite.
    #[error("Non-finite state at t = {t}")]
    NonFiniteState {
        /// Time at which the state diverged
        t: f64,
    },
}

/// Bounded global optimisation errors.
///
/// # Examples
/// ```
/// use epi_core::types::OptimiserError;
///
/// let err = OptimiserError::InvalidBounds { index: 1, lower: 2.0, upper: 1.0 };
/// assert!(format!("{}", err).contains("index 1"));
/// ```
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OptimiserError {
    /// Lower bound is not strictly below upper bound, or a bound is non-finite.
    #[error("Invalid bounds at index {index}: [{lower}, {upper}]")]
    InvalidBounds {
        /// Dimension index
        index: usize,
        /// Lower bound
        lower: f64,
        /// Upper bound
        upper: f64,
    },

    /// No dimensions to search over.
    #[error("Search space has no dimensions")]
    EmptySearchSpace,

    /// Every evaluated candidate produced a non-finite objective.
    #[error("Objective was non-finite for all {evaluations} evaluated candidates")]
    NonFiniteObjective {
        /// Number of objective evaluations performed
        evaluations: usize,
    },

    /// Optimiser configuration is unusable.
    #[error("Invalid optimiser configuration: {0}")]
    InvalidConfig(String),
}

/// Goodness-of-fit statistics errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StatsError {
    /// Input slices have different lengths.
    #[error("Length mismatch: expected {expected}, got {got}")]
    LengthMismatch {
        /// Expected length
        expected: usize,
        /// Actual length
        got: usize,
    },

    /// Not enough usable (non-missing) points to compute the statistic.
    #[error("Insufficient data: got {got} usable points, need at least {need}")]
    InsufficientData {
        /// Usable points provided
        got: usize,
        /// Minimum required
        need: usize,
    },
}
