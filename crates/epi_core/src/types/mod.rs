//! Core types: error enums and observed-series helpers.

pub mod error;
pub mod series;

pub use error::{OdeError, OptimiserError, StatsError};
pub use series::{from_dense, observed_count, observed_sum, ObservedSeries};
