//! # epi_optimiser
//!
//! Calibration of SEIR parameters against observed daily incidence.
//!
//! ## Architecture Position
//!
//! Layer 2.5: solves the inverse problem of the simulator in
//! `epi_models` (L2), using the optimisers and statistics of `epi_core` (L1).
//!
//! ## Modules
//!
//! - `calibrator`: the [`Calibrator`] and the [`Calibrate`] extension trait
//!   that lets a [`Simulator`](epi_models::seir::Simulator) calibrate itself;
//!   annealing explores the search box and Levenberg–Marquardt refines the
//!   best point
//! - `config`: [`CalibrationConfig`] with TOML and environment loading
//! - `search_space`: the parameter [`SearchSpace`]
//!
//! ## Example
//!
//! ```rust
//! use epi_models::observation::{NoiseMode, ObservationNoiseModel};
//! use epi_models::seir::{EpidemicParameters, Simulator};
//! use epi_optimiser::prelude::*;
//!
//! let simulator = Simulator::new(100_000).unwrap();
//! let truth = EpidemicParameters::default().with_tmax(45);
//! let trajectory = simulator.simulate(&truth).unwrap();
//!
//! let mut noise = ObservationNoiseModel::with_seed(
//!     trajectory.indicators().daily_incidence(),
//!     1.0,
//!     0.5,
//!     NoiseMode::Fixed,
//!     0,
//! )
//! .unwrap();
//! noise.add_noise();
//!
//! let config = CalibrationConfig::builder()
//!     .restarts(2)
//!     .max_iterations(150)
//!     .max_polish_evaluations(200)
//!     .build()
//!     .unwrap();
//! let result = simulator.calibrate_with(noise.incidence(), config).unwrap();
//! assert_eq!(result.observations, 44);
//! ```

#![deny(missing_docs)]

mod calibrator;
mod config;
mod error;
mod result;
mod search_space;

pub use calibrator::{Calibrate, Calibrator};
pub use config::{build_config, CalibrationConfig, CalibrationConfigBuilder, ENV_PREFIX};
pub use epi_core::math::stats::relative_error;
pub use error::{CalibrationError, ConfigError};
pub use result::CalibrationResult;
pub use search_space::SearchSpace;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        relative_error, Calibrate, CalibrationConfig, CalibrationError, CalibrationResult,
        Calibrator, SearchSpace,
    };
}
