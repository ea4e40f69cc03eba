//! # epi_models: SEIR Simulation, Indicators and Observation Noise
//!
//! ## Layer 2 (Models) Role
//!
//! - [`seir`]: epidemic parameters, the compartment [`Simulator`](seir::Simulator)
//!   and its [`CompartmentTrajectory`](seir::CompartmentTrajectory) output
//! - [`indicators`]: daily/weekly incidence and effective reproduction number,
//!   derived from every trajectory as it is built
//! - [`observation`]: reporting delay and underreporting applied to a true
//!   incidence series to synthesise an observed surveillance series
//!
//! ## Example
//!
//! ```rust
//! use epi_models::seir::{EpidemicParameters, Simulator};
//! use epi_models::observation::{NoiseMode, ObservationNoiseModel};
//!
//! let simulator = Simulator::new(10_000).unwrap();
//! let trajectory = simulator.simulate(&EpidemicParameters::default()).unwrap();
//! assert_eq!(trajectory.len(), 150);
//!
//! let mut noise = ObservationNoiseModel::with_seed(
//!     trajectory.indicators().daily_incidence(),
//!     2.0,
//!     0.3,
//!     NoiseMode::Random,
//!     42,
//! )
//! .unwrap();
//! noise.add_noise();
//! assert_eq!(noise.incidence().len(), 150);
//! ```
//!
//! ## Feature Flags
//!
//! - `serde`: serialisation for parameters, trajectories and indicators

#![deny(missing_docs)]

mod error;
pub mod indicators;
pub mod observation;
pub mod seir;

pub use error::{ModelError, NoiseError};
