//! Synthetic observation noise.
//!
//! Turns a true daily incidence series into a plausible surveillance series
//! by applying, in order:
//!
//! 1. **Underreporting**: each day is scaled by a multiplier below one
//! 2. **Reporting delay**: each day's reports are shifted forward by a
//!    per-day delay; shifts that collide are summed, shifts past the
//!    horizon are dropped and days that receive nothing become missing
//!
//! Delay and underreporting arrays are drawn once at construction, either
//! as constants ([`NoiseMode::Fixed`]) or from a geometric delay and a
//! uniform multiplier distribution ([`NoiseMode::Random`]).
//!
//! # Example
//!
//! ```
//! use epi_models::observation::{NoiseMode, ObservationNoiseModel};
//!
//! let mut model = ObservationNoiseModel::with_seed(&[100.0; 5], 2.0, 0.1, NoiseMode::Fixed, 0)
//!     .unwrap();
//! model.add_noise();
//!
//! assert_eq!(
//!     model.incidence(),
//!     &[None, None, Some(10.0), Some(10.0), Some(10.0)]
//! );
//! ```

mod mode;
mod noise_model;

pub use mode::NoiseMode;
pub use noise_model::{ObservationNoiseModel, MAX_RANDOM_MEAN_DELAY, UNDERREPORTING_SPREAD};
