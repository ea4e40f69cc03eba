//! SEIR compartment model.
//!
//! - [`EpidemicParameters`]: rates, initial fractions and horizon
//! - [`Simulator`]: integrates the compartment system for a fixed population
//! - [`CompartmentTrajectory`]: daily S/E/I/R counts with their indicators
//!
//! The fractional system integrated by the simulator is
//!
//! ```text
//! dS/dt = -β S I
//! dE/dt =  β S I - α E
//! dI/dt =  α E - γ I
//! dR/dt =  γ I
//! ```
//!
//! and every compartment is scaled by the population afterwards.

mod params;
mod simulator;
mod trajectory;

pub use params::{EpidemicParameters, DEFAULT_TMAX, PARAMETER_COUNT, PARAMETER_NAMES};
pub use simulator::{seir_rhs, Simulator};
pub use trajectory::CompartmentTrajectory;
