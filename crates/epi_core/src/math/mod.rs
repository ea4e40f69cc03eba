//! Numerical capabilities consumed by the model and calibration layers.
//!
//! - [`ode`]: ODE integration (adaptive Dormand–Prince)
//! - [`optimisers`]: bounded global optimisation and least-squares refinement
//! - [`stats`]: coefficient of determination and relative error

pub mod ode;
pub mod optimisers;
pub mod stats;
