//! # epi_core: Numerical Foundation for SEIR Simulation and Calibration
//!
//! ## Layer 1 (Foundation) Role
//!
//! epi_core is the bottom layer of the workspace, providing:
//! - ODE integration behind the [`math::ode::OdeIntegrator`] trait, with an
//!   adaptive Dormand–Prince 5(4) implementation (`math::ode`)
//! - Bounded gradient-free global optimisation behind the
//!   [`math::optimisers::GlobalOptimiser`] trait, with a simulated annealing
//!   implementation, and a box-constrained Levenberg–Marquardt solver for
//!   least-squares refinement (`math::optimisers`)
//! - Goodness-of-fit statistics: coefficient of determination and relative
//!   parameter error (`math::stats`)
//! - Seeded random variate generation (`rng`)
//! - Error types and observed-series helpers (`types`)
//!
//! ## Zero Dependency Principle
//!
//! Layer 1 has no dependencies on other epi_* crates, with minimal external dependencies:
//! - num-traits: generic floating-point statistics
//! - rand / rand_distr: geometric and uniform variates
//! - thiserror: error enums
//! - tracing: diagnostic events (no subscriber is installed here)
//! - rayon: parallel annealing restarts (optional, `parallel` feature)
//! - serde: serialisation support (optional)
//!
//! ## Usage Examples
//!
//! ```rust
//! use epi_core::math::ode::{DormandPrince, OdeIntegrator};
//!
//! // dy/dt = -y, y(0) = 1
//! let integrator = DormandPrince::default();
//! let grid = [0.0, 1.0, 2.0];
//! let states = integrator
//!     .integrate(|_t, y, dy| dy[0] = -y[0], &[1.0], &grid)
//!     .unwrap();
//! assert!((states[2][0] - (-2.0_f64).exp()).abs() < 1e-7);
//! ```
//!
//! ## Feature Flags
//!
//! - `parallel` (default): evaluate annealing restarts on the rayon thread pool
//! - `serde`: enable serialisation for configuration and result types

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]

pub mod math;
pub mod rng;
pub mod types;
