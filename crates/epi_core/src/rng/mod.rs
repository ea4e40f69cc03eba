//! # Random Number Generation
//!
//! Seeded random variate generation for synthetic observation noise and
//! stochastic optimisation.
//!
//! ## Design Rationale
//!
//! - **Reproducibility**: every generator is seeded, so noise realisations
//!   and annealing runs can be replayed exactly
//! - **Static dispatch**: distributions are passed by reference to
//!   [`EpiRng::sample`]; no `Box<dyn Distribution>` on hot paths
//!
//! ## Usage Example
//!
//! ```rust
//! use epi_core::rng::EpiRng;
//! use rand_distr::Geometric;
//!
//! let mut rng = EpiRng::from_seed(12345);
//!
//! // Uniform value in [0, 1)
//! let u = rng.gen_uniform();
//! assert!((0.0..1.0).contains(&u));
//!
//! // Reporting delay with mean 2 days: failures before first success, p = 1/3
//! let geometric = Geometric::new(1.0 / 3.0).unwrap();
//! let _delay: u64 = rng.sample(&geometric);
//! ```

mod prng;

pub use prng::EpiRng;
