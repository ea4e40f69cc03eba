//! Integrator configuration types.

/// Configuration for adaptive ODE integrators.
///
/// # Example
///
/// ```
/// use epi_core::math::ode::OdeConfig;
///
/// let config = OdeConfig::default();
/// assert!(config.rtol <= 1e-8);
///
/// let custom = OdeConfig::new(1e-6, 1e-9);
/// assert_eq!(custom.rtol, 1e-6);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OdeConfig {
    /// Relative error tolerance per component.
    pub rtol: f64,

    /// Absolute error tolerance per component.
    pub atol: f64,

    /// Maximum number of attempted steps over the whole grid.
    pub max_steps: usize,

    /// First trial step. `None` picks a step from the grid span.
    pub initial_step: Option<f64>,

    /// Upper limit on any single step.
    pub max_step: f64,
}

impl Default for OdeConfig {
    /// Default values:
    /// - `rtol`: 1e-8
    /// - `atol`: 1e-10
    /// - `max_steps`: 100_000
    fn default() -> Self {
        Self {
            rtol: 1e-8,
            atol: 1e-10,
            max_steps: 100_000,
            initial_step: None,
            max_step: f64::INFINITY,
        }
    }
}

impl OdeConfig {
    /// Create a configuration with the given tolerances.
    ///
    /// # Panics
    ///
    /// Panics if either tolerance is not positive.
    pub fn new(rtol: f64, atol: f64) -> Self {
        assert!(rtol > 0.0, "rtol must be positive");
        assert!(atol > 0.0, "atol must be positive");
        Self {
            rtol,
            atol,
            ..Default::default()
        }
    }

    /// Tight tolerances for reference solutions.
    pub fn high_precision() -> Self {
        Self {
            rtol: 1e-11,
            atol: 1e-13,
            max_steps: 1_000_000,
            ..Default::default()
        }
    }

    /// Relaxed tolerances for inner optimisation loops.
    pub fn fast() -> Self {
        Self {
            rtol: 1e-6,
            atol: 1e-9,
            ..Default::default()
        }
    }

    /// Set the maximum step size.
    pub fn with_max_step(mut self, max_step: f64) -> Self {
        self.max_step = max_step;
        self
    }
}
