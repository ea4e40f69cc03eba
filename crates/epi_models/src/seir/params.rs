//! Epidemic parameter set.

use std::fmt;

use crate::ModelError;

/// Simulation horizon in days when none is given.
pub const DEFAULT_TMAX: usize = 150;

/// Number of calibratable parameters.
pub const PARAMETER_COUNT: usize = 5;

/// Names of the calibratable parameters, in [`EpidemicParameters::as_array`] order.
pub const PARAMETER_NAMES: [&str; PARAMETER_COUNT] =
    ["alpha", "beta", "gamma", "init_inf_frac", "init_rec_frac"];

/// Rates and initial conditions of an SEIR outbreak.
///
/// - `alpha`: progression rate from exposed to infectious (1/latent period)
/// - `beta`: transmission rate
/// - `gamma`: recovery rate (1/infectious period)
/// - `init_inf_frac`: initially infectious fraction of the population
/// - `init_rec_frac`: initially recovered fraction of the population
/// - `tmax`: horizon in days; [`DEFAULT_TMAX`] when `None`
///
/// # Examples
///
/// ```
/// use epi_models::seir::EpidemicParameters;
///
/// let params = EpidemicParameters::new(0.5, 0.3, 0.2, 1e-4, 0.1).with_tmax(60);
/// assert!(params.validate().is_ok());
/// assert!((params.basic_reproduction_number() - 1.5).abs() < 1e-12);
/// assert_eq!(
///     format!("{}", params),
///     "alpha: 0.50, beta: 0.30, gamma: 0.20, init_inf_frac: 0.00, init_rec_frac: 0.10"
/// );
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EpidemicParameters {
    /// Exposed → infectious rate.
    pub alpha: f64,
    /// Transmission rate.
    pub beta: f64,
    /// Recovery rate.
    pub gamma: f64,
    /// Initially infectious fraction.
    pub init_inf_frac: f64,
    /// Initially recovered fraction.
    pub init_rec_frac: f64,
    /// Horizon in days.
    pub tmax: Option<usize>,
}

impl Default for EpidemicParameters {
    /// Baseline outbreak: 2-day latency, 7-day infectious period, R0 = 1.5.
    fn default() -> Self {
        Self {
            alpha: 0.5,
            beta: 1.5 / 7.0,
            gamma: 1.0 / 7.0,
            init_inf_frac: 1e-4,
            init_rec_frac: 0.15,
            tmax: Some(DEFAULT_TMAX),
        }
    }
}

impl EpidemicParameters {
    /// Create parameters without a horizon.
    pub fn new(alpha: f64, beta: f64, gamma: f64, init_inf_frac: f64, init_rec_frac: f64) -> Self {
        Self {
            alpha,
            beta,
            gamma,
            init_inf_frac,
            init_rec_frac,
            tmax: None,
        }
    }

    /// Copy with the given horizon.
    pub fn with_tmax(mut self, tmax: usize) -> Self {
        self.tmax = Some(tmax);
        self
    }

    /// Build from `[alpha, beta, gamma, init_inf_frac, init_rec_frac]`.
    ///
    /// # Errors
    ///
    /// [`ModelError::InvalidParameter`] if `values` does not hold exactly
    /// five entries.
    pub fn from_slice(values: &[f64], tmax: Option<usize>) -> Result<Self, ModelError> {
        match values {
            &[alpha, beta, gamma, init_inf_frac, init_rec_frac] => Ok(Self {
                alpha,
                beta,
                gamma,
                init_inf_frac,
                init_rec_frac,
                tmax,
            }),
            _ => Err(ModelError::invalid_parameter(
                "values",
                format!("expected {} values, got {}", PARAMETER_COUNT, values.len()),
            )),
        }
    }

    /// `[alpha, beta, gamma, init_inf_frac, init_rec_frac]`.
    pub fn as_array(&self) -> [f64; PARAMETER_COUNT] {
        [
            self.alpha,
            self.beta,
            self.gamma,
            self.init_inf_frac,
            self.init_rec_frac,
        ]
    }

    /// Horizon, falling back to [`DEFAULT_TMAX`].
    pub fn horizon(&self) -> usize {
        self.tmax.unwrap_or(DEFAULT_TMAX)
    }

    /// Initially susceptible fraction `1 - init_inf_frac - init_rec_frac`.
    pub fn init_sus_frac(&self) -> f64 {
        1.0 - self.init_inf_frac - self.init_rec_frac
    }

    /// Basic reproduction number `beta / gamma`.
    pub fn basic_reproduction_number(&self) -> f64 {
        self.beta / self.gamma
    }

    /// Check the model invariants.
    ///
    /// # Errors
    ///
    /// [`ModelError::InvalidParameter`] if a rate is not positive and
    /// finite, an initial fraction is negative or non-finite, the
    /// susceptible fraction would be negative, or `tmax` is `Some(0)`.
    pub fn validate(&self) -> Result<(), ModelError> {
        for (name, rate) in [("alpha", self.alpha), ("beta", self.beta), ("gamma", self.gamma)] {
            if !(rate > 0.0 && rate.is_finite()) {
                return Err(ModelError::invalid_parameter(
                    name,
                    format!("rate must be positive and finite, got {}", rate),
                ));
            }
        }
        for (name, frac) in [
            ("init_inf_frac", self.init_inf_frac),
            ("init_rec_frac", self.init_rec_frac),
        ] {
            if !(frac >= 0.0 && frac.is_finite()) {
                return Err(ModelError::invalid_parameter(
                    name,
                    format!("fraction must be non-negative and finite, got {}", frac),
                ));
            }
        }
        let s0 = self.init_sus_frac();
        if s0 < 0.0 {
            return Err(ModelError::invalid_parameter(
                "init_sus_frac",
                format!(
                    "init_inf_frac + init_rec_frac must not exceed 1 (susceptible fraction {})",
                    s0
                ),
            ));
        }
        if self.tmax == Some(0) {
            return Err(ModelError::invalid_parameter("tmax", "must be at least 1"));
        }
        Ok(())
    }
}

impl fmt::Display for EpidemicParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "alpha: {:.2}, beta: {:.2}, gamma: {:.2}, init_inf_frac: {:.2}, init_rec_frac: {:.2}",
            self.alpha, self.beta, self.gamma, self.init_inf_frac, self.init_rec_frac
        )
    }
}
