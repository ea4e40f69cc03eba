//! Noise-generation modes.

use std::fmt;
use std::str::FromStr;

use crate::NoiseError;

/// How per-day delays and underreporting multipliers are generated.
///
/// # Examples
/// ```
/// use epi_models::observation::NoiseMode;
/// use epi_models::NoiseError;
///
/// assert_eq!("Random".parse::<NoiseMode>().unwrap(), NoiseMode::Random);
/// assert!(matches!(
///     "poisson".parse::<NoiseMode>(),
///     Err(NoiseError::NotImplemented(_))
/// ));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum NoiseMode {
    /// Geometric delays and uniform multipliers, drawn independently per day.
    #[default]
    Random,
    /// Every day uses the mean delay and mean multiplier.
    Fixed,
}

impl NoiseMode {
    /// Lowercase mode name.
    pub fn as_str(&self) -> &'static str {
        match self {
            NoiseMode::Random => "random",
            NoiseMode::Fixed => "fixed",
        }
    }
}

impl FromStr for NoiseMode {
    type Err = NoiseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "random" => Ok(NoiseMode::Random),
            "fixed" => Ok(NoiseMode::Fixed),
            other => Err(NoiseError::NotImplemented(other.to_string())),
        }
    }
}

impl fmt::Display for NoiseMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
