//! Reporting delay and underreporting applied to an incidence series.

use epi_core::rng::EpiRng;
use epi_core::types::{from_dense, ObservedSeries};
use rand_distr::{Geometric, Uniform};
use tracing::{debug, warn};

use super::NoiseMode;
use crate::NoiseError;

/// Width of the uniform underreporting distribution in random mode:
/// multipliers are drawn from `[mean, mean + UNDERREPORTING_SPREAD]`.
pub const UNDERREPORTING_SPREAD: f64 = 0.02;

/// Largest `mean_delay` accepted in random mode. Beyond this the geometric
/// success probability loses the precision the sampler needs.
pub const MAX_RANDOM_MEAN_DELAY: f64 = 1e12;

/// Mutable observation-noise state for one incidence series.
///
/// `delays` and `underreporting` are fixed at construction; `incidence`
/// starts as the true series and is transformed in place.
#[derive(Debug, Clone, PartialEq)]
pub struct ObservationNoiseModel {
    incidence: ObservedSeries,
    delays: Vec<usize>,
    underreporting: Vec<f64>,
}

impl ObservationNoiseModel {
    /// Draw delay and underreporting arrays for `true_series`.
    ///
    /// - [`NoiseMode::Fixed`]: every delay is `mean_delay` rounded to whole
    ///   days; every multiplier is `mean_underreporting`.
    /// - [`NoiseMode::Random`]: delays are geometric on `{0, 1, 2, …}` with
    ///   success probability `1 / (1 + mean_delay)`, so their mean is
    ///   `mean_delay`; multipliers are uniform on
    ///   `[mean_underreporting, mean_underreporting + UNDERREPORTING_SPREAD]`.
    ///
    /// # Errors
    ///
    /// [`NoiseError::InvalidParameter`] if either mean is negative or
    /// non-finite, or if `mean_delay` exceeds [`MAX_RANDOM_MEAN_DELAY`] in
    /// random mode.
    pub fn new(
        true_series: &[f64],
        mean_delay: f64,
        mean_underreporting: f64,
        mode: NoiseMode,
        rng: &mut EpiRng,
    ) -> Result<Self, NoiseError> {
        if !(mean_delay >= 0.0 && mean_delay.is_finite()) {
            return Err(NoiseError::invalid_parameter(
                "mean_delay",
                format!("must be non-negative and finite, got {}", mean_delay),
            ));
        }
        if !(mean_underreporting >= 0.0 && mean_underreporting.is_finite()) {
            return Err(NoiseError::invalid_parameter(
                "mean_underreporting",
                format!("must be non-negative and finite, got {}", mean_underreporting),
            ));
        }

        if mean_underreporting > 1.0 {
            warn!(
                mean_underreporting,
                "underreporting multiplier above 1 inflates the observed series"
            );
        }

        let n = true_series.len();
        let (delays, underreporting) = match mode {
            NoiseMode::Fixed => (
                vec![mean_delay.round() as usize; n],
                vec![mean_underreporting; n],
            ),
            NoiseMode::Random => {
                if mean_delay > MAX_RANDOM_MEAN_DELAY {
                    return Err(NoiseError::invalid_parameter(
                        "mean_delay",
                        format!(
                            "must not exceed {} in random mode, got {}",
                            MAX_RANDOM_MEAN_DELAY, mean_delay
                        ),
                    ));
                }
                let geometric = Geometric::new(1.0 / (1.0 + mean_delay))
                    .map_err(|e| NoiseError::invalid_parameter("mean_delay", e.to_string()))?;
                let uniform = Uniform::new_inclusive(
                    mean_underreporting,
                    mean_underreporting + UNDERREPORTING_SPREAD,
                );
                let delays = (0..n)
                    .map(|_| usize::try_from(rng.sample(&geometric)).unwrap_or(usize::MAX))
                    .collect();
                let mut underreporting = vec![0.0; n];
                rng.fill_with(&uniform, &mut underreporting);
                (delays, underreporting)
            }
        };

        debug!(
            days = n,
            mean_delay,
            mean_underreporting,
            mode = mode.as_str(),
            seed = rng.seed(),
            "drew observation noise arrays"
        );

        Ok(Self {
            incidence: from_dense(true_series),
            delays,
            underreporting,
        })
    }

    /// [`new`](Self::new) with a freshly seeded generator.
    pub fn with_seed(
        true_series: &[f64],
        mean_delay: f64,
        mean_underreporting: f64,
        mode: NoiseMode,
        seed: u64,
    ) -> Result<Self, NoiseError> {
        let mut rng = EpiRng::from_seed(seed);
        Self::new(true_series, mean_delay, mean_underreporting, mode, &mut rng)
    }

    /// Build from explicit arrays.
    ///
    /// # Errors
    ///
    /// [`NoiseError::LengthMismatch`] if `delays` or `underreporting` differ
    /// in length from `incidence`.
    pub fn from_parts(
        incidence: Vec<Option<f64>>,
        delays: Vec<usize>,
        underreporting: Vec<f64>,
    ) -> Result<Self, NoiseError> {
        for len in [delays.len(), underreporting.len()] {
            if len != incidence.len() {
                return Err(NoiseError::LengthMismatch {
                    expected: incidence.len(),
                    got: len,
                });
            }
        }
        Ok(Self {
            incidence,
            delays,
            underreporting,
        })
    }

    /// Current working series.
    pub fn incidence(&self) -> &[Option<f64>] {
        &self.incidence
    }

    /// Per-day reporting delays in days.
    pub fn delays(&self) -> &[usize] {
        &self.delays
    }

    /// Per-day underreporting multipliers.
    pub fn underreporting(&self) -> &[f64] {
        &self.underreporting
    }

    /// Consume the model, returning the working series.
    pub fn into_incidence(self) -> ObservedSeries {
        self.incidence
    }

    /// Scale each day by its multiplier. Missing days stay missing.
    pub fn add_underreporting(&mut self) {
        for (value, &factor) in self.incidence.iter_mut().zip(&self.underreporting) {
            if let Some(v) = value {
                *v *= factor;
            }
        }
    }

    /// Shift each day forward by its delay.
    ///
    /// Source day `i` lands on `i + delays[i]`; colliding contributions are
    /// summed, contributions landing at or past the horizon are dropped and
    /// days receiving nothing become missing.
    pub fn add_delay(&mut self) {
        self.incidence = remap(&self.incidence, &self.delays, usize::checked_add);
    }

    /// Best-effort inverse of [`add_delay`](Self::add_delay).
    ///
    /// Day `i` moves back to `i - delays[i]` under the same collision,
    /// drop and missing rules. Mass censored by the forward shift cannot
    /// be recovered.
    pub fn remove_delay(&mut self) {
        self.incidence = remap(&self.incidence, &self.delays, usize::checked_sub);
    }

    /// Apply underreporting, then delay.
    pub fn add_noise(&mut self) {
        self.add_underreporting();
        self.add_delay();
    }
}

/// Move every observed day `i` to `shift(i, delays[i])`.
///
/// Collisions are summed, out-of-range destinations are dropped and days
/// receiving nothing are missing.
fn remap<F>(incidence: &[Option<f64>], delays: &[usize], shift: F) -> ObservedSeries
where
    F: Fn(usize, usize) -> Option<usize>,
{
    let n = incidence.len();
    let mut shifted: ObservedSeries = vec![None; n];
    let mut dropped = 0usize;

    for (source, (value, &delay)) in incidence.iter().zip(delays).enumerate() {
        let Some(v) = value else { continue };
        match shift(source, delay) {
            Some(dest) if dest < n => *shifted[dest].get_or_insert(0.0) += v,
            _ => dropped += 1,
        }
    }

    debug!(
        days = n,
        dropped,
        missing = shifted.iter().filter(|v| v.is_none()).count(),
        "remapped observation series"
    );
    shifted
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use epi_core::types::{observed_count, observed_sum};

    #[test]
    fn test_fixed_mode_arrays() {
        let model =
            ObservationNoiseModel::with_seed(&[1.0; 4], 2.4, 0.3, NoiseMode::Fixed, 0).unwrap();
        assert_eq!(model.delays(), &[2, 2, 2, 2]);
        assert_eq!(model.underreporting(), &[0.3; 4]);
    }

    #[test]
    fn test_fixed_mode_reference_scenario() {
        let mut model =
            ObservationNoiseModel::with_seed(&[100.0; 5], 2.0, 0.1, NoiseMode::Fixed, 0).unwrap();

        model.add_underreporting();
        for value in model.incidence() {
            assert_relative_eq!(value.unwrap(), 10.0);
        }

        model.add_delay();
        let observed = model.incidence();
        assert_eq!(observed[0], None);
        assert_eq!(observed[1], None);
        for value in &observed[2..] {
            assert_relative_eq!(value.unwrap(), 10.0);
        }
    }

    #[test]
    fn test_collisions_are_summed() {
        let mut model = ObservationNoiseModel::from_parts(
            vec![Some(1.0), Some(2.0), Some(4.0), Some(8.0)],
            vec![2, 1, 0, 5],
            vec![1.0; 4],
        )
        .unwrap();
        model.add_delay();
        // 0 -> 2, 1 -> 2, 2 -> 2, 3 -> dropped
        assert_eq!(model.incidence(), &[None, None, Some(7.0), None]);
    }

    #[test]
    fn test_zero_contribution_is_not_missing() {
        let mut model = ObservationNoiseModel::from_parts(
            vec![Some(0.0), Some(3.0)],
            vec![1, 1],
            vec![1.0, 1.0],
        )
        .unwrap();
        model.add_delay();
        assert_eq!(model.incidence(), &[None, Some(0.0)]);
    }

    #[test]
    fn test_missing_sources_contribute_nothing() {
        let mut model =
            ObservationNoiseModel::from_parts(vec![None, Some(5.0)], vec![0, 0], vec![0.5, 0.5])
                .unwrap();
        model.add_underreporting();
        assert_eq!(model.incidence(), &[None, Some(2.5)]);
        model.add_delay();
        assert_eq!(model.incidence(), &[None, Some(2.5)]);
    }

    #[test]
    fn test_remove_delay_restores_interior() {
        let mut model =
            ObservationNoiseModel::with_seed(&[5.0; 6], 2.0, 1.0, NoiseMode::Fixed, 0).unwrap();
        model.add_delay();
        model.remove_delay();
        assert_eq!(
            model.incidence(),
            &[Some(5.0), Some(5.0), Some(5.0), Some(5.0), None, None]
        );
    }

    #[test]
    fn test_remove_delay_drops_before_origin() {
        let mut model = ObservationNoiseModel::from_parts(
            vec![Some(1.0), Some(2.0), Some(3.0)],
            vec![3, 1, 1],
            vec![1.0; 3],
        )
        .unwrap();
        model.remove_delay();
        // 0 -> dropped, 1 -> 0, 2 -> 1
        assert_eq!(model.incidence(), &[Some(2.0), Some(3.0), None]);
    }

    #[test]
    fn test_random_mode_is_seeded() {
        let series: Vec<f64> = (0..30).map(f64::from).collect();
        let a = ObservationNoiseModel::with_seed(&series, 3.0, 0.2, NoiseMode::Random, 9).unwrap();
        let b = ObservationNoiseModel::with_seed(&series, 3.0, 0.2, NoiseMode::Random, 9).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_random_underreporting_within_spread() {
        let model =
            ObservationNoiseModel::with_seed(&[1.0; 500], 1.0, 0.3, NoiseMode::Random, 4).unwrap();
        assert!(model
            .underreporting()
            .iter()
            .all(|&u| (0.3..=0.3 + UNDERREPORTING_SPREAD).contains(&u)));
    }

    #[test]
    fn test_random_underreporting_scales_total_mass() {
        // Multipliers average mean + spread / 2 over a long series
        let series: Vec<f64> = (0..20_000).map(|i| 1.0 + (i % 7) as f64).collect();
        let mut model =
            ObservationNoiseModel::with_seed(&series, 2.0, 0.3, NoiseMode::Random, 11).unwrap();
        let before = observed_sum(model.incidence());
        model.add_underreporting();
        let ratio = observed_sum(model.incidence()) / before;

        assert!((0.3..=0.3 + UNDERREPORTING_SPREAD).contains(&ratio));
        assert_relative_eq!(ratio, 0.3 + UNDERREPORTING_SPREAD / 2.0, max_relative = 1e-3);
    }

    #[test]
    fn test_fixed_underreporting_scales_total_mass_exactly() {
        let series: Vec<f64> = (0..50).map(f64::from).collect();
        let mut model =
            ObservationNoiseModel::with_seed(&series, 0.0, 0.25, NoiseMode::Fixed, 0).unwrap();
        let before = observed_sum(model.incidence());
        model.add_underreporting();
        assert_relative_eq!(observed_sum(model.incidence()), 0.25 * before, max_relative = 1e-12);
    }

    #[test]
    fn test_random_zero_mean_delay_is_identity_shift() {
        let mut model =
            ObservationNoiseModel::with_seed(&[2.0; 10], 0.0, 1.0, NoiseMode::Random, 1).unwrap();
        assert!(model.delays().iter().all(|&d| d == 0));
        model.add_delay();
        assert_eq!(observed_count(model.incidence()), 10);
    }

    #[test]
    fn test_delay_mass_bound() {
        let series: Vec<f64> = (0..200).map(|i| (i % 17) as f64).collect();
        let mut model =
            ObservationNoiseModel::with_seed(&series, 4.0, 0.5, NoiseMode::Random, 21).unwrap();
        model.add_underreporting();
        let before = observed_sum(model.incidence());
        let mut censored = 0.0;
        for (day, value) in model.incidence().iter().enumerate() {
            if day + model.delays()[day] >= series.len() {
                censored += value.unwrap_or(0.0);
            }
        }
        model.add_delay();
        let after = observed_sum(model.incidence());
        assert!(after <= before + 1e-9);
        assert_relative_eq!(after, before - censored, max_relative = 1e-12);
    }

    #[test]
    fn test_invalid_means_rejected() {
        assert!(matches!(
            ObservationNoiseModel::with_seed(&[1.0], -1.0, 0.5, NoiseMode::Fixed, 0),
            Err(NoiseError::InvalidParameter { .. })
        ));
        assert!(matches!(
            ObservationNoiseModel::with_seed(&[1.0], 1.0, f64::NAN, NoiseMode::Random, 0),
            Err(NoiseError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_huge_random_mean_delay_rejected() {
        let err = ObservationNoiseModel::with_seed(&[1.0; 10], 1e17, 0.1, NoiseMode::Random, 0)
            .unwrap_err();
        assert!(matches!(
            err,
            NoiseError::InvalidParameter { ref name, .. } if name == "mean_delay"
        ));
    }

    #[test]
    fn test_large_random_mean_delay_censors_everything() {
        let mut model = ObservationNoiseModel::with_seed(
            &[1.0; 10],
            MAX_RANDOM_MEAN_DELAY,
            0.1,
            NoiseMode::Random,
            0,
        )
        .unwrap();
        model.add_noise();
        assert_eq!(observed_count(model.incidence()), 0);
    }

    #[test]
    fn test_huge_fixed_mean_delay_censors_everything() {
        let mut model =
            ObservationNoiseModel::with_seed(&[1.0; 10], 1e300, 0.1, NoiseMode::Fixed, 0).unwrap();
        model.add_noise();
        assert_eq!(model.incidence(), &[None; 10]);
    }

    #[test]
    fn test_noise_then_remove_delay_round_trip() {
        let series: Vec<f64> = (0..40).map(|i| (i * 3 % 11) as f64).collect();
        let mut model =
            ObservationNoiseModel::with_seed(&series, 1.5, 1.0, NoiseMode::Random, 5).unwrap();
        let delays = model.delays().to_vec();
        model.add_noise();
        let shifted = model.incidence().to_vec();
        model.remove_delay();

        // Shifting back uses each destination day's own delay
        for (day, value) in shifted.iter().enumerate() {
            if let Some(v) = value {
                if let Some(origin) = day.checked_sub(delays[day]) {
                    assert!(model.incidence()[origin].unwrap() >= *v - 1e-12);
                }
            }
        }
        assert!(observed_sum(model.incidence()) <= observed_sum(&shifted) + 1e-9);
    }

    #[test]
    fn test_from_parts_length_mismatch() {
        assert_eq!(
            ObservationNoiseModel::from_parts(vec![Some(1.0); 3], vec![0; 2], vec![1.0; 3]),
            Err(NoiseError::LengthMismatch {
                expected: 3,
                got: 2
            })
        );
    }

    #[test]
    fn test_empty_series() {
        let mut model =
            ObservationNoiseModel::with_seed(&[], 2.0, 0.5, NoiseMode::Random, 0).unwrap();
        model.add_noise();
        assert!(model.into_incidence().is_empty());
    }
}
