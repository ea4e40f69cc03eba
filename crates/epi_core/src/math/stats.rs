//! Goodness-of-fit statistics.
//!
//! - [`r_squared`]: coefficient of determination over the non-missing
//!   entries of an observed series
//! - [`relative_error`]: elementwise `|truth - estimate| / truth`

use num_traits::Float;

use crate::types::StatsError;

/// Coefficient of determination between an observed series with missing
/// entries and a fully defined prediction.
///
/// Only indices where `observed` is `Some` take part:
///
/// ```text
/// R² = 1 - Σ (y_i - ŷ_i)² / Σ (y_i - ȳ)²
/// ```
///
/// A constant observed series has no variance; it scores `1` for an exact
/// prediction and `0` otherwise. R² is at most 1 and unbounded below.
///
/// # Errors
///
/// - [`StatsError::LengthMismatch`] if the slices differ in length
/// - [`StatsError::InsufficientData`] if every observed entry is missing
///
/// # Examples
/// ```
/// use epi_core::math::stats::r_squared;
///
/// let observed = [Some(1.0), None, Some(3.0), Some(5.0)];
/// let predicted = [1.0, 100.0, 3.0, 5.0];
/// assert_eq!(r_squared(&observed, &predicted).unwrap(), 1.0);
/// ```
pub fn r_squared<T: Float>(observed: &[Option<T>], predicted: &[T]) -> Result<T, StatsError> {
    if observed.len() != predicted.len() {
        return Err(StatsError::LengthMismatch {
            expected: observed.len(),
            got: predicted.len(),
        });
    }

    let pairs = || {
        observed
            .iter()
            .zip(predicted)
            .filter_map(|(y, &p)| y.map(|y| (y, p)))
    };

    let count = pairs().count();
    if count == 0 {
        return Err(StatsError::InsufficientData { got: 0, need: 1 });
    }

    let n = T::from(count).unwrap_or_else(T::one);
    let mean = pairs().fold(T::zero(), |acc, (y, _)| acc + y) / n;
    let (ss_res, ss_tot) = pairs().fold((T::zero(), T::zero()), |(res, tot), (y, p)| {
        (res + (y - p) * (y - p), tot + (y - mean) * (y - mean))
    });

    if ss_tot == T::zero() {
        return Ok(if ss_res == T::zero() {
            T::one()
        } else {
            T::zero()
        });
    }
    Ok(T::one() - ss_res / ss_tot)
}

/// Elementwise relative error `|truth_i - estimate_i| / truth_i`.
///
/// Used to judge how well calibration recovers known parameters.
///
/// # Errors
///
/// [`StatsError::LengthMismatch`] if the slices differ in length.
///
/// # Examples
/// ```
/// use epi_core::math::stats::relative_error;
///
/// let errors = relative_error::<f64>(&[0.5, 0.2], &[0.55, 0.2]).unwrap();
/// assert!((errors[0] - 0.1).abs() < 1e-12);
/// assert_eq!(errors[1], 0.0);
/// ```
pub fn relative_error<T: Float>(truth: &[T], estimate: &[T]) -> Result<Vec<T>, StatsError> {
    if truth.len() != estimate.len() {
        return Err(StatsError::LengthMismatch {
            expected: truth.len(),
            got: estimate.len(),
        });
    }
    Ok(truth
        .iter()
        .zip(estimate)
        .map(|(&t, &e)| (t - e).abs() / t)
        .collect())
}
