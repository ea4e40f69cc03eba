//! Observed surveillance series with explicit missing values.
//!
//! A missing day (`None`) is distinct from a day with zero reported cases
//! (`Some(0.0)`).

/// Daily observed series; `None` marks a day with no report.
pub type ObservedSeries = Vec<Option<f64>>;

/// Lift a fully observed series into an [`ObservedSeries`].
///
/// # Examples
/// ```
/// use epi_core::types::series::from_dense;
///
/// assert_eq!(from_dense(&[1.0, 0.0]), vec![Some(1.0), Some(0.0)]);
/// ```
pub fn from_dense(values: &[f64]) -> ObservedSeries {
    values.iter().copied().map(Some).collect()
}

/// Number of non-missing entries.
pub fn observed_count(series: &[Option<f64>]) -> usize {
    series.iter().filter(|v| v.is_some()).count()
}

/// Sum of non-missing entries (zero when everything is missing).
pub fn observed_sum(series: &[Option<f64>]) -> f64 {
    series.iter().flatten().sum()
}
