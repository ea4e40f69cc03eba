//! Epidemic indicators derived from compartment arrays.
//!
//! Definitions, with `i` a day index:
//!
//! ```text
//! daily_incidence[0] = 0
//! daily_incidence[i] = (E[i-1] - E[i]) - (S[i] - S[i-1])
//! new_recoveries[0]  = 0
//! new_recoveries[i]  = R[i] - R[i-1]
//! daily_rt[i]        = daily_incidence[i] / new_recoveries[i]   (None if the denominator is 0)
//! weekly_*           = sums over consecutive 7-day blocks, right-padded with zeros
//! ```
//!
//! Weekly Rt is the sum of the daily ratios in each week, with undefined
//! days counted as zero.

/// Days per weekly aggregation block.
pub const WEEK_LEN: usize = 7;

/// Incidence and reproduction-number series for one trajectory.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IndicatorSeries {
    daily_incidence: Vec<f64>,
    weekly_incidence: Vec<f64>,
    new_recoveries: Vec<f64>,
    daily_rt: Vec<Option<f64>>,
    weekly_rt: Vec<f64>,
}

impl IndicatorSeries {
    /// Derive every indicator from the S, E and R compartments.
    ///
    /// # Panics
    ///
    /// Panics if the three slices differ in length.
    ///
    /// # Examples
    /// ```
    /// use epi_models::indicators::IndicatorSeries;
    ///
    /// let s = [90.0, 85.0, 79.0];
    /// let e = [5.0, 6.0, 7.0];
    /// let r = [0.0, 1.0, 1.0];
    /// let ind = IndicatorSeries::derive(&s, &e, &r);
    ///
    /// assert_eq!(ind.daily_incidence(), &[0.0, 4.0, 5.0]);
    /// assert_eq!(ind.daily_rt(), &[None, Some(4.0), None]);
    /// assert_eq!(ind.weekly_incidence(), &[9.0]);
    /// ```
    pub fn derive(s: &[f64], e: &[f64], r: &[f64]) -> Self {
        assert_eq!(s.len(), e.len(), "S and E must have equal length");
        assert_eq!(s.len(), r.len(), "S and R must have equal length");

        let daily_incidence = daily_incidence(s, e);
        let new_recoveries = first_differences(r);
        let daily_rt: Vec<Option<f64>> = daily_incidence
            .iter()
            .zip(&new_recoveries)
            .map(|(&inc, &rec)| if rec != 0.0 { Some(inc / rec) } else { None })
            .collect();

        let weekly_incidence = weekly_sums(&daily_incidence);
        let rt_for_sums: Vec<f64> = daily_rt.iter().map(|v| v.unwrap_or(0.0)).collect();
        let weekly_rt = weekly_sums(&rt_for_sums);

        Self {
            daily_incidence,
            weekly_incidence,
            new_recoveries,
            daily_rt,
            weekly_rt,
        }
    }

    /// Daily incidence; length equals the trajectory length.
    pub fn daily_incidence(&self) -> &[f64] {
        &self.daily_incidence
    }

    /// Weekly incidence; length `ceil(days / 7)`.
    pub fn weekly_incidence(&self) -> &[f64] {
        &self.weekly_incidence
    }

    /// Daily change in the recovered compartment.
    pub fn new_recoveries(&self) -> &[f64] {
        &self.new_recoveries
    }

    /// Daily Rt; `None` where no recoveries occurred.
    pub fn daily_rt(&self) -> &[Option<f64>] {
        &self.daily_rt
    }

    /// Weekly Rt; length `ceil(days / 7)`.
    pub fn weekly_rt(&self) -> &[f64] {
        &self.weekly_rt
    }
}

fn daily_incidence(s: &[f64], e: &[f64]) -> Vec<f64> {
    (0..s.len())
        .map(|i| {
            if i == 0 {
                0.0
            } else {
                (e[i - 1] - e[i]) - (s[i] - s[i - 1])
            }
        })
        .collect()
}

fn first_differences(values: &[f64]) -> Vec<f64> {
    (0..values.len())
        .map(|i| if i == 0 { 0.0 } else { values[i] - values[i - 1] })
        .collect()
}

/// Sum consecutive 7-day blocks, zero-padding the final partial week.
///
/// # Examples
/// ```
/// use epi_models::indicators::weekly_sums;
///
/// let daily: Vec<f64> = (1..=9).map(f64::from).collect();
/// assert_eq!(weekly_sums(&daily), vec![28.0, 17.0]);
/// assert!(weekly_sums(&[]).is_empty());
/// ```
pub fn weekly_sums(daily: &[f64]) -> Vec<f64> {
    daily
        .chunks(WEEK_LEN)
        .map(|week| week.iter().sum())
        .collect()
}
