use serde::Serialize;

use crate::percentiles::{Percentiles, compute_percentile};

/// Percentile points reported with every [`DescriptiveStats`].
pub const REPORTED_PERCENTILES: [f64; 4] = [25.0, 50.0, 75.0, 90.0];

/// Descriptive statistics summarizing a dataset.
///
/// All measures are computed on the raw series; no outlier removal happens
/// here. The standard deviation is the population one (divides by `n`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DescriptiveStats {
    /// The arithmetic mean (average) of the dataset.
    pub mean: f64,
    /// The median value of the dataset.
    pub median: f64,
    /// The population standard deviation of the dataset.
    pub std: f64,
    /// The minimum value in the dataset.
    pub min: f64,
    /// The maximum value in the dataset.
    pub max: f64,
    /// P25, P50, P75 and P90 of the dataset.
    pub percentiles: Percentiles,
}

impl DescriptiveStats {
    /// Computes descriptive statistics from unsorted values.
    ///
    /// This method will sort the values internally before computing statistics.
    ///
    /// # Returns
    ///
    /// * `Some(DescriptiveStats)` - if the dataset contains at least one value
    /// * `None` - if the dataset is empty
    ///
    /// # Examples
    ///
    /// ```
    /// # use policyscope_stats::descriptive::DescriptiveStats;
    /// let values = [5.0, 2.0, 4.0, 1.0, 3.0];
    /// let stats = DescriptiveStats::new(values).unwrap();
    /// assert_eq!(stats.min, 1.0);
    /// assert_eq!(stats.max, 5.0);
    /// assert_eq!(stats.mean, 3.0);
    /// assert_eq!(stats.median, 3.0);
    /// assert!(DescriptiveStats::new(Vec::new()).is_none());
    /// ```
    #[must_use]
    pub fn new<I>(values: I) -> Option<Self>
    where
        I: IntoIterator<Item = f64>,
    {
        let mut values = values.into_iter().collect::<Vec<_>>();
        values.sort_by(f64::total_cmp);
        Self::from_sorted(&values)
    }

    /// Computes descriptive statistics from pre-sorted values.
    ///
    /// # Panics
    ///
    /// Panics if `sorted_values` is not sorted in ascending order.
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn from_sorted(sorted_values: &[f64]) -> Option<Self> {
        assert!(
            sorted_values.is_sorted_by(|a, b| a <= b),
            "values must be sorted in ascending order"
        );

        let min = *sorted_values.first()?;
        let max = *sorted_values.last()?;
        let n = sorted_values.len() as f64;
        let mean = sorted_values.iter().sum::<f64>() / n;
        let median = compute_percentile(sorted_values, 50.0);
        let variance = sorted_values
            .iter()
            .map(|v| (v - mean).powi(2))
            .sum::<f64>()
            / n;
        let percentiles = Percentiles::from_sorted(sorted_values, &REPORTED_PERCENTILES);

        Some(Self {
            mean,
            median,
            std: variance.sqrt(),
            min,
            max,
            percentiles,
        })
    }
}

/// Population mean and standard deviation of a series.
///
/// Returns `None` for an empty series.
#[expect(clippy::cast_precision_loss)]
#[must_use]
pub fn mean_and_std(values: &[f64]) -> Option<(f64, f64)> {
    if values.is_empty() {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    Some((mean, variance.sqrt()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_population_std() {
        let stats = DescriptiveStats::new([2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert!((stats.mean - 5.0).abs() < 1e-12);
        assert!((stats.std - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_even_length_median_interpolates() {
        let stats = DescriptiveStats::new([4.0, 1.0, 3.0, 2.0]).unwrap();
        assert!((stats.median - 2.5).abs() < 1e-12);
        assert_eq!(stats.percentiles.get(50.0), Some(stats.median));
    }

    #[test]
    fn test_reported_percentiles() {
        let stats = DescriptiveStats::new((1..=11).map(f64::from)).unwrap();
        assert_eq!(stats.percentiles.get(25.0), Some(3.5));
        assert_eq!(stats.percentiles.get(75.0), Some(8.5));
        assert_eq!(stats.percentiles.get(90.0), Some(10.0));
    }

    #[test]
    fn test_single_value() {
        let stats = DescriptiveStats::new([42.0]).unwrap();
        assert_eq!(stats.min, 42.0);
        assert_eq!(stats.max, 42.0);
        assert_eq!(stats.std, 0.0);
    }

    #[test]
    fn test_mean_and_std() {
        assert_eq!(mean_and_std(&[]), None);
        assert_eq!(mean_and_std(&[3.0, 3.0]), Some((3.0, 0.0)));
    }
}
