use serde::{Serialize, Serializer, ser::SerializeMap as _};

/// Precomputed percentile values for a dataset.
///
/// This structure stores percentile-value pairs for efficient lookup
/// of commonly used percentile points.
///
/// # Examples
///
/// ```
/// use policyscope_stats::percentiles::Percentiles;
///
/// let values = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0];
/// let percentiles = Percentiles::new(&values, &[25.0, 50.0, 75.0]);
///
/// assert_eq!(percentiles.get(50.0), Some(5.5));
/// assert_eq!(percentiles.get(25.0), Some(3.25));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Percentiles {
    /// Percentile-value pairs, sorted by percentile.
    /// Each tuple contains (percentile, value) where percentile is 0.0-100.0.
    values: Vec<(f64, f64)>,
}

impl Percentiles {
    /// Computes percentiles from sorted values.
    ///
    /// # Arguments
    ///
    /// * `sorted_values` - Values sorted in ascending order
    /// * `percentile_points` - The percentile points to compute (e.g., [25.0, 50.0, 75.0])
    ///
    /// # Panics
    ///
    /// Panics if `sorted_values` is not sorted in ascending order.
    #[must_use]
    pub fn from_sorted(sorted_values: &[f64], percentile_points: &[f64]) -> Self {
        assert!(
            sorted_values.is_sorted_by(|a, b| a <= b),
            "values must be sorted in ascending order"
        );

        let values = percentile_points
            .iter()
            .map(|&p| (p, compute_percentile(sorted_values, p)))
            .collect();
        Self { values }
    }

    /// Computes percentiles from unsorted values.
    ///
    /// This method will sort the values internally before computing percentiles.
    ///
    /// # Examples
    ///
    /// ```
    /// use policyscope_stats::percentiles::Percentiles;
    ///
    /// let values = vec![5.0, 2.0, 8.0, 1.0, 9.0];
    /// let percentiles = Percentiles::new(&values, &[25.0, 50.0, 75.0]);
    ///
    /// assert_eq!(percentiles.get(50.0), Some(5.0));
    /// ```
    #[must_use]
    pub fn new(values: &[f64], percentile_points: &[f64]) -> Self {
        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);
        Self::from_sorted(&sorted, percentile_points)
    }

    /// Gets the value at a specific percentile.
    ///
    /// Returns `None` if the percentile was not precomputed.
    ///
    /// # Examples
    ///
    /// ```
    /// use policyscope_stats::percentiles::Percentiles;
    ///
    /// let values = vec![1.0, 2.0, 3.0, 4.0, 5.0];
    /// let percentiles = Percentiles::new(&values, &[50.0, 90.0]);
    ///
    /// assert_eq!(percentiles.get(50.0), Some(3.0));
    /// assert_eq!(percentiles.get(25.0), None); // Not precomputed
    /// ```
    #[must_use]
    pub fn get(&self, percentile: f64) -> Option<f64> {
        self.values.iter().find_map(|(p, value)| {
            if (*p - percentile).abs() < f64::EPSILON {
                Some(*value)
            } else {
                None
            }
        })
    }

    /// Returns an iterator over all (percentile, value) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.values.iter().copied()
    }

    /// Returns all percentile-value pairs as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[(f64, f64)] {
        &self.values
    }
}

/// Serialized as a map keyed by the percentile point, e.g. `{"25": 3.25, "50": 5.5}`.
impl Serialize for Percentiles {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (p, value) in &self.values {
            map.serialize_entry(&format!("{p}"), value)?;
        }
        map.end()
    }
}

/// Computes a single percentile value from sorted data.
///
/// Uses linear interpolation between the two closest ranks: the k-th
/// percentile sits at fractional position `(n - 1) * k / 100`.
///
/// # Returns
///
/// The value at the specified percentile. Returns `f64::NAN` if the input is empty.
///
/// # Examples
///
/// ```
/// use policyscope_stats::percentiles::compute_percentile;
///
/// let values = vec![1.0, 2.0, 3.0, 4.0];
///
/// assert_eq!(compute_percentile(&values, 50.0), 2.5);
/// assert_eq!(compute_percentile(&values, 0.0), 1.0);
/// assert_eq!(compute_percentile(&values, 100.0), 4.0);
/// ```
#[expect(
    clippy::cast_sign_loss,
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss
)]
#[must_use]
pub fn compute_percentile(sorted_values: &[f64], percentile: f64) -> f64 {
    if sorted_values.is_empty() {
        return f64::NAN;
    }
    let last = sorted_values.len() - 1;
    let position = (last as f64 * percentile.clamp(0.0, 100.0)) / 100.0;
    let lower = (position.floor() as usize).min(last);
    let upper = (position.ceil() as usize).min(last);
    let fraction = position - lower as f64;
    sorted_values[lower] + (sorted_values[upper] - sorted_values[lower]) * fraction
}

/// Percentage of `values` that are less than or equal to `score`.
///
/// This is the "weak" percentile-of-score definition: the largest value in a
/// series always sits at 100.
///
/// Returns `0.0` for an empty series.
///
/// # Examples
///
/// ```
/// use policyscope_stats::percentiles::percentile_of_score;
///
/// let values = [10.0, 20.0, 20.0, 40.0];
/// assert_eq!(percentile_of_score(&values, 20.0), 75.0);
/// assert_eq!(percentile_of_score(&values, 40.0), 100.0);
/// assert_eq!(percentile_of_score(&values, 5.0), 0.0);
/// ```
#[expect(clippy::cast_precision_loss)]
#[must_use]
pub fn percentile_of_score(values: &[f64], score: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let at_or_below = values.iter().filter(|v| **v <= score).count();
    at_or_below as f64 / values.len() as f64 * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interpolates_between_ranks() {
        let values = [10.0, 20.0, 30.0, 40.0, 50.0];
        assert!((compute_percentile(&values, 90.0) - 46.0).abs() < 1e-9);
        assert!((compute_percentile(&values, 25.0) - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_single_value() {
        assert_eq!(compute_percentile(&[7.0], 25.0), 7.0);
        assert_eq!(compute_percentile(&[7.0], 90.0), 7.0);
    }

    #[test]
    fn test_empty_is_nan() {
        assert!(compute_percentile(&[], 50.0).is_nan());
        assert_eq!(percentile_of_score(&[], 1.0), 0.0);
    }

    #[test]
    fn test_serialize_as_map() {
        let percentiles = Percentiles::new(&[1.0, 2.0, 3.0], &[25.0, 50.0]);
        let json = serde_json::to_value(&percentiles).unwrap();
        assert_eq!(json, serde_json::json!({"25": 1.5, "50": 2.0}));
    }
}
