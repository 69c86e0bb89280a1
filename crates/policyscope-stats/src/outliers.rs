//! Z-score outlier detection
//!
//! Flags values whose standardized distance from the series mean exceeds a
//! threshold. Missing entries are filtered out before the mean and standard
//! deviation are computed, and a series with fewer than
//! [`MIN_OUTLIER_SAMPLES`] valid values never produces outliers.
//!
//! # Examples
//!
//! ```
//! use policyscope_stats::outliers::{Deviation, ZScoreDetector};
//!
//! let values = [Some(10.0), Some(10.0), None, Some(10.0), Some(10.0), Some(90.0)];
//! let outliers = ZScoreDetector::new(1.5).detect(&values);
//!
//! assert_eq!(outliers.len(), 1);
//! assert_eq!(outliers[0].index, 5);
//! assert_eq!(outliers[0].deviation, Deviation::High);
//! ```

use serde::Serialize;

use crate::descriptive::mean_and_std;

/// Minimum number of valid values for z-scores to be meaningful.
pub const MIN_OUTLIER_SAMPLES: usize = 3;

/// Default absolute z-score above which a value is an outlier.
pub const DEFAULT_Z_THRESHOLD: f64 = 3.0;

/// Direction of an outlier relative to the series mean.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Deviation {
    High,
    Low,
}

impl Deviation {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Low => "low",
        }
    }
}

/// A single flagged value.
#[derive(Debug, Clone, PartialEq)]
pub struct ZScoreOutlier {
    /// Position of the value in the input series (missing entries included).
    pub index: usize,
    pub value: f64,
    /// Absolute z-score.
    pub z_score: f64,
    pub deviation: Deviation,
}

/// Population z-score outlier detector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZScoreDetector {
    pub threshold: f64,
}

impl Default for ZScoreDetector {
    fn default() -> Self {
        Self::new(DEFAULT_Z_THRESHOLD)
    }
}

impl ZScoreDetector {
    #[must_use]
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    /// Detects outliers in a series that may contain missing entries.
    ///
    /// `None` and non-finite values are treated as missing. Returns an empty
    /// list when fewer than [`MIN_OUTLIER_SAMPLES`] valid values remain or the
    /// valid values have zero spread.
    #[must_use]
    pub fn detect(&self, values: &[Option<f64>]) -> Vec<ZScoreOutlier> {
        let valid = values
            .iter()
            .enumerate()
            .filter_map(|(index, &value)| value.filter(|v| v.is_finite()).map(|v| (index, v)))
            .collect::<Vec<_>>();

        if valid.len() < MIN_OUTLIER_SAMPLES {
            return vec![];
        }

        let series = valid.iter().map(|(_, v)| *v).collect::<Vec<_>>();
        let Some((mean, std)) = mean_and_std(&series) else {
            return vec![];
        };
        if std <= 0.0 {
            return vec![];
        }

        valid
            .into_iter()
            .filter_map(|(index, value)| {
                let z_score = (value - mean).abs() / std;
                (z_score > self.threshold).then(|| ZScoreOutlier {
                    index,
                    value,
                    z_score,
                    deviation: if value > mean {
                        Deviation::High
                    } else {
                        Deviation::Low
                    },
                })
            })
            .collect()
    }

    /// Convenience wrapper for a series without missing entries.
    #[must_use]
    pub fn detect_complete(&self, values: &[f64]) -> Vec<ZScoreOutlier> {
        let values = values.iter().copied().map(Some).collect::<Vec<_>>();
        self.detect(&values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fewer_than_three_values_never_flag() {
        let detector = ZScoreDetector::new(0.0);
        assert!(detector.detect_complete(&[1.0, 1_000_000.0]).is_empty());
        assert!(
            detector
                .detect(&[Some(0.0), None, None, Some(1e9)])
                .is_empty()
        );
    }

    #[test]
    fn test_high_and_low_are_symmetric() {
        let detector = ZScoreDetector::new(1.5);

        let high = detector.detect_complete(&[10.0, 10.0, 10.0, 10.0, 90.0]);
        assert_eq!(high.len(), 1);
        assert_eq!(high[0].index, 4);
        assert_eq!(high[0].deviation, Deviation::High);
        assert!((high[0].z_score - 2.0).abs() < 1e-12);

        let low = detector.detect_complete(&[10.0, 10.0, 10.0, 10.0, -70.0]);
        assert_eq!(low.len(), 1);
        assert_eq!(low[0].deviation, Deviation::Low);
        assert!((low[0].z_score - high[0].z_score).abs() < 1e-12);
    }

    #[test]
    fn test_default_threshold_needs_large_series() {
        // Population z-scores in a series of n values never exceed sqrt(n - 1).
        let mut values = vec![50.0; 15];
        values.push(0.0);
        let outliers = ZScoreDetector::default().detect_complete(&values);
        assert_eq!(outliers.len(), 1);
        assert_eq!(outliers[0].deviation, Deviation::Low);

        assert!(
            ZScoreDetector::default()
                .detect_complete(&[10.0, 10.0, 10.0, 10.0, 90.0])
                .is_empty()
        );
    }

    #[test]
    fn test_value_at_mean_is_never_flagged() {
        let outliers = ZScoreDetector::new(0.0).detect_complete(&[0.0, 5.0, 10.0]);
        assert!(outliers.iter().all(|o| o.index != 1));
        assert_eq!(outliers.len(), 2);
    }

    #[test]
    fn test_constant_series() {
        assert!(
            ZScoreDetector::new(0.0)
                .detect_complete(&[3.0, 3.0, 3.0, 3.0])
                .is_empty()
        );
    }

    #[test]
    fn test_missing_entries_keep_original_index() {
        let values = [None, Some(80.0), Some(82.0), None, Some(79.0), Some(20.0)];
        let outliers = ZScoreDetector::new(1.5).detect(&values);
        assert_eq!(outliers.len(), 1);
        assert_eq!(outliers[0].index, 5);
        assert_eq!(outliers[0].value, 20.0);
    }
}
