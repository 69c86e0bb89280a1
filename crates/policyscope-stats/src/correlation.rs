//! Pairwise association tests
//!
//! Pearson correlation for two continuous series and point-biserial
//! correlation for a binary series against a continuous one, each with a
//! two-sided p-value from Student's t distribution with `n - 2` degrees of
//! freedom.
//!
//! Every test returns `None` instead of a value when the coefficient is
//! undefined: fewer than [`MIN_CORRELATION_PAIRS`] pairs, series of different
//! lengths, non-finite input, or a series with zero variance.
//!
//! # Examples
//!
//! ```
//! use policyscope_stats::correlation::CorrelationTest;
//!
//! let test = CorrelationTest::default();
//! let result = test.pearson(&[1.0, 2.0, 3.0, 4.0, 5.0], &[2.0, 4.0, 5.0, 4.0, 5.0]).unwrap();
//! assert!((result.correlation - 0.7746).abs() < 1e-4);
//! assert!((result.p_value - 0.1240).abs() < 1e-4);
//! assert!(!result.significant);
//!
//! assert!(test.pearson(&[1.0, 2.0], &[2.0, 1.0]).is_none());
//! ```

use serde::Serialize;
use statrs::distribution::{ContinuousCDF as _, StudentsT};

/// Minimum number of paired observations for a correlation test.
pub const MIN_CORRELATION_PAIRS: usize = 3;

/// Default significance level for the `significant` flag.
pub const DEFAULT_SIGNIFICANCE_LEVEL: f64 = 0.05;

/// Outcome of a correlation test.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CorrelationResult {
    /// Correlation coefficient in `[-1, 1]`.
    pub correlation: f64,
    /// Two-sided p-value.
    pub p_value: f64,
    /// `p_value < significance_level`.
    pub significant: bool,
}

/// Correlation test runner carrying the significance level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CorrelationTest {
    pub significance_level: f64,
}

impl Default for CorrelationTest {
    fn default() -> Self {
        Self {
            significance_level: DEFAULT_SIGNIFICANCE_LEVEL,
        }
    }
}

impl CorrelationTest {
    #[must_use]
    pub fn new(significance_level: f64) -> Self {
        Self { significance_level }
    }

    /// Pearson product-moment correlation of two continuous series.
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn pearson(&self, x: &[f64], y: &[f64]) -> Option<CorrelationResult> {
        if x.len() != y.len() || x.len() < MIN_CORRELATION_PAIRS {
            return None;
        }
        if !x.iter().chain(y).all(|v| v.is_finite()) {
            return None;
        }

        let n = x.len() as f64;
        let mean_x = x.iter().sum::<f64>() / n;
        let mean_y = y.iter().sum::<f64>() / n;

        let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
        for (a, b) in x.iter().zip(y) {
            let dx = a - mean_x;
            let dy = b - mean_y;
            sxy += dx * dy;
            sxx += dx * dx;
            syy += dy * dy;
        }
        if sxx <= 0.0 || syy <= 0.0 {
            return None;
        }

        let correlation = (sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0);
        let p_value = correlation_p_value(correlation, n - 2.0)?;

        Some(CorrelationResult {
            correlation,
            p_value,
            significant: p_value < self.significance_level,
        })
    }

    /// Point-biserial correlation of a binary series against a continuous one.
    ///
    /// This is the Pearson correlation with the binary series coded as 0/1.
    ///
    /// ```
    /// use policyscope_stats::correlation::CorrelationTest;
    ///
    /// let hipaa = [true, true, true, false, false, false];
    /// let security = [90.0, 85.0, 88.0, 40.0, 35.0, 42.0];
    /// let result = CorrelationTest::default().point_biserial(&hipaa, &security).unwrap();
    /// assert!(result.correlation > 0.9);
    /// assert!(result.significant);
    /// ```
    #[must_use]
    pub fn point_biserial(&self, binary: &[bool], continuous: &[f64]) -> Option<CorrelationResult> {
        let coded = binary
            .iter()
            .map(|&b| if b { 1.0 } else { 0.0 })
            .collect::<Vec<_>>();
        self.pearson(&coded, continuous)
    }
}

/// Two-sided p-value of `r` under H0: rho = 0, from the t statistic with
/// `df` degrees of freedom.
fn correlation_p_value(r: f64, df: f64) -> Option<f64> {
    if r.abs() >= 1.0 {
        return Some(0.0);
    }
    let t = r * (df / (1.0 - r * r)).sqrt();
    let distribution = StudentsT::new(0.0, 1.0, df).ok()?;
    Some((2.0 * distribution.sf(t.abs())).clamp(0.0, 1.0))
}
