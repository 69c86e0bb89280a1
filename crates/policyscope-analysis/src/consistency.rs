//! Cross-field consistency of a single record
//!
//! Category scores and transparency are "higher = better" while overall risk
//! is "higher = worse". A record is consistent when
//!
//! ```text
//! |overall_risk_score - (100 - avg_category_score)| <= tolerance
//! |overall_transparency_score - avg_category_score| <= tolerance
//! ```
//!
//! Findings are advisory warnings, never errors.

/// Default allowed gap, in score points.
pub const DEFAULT_CONSISTENCY_TOLERANCE: f64 = 15.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConsistencyChecker {
    pub tolerance: f64,
}

impl Default for ConsistencyChecker {
    fn default() -> Self {
        Self::new(DEFAULT_CONSISTENCY_TOLERANCE)
    }
}

impl ConsistencyChecker {
    #[must_use]
    pub fn new(tolerance: f64) -> Self {
        Self { tolerance }
    }

    /// Compares the overall scores of a record with its category scores.
    ///
    /// `category_scores` holds only the numeric scores present in the record.
    /// Without any of them a single warning is returned and both comparisons
    /// are skipped.
    ///
    /// ```
    /// use policyscope_analysis::consistency::ConsistencyChecker;
    ///
    /// let checker = ConsistencyChecker::default();
    /// assert!(checker.check(45.0, 60.0, &[55.0, 65.0]).is_empty());
    ///
    /// let warnings = checker.check(10.0, 60.0, &[55.0, 65.0]);
    /// assert_eq!(warnings.len(), 1);
    /// assert!(warnings[0].contains("overall_risk_score"));
    /// ```
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn check(
        &self,
        overall_risk_score: f64,
        overall_transparency_score: f64,
        category_scores: &[f64],
    ) -> Vec<String> {
        if category_scores.is_empty() {
            return vec!["No valid category scores found for consistency check".to_owned()];
        }

        let avg_category_score = category_scores.iter().sum::<f64>() / category_scores.len() as f64;
        let mut warnings = vec![];

        let expected_risk = 100.0 - avg_category_score;
        let diff = (overall_risk_score - expected_risk).abs();
        if diff > self.tolerance {
            warnings.push(format!(
                "Inconsistency detected: overall_risk_score ({overall_risk_score}) differs \
                 significantly from category average (expected ~{expected_risk:.1}, diff={diff:.1})"
            ));
        }

        let diff = (overall_transparency_score - avg_category_score).abs();
        if diff > self.tolerance {
            warnings.push(format!(
                "Inconsistency detected: overall_transparency_score ({overall_transparency_score}) \
                 differs from category average ({avg_category_score:.1}, diff={diff:.1})"
            ));
        }

        warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_category_scores() {
        let warnings = ConsistencyChecker::default().check(0.0, 100.0, &[]);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("No valid category scores"));
    }

    #[test]
    fn test_checks_are_independent() {
        let checker = ConsistencyChecker::default();
        // avg 60: expected risk 40
        let scores = [60.0; 6];

        let warnings = checker.check(40.0, 20.0, &scores);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("overall_transparency_score"));

        let warnings = checker.check(90.0, 20.0, &scores);
        assert_eq!(warnings.len(), 2);
    }

    #[test]
    fn test_tolerance_boundary_is_inclusive() {
        let checker = ConsistencyChecker::default();
        assert!(checker.check(55.0, 75.0, &[60.0]).is_empty());
        assert_eq!(checker.check(55.5, 60.0, &[60.0]).len(), 1);
        assert!(ConsistencyChecker::new(30.0).check(10.0, 60.0, &[60.0]).is_empty());
    }
}
