//! Human-readable rendering of batch validation results

use std::fmt;

use crate::validation::{BatchValidationResult, Outlier};

const RULE_WIDTH: usize = 80;

/// Renders a batch validation result as a plain-text report.
///
/// ```
/// use policyscope_analysis::{report::generate_validation_report, validation::RecordValidator};
///
/// let batch = RecordValidator::default().validate_batch(&[], true).unwrap();
/// let report = generate_validation_report(&batch);
///
/// assert!(report.contains("VALIDATION SUMMARY"));
/// assert!(report.contains("Total Records:         0"));
/// assert!(report.trim_end().ends_with(&"=".repeat(80)));
/// ```
#[must_use]
pub fn generate_validation_report(result: &BatchValidationResult) -> String {
    ValidationReport(result).to_string()
}

/// [`Display`](fmt::Display) adapter behind [`generate_validation_report`].
#[derive(Debug, Clone, Copy)]
pub struct ValidationReport<'a>(pub &'a BatchValidationResult);

impl fmt::Display for ValidationReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let result = self.0;
        let double_rule = "=".repeat(RULE_WIDTH);
        let rule = "-".repeat(RULE_WIDTH);

        writeln!(f, "{double_rule}")?;
        writeln!(f, "PRIVACY POLICY ANALYSIS - QUALITY VALIDATION REPORT")?;
        writeln!(f, "{double_rule}")?;
        writeln!(f)?;
        writeln!(f, "Generated: {}", result.validated_at.to_rfc3339())?;
        writeln!(f)?;

        let summary = &result.summary;
        writeln!(f, "VALIDATION SUMMARY")?;
        writeln!(f, "{rule}")?;
        writeln!(f, "Total Records:         {}", summary.total)?;
        writeln!(f, "Valid Records:         {}", summary.valid)?;
        writeln!(f, "Invalid Records:       {}", summary.invalid)?;
        writeln!(f, "Validation Rate:       {:.1}%", summary.validation_rate_percent)?;
        writeln!(f, "Total Errors:          {}", summary.total_errors)?;
        writeln!(f, "Total Warnings:        {}", summary.total_warnings)?;
        writeln!(f, "Avg Errors/Record:     {:.2}", summary.avg_errors_per_record)?;
        writeln!(f, "Avg Warnings/Record:   {:.2}", summary.avg_warnings_per_record)?;
        writeln!(f)?;

        writeln!(f, "INDIVIDUAL VALIDATION RESULTS")?;
        writeln!(f, "{rule}")?;
        for record in &result.individual_results {
            let status = if record.is_valid { "✓ PASS" } else { "✗ FAIL" };
            writeln!(f)?;
            writeln!(f, "{}: {status}", record.app_name)?;
            if !record.errors.is_empty() {
                writeln!(f, "  Errors ({}):", record.errors.len())?;
                write_items(f, &record.errors)?;
            }
            if !record.warnings.is_empty() {
                writeln!(f, "  Warnings ({}):", record.warnings.len())?;
                write_items(f, &record.warnings)?;
            }
            if !record.info.is_empty() {
                writeln!(f, "  Info:")?;
                write_items(f, &record.info)?;
            }
        }

        if let Some(anomalies) = &result.anomalies {
            writeln!(f)?;
            writeln!(f)?;
            writeln!(f, "ANOMALY DETECTION")?;
            writeln!(f, "{rule}")?;
            for (metric, outliers) in anomalies.metrics() {
                if !outliers.is_empty() {
                    writeln!(f)?;
                    writeln!(f, "{metric}:")?;
                    write_outliers(f, outliers)?;
                }
            }
            for (category, outliers) in &anomalies.category_scores {
                writeln!(f)?;
                writeln!(f, "{category} (Category):")?;
                write_outliers(f, outliers)?;
            }
            if anomalies.is_empty() {
                writeln!(f)?;
                writeln!(f, "No statistical anomalies detected.")?;
            }
        }

        writeln!(f)?;
        writeln!(f)?;
        writeln!(f, "{double_rule}")?;
        writeln!(f, "END OF REPORT")?;
        writeln!(f, "{double_rule}")
    }
}

fn write_items(f: &mut fmt::Formatter<'_>, items: &[String]) -> fmt::Result {
    for item in items {
        writeln!(f, "    - {item}")?;
    }
    Ok(())
}

fn write_outliers(f: &mut fmt::Formatter<'_>, outliers: &[Outlier]) -> fmt::Result {
    for outlier in outliers {
        writeln!(
            f,
            "  - {}: {:.1} (z-score: {:.2}, {} deviation)",
            outlier.app_name,
            outlier.value,
            outlier.z_score,
            outlier.deviation.as_str()
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{
        config::ValidatorConfig,
        validation::{
            RecordValidator,
            tests::{category, clean_record},
        },
    };

    #[test]
    fn test_report_sections() {
        let mut broken = clean_record("Broken", 60.0);
        broken["overall_risk_score"] = json!(150);
        let records = [clean_record("Clean", 60.0), broken];
        let batch = RecordValidator::default()
            .validate_batch(&records, true)
            .unwrap();
        let report = generate_validation_report(&batch);

        assert!(report.starts_with(&"=".repeat(80)));
        assert!(report.contains("Validation Rate:       50.0%"));
        assert!(report.contains("Clean: ✓ PASS"));
        assert!(report.contains("Broken: ✗ FAIL"));
        assert!(report.contains("  Errors (1):\n    - overall_risk_score (150) out of valid range [0, 100]"));
        assert!(report.contains("ANOMALY DETECTION"));
        assert!(report.contains("No statistical anomalies detected."));
        assert!(report.contains("END OF REPORT"));
    }

    #[test]
    fn test_report_lists_outliers() {
        let records = [80.0, 82.0, 79.0, 20.0]
            .into_iter()
            .enumerate()
            .map(|(i, security)| {
                let mut record = clean_record(&format!("app{i}"), 60.0);
                record["categories"]["security_measures"] = category(security);
                record
            })
            .collect::<Vec<_>>();
        let validator = RecordValidator::new(ValidatorConfig {
            outlier_threshold: 1.5,
            ..ValidatorConfig::default()
        });
        let report = generate_validation_report(&validator.validate_batch(&records, true).unwrap());

        assert!(report.contains("security_measures (Category):\n  - app3: 20.0 (z-score: 1.73, low deviation)"));
        assert!(!report.contains("No statistical anomalies detected."));
    }

    #[test]
    fn test_anomaly_section_absent_without_detection() {
        let batch = RecordValidator::default()
            .validate_batch(&[clean_record("A", 60.0)], false)
            .unwrap();
        assert!(!generate_validation_report(&batch).contains("ANOMALY DETECTION"));
    }
}
