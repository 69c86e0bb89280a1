//! Structural and semantic validation of analysis records
//!
//! Validation runs on the raw JSON value of each record, before it is trusted
//! as an [`AnalysisRecord`](crate::record::AnalysisRecord). Problems with the
//! data are collected as messages, never raised:
//!
//! - **errors** make a record invalid,
//! - **warnings** are advisory (and invalidate only in strict mode),
//! - **info** lines describe completeness and never affect validity.
//!
//! Only a record that is not a JSON object at all is rejected with a
//! [`RecordShapeError`].
//!
//! # Per-record checks
//!
//! 1. Required top-level fields with the right JSON type
//! 2. Score ranges (`[0, 100]`) and low confidence
//! 3. Category structure and known category names
//! 4. Red flag structure and severities
//! 5. Consistency of overall and category scores (only without errors)
//! 6. Recommended metadata fields
//! 7. Completeness counts
//!
//! # Batches
//!
//! [`RecordValidator::validate_batch`] validates every record, aggregates a
//! [`BatchSummary`] and optionally runs z-score anomaly detection across the
//! batch.
//!
//! # Example
//!
//! ```
//! use policyscope_analysis::{config::ValidatorConfig, validation::RecordValidator};
//! use serde_json::json;
//!
//! let validator = RecordValidator::new(ValidatorConfig::default());
//! let result = validator
//!     .validate_record(&json!({"app_name": "A", "overall_risk_score": 150}))
//!     .unwrap();
//!
//! assert!(!result.is_valid);
//! assert!(result.errors.iter().any(|e| e.contains("out of valid range")));
//! assert!(result.errors.iter().any(|e| e.contains("Missing required field: 'categories'")));
//! ```

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use policyscope_stats::outliers::{Deviation, ZScoreDetector};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::{
    config::ValidatorConfig,
    consistency::ConsistencyChecker,
    record::{Category, Severity},
};

pub const SCORE_MIN: f64 = 0.0;
pub const SCORE_MAX: f64 = 100.0;

const SCORE_FIELDS: [&str; 3] = [
    "overall_risk_score",
    "overall_transparency_score",
    "confidence_score",
];

const REQUIRED_FIELDS: [(&str, JsonType); 8] = [
    ("app_name", JsonType::String),
    ("overall_risk_score", JsonType::Number),
    ("overall_transparency_score", JsonType::Number),
    ("confidence_score", JsonType::Number),
    ("categories", JsonType::Object),
    ("red_flags", JsonType::Array),
    ("positive_practices", JsonType::Array),
    ("metadata", JsonType::Object),
];

const REQUIRED_CATEGORY_FIELDS: [(&str, JsonType); 3] = [
    ("score", JsonType::Number),
    ("explanation", JsonType::String),
    ("key_findings", JsonType::Array),
];

const REQUIRED_RED_FLAG_FIELDS: [&str; 4] = ["finding", "severity", "quote", "category"];

const RECOMMENDED_METADATA_FIELDS: [&str; 6] = [
    "analysis_date",
    "model_used",
    "analysis_depth",
    "policy_length",
    "processing_time",
    "token_count",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
enum JsonType {
    #[display("string")]
    String,
    #[display("number")]
    Number,
    #[display("object")]
    Object,
    #[display("array")]
    Array,
}

impl JsonType {
    fn matches(self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Number => value.is_number(),
            Self::Object => value.is_object(),
            Self::Array => value.is_array(),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// A record that cannot be validated at all.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum RecordShapeError {
    #[display("analysis record must be a JSON object, found {found}")]
    NotAnObject { found: &'static str },
    #[display("record {index} of the batch must be a JSON object, found {found}")]
    NotAnObjectInBatch { index: usize, found: &'static str },
}

/// Outcome of validating one record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    pub app_name: String,
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub info: Vec<String>,
}

/// Aggregate counts over a batch.
///
/// All fields are zero for an empty batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub valid: usize,
    pub invalid: usize,
    pub validation_rate_percent: f64,
    pub total_errors: usize,
    pub total_warnings: usize,
    pub avg_errors_per_record: f64,
    pub avg_warnings_per_record: f64,
}

impl BatchSummary {
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn from_results(results: &[ValidationResult]) -> Self {
        let total = results.len();
        if total == 0 {
            return Self::default();
        }
        let valid = results.iter().filter(|r| r.is_valid).count();
        let total_errors = results.iter().map(|r| r.errors.len()).sum::<usize>();
        let total_warnings = results.iter().map(|r| r.warnings.len()).sum::<usize>();
        let n = total as f64;

        Self {
            total,
            valid,
            invalid: total - valid,
            validation_rate_percent: valid as f64 / n * 100.0,
            total_errors,
            total_warnings,
            avg_errors_per_record: total_errors as f64 / n,
            avg_warnings_per_record: total_warnings as f64 / n,
        }
    }
}

/// A batch value far from its peers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Outlier {
    pub app_name: String,
    pub metric: String,
    pub value: f64,
    pub z_score: f64,
    pub deviation: Deviation,
}

/// Outliers per metric across a batch.
///
/// Categories without outliers are left out of `category_scores`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AnomalyReport {
    pub overall_risk_score: Vec<Outlier>,
    pub overall_transparency_score: Vec<Outlier>,
    pub confidence_score: Vec<Outlier>,
    pub red_flag_count: Vec<Outlier>,
    pub category_scores: BTreeMap<String, Vec<Outlier>>,
}

impl AnomalyReport {
    /// Top-level metrics paired with their outliers, in report order.
    #[must_use]
    pub fn metrics(&self) -> [(&'static str, &[Outlier]); 4] {
        [
            ("overall_risk_score", self.overall_risk_score.as_slice()),
            (
                "overall_transparency_score",
                self.overall_transparency_score.as_slice(),
            ),
            ("confidence_score", self.confidence_score.as_slice()),
            ("red_flag_count", self.red_flag_count.as_slice()),
        ]
    }

    #[must_use]
    pub fn total_outliers(&self) -> usize {
        self.metrics()
            .iter()
            .map(|(_, outliers)| outliers.len())
            .chain(self.category_scores.values().map(Vec::len))
            .sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total_outliers() == 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchValidationResult {
    pub validated_at: DateTime<Utc>,
    pub individual_results: Vec<ValidationResult>,
    pub summary: BatchSummary,
    /// Present when anomaly detection was requested and at least one record
    /// is valid.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anomalies: Option<AnomalyReport>,
}

impl BatchValidationResult {
    #[must_use]
    pub fn has_invalid_records(&self) -> bool {
        self.summary.invalid > 0
    }
}

/// Caller-owned trail of validation results.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AuditLog {
    entries: Vec<ValidationResult>,
}

impl AuditLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, result: ValidationResult) {
        self.entries.push(result);
    }

    #[must_use]
    pub fn entries(&self) -> &[ValidationResult] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[derive(Debug, Default)]
struct Findings {
    errors: Vec<String>,
    warnings: Vec<String>,
    info: Vec<String>,
}

/// Validates analysis records.
///
/// The validator itself holds only configuration; pass an [`AuditLog`] to
/// the `*_audited` variants to keep a history.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RecordValidator {
    config: ValidatorConfig,
}

impl RecordValidator {
    #[must_use]
    pub fn new(config: ValidatorConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    /// Validates a single record.
    pub fn validate_record(&self, record: &Value) -> Result<ValidationResult, RecordShapeError> {
        let Some(object) = record.as_object() else {
            return Err(RecordShapeError::NotAnObject {
                found: json_kind(record),
            });
        };

        let app_name = object
            .get("app_name")
            .and_then(Value::as_str)
            .unwrap_or("Unknown")
            .to_owned();

        let mut findings = Findings::default();
        check_required_fields(object, &mut findings);
        self.check_scores(object, &mut findings);
        check_categories(object, &mut findings);
        self.check_red_flags(object, &mut findings);
        if findings.errors.is_empty() {
            self.check_consistency(object, &mut findings);
        }
        check_metadata(object, &mut findings);
        check_completeness(object, &mut findings);

        let Findings {
            errors,
            warnings,
            info,
        } = findings;
        let is_valid = errors.is_empty() && !(self.config.strict_mode && !warnings.is_empty());

        tracing::debug!(
            app_name = %app_name,
            is_valid,
            errors = errors.len(),
            warnings = warnings.len(),
            "validated record"
        );

        Ok(ValidationResult {
            app_name,
            is_valid,
            errors,
            warnings,
            info,
        })
    }

    /// Like [`validate_record`](Self::validate_record), also appending the
    /// result to `audit`.
    pub fn validate_record_audited(
        &self,
        record: &Value,
        audit: &mut AuditLog,
    ) -> Result<ValidationResult, RecordShapeError> {
        let result = self.validate_record(record)?;
        audit.record(result.clone());
        Ok(result)
    }

    /// Validates every record of a batch.
    ///
    /// Fails only if some record is not a JSON object; nothing is validated
    /// in that case.
    pub fn validate_batch(
        &self,
        records: &[Value],
        detect_anomalies: bool,
    ) -> Result<BatchValidationResult, RecordShapeError> {
        let individual_results = records
            .iter()
            .enumerate()
            .map(|(index, record)| {
                self.validate_record(record).map_err(|_| RecordShapeError::NotAnObjectInBatch {
                    index,
                    found: json_kind(record),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let summary = BatchSummary::from_results(&individual_results);
        tracing::info!(
            total = summary.total,
            valid = summary.valid,
            invalid = summary.invalid,
            "validated batch"
        );

        let anomalies =
            (detect_anomalies && summary.valid > 0).then(|| self.detect_anomalies(records));

        Ok(BatchValidationResult {
            validated_at: Utc::now(),
            individual_results,
            summary,
            anomalies,
        })
    }

    /// Like [`validate_batch`](Self::validate_batch), also appending every
    /// per-record result to `audit`.
    pub fn validate_batch_audited(
        &self,
        records: &[Value],
        detect_anomalies: bool,
        audit: &mut AuditLog,
    ) -> Result<BatchValidationResult, RecordShapeError> {
        let result = self.validate_batch(records, detect_anomalies)?;
        for entry in &result.individual_results {
            audit.record(entry.clone());
        }
        Ok(result)
    }

    /// Runs z-score outlier detection over every record of a batch.
    ///
    /// Non-numeric and missing values are skipped. A record without
    /// `red_flags` counts as having none.
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn detect_anomalies(&self, records: &[Value]) -> AnomalyReport {
        let detector = ZScoreDetector::new(self.config.outlier_threshold);
        let app_names = records
            .iter()
            .map(|r| r.get("app_name").and_then(Value::as_str).unwrap_or("Unknown"))
            .collect::<Vec<_>>();

        let find = |metric: &str, values: &[Option<f64>]| -> Vec<Outlier> {
            detector
                .detect(values)
                .into_iter()
                .map(|o| Outlier {
                    app_name: app_names[o.index].to_owned(),
                    metric: metric.to_owned(),
                    value: o.value,
                    z_score: o.z_score,
                    deviation: o.deviation,
                })
                .collect()
        };
        let top_level = |field: &str| -> Vec<Option<f64>> {
            records
                .iter()
                .map(|r| r.get(field).and_then(Value::as_f64))
                .collect()
        };

        let red_flag_counts = records
            .iter()
            .map(|r| {
                let count = r.get("red_flags").and_then(Value::as_array).map_or(0, Vec::len);
                Some(count as f64)
            })
            .collect::<Vec<_>>();

        let category_names = records
            .iter()
            .filter_map(|r| r.get("categories").and_then(Value::as_object))
            .flat_map(Map::keys)
            .collect::<BTreeSet<_>>();

        let category_scores = category_names
            .into_iter()
            .filter_map(|name| {
                let values = records
                    .iter()
                    .map(|r| {
                        r.get("categories")?
                            .get(name.as_str())?
                            .get("score")
                            .and_then(Value::as_f64)
                    })
                    .collect::<Vec<_>>();
                let outliers = find(name.as_str(), &values);
                (!outliers.is_empty()).then(|| (name.clone(), outliers))
            })
            .collect();

        let report = AnomalyReport {
            overall_risk_score: find("overall_risk_score", &top_level("overall_risk_score")),
            overall_transparency_score: find(
                "overall_transparency_score",
                &top_level("overall_transparency_score"),
            ),
            confidence_score: find("confidence_score", &top_level("confidence_score")),
            red_flag_count: find("red_flag_count", &red_flag_counts),
            category_scores,
        };
        tracing::info!(outliers = report.total_outliers(), "anomaly detection finished");
        report
    }

    fn check_scores(&self, object: &Map<String, Value>, findings: &mut Findings) {
        for field in SCORE_FIELDS {
            // non-numeric values are reported by the structural check
            let Some(score) = object.get(field).and_then(Value::as_f64) else {
                continue;
            };
            if !(SCORE_MIN..=SCORE_MAX).contains(&score) {
                findings.errors.push(format!(
                    "{field} ({score}) out of valid range [{SCORE_MIN}, {SCORE_MAX}]"
                ));
            }
        }

        if let Some(confidence) = object.get("confidence_score").and_then(Value::as_f64)
            && confidence < self.config.low_confidence_threshold
        {
            findings.warnings.push(format!(
                "Low confidence score ({confidence}). Analysis may be unreliable."
            ));
        }
    }

    fn check_red_flags(&self, object: &Map<String, Value>, findings: &mut Findings) {
        let Some(red_flags) = object.get("red_flags").and_then(Value::as_array) else {
            return;
        };

        if red_flags.is_empty() {
            findings
                .warnings
                .push("No red flags identified (unusual for healthcare apps)".to_owned());
        }

        let mut critical_count = 0;
        for (i, flag) in red_flags.iter().enumerate() {
            let Some(flag) = flag.as_object() else {
                findings.errors.push(format!("Red flag {i} is not an object"));
                continue;
            };

            for field in REQUIRED_RED_FLAG_FIELDS {
                if !flag.contains_key(field) {
                    findings
                        .errors
                        .push(format!("Red flag {i} missing required field '{field}'"));
                }
            }

            if let Some(severity) = flag.get("severity") {
                match severity.as_str().map(str::parse::<Severity>) {
                    Some(Ok(Severity::Critical)) => critical_count += 1,
                    Some(Ok(_)) => {}
                    Some(Err(_)) | None => findings.errors.push(format!(
                        "Red flag {i} has invalid severity {severity}. \
                         Must be one of: critical, high, medium, low"
                    )),
                }
            }

            if let Some(quote) = flag.get("quote") {
                let empty = match quote {
                    Value::Null => true,
                    Value::String(s) => s.trim().is_empty(),
                    _ => false,
                };
                if empty {
                    findings.warnings.push(format!("Red flag {i} has empty quote"));
                }
            }
        }

        if critical_count > self.config.max_critical_flags {
            findings.warnings.push(format!(
                "High number of critical red flags ({critical_count}). Verify severity assessment."
            ));
        }
    }

    fn check_consistency(&self, object: &Map<String, Value>, findings: &mut Findings) {
        let (Some(risk), Some(transparency)) = (
            object.get("overall_risk_score").and_then(Value::as_f64),
            object.get("overall_transparency_score").and_then(Value::as_f64),
        ) else {
            return;
        };
        let category_scores = object
            .get("categories")
            .and_then(Value::as_object)
            .into_iter()
            .flat_map(Map::values)
            .filter_map(|category| category.get("score").and_then(Value::as_f64))
            .collect::<Vec<_>>();

        let checker = ConsistencyChecker::new(self.config.consistency_tolerance);
        findings
            .warnings
            .extend(checker.check(risk, transparency, &category_scores));
    }
}

fn check_required_fields(object: &Map<String, Value>, findings: &mut Findings) {
    for (field, expected) in REQUIRED_FIELDS {
        match object.get(field) {
            None => findings
                .errors
                .push(format!("Missing required field: '{field}'")),
            Some(Value::Null) => findings.errors.push(format!("Field '{field}' is null")),
            Some(value) if !expected.matches(value) => findings.errors.push(format!(
                "Field '{field}' has incorrect type: expected {expected}, found {}",
                json_kind(value)
            )),
            Some(_) => {}
        }
    }
    if let Some(name) = object.get("app_name").and_then(Value::as_str)
        && name.trim().is_empty()
    {
        findings.errors.push("Field 'app_name' is empty".to_owned());
    }
}

fn check_categories(object: &Map<String, Value>, findings: &mut Findings) {
    let Some(categories) = object.get("categories").and_then(Value::as_object) else {
        return;
    };

    if categories.is_empty() {
        findings
            .warnings
            .push("No categories found in analysis".to_owned());
    }

    for (name, data) in categories {
        if Category::from_name(name).is_none() {
            findings.errors.push(format!("Unknown category '{name}'"));
        }

        let Some(data) = data.as_object() else {
            findings
                .errors
                .push(format!("Category '{name}' is not an object"));
            continue;
        };

        for (field, expected) in REQUIRED_CATEGORY_FIELDS {
            match data.get(field) {
                None => findings
                    .errors
                    .push(format!("Category '{name}' missing field '{field}'")),
                Some(value) if !expected.matches(value) => findings.errors.push(format!(
                    "Category '{name}' field '{field}' has incorrect type: expected {expected}, found {}",
                    json_kind(value)
                )),
                Some(_) => {}
            }
        }

        if let Some(score) = data.get("score").and_then(Value::as_f64)
            && !(SCORE_MIN..=SCORE_MAX).contains(&score)
        {
            findings.errors.push(format!(
                "Category '{name}' score ({score}) out of valid range [{SCORE_MIN}, {SCORE_MAX}]"
            ));
        }

        if data
            .get("key_findings")
            .and_then(Value::as_array)
            .is_some_and(Vec::is_empty)
        {
            findings
                .warnings
                .push(format!("Category '{name}' has no key findings"));
        }
    }
}

fn check_metadata(object: &Map<String, Value>, findings: &mut Findings) {
    let Some(metadata) = object.get("metadata").and_then(Value::as_object) else {
        return;
    };

    let missing = RECOMMENDED_METADATA_FIELDS
        .into_iter()
        .filter(|field| !metadata.contains_key(*field))
        .collect::<Vec<_>>();
    if !missing.is_empty() {
        findings.warnings.push(format!(
            "Metadata missing recommended fields: {}",
            missing.join(", ")
        ));
    }
}

fn check_completeness(object: &Map<String, Value>, findings: &mut Findings) {
    if let Some(categories) = object.get("categories").and_then(Value::as_object) {
        findings
            .info
            .push(format!("Categories analyzed: {}", categories.len()));
    }
    if let Some(red_flags) = object.get("red_flags").and_then(Value::as_array) {
        findings
            .info
            .push(format!("Red flags identified: {}", red_flags.len()));
    }
    if let Some(practices) = object.get("positive_practices").and_then(Value::as_array) {
        findings
            .info
            .push(format!("Positive practices identified: {}", practices.len()));
    }
    if let Some(missing) = object.get("missing_information").and_then(Value::as_array)
        && !missing.is_empty()
    {
        findings
            .info
            .push(format!("Missing information items: {}", missing.len()));
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use serde_json::json;

    use super::*;

    /// A record that passes every check without warnings.
    pub(crate) fn clean_record(app_name: &str, category_score: f64) -> Value {
        let categories = Category::PRIMARY
            .iter()
            .map(|c| (c.to_string(), category(category_score)))
            .collect::<Map<_, _>>();
        json!({
            "app_name": app_name,
            "overall_risk_score": 100.0 - category_score,
            "overall_transparency_score": category_score,
            "confidence_score": 85,
            "categories": categories,
            "red_flags": [
                {"finding": "Shares data with advertisers", "severity": "high",
                 "quote": "we may share", "category": "third_party_sharing"},
            ],
            "positive_practices": [{"category": "security_measures", "description": "encryption"}],
            "metadata": {
                "analysis_date": "2025-01-10T12:00:00Z",
                "model_used": "model",
                "analysis_depth": "full",
                "policy_length": 5000,
                "processing_time": 12.5,
                "token_count": 4000,
            },
        })
    }

    pub(crate) fn category(score: f64) -> Value {
        json!({"score": score, "explanation": "explained", "key_findings": ["a finding"]})
    }

    fn validator() -> RecordValidator {
        RecordValidator::default()
    }

    fn strict() -> RecordValidator {
        RecordValidator::new(ValidatorConfig {
            strict_mode: true,
            ..ValidatorConfig::default()
        })
    }

    #[test]
    fn test_clean_record_has_no_findings() {
        let result = validator().validate_record(&clean_record("A", 60.0)).unwrap();
        assert!(result.is_valid);
        assert!(result.errors.is_empty(), "{:?}", result.errors);
        assert!(result.warnings.is_empty(), "{:?}", result.warnings);
        assert_eq!(
            result.info,
            [
                "Categories analyzed: 6",
                "Red flags identified: 1",
                "Positive practices identified: 1",
            ]
        );
    }

    #[test]
    fn test_validation_is_idempotent() {
        let mut record = clean_record("A", 60.0);
        record["overall_risk_score"] = json!(10);
        record["categories"]["user_rights"]["key_findings"] = json!([]);

        let validator = validator();
        let first = validator.validate_record(&record).unwrap();
        let second = validator.validate_record(&record).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_strict_mode_turns_warnings_into_failure() {
        let mut record = clean_record("A", 60.0);
        record["categories"]["data_usage"]["key_findings"] = json!([]);

        let lenient = validator().validate_record(&record).unwrap();
        assert!(lenient.errors.is_empty());
        assert_eq!(lenient.warnings.len(), 1);
        assert!(lenient.is_valid);

        let strict = strict().validate_record(&record).unwrap();
        assert_eq!(strict.warnings, lenient.warnings);
        assert!(!strict.is_valid);
    }

    #[test]
    fn test_out_of_range_risk_is_an_error() {
        let mut record = clean_record("A", 60.0);
        record["overall_risk_score"] = json!(150);
        let result = validator().validate_record(&record).unwrap();

        assert!(!result.is_valid);
        assert_eq!(
            result.errors,
            ["overall_risk_score (150) out of valid range [0, 100]"]
        );
        // consistency is skipped once errors exist
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_structural_errors_are_all_collected() {
        let result = validator()
            .validate_record(&json!({
                "app_name": 42,
                "overall_risk_score": "high",
                "overall_transparency_score": null,
                "categories": [],
                "red_flags": {},
            }))
            .unwrap();

        assert_eq!(result.app_name, "Unknown");
        assert!(!result.is_valid);
        for expected in [
            "Field 'app_name' has incorrect type: expected string, found number",
            "Field 'overall_risk_score' has incorrect type: expected number, found string",
            "Field 'overall_transparency_score' is null",
            "Missing required field: 'confidence_score'",
            "Field 'categories' has incorrect type: expected object, found array",
            "Field 'red_flags' has incorrect type: expected array, found object",
            "Missing required field: 'positive_practices'",
            "Missing required field: 'metadata'",
        ] {
            assert!(result.errors.iter().any(|e| e == expected), "missing: {expected}");
        }
        assert_eq!(result.errors.len(), 8);
    }

    #[test]
    fn test_blank_app_name_is_an_error() {
        for name in ["", "  \t"] {
            let result = validator()
                .validate_record(&clean_record(name, 60.0))
                .unwrap();
            assert!(!result.is_valid);
            assert_eq!(result.errors, ["Field 'app_name' is empty"]);
        }
    }

    #[test]
    fn test_category_checks() {
        let mut record = clean_record("A", 60.0);
        record["categories"]["marketing"] = category(50.0);
        record["categories"]["data_collection"] = json!({"score": "good", "key_findings": []});
        record["categories"]["compliance"] = category(120.0);
        let result = validator().validate_record(&record).unwrap();

        assert!(result.errors.contains(&"Unknown category 'marketing'".to_owned()));
        assert!(
            result
                .errors
                .contains(&"Category 'data_collection' missing field 'explanation'".to_owned())
        );
        assert!(result.errors.iter().any(|e| {
            e.starts_with("Category 'data_collection' field 'score' has incorrect type")
        }));
        assert!(
            result
                .errors
                .contains(&"Category 'compliance' score (120) out of valid range [0, 100]".to_owned())
        );
        assert!(
            result
                .warnings
                .contains(&"Category 'data_collection' has no key findings".to_owned())
        );
    }

    #[test]
    fn test_empty_categories_warn() {
        let mut record = clean_record("A", 60.0);
        record["categories"] = json!({});
        let result = validator().validate_record(&record).unwrap();
        assert!(result.errors.is_empty());
        assert!(result.warnings.contains(&"No categories found in analysis".to_owned()));
        assert!(
            result
                .warnings
                .contains(&"No valid category scores found for consistency check".to_owned())
        );
    }

    #[test]
    fn test_red_flag_checks() {
        let mut record = clean_record("A", 60.0);
        record["red_flags"] = json!([
            {"finding": "f", "severity": "CRITICAL", "quote": "  ", "category": "c"},
            {"finding": "f", "severity": "urgent", "quote": "q", "category": "c"},
            {"severity": "low", "quote": "q"},
            "not a flag",
        ]);
        let result = validator().validate_record(&record).unwrap();

        assert_eq!(
            result.errors,
            [
                "Red flag 1 has invalid severity \"urgent\". Must be one of: critical, high, medium, low",
                "Red flag 2 missing required field 'finding'",
                "Red flag 2 missing required field 'category'",
                "Red flag 3 is not an object",
            ]
        );
        assert_eq!(result.warnings, ["Red flag 0 has empty quote"]);
    }

    #[test]
    fn test_red_flag_volume_warnings() {
        let mut record = clean_record("A", 60.0);
        record["red_flags"] = json!([]);
        let result = validator().validate_record(&record).unwrap();
        assert_eq!(
            result.warnings,
            ["No red flags identified (unusual for healthcare apps)"]
        );

        let flag = json!({"finding": "f", "severity": "critical", "quote": "q", "category": "c"});
        record["red_flags"] = Value::Array(vec![flag; 6]);
        let result = validator().validate_record(&record).unwrap();
        assert_eq!(
            result.warnings,
            ["High number of critical red flags (6). Verify severity assessment."]
        );
    }

    #[test]
    fn test_low_confidence_and_metadata_warnings() {
        let mut record = clean_record("A", 60.0);
        record["confidence_score"] = json!(30);
        record["metadata"] = json!({"model_used": "m", "token_count": 10});
        record["missing_information"] = json!(["retention period"]);
        let result = validator().validate_record(&record).unwrap();

        assert!(result.is_valid);
        assert_eq!(
            result.warnings,
            [
                "Low confidence score (30). Analysis may be unreliable.",
                "Metadata missing recommended fields: analysis_date, analysis_depth, policy_length, processing_time",
            ]
        );
        assert!(result.info.contains(&"Missing information items: 1".to_owned()));
    }

    #[test]
    fn test_consistency_within_tolerance() {
        let records = (0..5)
            .map(|i| {
                let mut record = clean_record(&format!("app{i}"), 60.0);
                if i == 0 {
                    record["overall_risk_score"] = json!(45);
                }
                record
            })
            .collect::<Vec<_>>();
        let batch = validator().validate_batch(&records, true).unwrap();

        assert_eq!(batch.summary.valid, 5);
        assert!(
            batch.individual_results[0]
                .warnings
                .iter()
                .all(|w| !w.contains("Inconsistency"))
        );
    }

    #[test]
    fn test_consistency_beyond_tolerance() {
        let records = (0..5)
            .map(|i| {
                let mut record = clean_record(&format!("app{i}"), 60.0);
                if i == 0 {
                    record["overall_risk_score"] = json!(10);
                }
                record
            })
            .collect::<Vec<_>>();
        let batch = validator().validate_batch(&records, true).unwrap();

        let consistency = batch.individual_results[0]
            .warnings
            .iter()
            .filter(|w| w.contains("Inconsistency"))
            .collect::<Vec<_>>();
        assert_eq!(consistency.len(), 1);
        assert!(consistency[0].contains("overall_risk_score"));
        assert!(batch.individual_results[0].is_valid);
    }

    #[test]
    fn test_category_outlier_in_batch() {
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
        let batch = validator.validate_batch(&records, true).unwrap();
        let anomalies = batch.anomalies.unwrap();

        assert_eq!(anomalies.category_scores.len(), 1);
        let outliers = &anomalies.category_scores["security_measures"];
        assert_eq!(outliers.len(), 1);
        assert_eq!(outliers[0].app_name, "app3");
        assert_eq!(outliers[0].metric, "security_measures");
        assert_eq!(outliers[0].deviation, Deviation::Low);
        assert_eq!(anomalies.total_outliers(), 1);
    }

    #[test]
    fn test_anomalies_need_a_valid_record() {
        let records = vec![json!({"app_name": "A"}); 4];
        let batch = validator().validate_batch(&records, true).unwrap();
        assert_eq!(batch.summary.invalid, 4);
        assert!(batch.anomalies.is_none());

        let batch = validator()
            .validate_batch(&[clean_record("A", 60.0)], false)
            .unwrap();
        assert!(batch.anomalies.is_none());
    }

    #[test]
    fn test_empty_batch_summary() {
        let batch = validator().validate_batch(&[], true).unwrap();
        assert_eq!(batch.summary, BatchSummary::default());
        assert!(!batch.has_invalid_records());
        assert!(batch.anomalies.is_none());
    }

    #[test]
    fn test_batch_summary_counts() {
        let mut broken = clean_record("B", 60.0);
        broken["confidence_score"] = json!(-1);
        let records = [clean_record("A", 60.0), broken];
        let batch = validator().validate_batch(&records, false).unwrap();

        assert_eq!(batch.summary.total, 2);
        assert_eq!(batch.summary.valid, 1);
        assert_eq!(batch.summary.invalid, 1);
        assert_eq!(batch.summary.validation_rate_percent, 50.0);
        // -1 is out of range and below the confidence threshold
        assert_eq!(batch.summary.total_errors, 1);
        assert_eq!(batch.summary.total_warnings, 1);
        assert_eq!(batch.summary.avg_errors_per_record, 0.5);
        assert!(batch.has_invalid_records());
    }

    #[test]
    fn test_non_object_records_are_rejected() {
        assert_eq!(
            validator().validate_record(&json!([1, 2])),
            Err(RecordShapeError::NotAnObject { found: "array" })
        );
        assert_eq!(
            validator().validate_batch(&[clean_record("A", 60.0), json!("x")], true),
            Err(RecordShapeError::NotAnObjectInBatch {
                index: 1,
                found: "string"
            })
        );
    }

    #[test]
    fn test_audit_log_is_caller_owned() {
        let validator = validator();
        let mut audit = AuditLog::new();

        validator.validate_record(&clean_record("A", 60.0)).unwrap();
        assert!(audit.is_empty());

        validator
            .validate_record_audited(&clean_record("A", 60.0), &mut audit)
            .unwrap();
        validator
            .validate_batch_audited(
                &[clean_record("B", 60.0), clean_record("C", 60.0)],
                false,
                &mut audit,
            )
            .unwrap();

        let names = audit
            .entries()
            .iter()
            .map(|r| r.app_name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(names, ["A", "B", "C"]);

        audit.clear();
        assert_eq!(audit.len(), 0);
    }
}
