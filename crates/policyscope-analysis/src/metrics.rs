//! Flat numeric features extracted from analysis records
//!
//! The extractor turns each [`AnalysisRecord`] into a fixed-order feature
//! vector:
//!
//! ```text
//! [overall_risk_score, overall_transparency_score, confidence_score,
//!  red_flag_count, data_collection, data_usage, ..., older_adult_considerations]
//! ```
//!
//! The three overall scores always yield a number: a missing or non-numeric
//! value becomes 0 and produces an [`ExtractionDiagnostic`].
//!
//! Internally a category score is either measured or absent. A present but
//! non-numeric score counts as absent and produces an [`ExtractionDiagnostic`].
//! Absent scores are only filled in when a dense matrix is requested, using
//! the configured [`MissingCategoryPolicy`].
//!
//! # Example
//!
//! ```
//! use policyscope_analysis::{
//!     metrics::{Feature, MetricExtractor},
//!     record::AnalysisRecord,
//! };
//!
//! let record: AnalysisRecord = serde_json::from_value(serde_json::json!({
//!     "app_name": "A",
//!     "overall_risk_score": 30,
//!     "overall_transparency_score": 70,
//!     "confidence_score": 80,
//!     "categories": {"user_rights": {"score": 65}},
//! }))
//! .unwrap();
//!
//! let vector = MetricExtractor::default().feature_vector(&record);
//! assert_eq!(vector.len(), Feature::all().len());
//! assert_eq!(&vector[..4], &[30.0, 70.0, 80.0, 0.0]);
//! assert_eq!(vector[4 + 4], 65.0);
//! ```

use serde::{Deserialize, Serialize};

use crate::record::{AnalysisRecord, Category, ScoreValue};

/// How absent category scores are filled in a dense feature matrix.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingCategoryPolicy {
    /// Absent scores become 0.
    #[default]
    Zero,
    /// Absent scores become the mean of the measured scores in the same
    /// column (0 if no record measured it).
    ColumnMean,
}

/// One column of the feature matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum Feature {
    #[display("overall_risk_score")]
    OverallRisk,
    #[display("overall_transparency_score")]
    Transparency,
    #[display("confidence_score")]
    Confidence,
    #[display("red_flag_count")]
    RedFlagCount,
    #[display("{_0}")]
    Category(Category),
}

impl Feature {
    /// Every feature, in extraction order.
    #[must_use]
    pub fn all() -> Vec<Self> {
        [
            Self::OverallRisk,
            Self::Transparency,
            Self::Confidence,
            Self::RedFlagCount,
        ]
        .into_iter()
        .chain(Category::ALL.map(Self::Category))
        .collect()
    }

    /// Features used for clustering.
    #[must_use]
    pub fn clustering() -> Vec<Self> {
        [Self::OverallRisk, Self::Transparency, Self::RedFlagCount]
            .into_iter()
            .chain(Category::PRIMARY.map(Self::Category))
            .collect()
    }
}

/// A non-fatal problem found while extracting metrics.
#[derive(Debug, Clone, PartialEq, derive_more::Display)]
pub enum ExtractionDiagnostic {
    #[display("{app_name}: non-numeric {category} score {value} treated as missing")]
    MalformedScore {
        app_name: String,
        category: Category,
        value: String,
    },
    #[display("{app_name}: non-numeric {feature} {value} treated as 0")]
    MalformedOverallScore {
        app_name: String,
        feature: Feature,
        value: String,
    },
    #[display("{app_name}: missing {feature} treated as 0")]
    MissingOverallScore { app_name: String, feature: Feature },
}

fn describe(score: &ScoreValue) -> String {
    match score {
        ScoreValue::Number(n) => n.to_string(),
        ScoreValue::Malformed(v) => v.to_string(),
    }
}

/// Numeric metrics of one record, with absent category scores kept apart.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordMetrics {
    pub overall_risk_score: f64,
    pub overall_transparency_score: f64,
    pub confidence_score: f64,
    pub red_flag_count: usize,
    /// Indexed like [`Category::ALL`].
    pub category_scores: [Option<f64>; Category::ALL.len()],
}

impl RecordMetrics {
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn get(&self, feature: Feature) -> Option<f64> {
        match feature {
            Feature::OverallRisk => Some(self.overall_risk_score),
            Feature::Transparency => Some(self.overall_transparency_score),
            Feature::Confidence => Some(self.confidence_score),
            Feature::RedFlagCount => Some(self.red_flag_count as f64),
            Feature::Category(category) => self.category_score(category),
        }
    }

    #[must_use]
    pub fn category_score(&self, category: Category) -> Option<f64> {
        let index = Category::ALL.iter().position(|c| *c == category)?;
        self.category_scores[index]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub metrics: RecordMetrics,
    pub diagnostics: Vec<ExtractionDiagnostic>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricExtractor {
    pub missing_category_policy: MissingCategoryPolicy,
}

impl MetricExtractor {
    #[must_use]
    pub fn new(missing_category_policy: MissingCategoryPolicy) -> Self {
        Self {
            missing_category_policy,
        }
    }

    /// Extracts the metrics of one record.
    #[must_use]
    pub fn extract(&self, record: &AnalysisRecord) -> Extraction {
        let mut diagnostics = vec![];
        let mut overall = |feature: Feature, score: Option<&ScoreValue>| {
            let app_name = record.app_name.clone();
            let diagnostic = match score {
                Some(score) => match score.as_number() {
                    Some(number) => return number,
                    None => ExtractionDiagnostic::MalformedOverallScore {
                        app_name,
                        feature,
                        value: describe(score),
                    },
                },
                None => ExtractionDiagnostic::MissingOverallScore { app_name, feature },
            };
            tracing::debug!("{diagnostic}");
            diagnostics.push(diagnostic);
            0.0
        };
        let overall_risk_score =
            overall(Feature::OverallRisk, record.overall_risk_score.as_ref());
        let overall_transparency_score = overall(
            Feature::Transparency,
            record.overall_transparency_score.as_ref(),
        );
        let confidence_score = overall(Feature::Confidence, record.confidence_score.as_ref());

        let category_scores = Category::ALL.map(|category| {
            let score = record.categories.get(&category)?.score.as_ref()?;
            let number = score.as_number();
            if number.is_none() {
                let diagnostic = ExtractionDiagnostic::MalformedScore {
                    app_name: record.app_name.clone(),
                    category,
                    value: describe(score),
                };
                tracing::debug!("{diagnostic}");
                diagnostics.push(diagnostic);
            }
            number
        });

        Extraction {
            metrics: RecordMetrics {
                overall_risk_score,
                overall_transparency_score,
                confidence_score,
                red_flag_count: record.red_flag_count(),
                category_scores,
            },
            diagnostics,
        }
    }

    /// Dense feature vector of a single record in [`Feature::all`] order.
    ///
    /// With a single row, both policies fill absent scores with 0.
    #[must_use]
    pub fn feature_vector(&self, record: &AnalysisRecord) -> Vec<f64> {
        let metrics = [self.extract(record).metrics];
        self.dense_matrix(&metrics, &Feature::all())
            .pop()
            .unwrap_or_default()
    }

    /// Dense row-major matrix of the selected features, one row per record.
    #[must_use]
    pub fn feature_matrix(&self, records: &[AnalysisRecord], features: &[Feature]) -> Vec<Vec<f64>> {
        let metrics = records
            .iter()
            .map(|record| self.extract(record).metrics)
            .collect::<Vec<_>>();
        self.dense_matrix(&metrics, features)
    }

    /// Fills absent values of already-extracted metrics.
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn dense_matrix(&self, metrics: &[RecordMetrics], features: &[Feature]) -> Vec<Vec<f64>> {
        let fills = features
            .iter()
            .map(|&feature| match self.missing_category_policy {
                MissingCategoryPolicy::Zero => 0.0,
                MissingCategoryPolicy::ColumnMean => {
                    let present = metrics
                        .iter()
                        .filter_map(|m| m.get(feature))
                        .collect::<Vec<_>>();
                    if present.is_empty() {
                        0.0
                    } else {
                        present.iter().sum::<f64>() / present.len() as f64
                    }
                }
            })
            .collect::<Vec<_>>();

        metrics
            .iter()
            .map(|m| {
                features
                    .iter()
                    .zip(&fills)
                    .map(|(&feature, &fill)| m.get(feature).unwrap_or(fill))
                    .collect()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn record(name: &str, categories: serde_json::Value) -> AnalysisRecord {
        serde_json::from_value(json!({
            "app_name": name,
            "overall_risk_score": 40,
            "overall_transparency_score": 55,
            "confidence_score": 75,
            "categories": categories,
            "red_flags": [
                {"finding": "sells data", "severity": "high", "quote": "q", "category": "data_usage"},
            ],
        }))
        .unwrap()
    }

    #[test]
    fn test_malformed_score_yields_diagnostic() {
        let record = record(
            "A",
            json!({"security_measures": {"score": "strong"}, "user_rights": {"score": 50}}),
        );
        let extraction = MetricExtractor::default().extract(&record);

        assert_eq!(extraction.diagnostics.len(), 1);
        assert!(matches!(
            &extraction.diagnostics[0],
            ExtractionDiagnostic::MalformedScore { category: Category::SecurityMeasures, .. }
        ));
        assert_eq!(
            extraction.metrics.category_score(Category::SecurityMeasures),
            None
        );
        assert_eq!(extraction.metrics.category_score(Category::UserRights), Some(50.0));
        assert_eq!(extraction.metrics.red_flag_count, 1);
    }

    #[test]
    fn test_unusable_overall_scores_become_zero() {
        let record: AnalysisRecord = serde_json::from_value(json!({
            "app_name": "A",
            "overall_risk_score": "45",
            "overall_transparency_score": 62,
        }))
        .unwrap();
        let extraction = MetricExtractor::default().extract(&record);

        assert_eq!(extraction.metrics.overall_risk_score, 0.0);
        assert_eq!(extraction.metrics.overall_transparency_score, 62.0);
        assert_eq!(extraction.metrics.confidence_score, 0.0);
        assert_eq!(
            extraction.diagnostics,
            [
                ExtractionDiagnostic::MalformedOverallScore {
                    app_name: "A".to_owned(),
                    feature: Feature::OverallRisk,
                    value: r#""45""#.to_owned(),
                },
                ExtractionDiagnostic::MissingOverallScore {
                    app_name: "A".to_owned(),
                    feature: Feature::Confidence,
                },
            ]
        );
        assert_eq!(
            extraction.diagnostics[0].to_string(),
            r#"A: non-numeric overall_risk_score "45" treated as 0"#
        );
    }

    #[test]
    fn test_zero_policy_fills_with_zero() {
        let records = [
            record("A", json!({"user_rights": {"score": 80}})),
            record("B", json!({})),
        ];
        let features = [Feature::RedFlagCount, Feature::Category(Category::UserRights)];
        let matrix = MetricExtractor::default().feature_matrix(&records, &features);
        assert_eq!(matrix, [vec![1.0, 80.0], vec![1.0, 0.0]]);
    }

    #[test]
    fn test_column_mean_policy() {
        let records = [
            record("A", json!({"user_rights": {"score": 80}})),
            record("B", json!({"user_rights": {"score": 60}})),
            record("C", json!({"user_rights": {"score": "n/a"}})),
        ];
        let features = [
            Feature::Category(Category::UserRights),
            Feature::Category(Category::Compliance),
        ];
        let matrix = MetricExtractor::new(MissingCategoryPolicy::ColumnMean)
            .feature_matrix(&records, &features);
        assert_eq!(matrix[2], [70.0, 0.0]);
        assert_eq!(matrix[0], [80.0, 0.0]);
    }

    #[test]
    fn test_feature_layouts() {
        assert_eq!(Feature::all().len(), 12);
        assert_eq!(Feature::clustering().len(), 9);
        assert_eq!(Feature::clustering()[2].to_string(), "red_flag_count");
        assert_eq!(
            Feature::Category(Category::DataRetention).to_string(),
            "data_retention"
        );
    }
}
