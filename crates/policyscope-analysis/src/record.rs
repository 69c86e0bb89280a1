//! Typed schema of a per-app privacy-policy analysis record
//!
//! Every analyzed app is persisted upstream as one JSON object. This module
//! gives that object an explicit shape so the comparative engine never works
//! on loosely-typed maps.
//!
//! # Data Structure
//!
//! ```text
//! AnalysisRecord
//! ├─ app_name, url
//! ├─ overall_risk_score          (higher = more risk)
//! ├─ overall_transparency_score  (higher = better)
//! ├─ confidence_score
//! ├─ categories: Category -> CategoryAssessment
//! │   └─ score, explanation, key_findings, positive_aspects, concerns
//! ├─ red_flags: Vec<RedFlag>      (finding, severity, quote, category)
//! ├─ positive_practices, missing_information, quotable_findings
//! ├─ compliance, retention_specified, readability_label, user_rights
//! └─ metadata                     (analysis_date + free-form fields)
//! ```
//!
//! # Serialization
//!
//! ```json
//! {
//!   "app_name": "CareConnect",
//!   "overall_risk_score": 42.0,
//!   "overall_transparency_score": 61.0,
//!   "confidence_score": 85.0,
//!   "categories": {
//!     "data_collection": { "score": 60, "explanation": "...", "key_findings": ["..."] }
//!   },
//!   "red_flags": [
//!     { "finding": "...", "severity": "high", "quote": "...", "category": "data_usage" }
//!   ],
//!   "metadata": { "analysis_date": "2025-01-10T12:00:00Z" }
//! }
//! ```
//!
//! A score (overall or per category) that is present but not a number does
//! not fail deserialization; it is kept as [`ScoreValue::Malformed`] so that
//! the [`MetricExtractor`](crate::metrics::MetricExtractor) can coerce it and
//! report it. Likewise a red flag with an unrecognized severity is kept with
//! [`Severity::Unknown`].
//!
//! Structural validation of untrusted input happens on the raw JSON value in
//! [`validation`](crate::validation); this schema is used once a record is
//! known to be well-formed enough to analyze.

use std::{collections::BTreeMap, str::FromStr};

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Fixed set of assessed privacy dimensions.
///
/// Category scores are "higher = better".
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    derive_more::Display,
)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    #[display("data_collection")]
    DataCollection,
    #[display("data_usage")]
    DataUsage,
    #[display("third_party_sharing")]
    ThirdPartySharing,
    #[display("data_retention")]
    DataRetention,
    #[display("user_rights")]
    UserRights,
    #[display("security_measures")]
    SecurityMeasures,
    #[display("compliance")]
    Compliance,
    #[display("older_adult_considerations")]
    OlderAdultConsiderations,
}

impl Category {
    pub const ALL: [Self; 8] = [
        Self::DataCollection,
        Self::DataUsage,
        Self::ThirdPartySharing,
        Self::DataRetention,
        Self::UserRights,
        Self::SecurityMeasures,
        Self::Compliance,
        Self::OlderAdultConsiderations,
    ];

    /// Categories used as clustering features.
    pub const PRIMARY: [Self; 6] = [
        Self::DataCollection,
        Self::DataUsage,
        Self::ThirdPartySharing,
        Self::DataRetention,
        Self::UserRights,
        Self::SecurityMeasures,
    ];

    /// Looks up a category by its wire name.
    ///
    /// ```
    /// use policyscope_analysis::record::Category;
    ///
    /// assert_eq!(Category::from_name("user_rights"), Some(Category::UserRights));
    /// assert_eq!(Category::from_name("marketing"), None);
    /// ```
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == name)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DataCollection => "data_collection",
            Self::DataUsage => "data_usage",
            Self::ThirdPartySharing => "third_party_sharing",
            Self::DataRetention => "data_retention",
            Self::UserRights => "user_rights",
            Self::SecurityMeasures => "security_measures",
            Self::Compliance => "compliance",
            Self::OlderAdultConsiderations => "older_adult_considerations",
        }
    }
}

/// Severity tier of a red flag, most severe first.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    derive_more::Display,
)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Severity {
    #[display("critical")]
    Critical,
    #[display("high")]
    High,
    #[display("medium")]
    Medium,
    #[display("low")]
    Low,
    /// Missing or not one of the tiers above.
    #[default]
    #[display("unknown")]
    Unknown,
}

impl Severity {
    /// The recognized tiers.
    pub const ALL: [Self; 4] = [Self::Critical, Self::High, Self::Medium, Self::Low];
}

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("unknown severity '{value}' (expected one of: critical, high, medium, low)")]
pub struct UnknownSeverityError {
    pub value: String,
}

impl FromStr for Severity {
    type Err = UnknownSeverityError;

    /// Parses a severity, ignoring ASCII case and surrounding whitespace.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|severity| severity.to_string() == normalized)
            .ok_or_else(|| UnknownSeverityError {
                value: s.to_owned(),
            })
    }
}

impl From<String> for Severity {
    fn from(value: String) -> Self {
        value.parse().unwrap_or(Self::Unknown)
    }
}

/// A score as found in the input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScoreValue {
    Number(f64),
    /// Present but not a number (a string, a list, ...).
    Malformed(serde_json::Value),
}

impl ScoreValue {
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) if n.is_finite() => Some(*n),
            Self::Number(_) | Self::Malformed(_) => None,
        }
    }
}

/// Assessment of a single category.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryAssessment {
    #[serde(default)]
    pub score: Option<ScoreValue>,
    #[serde(default)]
    pub explanation: String,
    #[serde(default)]
    pub key_findings: Vec<String>,
    #[serde(default)]
    pub positive_aspects: Vec<String>,
    #[serde(default)]
    pub concerns: Vec<String>,
}

/// A concerning practice identified in a policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedFlag {
    #[serde(default)]
    pub finding: String,
    #[serde(default)]
    pub severity: Severity,
    #[serde(default)]
    pub quote: String,
    #[serde(default)]
    pub category: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PositivePractice {
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub description: String,
}

/// A finding worth quoting in research output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuotableFinding {
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub finding: String,
    #[serde(default)]
    pub quote: String,
    #[serde(default)]
    pub significance: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComplianceFlags {
    pub hipaa_mentioned: bool,
    pub gdpr_mentioned: bool,
    pub business_associate_agreement: bool,
}

/// Free-text descriptions of the rights a policy grants.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserRights {
    pub deletion_rights: String,
    pub portability: String,
    pub opt_out_mechanisms: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis_date: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl RecordMetadata {
    /// Parses `analysis_date`.
    ///
    /// Accepts RFC 3339 timestamps, timestamps without an offset (taken as
    /// UTC) and plain dates.
    ///
    /// ```
    /// use policyscope_analysis::record::RecordMetadata;
    ///
    /// let metadata = RecordMetadata {
    ///     analysis_date: Some("2025-01-10T12:00:00".to_owned()),
    ///     ..RecordMetadata::default()
    /// };
    /// let date = metadata.parsed_analysis_date().unwrap();
    /// assert_eq!(date.to_rfc3339(), "2025-01-10T12:00:00+00:00");
    /// ```
    #[must_use]
    pub fn parsed_analysis_date(&self) -> Option<DateTime<Utc>> {
        let raw = self.analysis_date.as_deref()?.trim();
        if let Ok(date) = DateTime::parse_from_rfc3339(raw) {
            return Some(date.with_timezone(&Utc));
        }
        if let Ok(date) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
            return Some(date.and_utc());
        }
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|date| date.and_utc())
    }
}

/// One app's complete analysis result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub app_name: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub overall_risk_score: Option<ScoreValue>,
    #[serde(default)]
    pub overall_transparency_score: Option<ScoreValue>,
    #[serde(default)]
    pub confidence_score: Option<ScoreValue>,
    #[serde(default)]
    pub categories: BTreeMap<Category, CategoryAssessment>,
    #[serde(default)]
    pub red_flags: Vec<RedFlag>,
    #[serde(default)]
    pub positive_practices: Vec<PositivePractice>,
    #[serde(default)]
    pub missing_information: Vec<String>,
    #[serde(default)]
    pub quotable_findings: Vec<QuotableFinding>,
    #[serde(default)]
    pub compliance: ComplianceFlags,
    #[serde(default)]
    pub retention_specified: bool,
    #[serde(default)]
    pub readability_label: String,
    #[serde(default)]
    pub user_rights: UserRights,
    #[serde(default)]
    pub metadata: RecordMetadata,
}

impl AnalysisRecord {
    /// Numeric score of `category`, if present and numeric.
    #[must_use]
    pub fn category_score(&self, category: Category) -> Option<f64> {
        self.categories
            .get(&category)?
            .score
            .as_ref()
            .and_then(ScoreValue::as_number)
    }

    #[must_use]
    pub fn red_flag_count(&self) -> usize {
        self.red_flags.len()
    }
}
