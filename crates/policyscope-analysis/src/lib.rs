//! Validation and cross-app analysis of privacy-policy analysis records
//!
//! Each input is one app's [`record::AnalysisRecord`]: overall risk,
//! transparency and confidence scores, per-category assessments, red flags,
//! compliance flags and user-rights text.
//!
//! # Overview
//!
//! The crate supports two workflows.
//!
//! ## Record Validation Workflow
//!
//! Check records before they reach research output:
//!
//! 1. **Structure and Ranges** ([`validation::RecordValidator`]): Required fields, score
//!    bounds, red flag shape
//! 2. **Consistency** ([`consistency::ConsistencyChecker`]): Overall scores against category
//!    scores
//! 3. **Anomalies** ([`validation::RecordValidator::detect_anomalies`]): Z-score outliers per
//!    metric across the batch
//! 4. **Report** ([`report::generate_validation_report`]): Plain-text summary
//!
//! ## Comparative Analysis Workflow
//!
//! Describe a collection of apps as a whole:
//!
//! 1. **Metric Extraction** ([`metrics::MetricExtractor`]): Numeric columns with a policy for
//!    missing category scores
//! 2. **Statistics** ([`comparative::ComparativeStatisticsEngine::compute_statistics`]):
//!    Distributions, red flag frequencies, compliance rates, gaps, correlations and rankings
//! 3. **Clustering** ([`clustering::ClusteringEngine`]): Seeded k-means over standardized
//!    features
//! 4. **Report** ([`comparative::ComparativeReport`]): Best and worst practices, research
//!    quotes and recommendations
//!
//! # Examples
//!
//! ```
//! use policyscope_analysis::{
//!     comparative::ComparativeStatisticsEngine, record::AnalysisRecord,
//!     validation::RecordValidator,
//! };
//!
//! let raw = serde_json::json!({
//!     "app_name": "Example Health",
//!     "overall_risk_score": 35,
//!     "overall_transparency_score": 70,
//!     "confidence_score": 85,
//!     "categories": {},
//!     "red_flags": [],
//!     "positive_practices": [],
//!     "missing_information": [],
//!     "metadata": {"analysis_date": "2025-03-01"},
//! });
//!
//! let validation = RecordValidator::default().validate_record(&raw).unwrap();
//! assert!(validation.is_valid);
//! assert!(validation.warnings.contains(&"No categories found in analysis".to_owned()));
//!
//! let record: AnalysisRecord = serde_json::from_value(raw).unwrap();
//! let report = ComparativeStatisticsEngine::default().generate_comparative_report(&[record]);
//! assert_eq!(report.metadata.num_apps_analyzed, 1);
//! ```

pub mod clustering;
pub mod comparative;
pub mod config;
pub mod consistency;
pub mod metrics;
pub mod record;
pub mod report;
pub mod validation;
