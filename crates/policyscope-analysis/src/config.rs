//! Tunable thresholds for validation and comparative analysis
//!
//! Both configuration types deserialize from partial JSON: any field left out
//! keeps its default.
//!
//! ```
//! use policyscope_analysis::config::{AnalysisConfig, ValidatorConfig};
//!
//! let config: ValidatorConfig = serde_json::from_str(r#"{"strict_mode": true}"#).unwrap();
//! assert!(config.strict_mode);
//! assert_eq!(config.consistency_tolerance, 15.0);
//!
//! let config: AnalysisConfig = serde_json::from_str("{}").unwrap();
//! assert_eq!(config, AnalysisConfig::default());
//! ```

use serde::{Deserialize, Serialize};

use crate::metrics::MissingCategoryPolicy;

/// Settings of the [`RecordValidator`](crate::validation::RecordValidator).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorConfig {
    /// Treat warnings as failures.
    pub strict_mode: bool,
    /// Maximum allowed gap between overall scores and the category average.
    pub consistency_tolerance: f64,
    /// Absolute z-score above which a batch value is anomalous.
    pub outlier_threshold: f64,
    /// Confidence scores below this are reported as unreliable.
    pub low_confidence_threshold: f64,
    /// More critical red flags than this are reported for review.
    pub max_critical_flags: usize,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            strict_mode: false,
            consistency_tolerance: crate::consistency::DEFAULT_CONSISTENCY_TOLERANCE,
            outlier_threshold: policyscope_stats::outliers::DEFAULT_Z_THRESHOLD,
            low_confidence_threshold: 50.0,
            max_critical_flags: 5,
        }
    }
}

/// Settings of the [`ComparativeStatisticsEngine`](crate::comparative::ComparativeStatisticsEngine).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub missing_category_policy: MissingCategoryPolicy,
    pub cluster_seed: u64,
    pub cluster_restarts: usize,
    pub significance_level: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            missing_category_policy: MissingCategoryPolicy::default(),
            cluster_seed: policyscope_stats::kmeans::DEFAULT_SEED,
            cluster_restarts: policyscope_stats::kmeans::DEFAULT_RESTARTS,
            significance_level: policyscope_stats::correlation::DEFAULT_SIGNIFICANCE_LEVEL,
        }
    }
}
