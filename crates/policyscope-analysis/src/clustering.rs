//! Segmentation of apps into groups with similar privacy profiles
//!
//! Each app is described by its overall risk, transparency, red flag count and
//! the six primary category scores. Columns are standardized and clustered
//! with seeded k-means, so repeated calls on the same records give the same
//! grouping. Nothing is kept between calls.

use std::collections::BTreeMap;

use policyscope_stats::kmeans::{KMeans, standardize_columns};
use serde::Serialize;

use crate::{
    config::AnalysisConfig,
    metrics::{Feature, MetricExtractor},
    record::AnalysisRecord,
};

/// Below this many apps no clustering is attempted.
pub const MIN_CLUSTER_APPS: usize = 3;

/// Chooses the number of clusters from the number of apps.
pub type ClusterCountStrategy = fn(usize) -> usize;

/// `min(3, max(2, n / 2))`.
///
/// ```
/// use policyscope_analysis::clustering::default_cluster_count;
///
/// assert_eq!(default_cluster_count(3), 2);
/// assert_eq!(default_cluster_count(6), 3);
/// assert_eq!(default_cluster_count(40), 3);
/// ```
#[must_use]
pub fn default_cluster_count(n_apps: usize) -> usize {
    (n_apps / 2).clamp(2, 3)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterMember {
    pub app_name: String,
    pub overall_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cluster {
    pub cluster_id: usize,
    pub size: usize,
    pub apps: Vec<ClusterMember>,
    /// Mean overall risk score of the members.
    pub avg_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterReport {
    /// Requested number of clusters; 0 when clustering was skipped.
    pub n_clusters: usize,
    /// Non-empty clusters ordered by id.
    pub clusters: Vec<Cluster>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl ClusterReport {
    fn skipped(note: &str) -> Self {
        Self {
            n_clusters: 0,
            clusters: vec![],
            note: Some(note.to_owned()),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ClusteringEngine {
    extractor: MetricExtractor,
    strategy: ClusterCountStrategy,
    seed: u64,
    restarts: usize,
}

impl Default for ClusteringEngine {
    fn default() -> Self {
        Self::new(&AnalysisConfig::default())
    }
}

impl ClusteringEngine {
    #[must_use]
    pub fn new(config: &AnalysisConfig) -> Self {
        Self {
            extractor: MetricExtractor::new(config.missing_category_policy),
            strategy: default_cluster_count,
            seed: config.cluster_seed,
            restarts: config.cluster_restarts,
        }
    }

    /// Replaces the cluster-count heuristic.
    #[must_use]
    pub fn with_strategy(self, strategy: ClusterCountStrategy) -> Self {
        Self { strategy, ..self }
    }

    /// Clusters `records`.
    ///
    /// ```
    /// use policyscope_analysis::{clustering::ClusteringEngine, record::AnalysisRecord};
    ///
    /// let record: AnalysisRecord = serde_json::from_value(serde_json::json!({
    ///     "app_name": "A",
    ///     "overall_risk_score": 30,
    ///     "overall_transparency_score": 70,
    ///     "confidence_score": 80,
    /// }))
    /// .unwrap();
    ///
    /// let report = ClusteringEngine::default().cluster(&[record.clone(), record]);
    /// assert_eq!(report.n_clusters, 0);
    /// assert!(report.clusters.is_empty());
    /// assert!(report.note.is_some());
    /// ```
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn cluster(&self, records: &[AnalysisRecord]) -> ClusterReport {
        if records.len() < MIN_CLUSTER_APPS {
            return ClusterReport::skipped("Insufficient data for clustering");
        }

        let metrics = records
            .iter()
            .map(|record| self.extractor.extract(record).metrics)
            .collect::<Vec<_>>();
        let features = self
            .extractor
            .dense_matrix(&metrics, &Feature::clustering());
        let scaled = standardize_columns(&features);
        let n_clusters = (self.strategy)(records.len()).clamp(1, records.len());

        let Some(fit) = KMeans::new(n_clusters)
            .with_seed(self.seed)
            .with_restarts(self.restarts)
            .fit(&scaled)
        else {
            return ClusterReport::skipped("Clustering failed");
        };
        tracing::debug!(
            n_clusters,
            inertia = fit.inertia,
            iterations = fit.n_iter,
            "k-means converged"
        );

        let mut groups = BTreeMap::<usize, Vec<ClusterMember>>::new();
        for ((record, extracted), label) in records.iter().zip(&metrics).zip(fit.labels) {
            groups.entry(label).or_default().push(ClusterMember {
                app_name: record.app_name.clone(),
                overall_score: extracted.overall_risk_score,
            });
        }

        let clusters = groups
            .into_iter()
            .map(|(cluster_id, apps)| {
                let avg_score =
                    apps.iter().map(|a| a.overall_score).sum::<f64>() / apps.len() as f64;
                Cluster {
                    cluster_id,
                    size: apps.len(),
                    apps,
                    avg_score,
                }
            })
            .collect();

        ClusterReport {
            n_clusters,
            clusters,
            note: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn record(name: &str, risk: f64, category_score: f64, flags: usize) -> AnalysisRecord {
        let flag = json!({"finding": "f", "severity": "medium", "quote": "q", "category": "c"});
        let categories = crate::record::Category::PRIMARY
            .iter()
            .map(|c| (c.to_string(), json!({"score": category_score})))
            .collect::<serde_json::Map<_, _>>();
        serde_json::from_value(json!({
            "app_name": name,
            "overall_risk_score": risk,
            "overall_transparency_score": category_score,
            "confidence_score": 80,
            "categories": categories,
            "red_flags": vec![flag; flags],
        }))
        .unwrap()
    }

    #[test]
    fn test_identical_records_share_a_cluster() {
        let records = vec![record("same", 42.0, 58.0, 2); 4];
        let report = ClusteringEngine::default().cluster(&records);

        assert_eq!(report.n_clusters, 2);
        assert!(report.note.is_none());
        assert_eq!(report.clusters.len(), 1);
        assert_eq!(report.clusters[0].size, 4);
        assert_eq!(report.clusters[0].avg_score, 42.0);
    }

    #[test]
    fn test_separates_risk_profiles() {
        fn names(cluster: &Cluster) -> Vec<&str> {
            cluster.apps.iter().map(|a| a.app_name.as_str()).collect()
        }

        let records = [
            record("safe-1", 10.0, 90.0, 0),
            record("risky-1", 85.0, 15.0, 9),
            record("safe-2", 12.0, 88.0, 1),
            record("risky-2", 80.0, 20.0, 8),
        ];
        let report = ClusteringEngine::default().cluster(&records);

        assert_eq!(report.n_clusters, 2);
        assert_eq!(report.clusters.len(), 2);
        assert_eq!(names(&report.clusters[0]), ["safe-1", "safe-2"]);
        assert_eq!(names(&report.clusters[1]), ["risky-1", "risky-2"]);
        assert_eq!(report.clusters[0].avg_score, 11.0);
        assert_eq!(report.clusters[1].avg_score, 82.5);
    }

    #[test]
    fn test_reclustering_is_deterministic() {
        let records = (0..7)
            .map(|i| {
                let i = f64::from(i);
                record(&format!("app{i}"), 10.0 * i, 90.0 - 7.0 * i, 0)
            })
            .collect::<Vec<_>>();
        let engine = ClusteringEngine::default();
        let first = engine.cluster(&records);
        assert_eq!(first.n_clusters, 3);
        assert_eq!(first, engine.cluster(&records));
        assert_eq!(first.clusters.iter().map(|c| c.size).sum::<usize>(), 7);
    }

    #[test]
    fn test_non_numeric_risk_counts_as_zero() {
        let mut records = vec![record("same", 42.0, 58.0, 2); 3];
        let mut malformed = serde_json::to_value(&records[0]).unwrap();
        malformed["app_name"] = json!("text");
        malformed["overall_risk_score"] = json!("42");
        records.push(serde_json::from_value(malformed).unwrap());

        let report = ClusteringEngine::default().cluster(&records);
        let member = report
            .clusters
            .iter()
            .flat_map(|c| &c.apps)
            .find(|a| a.app_name == "text")
            .unwrap();
        assert_eq!(member.overall_score, 0.0);
    }

    #[test]
    fn test_custom_strategy() {
        let records = vec![record("same", 42.0, 58.0, 2); 3];
        let report = ClusteringEngine::default()
            .with_strategy(|_| 10)
            .cluster(&records);
        // capped at the number of apps
        assert_eq!(report.n_clusters, 3);
    }
}
