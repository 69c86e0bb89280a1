//! Cross-app comparative statistics
//!
//! [`ComparativeStatisticsEngine`] turns a collection of analysis records into
//! a single [`ComparativeReport`]:
//!
//! ```text
//! ComparativeReport
//! ├─ metadata            (generated_at, app names)
//! ├─ statistics
//! │   ├─ summary         (app count, analysis date range)
//! │   ├─ overall_risk / transparency / confidence / category_stats
//! │   ├─ red_flag_stats, compliance_stats, gap_analysis
//! │   ├─ correlations    (hipaa_vs_security, transparency_vs_risk)
//! │   ├─ rankings        (overall_risk, transparency, per category)
//! │   └─ clusters
//! ├─ best_practices / worst_practices   (per category)
//! ├─ research_quotes                     (per quote category)
//! └─ recommendations
//! ```
//!
//! Category series are built with the configured
//! [`MissingCategoryPolicy`](crate::metrics::MissingCategoryPolicy), so every
//! app contributes one value to every category.
//!
//! # Example
//!
//! ```
//! use policyscope_analysis::{comparative::ComparativeStatisticsEngine, record::AnalysisRecord};
//!
//! let records = [(20.0, 80.0), (50.0, 55.0), (70.0, 35.0)]
//!     .into_iter()
//!     .enumerate()
//!     .map(|(i, (risk, transparency))| {
//!         serde_json::from_value::<AnalysisRecord>(serde_json::json!({
//!             "app_name": format!("app{i}"),
//!             "overall_risk_score": risk,
//!             "overall_transparency_score": transparency,
//!             "confidence_score": 80,
//!         }))
//!         .unwrap()
//!     })
//!     .collect::<Vec<_>>();
//!
//! let statistics = ComparativeStatisticsEngine::default().compute_statistics(&records);
//! assert_eq!(statistics.summary.total_apps, 3);
//! assert_eq!(statistics.rankings.overall_risk[0].app_name, "app0");
//! assert!(statistics.correlations.transparency_vs_risk.unwrap().correlation < -0.99);
//! ```

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use policyscope_stats::{
    correlation::{CorrelationResult, CorrelationTest},
    descriptive::DescriptiveStats,
    percentiles::compute_percentile,
    ranking::{RankOrder, rank_by_value},
};
use serde::Serialize;

use crate::{
    clustering::{ClusterCountStrategy, ClusterReport, ClusteringEngine},
    config::AnalysisConfig,
    metrics::{Feature, MetricExtractor, RecordMetrics},
    record::{AnalysisRecord, Category, Severity},
};

const MOST_COMMON_FLAGS: usize = 10;
const MOST_COMMON_GAPS: usize = 15;
/// User-rights text must be longer than this to count as present.
const MIN_RIGHTS_TEXT_LEN: usize = 5;
const BEST_PRACTICE_PERCENTILE: f64 = 75.0;
const WORST_PRACTICE_PERCENTILE: f64 = 25.0;

const HIPAA_RECOMMENDATION_BELOW: f64 = 50.0;
const RETENTION_RECOMMENDATION_BELOW: f64 = 70.0;
const TRANSPARENCY_RECOMMENDATION_BELOW: f64 = 60.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparativeReport {
    pub metadata: ReportMetadata,
    pub statistics: Statistics,
    pub best_practices: BTreeMap<Category, Vec<BestPractice>>,
    pub worst_practices: BTreeMap<Category, Vec<WorstPractice>>,
    pub research_quotes: BTreeMap<String, Vec<ResearchQuote>>,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportMetadata {
    pub generated_at: DateTime<Utc>,
    pub num_apps_analyzed: usize,
    pub app_names: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Statistics {
    pub summary: StatisticsSummary,
    pub overall_risk: Option<DescriptiveStats>,
    pub transparency: Option<DescriptiveStats>,
    pub confidence: Option<DescriptiveStats>,
    pub category_stats: BTreeMap<Category, Option<DescriptiveStats>>,
    pub red_flag_stats: RedFlagStats,
    pub compliance_stats: ComplianceStats,
    pub gap_analysis: GapAnalysis,
    pub correlations: Correlations,
    pub rankings: Rankings,
    pub clusters: ClusterReport,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatisticsSummary {
    pub total_apps: usize,
    pub analysis_date_range: DateRange,
}

/// Earliest and latest parseable `metadata.analysis_date`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub earliest: Option<DateTime<Utc>>,
    pub latest: Option<DateTime<Utc>>,
}

/// A count and its share of all apps, in percent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CountShare {
    pub count: usize,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlagFrequency {
    pub flag: String,
    pub count: usize,
    /// Occurrences per app, in percent.
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RedFlagStats {
    pub total_flags: usize,
    pub unique_flags: usize,
    pub avg_per_app: f64,
    pub most_common: Vec<FlagFrequency>,
    pub by_severity: BTreeMap<Severity, usize>,
    pub by_category: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ComplianceStats {
    pub hipaa_mentioned: CountShare,
    pub gdpr_mentioned: CountShare,
    pub business_associate_agreement: CountShare,
    pub retention_period_specified: CountShare,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GapFrequency {
    pub item: String,
    pub count: usize,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GapAnalysis {
    pub common_gaps: Vec<GapFrequency>,
    pub apps_with_deletion_rights: CountShare,
    pub apps_with_data_export: CountShare,
    pub apps_with_opt_out: CountShare,
}

/// Fixed domain hypotheses; an undefined correlation is left out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Correlations {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hipaa_vs_security: Option<CorrelationResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transparency_vs_risk: Option<CorrelationResult>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankEntry {
    pub rank: usize,
    pub app_name: String,
    pub value: f64,
    pub percentile: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rankings {
    /// Lowest risk first.
    pub overall_risk: Vec<RankEntry>,
    pub transparency: Vec<RankEntry>,
    pub category_rankings: BTreeMap<Category, Vec<RankEntry>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BestPractice {
    pub app_name: String,
    pub score: f64,
    pub positive_aspects: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorstPractice {
    pub app_name: String,
    pub score: f64,
    pub concerns: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResearchQuote {
    pub app: String,
    pub finding: String,
    pub quote: String,
    pub significance: String,
}

/// Per-call view of the records with their extracted metrics.
struct MetricTable<'a> {
    records: &'a [AnalysisRecord],
    metrics: Vec<RecordMetrics>,
    extractor: MetricExtractor,
}

impl<'a> MetricTable<'a> {
    fn new(records: &'a [AnalysisRecord], extractor: MetricExtractor) -> Self {
        let mut diagnostics = 0;
        let metrics = records
            .iter()
            .map(|record| {
                let extraction = extractor.extract(record);
                diagnostics += extraction.diagnostics.len();
                extraction.metrics
            })
            .collect();
        if diagnostics > 0 {
            tracing::warn!(diagnostics, "some scores were missing or not numeric");
        }
        Self {
            records,
            metrics,
            extractor,
        }
    }

    fn len(&self) -> usize {
        self.records.len()
    }

    fn column(&self, feature: Feature) -> Vec<f64> {
        self.extractor
            .dense_matrix(&self.metrics, &[feature])
            .into_iter()
            .flatten()
            .collect()
    }

    fn app_names(&self) -> impl Iterator<Item = &'a str> {
        self.records.iter().map(|r| r.app_name.as_str())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ComparativeStatisticsEngine {
    config: AnalysisConfig,
    clustering: ClusteringEngine,
}

impl Default for ComparativeStatisticsEngine {
    fn default() -> Self {
        Self::new(AnalysisConfig::default())
    }
}

impl ComparativeStatisticsEngine {
    #[must_use]
    pub fn new(config: AnalysisConfig) -> Self {
        Self {
            config,
            clustering: ClusteringEngine::new(&config),
        }
    }

    /// Replaces the heuristic choosing the number of clusters.
    #[must_use]
    pub fn with_cluster_count_strategy(self, strategy: ClusterCountStrategy) -> Self {
        Self {
            clustering: self.clustering.with_strategy(strategy),
            ..self
        }
    }

    fn table<'a>(&self, records: &'a [AnalysisRecord]) -> MetricTable<'a> {
        MetricTable::new(
            records,
            MetricExtractor::new(self.config.missing_category_policy),
        )
    }

    /// Computes every cross-app statistic.
    #[must_use]
    pub fn compute_statistics(&self, records: &[AnalysisRecord]) -> Statistics {
        tracing::info!(apps = records.len(), "calculating comparative statistics");
        let table = self.table(records);

        let category_stats = Category::ALL
            .into_iter()
            .map(|c| (c, DescriptiveStats::new(table.column(Feature::Category(c)))))
            .collect();

        Statistics {
            summary: StatisticsSummary {
                total_apps: table.len(),
                analysis_date_range: date_range(records),
            },
            overall_risk: DescriptiveStats::new(table.column(Feature::OverallRisk)),
            transparency: DescriptiveStats::new(table.column(Feature::Transparency)),
            confidence: DescriptiveStats::new(table.column(Feature::Confidence)),
            category_stats,
            red_flag_stats: red_flag_stats(records),
            compliance_stats: compliance_stats(records),
            gap_analysis: gap_analysis(records),
            correlations: self.correlations(&table),
            rankings: rankings(&table),
            clusters: self.clustering.cluster(records),
        }
    }

    fn correlations(&self, table: &MetricTable<'_>) -> Correlations {
        let test = CorrelationTest::new(self.config.significance_level);
        let hipaa = table
            .records
            .iter()
            .map(|r| r.compliance.hipaa_mentioned)
            .collect::<Vec<_>>();

        Correlations {
            hipaa_vs_security: test.point_biserial(
                &hipaa,
                &table.column(Feature::Category(Category::SecurityMeasures)),
            ),
            transparency_vs_risk: test.pearson(
                &table.column(Feature::Transparency),
                &table.column(Feature::OverallRisk),
            ),
        }
    }

    /// Apps scoring at or above the 75th percentile of each category.
    #[must_use]
    pub fn identify_best_practices(
        &self,
        records: &[AnalysisRecord],
    ) -> BTreeMap<Category, Vec<BestPractice>> {
        let table = self.table(records);
        per_category_extremes(&table, BEST_PRACTICE_PERCENTILE, |score, threshold| {
            score >= threshold
        })
        .into_iter()
        .map(|(category, members)| {
            let practices = members
                .into_iter()
                .map(|(record, score)| BestPractice {
                    app_name: record.app_name.clone(),
                    score,
                    positive_aspects: record
                        .categories
                        .get(&category)
                        .map(|c| c.positive_aspects.clone())
                        .unwrap_or_default(),
                })
                .collect();
            (category, practices)
        })
        .collect()
    }

    /// Apps scoring at or below the 25th percentile of each category.
    #[must_use]
    pub fn identify_worst_practices(
        &self,
        records: &[AnalysisRecord],
    ) -> BTreeMap<Category, Vec<WorstPractice>> {
        let table = self.table(records);
        per_category_extremes(&table, WORST_PRACTICE_PERCENTILE, |score, threshold| {
            score <= threshold
        })
        .into_iter()
        .map(|(category, members)| {
            let practices = members
                .into_iter()
                .map(|(record, score)| WorstPractice {
                    app_name: record.app_name.clone(),
                    score,
                    concerns: record
                        .categories
                        .get(&category)
                        .map(|c| c.concerns.clone())
                        .unwrap_or_default(),
                })
                .collect();
            (category, practices)
        })
        .collect()
    }

    /// Quotable findings grouped by their category, "General" when unset.
    #[must_use]
    pub fn extract_research_quotes(
        &self,
        records: &[AnalysisRecord],
    ) -> BTreeMap<String, Vec<ResearchQuote>> {
        let mut quotes = BTreeMap::<String, Vec<ResearchQuote>>::new();
        for record in records {
            for finding in &record.quotable_findings {
                let theme = if finding.category.trim().is_empty() {
                    "General".to_owned()
                } else {
                    finding.category.clone()
                };
                quotes.entry(theme).or_default().push(ResearchQuote {
                    app: record.app_name.clone(),
                    finding: finding.finding.clone(),
                    quote: finding.quote.clone(),
                    significance: finding.significance.clone(),
                });
            }
        }
        quotes
    }

    /// Policy recommendations triggered by weak cross-app figures.
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn recommendations(&self, records: &[AnalysisRecord]) -> Vec<String> {
        if records.is_empty() {
            return vec![];
        }
        let n = records.len();
        let compliance = compliance_stats(records);
        let mut recommendations = vec![];

        let hipaa = compliance.hipaa_mentioned.percentage;
        if hipaa < HIPAA_RECOMMENDATION_BELOW {
            recommendations.push(format!(
                "Only {hipaa:.1}% of apps explicitly mention HIPAA compliance. \
                 Healthcare apps should clearly state HIPAA compliance status."
            ));
        }

        let retention = compliance.retention_period_specified.percentage;
        if retention < RETENTION_RECOMMENDATION_BELOW {
            recommendations.push(format!(
                "Only {retention:.1}% of apps specify data retention periods. \
                 Clear retention policies should be mandatory for healthcare data."
            ));
        }

        let college = records
            .iter()
            .filter(|r| r.readability_label.to_lowercase().contains("college"))
            .count();
        if college * 2 > n {
            recommendations.push(format!(
                "{college} apps use college-level language. \
                 Privacy policies should be written at an 8th-grade reading level for accessibility."
            ));
        }

        let extractor = MetricExtractor::new(self.config.missing_category_policy);
        let avg_transparency = records
            .iter()
            .map(|r| extractor.extract(r).metrics.overall_transparency_score)
            .sum::<f64>()
            / n as f64;
        if avg_transparency < TRANSPARENCY_RECOMMENDATION_BELOW {
            recommendations.push(format!(
                "Average transparency score is {avg_transparency:.1}/100. \
                 Industry should improve clarity and specificity in privacy policies."
            ));
        }

        recommendations
    }

    /// Builds the complete comparative report.
    #[must_use]
    pub fn generate_comparative_report(&self, records: &[AnalysisRecord]) -> ComparativeReport {
        tracing::info!(apps = records.len(), "generating comparative report");
        ComparativeReport {
            metadata: ReportMetadata {
                generated_at: Utc::now(),
                num_apps_analyzed: records.len(),
                app_names: records.iter().map(|r| r.app_name.clone()).collect(),
            },
            statistics: self.compute_statistics(records),
            best_practices: self.identify_best_practices(records),
            worst_practices: self.identify_worst_practices(records),
            research_quotes: self.extract_research_quotes(records),
            recommendations: self.recommendations(records),
        }
    }
}

#[expect(clippy::cast_precision_loss)]
fn percentage(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64 * 100.0
    }
}

fn count_share(records: &[AnalysisRecord], predicate: impl Fn(&AnalysisRecord) -> bool) -> CountShare {
    let count = records.iter().filter(|&r| predicate(r)).count();
    CountShare {
        count,
        percentage: percentage(count, records.len()),
    }
}

/// Counts occurrences, most frequent first; ties keep first-seen order.
fn most_common<'a>(items: impl IntoIterator<Item = &'a str>, limit: usize) -> Vec<(String, usize)> {
    let mut order = Vec::<(String, usize)>::new();
    let mut positions = HashMap::<&str, usize>::new();
    for item in items {
        if let Some(&position) = positions.get(item) {
            order[position].1 += 1;
        } else {
            positions.insert(item, order.len());
            order.push((item.to_owned(), 1));
        }
    }
    order.sort_by(|(_, a), (_, b)| b.cmp(a));
    order.truncate(limit);
    order
}

fn date_range(records: &[AnalysisRecord]) -> DateRange {
    let dates = records
        .iter()
        .filter_map(|r| r.metadata.parsed_analysis_date())
        .collect::<Vec<_>>();
    DateRange {
        earliest: dates.iter().min().copied(),
        latest: dates.iter().max().copied(),
    }
}

#[expect(clippy::cast_precision_loss)]
fn red_flag_stats(records: &[AnalysisRecord]) -> RedFlagStats {
    let flags = records.iter().flat_map(|r| &r.red_flags).collect::<Vec<_>>();

    let mut by_severity = BTreeMap::new();
    let mut by_category = BTreeMap::<String, usize>::new();
    for flag in &flags {
        *by_severity.entry(flag.severity).or_insert(0) += 1;
        let category = if flag.category.trim().is_empty() {
            "Unknown"
        } else {
            flag.category.as_str()
        };
        *by_category.entry(category.to_owned()).or_insert(0) += 1;
    }

    let counts = most_common(flags.iter().map(|f| f.finding.as_str()), usize::MAX);
    let unique_flags = counts.len();
    let most_common = counts
        .into_iter()
        .take(MOST_COMMON_FLAGS)
        .map(|(flag, count)| FlagFrequency {
            flag,
            count,
            percentage: percentage(count, records.len()),
        })
        .collect();

    RedFlagStats {
        total_flags: flags.len(),
        unique_flags,
        avg_per_app: if records.is_empty() {
            0.0
        } else {
            flags.len() as f64 / records.len() as f64
        },
        most_common,
        by_severity,
        by_category,
    }
}

fn compliance_stats(records: &[AnalysisRecord]) -> ComplianceStats {
    ComplianceStats {
        hipaa_mentioned: count_share(records, |r| r.compliance.hipaa_mentioned),
        gdpr_mentioned: count_share(records, |r| r.compliance.gdpr_mentioned),
        business_associate_agreement: count_share(records, |r| {
            r.compliance.business_associate_agreement
        }),
        retention_period_specified: count_share(records, |r| r.retention_specified),
    }
}

fn rights_text_present(text: &str) -> bool {
    text.trim().chars().count() > MIN_RIGHTS_TEXT_LEN
}

fn gap_analysis(records: &[AnalysisRecord]) -> GapAnalysis {
    let gaps = records
        .iter()
        .flat_map(|r| &r.missing_information)
        .map(String::as_str);
    let common_gaps = most_common(gaps, MOST_COMMON_GAPS)
        .into_iter()
        .map(|(item, count)| GapFrequency {
            item,
            count,
            percentage: percentage(count, records.len()),
        })
        .collect();

    GapAnalysis {
        common_gaps,
        apps_with_deletion_rights: count_share(records, |r| {
            rights_text_present(&r.user_rights.deletion_rights)
        }),
        apps_with_data_export: count_share(records, |r| {
            rights_text_present(&r.user_rights.portability)
        }),
        apps_with_opt_out: count_share(records, |r| {
            rights_text_present(&r.user_rights.opt_out_mechanisms)
        }),
    }
}

fn rank(table: &MetricTable<'_>, feature: Feature, order: RankOrder) -> Vec<RankEntry> {
    let names = table.app_names().collect::<Vec<_>>();
    rank_by_value(&table.column(feature), order)
        .into_iter()
        .map(|r| RankEntry {
            rank: r.rank,
            app_name: names[r.index].to_owned(),
            value: r.value,
            percentile: r.percentile,
        })
        .collect()
}

fn rankings(table: &MetricTable<'_>) -> Rankings {
    Rankings {
        overall_risk: rank(table, Feature::OverallRisk, RankOrder::LowerIsBetter),
        transparency: rank(table, Feature::Transparency, RankOrder::HigherIsBetter),
        category_rankings: Category::ALL
            .into_iter()
            .map(|c| {
                let ranking = rank(table, Feature::Category(c), RankOrder::HigherIsBetter);
                (c, ranking)
            })
            .collect(),
    }
}

/// Members of each category whose score passes `keep` against the given
/// percentile of that category. Empty input gives an empty map.
fn per_category_extremes<'a>(
    table: &MetricTable<'a>,
    percentile: f64,
    keep: impl Fn(f64, f64) -> bool,
) -> BTreeMap<Category, Vec<(&'a AnalysisRecord, f64)>> {
    if table.len() == 0 {
        return BTreeMap::new();
    }

    Category::ALL
        .into_iter()
        .map(|category| {
            let scores = table.column(Feature::Category(category));
            let mut sorted = scores.clone();
            sorted.sort_by(f64::total_cmp);
            let threshold = compute_percentile(&sorted, percentile);
            let members = table
                .records
                .iter()
                .zip(scores)
                .filter(|(_, score)| keep(*score, threshold))
                .collect();
            (category, members)
        })
        .collect()
}
