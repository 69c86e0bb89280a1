//! Statistical utilities for the policyscope project.
//!
//! This crate provides the numeric building blocks used by the record
//! validator and the comparative statistics engine:
//!
//! - **Descriptive statistics**: mean, median, standard deviation, min, max and quartiles
//! - **Percentiles**: linearly interpolated percentiles and percentile ranks
//! - **Outliers**: population z-score outlier detection over series with gaps
//! - **Correlation**: Pearson and point-biserial correlation with two-sided p-values
//! - **Ranking**: stable ordinal ranking with percentile positions
//! - **Clustering**: column standardization and seeded k-means
//!
//! # Modules
//!
//! - [`descriptive`]: Descriptive statistics for summarizing datasets
//! - [`percentiles`]: Percentile computation and storage
//! - [`outliers`]: Z-score outlier detection
//! - [`correlation`]: Correlation coefficients and their significance
//! - [`ranking`]: Ordinal rankings
//! - [`kmeans`]: Standardization and k-means clustering
//!
//! # Examples
//!
//! ## Computing descriptive statistics
//!
//! ```
//! use policyscope_stats::descriptive::DescriptiveStats;
//!
//! let values = [1.0, 2.0, 3.0, 4.0, 5.0];
//! let stats = DescriptiveStats::new(values).unwrap();
//! assert_eq!(stats.mean, 3.0);
//! assert_eq!(stats.percentiles.get(75.0), Some(4.0));
//! ```
//!
//! ## Computing percentiles
//!
//! ```
//! use policyscope_stats::percentiles::Percentiles;
//!
//! let values = [1.0, 2.0, 3.0, 4.0, 5.0];
//! let percentiles = Percentiles::new(&values, &[25.0, 50.0, 75.0]);
//! assert_eq!(percentiles.get(50.0), Some(3.0));
//! ```
//!
//! ## Detecting outliers
//!
//! ```
//! use policyscope_stats::outliers::ZScoreDetector;
//!
//! let outliers = ZScoreDetector::new(1.5).detect_complete(&[50.0, 52.0, 49.0, 51.0, 5.0]);
//! assert_eq!(outliers.len(), 1);
//! assert_eq!(outliers[0].index, 4);
//! ```

pub mod correlation;
pub mod descriptive;
pub mod kmeans;
pub mod outliers;
pub mod percentiles;
pub mod ranking;
