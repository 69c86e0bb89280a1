//! Column standardization and seeded k-means clustering
//!
//! The k-means implementation uses k-means++ seeding followed by Lloyd
//! iterations, restarted several times from the same seeded RNG stream and
//! keeping the fit with the lowest inertia. Given the same data and
//! configuration the result is always identical.
//!
//! # Examples
//!
//! ```
//! use policyscope_stats::kmeans::KMeans;
//!
//! let data = vec![
//!     vec![1.0, 1.0],
//!     vec![1.2, 0.8],
//!     vec![8.0, 8.0],
//!     vec![8.2, 7.9],
//! ];
//! let fit = KMeans::new(2).fit(&data).unwrap();
//!
//! assert_eq!(fit.labels, [0, 0, 1, 1]);
//! ```

use rand::{Rng as _, SeedableRng as _};
use rand_pcg::Pcg32;

use crate::descriptive::mean_and_std;

pub const DEFAULT_SEED: u64 = 42;
pub const DEFAULT_RESTARTS: usize = 10;
pub const DEFAULT_MAX_ITER: usize = 300;
pub const DEFAULT_TOLERANCE: f64 = 1e-4;

/// Standardizes every column of a row-major matrix to zero mean and unit
/// (population) variance.
///
/// Columns with zero variance are only centered, so they become all zeros.
/// Rows are expected to have equal length.
///
/// ```
/// use policyscope_stats::kmeans::standardize_columns;
///
/// let scaled = standardize_columns(&[vec![1.0, 5.0], vec![3.0, 5.0]]);
/// assert_eq!(scaled, [vec![-1.0, 0.0], vec![1.0, 0.0]]);
/// ```
#[must_use]
pub fn standardize_columns(rows: &[Vec<f64>]) -> Vec<Vec<f64>> {
    let Some(width) = rows.first().map(Vec::len) else {
        return vec![];
    };

    let scales = (0..width)
        .map(|column| {
            let values = rows.iter().map(|row| row[column]).collect::<Vec<_>>();
            let (mean, std) = mean_and_std(&values).unwrap_or((0.0, 1.0));
            (mean, if std > 0.0 { std } else { 1.0 })
        })
        .collect::<Vec<_>>();

    rows.iter()
        .map(|row| {
            row.iter()
                .zip(&scales)
                .map(|(value, (mean, std))| (value - mean) / std)
                .collect()
        })
        .collect()
}

/// K-means configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KMeans {
    pub n_clusters: usize,
    pub max_iter: usize,
    /// Convergence threshold on the total squared centroid shift.
    pub tolerance: f64,
    /// Number of independently seeded runs; the lowest-inertia run wins.
    pub restarts: usize,
    pub seed: u64,
}

/// Result of a k-means fit.
#[derive(Debug, Clone, PartialEq)]
pub struct KMeansFit {
    /// Cluster label per input row.
    ///
    /// Labels are numbered in order of first appearance, so the first row is
    /// always in cluster 0.
    pub labels: Vec<usize>,
    /// One centroid per label.
    pub centroids: Vec<Vec<f64>>,
    /// Sum of squared distances from each row to its centroid.
    pub inertia: f64,
    /// Lloyd iterations run by the winning restart.
    pub n_iter: usize,
}

impl KMeans {
    #[must_use]
    pub fn new(n_clusters: usize) -> Self {
        Self {
            n_clusters,
            max_iter: DEFAULT_MAX_ITER,
            tolerance: DEFAULT_TOLERANCE,
            restarts: DEFAULT_RESTARTS,
            seed: DEFAULT_SEED,
        }
    }

    #[must_use]
    pub fn with_seed(self, seed: u64) -> Self {
        Self { seed, ..self }
    }

    #[must_use]
    pub fn with_restarts(self, restarts: usize) -> Self {
        Self { restarts, ..self }
    }

    /// Fits the model to row-major `data`.
    ///
    /// Returns `None` when there are no rows, no clusters were requested, or
    /// more clusters than rows were requested.
    #[must_use]
    pub fn fit(&self, data: &[Vec<f64>]) -> Option<KMeansFit> {
        if data.is_empty() || self.n_clusters == 0 || self.n_clusters > data.len() {
            return None;
        }

        let mut rng = Pcg32::seed_from_u64(self.seed);
        let mut best: Option<KMeansFit> = None;
        for _ in 0..self.restarts.max(1) {
            let fit = self.fit_once(data, &mut rng);
            if best.as_ref().is_none_or(|b| fit.inertia < b.inertia) {
                best = Some(fit);
            }
        }

        best.map(relabel_by_first_appearance)
    }

    fn fit_once(&self, data: &[Vec<f64>], rng: &mut Pcg32) -> KMeansFit {
        let mut centroids = kmeans_plus_plus(data, self.n_clusters, rng);
        let mut labels = assign(data, &centroids);
        let mut n_iter = 0;

        while n_iter < self.max_iter {
            n_iter += 1;
            let updated = update_centroids(data, &labels, &centroids);
            let shift = centroids
                .iter()
                .zip(&updated)
                .map(|(old, new)| squared_distance(old, new))
                .sum::<f64>();
            centroids = updated;
            let new_labels = assign(data, &centroids);
            let stable = new_labels == labels;
            labels = new_labels;
            if stable || shift <= self.tolerance {
                break;
            }
        }

        let inertia = data
            .iter()
            .zip(&labels)
            .map(|(row, &label)| squared_distance(row, &centroids[label]))
            .sum();

        KMeansFit {
            labels,
            centroids,
            inertia,
            n_iter,
        }
    }
}

fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum()
}

fn nearest_centroid(row: &[f64], centroids: &[Vec<f64>]) -> usize {
    centroids
        .iter()
        .enumerate()
        .map(|(index, centroid)| (index, squared_distance(row, centroid)))
        .min_by(|(_, a), (_, b)| a.total_cmp(b))
        .map_or(0, |(index, _)| index)
}

fn assign(data: &[Vec<f64>], centroids: &[Vec<f64>]) -> Vec<usize> {
    data.iter()
        .map(|row| nearest_centroid(row, centroids))
        .collect()
}

/// Empty clusters keep their previous centroid.
#[expect(clippy::cast_precision_loss)]
fn update_centroids(data: &[Vec<f64>], labels: &[usize], previous: &[Vec<f64>]) -> Vec<Vec<f64>> {
    let width = previous.first().map_or(0, Vec::len);
    let mut sums = vec![vec![0.0; width]; previous.len()];
    let mut counts = vec![0_usize; previous.len()];
    for (row, &label) in data.iter().zip(labels) {
        counts[label] += 1;
        for (sum, value) in sums[label].iter_mut().zip(row) {
            *sum += value;
        }
    }

    sums.into_iter()
        .zip(counts)
        .zip(previous)
        .map(|((sum, count), previous)| {
            if count == 0 {
                previous.clone()
            } else {
                sum.into_iter().map(|s| s / count as f64).collect()
            }
        })
        .collect()
}

/// k-means++ seeding: each new centroid is drawn with probability
/// proportional to its squared distance from the nearest chosen centroid.
fn kmeans_plus_plus(data: &[Vec<f64>], k: usize, rng: &mut Pcg32) -> Vec<Vec<f64>> {
    let mut centroids = Vec::with_capacity(k);
    centroids.push(data[rng.random_range(0..data.len())].clone());

    while centroids.len() < k {
        let weights = data
            .iter()
            .map(|row| {
                centroids
                    .iter()
                    .map(|c| squared_distance(row, c))
                    .fold(f64::INFINITY, f64::min)
            })
            .collect::<Vec<_>>();
        let total = weights.iter().sum::<f64>();

        let chosen = if total > 0.0 {
            let mut target = rng.random::<f64>() * total;
            weights
                .iter()
                .position(|&w| {
                    target -= w;
                    target < 0.0
                })
                .unwrap_or(data.len() - 1)
        } else {
            // every row already coincides with a centroid
            rng.random_range(0..data.len())
        };
        centroids.push(data[chosen].clone());
    }

    centroids
}

fn relabel_by_first_appearance(fit: KMeansFit) -> KMeansFit {
    let mut mapping = vec![None; fit.centroids.len()];
    let mut next = 0;
    for &label in &fit.labels {
        if mapping[label].is_none() {
            mapping[label] = Some(next);
            next += 1;
        }
    }
    for slot in &mut mapping {
        if slot.is_none() {
            *slot = Some(next);
            next += 1;
        }
    }
    let mapping = mapping.into_iter().flatten().collect::<Vec<_>>();

    let mut centroids = vec![vec![]; fit.centroids.len()];
    for (old, centroid) in fit.centroids.into_iter().enumerate() {
        centroids[mapping[old]] = centroid;
    }

    KMeansFit {
        labels: fit.labels.iter().map(|&label| mapping[label]).collect(),
        centroids,
        inertia: fit.inertia,
        n_iter: fit.n_iter,
    }
}
