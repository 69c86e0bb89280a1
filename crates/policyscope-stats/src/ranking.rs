use crate::percentiles::percentile_of_score;

/// Sort direction for [`rank_by_value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankOrder {
    /// Largest value gets rank 1.
    HigherIsBetter,
    /// Smallest value gets rank 1.
    LowerIsBetter,
}

impl RankOrder {
    #[must_use]
    pub fn from_higher_is_better(higher_is_better: bool) -> Self {
        if higher_is_better {
            Self::HigherIsBetter
        } else {
            Self::LowerIsBetter
        }
    }
}

/// One position in a ranking.
#[derive(Debug, Clone, PartialEq)]
pub struct Rank {
    /// 1-based rank.
    pub rank: usize,
    /// Position of the value in the input series.
    pub index: usize,
    pub value: f64,
    /// Percentage of the series less than or equal to `value`.
    pub percentile: f64,
}

/// Ranks a series of values.
///
/// Ties keep their original relative order, so ranks are always the
/// permutation `1..=n`. The percentile is independent of the sort direction.
///
/// # Examples
///
/// ```
/// use policyscope_stats::ranking::{RankOrder, rank_by_value};
///
/// let ranks = rank_by_value(&[30.0, 90.0, 60.0, 90.0], RankOrder::HigherIsBetter);
///
/// let order = ranks.iter().map(|r| r.index).collect::<Vec<_>>();
/// assert_eq!(order, [1, 3, 2, 0]);
/// assert_eq!(ranks[0].rank, 1);
/// assert_eq!(ranks[0].percentile, 100.0);
/// assert_eq!(ranks[3].percentile, 25.0);
/// ```
#[must_use]
pub fn rank_by_value(values: &[f64], order: RankOrder) -> Vec<Rank> {
    let mut indexed = values.iter().copied().enumerate().collect::<Vec<_>>();
    // `sort_by` is stable, which gives the tie-break by original order
    match order {
        RankOrder::HigherIsBetter => indexed.sort_by(|(_, a), (_, b)| b.total_cmp(a)),
        RankOrder::LowerIsBetter => indexed.sort_by(|(_, a), (_, b)| a.total_cmp(b)),
    }

    indexed
        .into_iter()
        .enumerate()
        .map(|(position, (index, value))| Rank {
            rank: position + 1,
            index,
            value,
            percentile: percentile_of_score(values, value),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank_sum_and_monotonic_percentile() {
        let values = [55.0, 12.0, 87.0, 55.0, 40.0, 99.0, 3.0];
        let ranks = rank_by_value(&values, RankOrder::HigherIsBetter);

        let n = values.len();
        assert_eq!(ranks.iter().map(|r| r.rank).sum::<usize>(), n * (n + 1) / 2);

        // Walking down a higher-is-better ranking visits values in
        // non-increasing order, so percentiles must not increase either.
        for pair in ranks.windows(2) {
            assert!(pair[0].value >= pair[1].value);
            assert!(pair[0].percentile >= pair[1].percentile);
        }
    }

    #[test]
    fn test_ties_keep_original_order() {
        let ranks = rank_by_value(&[5.0, 5.0, 5.0], RankOrder::HigherIsBetter);
        assert_eq!(
            ranks.iter().map(|r| (r.rank, r.index)).collect::<Vec<_>>(),
            [(1, 0), (2, 1), (3, 2)]
        );
        assert!(ranks.iter().all(|r| r.percentile == 100.0));

        let ranks = rank_by_value(&[5.0, 1.0, 5.0], RankOrder::LowerIsBetter);
        assert_eq!(
            ranks.iter().map(|r| r.index).collect::<Vec<_>>(),
            [1, 0, 2]
        );
    }

    #[test]
    fn test_empty_series() {
        assert!(rank_by_value(&[], RankOrder::LowerIsBetter).is_empty());
    }
}
