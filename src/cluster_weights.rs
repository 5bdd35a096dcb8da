use std::collections::{BTreeMap, HashMap};

/// Default decay rate for [`cluster_weights`].
pub const DEFAULT_DECAY_RATE: f64 = 0.7;

/// Default floor applied before normalisation.
pub const DEFAULT_MIN_WEIGHT: f64 = 0.1;

/// Normalized weight per cluster id.
pub type ClusterWeightTable = BTreeMap<usize, f64>;

/// Weight clusters by population rank with exponential decay.
///
/// Clusters are ranked by document count, largest first, with ties going
/// to the lower cluster id. Rank `r` gets `max(min_weight, decay_rate^r)`
/// and the weights are then scaled to sum to 1, so the most populous
/// cluster always carries the largest weight. Empty input gives an empty
/// table.
///
/// # Examples
///
/// ```
/// use reportscope::cluster_weights::cluster_weights;
///
/// let weights = cluster_weights(&[0, 0, 0, 1, 1, 2], 0.5, 0.1);
/// assert!(weights[&0] > weights[&1] && weights[&1] > weights[&2]);
/// let total: f64 = weights.values().sum();
/// assert!((total - 1.0).abs() < 1e-9);
/// ```
pub fn cluster_weights(
    assignments: &[usize],
    decay_rate: f64,
    min_weight: f64,
) -> ClusterWeightTable {
    let mut counts: HashMap<usize, usize> = HashMap::new();
    for &cluster in assignments {
        *counts.entry(cluster).or_insert(0) += 1;
    }

    let mut ranked: Vec<(usize, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

    let raw: Vec<(usize, f64)> = ranked
        .iter()
        .enumerate()
        .map(|(rank, &(cluster, _))| {
            (cluster, min_weight.max(decay_rate.powi(rank as i32)))
        })
        .collect();

    let total: f64 = raw.iter().map(|(_, w)| w).sum();
    raw.into_iter().map(|(c, w)| (c, w / total)).collect()
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn empty_input_gives_empty_table() {
        assert!(cluster_weights(&[], 0.6, 0.1).is_empty());
    }

    #[test]
    fn single_cluster_takes_everything() {
        let weights = cluster_weights(&[4, 4, 4], 0.6, 0.1);
        assert_eq!(weights.len(), 1);
        assert!((weights[&4] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn decay_by_rank() {
        // Sizes: cluster 2 -> 3, cluster 0 -> 2, cluster 1 -> 1.
        let weights = cluster_weights(&[2, 0, 2, 1, 0, 2], 0.5, 0.1);
        let total = 1.0 + 0.5 + 0.25;
        assert!((weights[&2] - 1.0 / total).abs() < 1e-12);
        assert!((weights[&0] - 0.5 / total).abs() < 1e-12);
        assert!((weights[&1] - 0.25 / total).abs() < 1e-12);
    }

    #[test]
    fn floor_applies_before_normalising() {
        // Ranks 0..3 with decay 0.2: 1, 0.2, 0.04 -> floored to 0.1.
        let weights = cluster_weights(&[0, 0, 0, 1, 1, 2], 0.2, 0.1);
        let total = 1.0 + 0.2 + 0.1;
        assert!((weights[&2] - 0.1 / total).abs() < 1e-12);
    }

    #[test]
    fn ties_go_to_lower_cluster_id() {
        let weights = cluster_weights(&[1, 0, 1, 0], 0.5, 0.1);
        assert!(weights[&0] > weights[&1]);
    }

    proptest! {
        #[test]
        fn weights_are_positive_and_sum_to_one(
            assignments in prop::collection::vec(0usize..6, 1..60),
            decay in 0.05f64..0.95,
            floor in 0.01f64..0.5,
        ) {
            let weights = cluster_weights(&assignments, decay, floor);
            let total: f64 = weights.values().sum();
            prop_assert!((total - 1.0).abs() < 1e-9);
            for w in weights.values() {
                prop_assert!(*w > 0.0 && *w <= 1.0);
            }
        }

        #[test]
        fn largest_cluster_gets_largest_weight(
            assignments in prop::collection::vec(0usize..6, 1..60),
            decay in 0.05f64..0.95,
        ) {
            let weights = cluster_weights(&assignments, decay, 0.1);
            let mut counts: HashMap<usize, usize> = HashMap::new();
            for &c in &assignments {
                *counts.entry(c).or_insert(0) += 1;
            }
            let (&largest, _) = counts
                .iter()
                .max_by(|a, b| a.1.cmp(b.1).then(b.0.cmp(a.0)))
                .unwrap();
            let max_weight =
                weights.values().copied().fold(f64::MIN, f64::max);
            prop_assert_eq!(weights[&largest], max_weight);
        }
    }
}
