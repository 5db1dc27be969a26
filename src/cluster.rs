use std::collections::HashMap;

/// Clustering options.
#[derive(Debug, Clone)]
pub struct ClusterOpt {
    /// Minimum sequence-similarity ratio for an operating condition's
    /// critical-bus list to join a cluster (inclusive).
    pub similarity: f64,

    /// Upper bound on the number of clusters formed. When the bound is hit
    /// the remaining lists are left unclustered; this is silent truncation,
    /// not an error.
    pub max_clusters: usize,
}

impl Default for ClusterOpt {
    fn default() -> Self {
        Self {
            similarity: 0.8,
            max_clusters: 1000,
        }
    }
}

/// A group of recurrently critical buses merged from one or more operating
/// conditions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cluster {
    /// Union of the member lists' bus ids, in first-seen order.
    pub buses: Vec<usize>,
    /// How many operating conditions were merged, the seeding one included.
    pub merged: usize,
}

/// Merges per-operating-condition critical-bus lists into clusters.
///
/// Greedy single pass: the first list not yet consumed seeds a new cluster;
/// every other remaining list whose similarity ratio against the seed is at
/// least `opt.similarity` is merged into it and removed from the pool.
/// Empty input lists are ignored. Similarity is always measured against the
/// seed list, not the growing cluster.
pub fn cluster_critical_buses(per_oc: &[Vec<usize>], opt: &ClusterOpt) -> Vec<Cluster> {
    let mut consumed: Vec<bool> = per_oc.iter().map(|l| l.is_empty()).collect();
    let mut clusters = Vec::new();

    for _ in 0..opt.max_clusters {
        let Some(seed) = consumed.iter().position(|&c| !c) else {
            return clusters;
        };
        consumed[seed] = true;

        let mut buses = per_oc[seed].clone();
        let mut merged = 1;

        for oc in 0..per_oc.len() {
            if consumed[oc] {
                continue;
            }
            if sequence_ratio(&per_oc[seed], &per_oc[oc]) >= opt.similarity {
                consumed[oc] = true;
                merged += 1;
                for &bus in &per_oc[oc] {
                    if !buses.contains(&bus) {
                        buses.push(bus);
                    }
                }
            }
        }

        clusters.push(Cluster { buses, merged });
    }

    if consumed.iter().any(|&c| !c) {
        log::debug!(
            "cluster cap {} reached with lists remaining; stopping early",
            opt.max_clusters
        );
    }
    clusters
}

/// Ratcliff/Obershelp similarity of two sequences: `2*M / (len(a)+len(b))`
/// where M is the total size of the matching blocks found by recursively
/// splitting around the longest common block. 1.0 iff the sequences are
/// identical, 0.0 if they share no elements.
pub fn sequence_ratio(a: &[usize], b: &[usize]) -> f64 {
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    2.0 * match_count(a, b) as f64 / total as f64
}

fn match_count(a: &[usize], b: &[usize]) -> usize {
    let (i, j, size) = longest_match(a, b);
    if size == 0 {
        return 0;
    }
    size + match_count(&a[..i], &b[..j]) + match_count(&a[i + size..], &b[j + size..])
}

/// Finds the longest block common to `a` and `b`, earliest in `a` (then in
/// `b`) on ties. Returns (start in a, start in b, length).
fn longest_match(a: &[usize], b: &[usize]) -> (usize, usize, usize) {
    let mut best = (0, 0, 0);

    // lengths of runs ending at each position of b for the previous row
    let mut run_len: HashMap<usize, usize> = HashMap::new();
    for (i, &av) in a.iter().enumerate() {
        let mut next: HashMap<usize, usize> = HashMap::new();
        for (j, &bv) in b.iter().enumerate() {
            if av == bv {
                let k = if j == 0 {
                    1
                } else {
                    run_len.get(&(j - 1)).copied().unwrap_or(0) + 1
                };
                next.insert(j, k);
                if k > best.2 {
                    best = (i + 1 - k, j + 1 - k, k);
                }
            }
        }
        run_len = next;
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ratio() {
        assert_eq!(sequence_ratio(&[1, 2, 3], &[1, 2, 3]), 1.0);
        assert_eq!(sequence_ratio(&[1, 2, 3], &[4, 5, 6]), 0.0);
        assert_eq!(sequence_ratio(&[1, 2, 3, 4], &[2, 3, 4, 5]), 0.75);
        assert_eq!(sequence_ratio(&[], &[]), 1.0);
        assert_eq!(sequence_ratio(&[1], &[]), 0.0);
    }

    #[test]
    fn test_identical_lists_merge() {
        let opt = ClusterOpt {
            similarity: 1.0,
            ..Default::default()
        };
        let clusters = cluster_critical_buses(&[vec![7, 8], vec![7, 8]], &opt);

        assert_eq!(
            clusters,
            vec![Cluster {
                buses: vec![7, 8],
                merged: 2
            }]
        );
    }

    #[test]
    fn test_disjoint_lists_stay_separate() {
        let opt = ClusterOpt {
            similarity: 1.0,
            ..Default::default()
        };
        let clusters = cluster_critical_buses(&[vec![1, 2], vec![3, 4]], &opt);

        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0].buses, vec![1, 2]);
        assert_eq!(clusters[0].merged, 1);
        assert_eq!(clusters[1].buses, vec![3, 4]);
        assert_eq!(clusters[1].merged, 1);
    }

    #[test]
    fn test_merge_unions_in_first_seen_order() {
        let opt = ClusterOpt {
            similarity: 0.5,
            ..Default::default()
        };
        let clusters = cluster_critical_buses(&[vec![1, 2, 3], vec![2, 3, 4]], &opt);

        assert_eq!(
            clusters,
            vec![Cluster {
                buses: vec![1, 2, 3, 4],
                merged: 2
            }]
        );
    }

    #[test]
    fn test_empty_lists_ignored() {
        let opt = ClusterOpt::default();
        let clusters = cluster_critical_buses(&[vec![], vec![5, 6], vec![]], &opt);

        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].buses, vec![5, 6]);
        assert_eq!(clusters[0].merged, 1);
    }

    #[test]
    fn test_cluster_cap_stops_early() {
        let opt = ClusterOpt {
            similarity: 1.0,
            max_clusters: 2,
        };
        let clusters = cluster_critical_buses(&[vec![1], vec![2], vec![3]], &opt);
        assert_eq!(clusters.len(), 2);
    }
}
