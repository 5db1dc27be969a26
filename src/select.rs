/// Selects the critical buses of one mode by thresholding its normalized
/// participation factors.
///
/// A PQ bus is critical iff its factor is greater than or equal to
/// `threshold` (inclusive). The output keeps the PQ input ordering, it is
/// not re-sorted by factor. Returns the selected bus ids paired with their
/// factors.
pub fn select_critical(
    normalized_pf: &[f64],
    pq: &[usize],
    threshold: f64,
) -> (Vec<usize>, Vec<f64>) {
    let mut buses = Vec::new();
    let mut factors = Vec::new();

    for (k, &pf) in normalized_pf.iter().enumerate() {
        if pf >= threshold {
            buses.push(pq[k]);
            factors.push(pf);
        }
    }

    (buses, factors)
}

/// Per-bus rank of the normalized participation factors, scaled to [0, 1].
///
/// Rank 0 is the smallest factor; the result divides each rank by the
/// largest rank, so the most participating bus gets exactly 1.0.
pub fn normalized_ranks(normalized_pf: &[f64]) -> Vec<f64> {
    let n = normalized_pf.len();
    if n < 2 {
        return vec![0.0; n];
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| normalized_pf[a].total_cmp(&normalized_pf[b]));

    let mut ranks = vec![0.0; n];
    for (rank, &k) in order.iter().enumerate() {
        ranks[k] = rank as f64 / (n - 1) as f64;
    }
    ranks
}
