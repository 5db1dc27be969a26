/// Counts how often each candidate bus appears in the flat list of critical
/// buses gathered across the insecure operating conditions, and returns the
/// `n` most frequent.
///
/// Ties are broken by candidate order, so with equal counts the bus listed
/// earlier in `candidates` ranks first. Returns (counts, bus ids), both in
/// rank order.
pub fn top_n_frequent(
    critical_buses: &[usize],
    candidates: &[usize],
    n: usize,
) -> (Vec<usize>, Vec<usize>) {
    let counts: Vec<usize> = candidates
        .iter()
        .map(|c| critical_buses.iter().filter(|&&b| b == *c).count())
        .collect();

    let mut order: Vec<usize> = (0..candidates.len()).collect();
    order.sort_by(|&a, &b| counts[b].cmp(&counts[a]));
    order.truncate(n);

    (
        order.iter().map(|&i| counts[i]).collect(),
        order.iter().map(|&i| candidates[i]).collect(),
    )
}
