use crate::debug::format_mat;
use crate::error::Result;
use crate::gb::make_gb;
use crate::network::{Branch, BusIndex, VoltageProfile};
use faer::Mat;

/// The four power-flow Jacobian sub-blocks at one operating point.
///
/// With `nns = |non-slack buses|` and `npq = |PQ buses|`:
/// J1 (dP/dVa) is nns x nns, J2 (dP/dVm) is nns x npq,
/// J3 (dQ/dVa) is npq x nns and J4 (dQ/dVm) is npq x npq.
#[derive(Debug, Clone, PartialEq)]
pub struct JacobianBlocks {
    pub j1: Mat<f64>,
    pub j2: Mat<f64>,
    pub j3: Mat<f64>,
    pub j4: Mat<f64>,
}

/// Forms the power-flow Jacobian blocks.
///
/// Rows and columns follow the order of the `non_slack` and `pq` sequences
/// as given; callers must keep one consistent bus ordering for a study.
/// Diagonal terms sum over all buses in `buses` (slack included), so every
/// bus must have a voltage/angle entry in `profile`. The units for all
/// quantities are per unit with radians for voltage angles.
///
/// Pure function of its inputs: the blocks are recomputed fresh for every
/// operating condition, there is no incremental update.
#[allow(non_snake_case)]
pub fn make_jacobian(
    branches: &[Branch],
    profile: &VoltageProfile,
    buses: &[usize],
    pq: &[usize],
    non_slack: &[usize],
) -> Result<JacobianBlocks> {
    let nb = buses.len();
    let index = BusIndex::new(buses);

    let (G, B) = make_gb(branches, &index)?;

    // extract voltage state in bus order
    let mut vm = Vec::with_capacity(nb);
    let mut va = Vec::with_capacity(nb);
    for &bus in buses {
        let (m, a) = profile.get(bus)?;
        vm.push(m);
        va.push(a);
    }

    let ns_pos = non_slack
        .iter()
        .map(|&b| index.position(b))
        .collect::<Result<Vec<usize>>>()?;
    let pq_pos = pq
        .iter()
        .map(|&b| index.position(b))
        .collect::<Result<Vec<usize>>>()?;

    // J1 = dP/dVa over (non-slack, non-slack)
    let mut j1 = Mat::<f64>::zeros(ns_pos.len(), ns_pos.len());
    for (i, &m) in ns_pos.iter().enumerate() {
        for (k, &n) in ns_pos.iter().enumerate() {
            if n == m {
                let mut sum = 0.0;
                for q in 0..nb {
                    let t = va[m] - va[q];
                    sum += vm[m] * vm[q] * (-G[(m, q)] * t.sin() + B[(m, q)] * t.cos());
                }
                j1[(i, k)] = sum - vm[m] * vm[m] * B[(m, m)];
            } else {
                let t = va[m] - va[n];
                j1[(i, k)] = vm[m] * vm[n] * (G[(m, n)] * t.sin() - B[(m, n)] * t.cos());
            }
        }
    }

    // J2 = dP/dVm over (non-slack, PQ)
    let mut j2 = Mat::<f64>::zeros(ns_pos.len(), pq_pos.len());
    for (i, &m) in ns_pos.iter().enumerate() {
        for (k, &n) in pq_pos.iter().enumerate() {
            if n == m {
                let mut sum = 0.0;
                for q in 0..nb {
                    let t = va[m] - va[q];
                    sum += vm[q] * (G[(m, q)] * t.cos() + B[(m, q)] * t.sin());
                }
                j2[(i, k)] = sum + vm[m] * G[(m, m)];
            } else {
                let t = va[m] - va[n];
                j2[(i, k)] = vm[m] * (G[(m, n)] * t.cos() + B[(m, n)] * t.sin());
            }
        }
    }

    // J3 = dQ/dVa over (PQ, non-slack)
    let mut j3 = Mat::<f64>::zeros(pq_pos.len(), ns_pos.len());
    for (i, &m) in pq_pos.iter().enumerate() {
        for (k, &n) in ns_pos.iter().enumerate() {
            if n == m {
                let mut sum = 0.0;
                for q in 0..nb {
                    let t = va[m] - va[q];
                    sum += vm[m] * vm[q] * (G[(m, q)] * t.cos() + B[(m, q)] * t.sin());
                }
                j3[(i, k)] = sum - vm[m] * vm[m] * G[(m, m)];
            } else {
                let t = va[m] - va[n];
                j3[(i, k)] = vm[m] * vm[n] * (-G[(m, n)] * t.cos() - B[(m, n)] * t.sin());
            }
        }
    }

    // J4 = dQ/dVm over (PQ, PQ); the reduced block used for modal analysis
    let mut j4 = Mat::<f64>::zeros(pq_pos.len(), pq_pos.len());
    for (i, &m) in pq_pos.iter().enumerate() {
        for (k, &n) in pq_pos.iter().enumerate() {
            if n == m {
                let mut sum = 0.0;
                for q in 0..nb {
                    let t = va[m] - va[q];
                    sum += vm[q] * (G[(m, q)] * t.sin() - B[(m, q)] * t.cos());
                }
                j4[(i, k)] = sum - vm[m] * B[(m, m)];
            } else {
                let t = va[m] - va[n];
                j4[(i, k)] = vm[m] * (G[(m, n)] * t.sin() - B[(m, n)] * t.cos());
            }
        }
    }

    log::trace!("J4:\n{}", format_mat(j4.as_ref()));

    Ok(JacobianBlocks { j1, j2, j3, j4 })
}
