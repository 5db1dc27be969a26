use crate::cluster::{cluster_critical_buses, Cluster, ClusterOpt};
use crate::error::Result;
use crate::jac::{make_jacobian, JacobianBlocks};
use crate::modal::{modal_analysis, ModalOpt, ModalReport};
use crate::network::{bus_types, Network, VoltageProfile};
use crate::rank::top_n_frequent;
use crate::select::select_critical;

/// Options for a voltage-stability study.
pub struct StudyOpt {
    pub modal: ModalOpt,

    /// Normalized participation factor above which (inclusive) a PQ bus is
    /// reported critical for an operating condition.
    pub pf_threshold: f64,

    pub cluster: ClusterOpt,

    /// Size of the bus frequency table in the study summary.
    pub top_n: usize,
}

impl Default for StudyOpt {
    fn default() -> Self {
        Self {
            modal: ModalOpt::default(),
            pf_threshold: 0.9,
            cluster: ClusterOpt::default(),
            top_n: 5,
        }
    }
}

/// Analysis results for one operating condition.
pub struct ConditionReport {
    /// PQ bus ids, in the network bus ordering. Jacobian J4 rows/columns
    /// and participation factor vectors follow this ordering.
    pub pq: Vec<usize>,
    pub jac: JacobianBlocks,
    pub modal: ModalReport,

    /// Buses of the first critical mode whose normalized participation
    /// factor meets the threshold, in PQ order, with their factors.
    pub critical_buses: Vec<usize>,
    pub critical_pf: Vec<f64>,
}

/// Runs the per-operating-condition analysis: partitions the buses, builds
/// the Jacobian blocks at the supplied voltage state, eigen-decomposes the
/// reduced Q-V block J4 and thresholds the participation factors.
///
/// Errors are recoverable per condition; a batch driver should log them and
/// continue with the next operating condition.
pub fn analyze_condition(
    net: &Network,
    profile: &VoltageProfile,
    opt: &StudyOpt,
) -> Result<ConditionReport> {
    let (_, pv, pq) = bus_types(net);
    let non_slack = [pv, pq.clone()].concat();

    let jac = make_jacobian(&net.branches, profile, &net.buses, &pq, &non_slack)?;
    let modal = modal_analysis(jac.j4.as_ref(), &pq, &opt.modal)?;

    let (critical_buses, critical_pf) = match modal.modes.first() {
        Some(mode) => select_critical(&mode.normalized_pf, &pq, opt.pf_threshold),
        None => (Vec::new(), Vec::new()),
    };
    log::debug!("critical buses: {:?}", critical_buses);

    Ok(ConditionReport {
        pq,
        jac,
        modal,
        critical_buses,
        critical_pf,
    })
}

/// Cross-condition study summary.
pub struct StudySummary {
    pub clusters: Vec<Cluster>,
    pub top_buses: Vec<usize>,
    pub top_frequencies: Vec<usize>,
}

/// Summarizes the critical-bus lists collected over the insecure operating
/// conditions of a study: similarity clusters plus the top-N most frequently
/// critical buses among `pq`.
pub fn summarize_study(per_oc_critical: &[Vec<usize>], pq: &[usize], opt: &StudyOpt) -> StudySummary {
    let clusters = cluster_critical_buses(per_oc_critical, &opt.cluster);

    let flat: Vec<usize> = per_oc_critical.iter().flatten().copied().collect();
    let (top_frequencies, top_buses) = top_n_frequent(&flat, pq, opt.top_n);

    StudySummary {
        clusters,
        top_buses,
        top_frequencies,
    }
}
