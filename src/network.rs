use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Bus type codes follow the usual power-flow convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BusType {
    /// Load bus: fixed P and Q injection.
    PQ,
    /// Generator bus: fixed P and |V|.
    PV,
    /// Slack/swing bus: fixed |V| and angle.
    REF,
}

/// One branch or transformer record with its series admittance split into
/// conductance and susceptance. Records are logically undirected; the same
/// physical edge may be supplied once or twice (both traversal directions).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Branch {
    pub f_bus: usize,
    pub t_bus: usize,
    pub g: f64,
    pub b: f64,
}

/// Network snapshot for one study: the ordered list of participating buses,
/// their type classification, and the branch admittance list. Bus identity
/// is stable across operating conditions within a study; voltages are not
/// part of the model and arrive per condition as a [`VoltageProfile`].
#[derive(Debug, Clone)]
pub struct Network {
    pub buses: Vec<usize>,
    pub bus_type: HashMap<usize, BusType>,
    pub branches: Vec<Branch>,
}

impl Network {
    pub fn new(buses: Vec<usize>, bus_type: HashMap<usize, BusType>, branches: Vec<Branch>) -> Self {
        Self {
            buses,
            bus_type,
            branches,
        }
    }
}

/// Per-operating-condition bus state: voltage magnitude (pu) and
/// angle (radians), keyed by bus number.
#[derive(Debug, Clone, Default)]
pub struct VoltageProfile {
    state: HashMap<usize, (f64, f64)>,
}

impl VoltageProfile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, bus: usize, vm: f64, va: f64) {
        self.state.insert(bus, (vm, va));
    }

    pub fn get(&self, bus: usize) -> Result<(f64, f64)> {
        self.state.get(&bus).copied().ok_or(Error::MissingBusData(bus))
    }

    pub fn len(&self) -> usize {
        self.state.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.is_empty()
    }
}

impl FromIterator<(usize, (f64, f64))> for VoltageProfile {
    fn from_iter<T: IntoIterator<Item = (usize, (f64, f64))>>(iter: T) -> Self {
        Self {
            state: iter.into_iter().collect(),
        }
    }
}

/// Builds index lists for each type of bus (REF, PV, PQ).
///
/// Buses with no classification entry are treated as PQ. Output lists
/// preserve the network's bus ordering; callers must keep that ordering
/// consistent across calls within one study because Jacobian rows/columns
/// follow it.
pub fn bus_types(net: &Network) -> (Vec<usize>, Vec<usize>, Vec<usize>) {
    let typ = |b: &usize| net.bus_type.get(b).copied().unwrap_or(BusType::PQ);

    let refbus = net
        .buses
        .iter()
        .filter(|b| typ(b) == BusType::REF)
        .copied()
        .collect::<Vec<usize>>();
    let pv = net
        .buses
        .iter()
        .filter(|b| typ(b) == BusType::PV)
        .copied()
        .collect::<Vec<usize>>();
    let pq = net
        .buses
        .iter()
        .filter(|b| typ(b) == BusType::PQ)
        .copied()
        .collect::<Vec<usize>>();

    (refbus, pv, pq)
}

/// Bus number to contiguous matrix position mapping, built once per
/// operating condition so admittance and Jacobian assembly get O(1)
/// position lookups.
#[derive(Debug, Clone)]
pub struct BusIndex {
    e2i: HashMap<usize, usize>,
}

impl BusIndex {
    pub fn new(buses: &[usize]) -> Self {
        Self {
            e2i: buses.iter().enumerate().map(|(i, &b)| (b, i)).collect(),
        }
    }

    pub fn position(&self, bus: usize) -> Result<usize> {
        self.e2i.get(&bus).copied().ok_or(Error::MissingBusData(bus))
    }

    pub fn len(&self) -> usize {
        self.e2i.len()
    }

    pub fn is_empty(&self) -> bool {
        self.e2i.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn net3() -> Network {
        let bus_type = HashMap::from([(1, BusType::REF), (2, BusType::PV), (3, BusType::PQ)]);
        Network::new(vec![1, 2, 3], bus_type, vec![])
    }

    #[test]
    fn test_bus_types() {
        let (refbus, pv, pq) = bus_types(&net3());
        assert_eq!(refbus, vec![1]);
        assert_eq!(pv, vec![2]);
        assert_eq!(pq, vec![3]);
    }

    #[test]
    fn test_unclassified_bus_is_pq() {
        let mut net = net3();
        net.buses.push(4);
        let (_, _, pq) = bus_types(&net);
        assert_eq!(pq, vec![3, 4]);
    }

    #[test]
    fn test_bus_index_positions() {
        let ix = BusIndex::new(&[10, 20, 30]);
        assert_eq!(ix.position(20), Ok(1));
        assert_eq!(ix.position(40), Err(Error::MissingBusData(40)));
    }

    #[test]
    fn test_profile_missing_bus() {
        let mut profile = VoltageProfile::new();
        profile.insert(1, 1.0, 0.0);
        assert_eq!(profile.get(1), Ok((1.0, 0.0)));
        assert_eq!(profile.get(2), Err(Error::MissingBusData(2)));
    }
}
