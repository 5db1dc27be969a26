//! 5-bus fixture: one slack bus, one generator and three PQ buses with no
//! PQ-PQ branches, so at a flat profile J4 is diagonal:
//! diag(-(B31+B32), -B41, -(B51+B52)) = diag(9, 2, 7).

use crate::network::{Branch, BusType, Network, VoltageProfile};
use std::collections::HashMap;

pub fn network() -> Network {
    let bus_type = HashMap::from([
        (1, BusType::REF),
        (2, BusType::PV),
        (3, BusType::PQ),
        (4, BusType::PQ),
        (5, BusType::PQ),
    ]);
    let line = |f_bus, t_bus, g, b| Branch { f_bus, t_bus, g, b };
    let branches = vec![
        line(1, 3, 0.5, -4.0),
        line(2, 3, 0.6, -5.0),
        line(1, 4, 0.2, -2.0),
        line(1, 5, 0.3, -3.0),
        line(2, 5, 0.4, -4.0),
    ];
    Network::new(vec![1, 2, 3, 4, 5], bus_type, branches)
}

pub fn flat() -> (Network, VoltageProfile) {
    let profile = (1..=5).map(|b| (b, (1.0, 0.0))).collect();
    (network(), profile)
}
