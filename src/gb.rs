use crate::error::Result;
use crate::network::{Branch, BusIndex};
use faer::Mat;

/// Builds the dense conductance and susceptance matrices from the branch
/// admittance list.
///
/// Each record scatters into position (i,j) and is mirrored to (j,i): the
/// input may list a physical edge once or twice (both directions), and
/// plain assignment makes the duplicate form idempotent. Self-admittances
/// appear on the diagonal only when a record has `f_bus == t_bus`.
#[allow(non_snake_case)]
pub fn make_gb(branches: &[Branch], index: &BusIndex) -> Result<(Mat<f64>, Mat<f64>)> {
    let nb = index.len();
    let mut G = Mat::<f64>::zeros(nb, nb);
    let mut B = Mat::<f64>::zeros(nb, nb);

    for br in branches {
        let i = index.position(br.f_bus)?;
        let j = index.position(br.t_bus)?;

        G[(i, j)] = br.g;
        G[(j, i)] = br.g;
        B[(i, j)] = br.b;
        B[(j, i)] = br.b;
    }

    Ok((G, B))
}
