use crate::debug::format_rect_vec;
use crate::error::{Error, Result};
use derive_builder::Builder;
use faer::prelude::Solve;
use faer::{Mat, MatRef};
use num_complex::Complex64;

/// Modal analysis options.
#[derive(Debug, Clone, Builder)]
#[builder(default)]
pub struct ModalOpt {
    /// Number of critical eigenvalues retained when the whole spectrum has
    /// non-negative real part.
    pub n_modes: usize,
    /// Number of top-ranked buses retained per critical mode.
    pub n_buses: usize,
}

impl Default for ModalOpt {
    fn default() -> Self {
        Self {
            n_modes: 1,
            n_buses: 5,
        }
    }
}

/// Which critical-mode selection rule applied to this spectrum.
///
/// The two rules are not mathematically equivalent and are kept as distinct
/// tagged branches: a spectrum with any negative-real-part eigenvalue flags
/// voltage instability and the single most negative mode is retained, while
/// a wholly non-negative spectrum is screened by eigenvalue magnitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeSelection {
    /// Every eigenvalue has non-negative real part; the `n_modes` smallest
    /// by magnitude are the critical modes.
    AllNonNegative,
    /// At least one eigenvalue has negative real part; only the single most
    /// negative one is retained, regardless of `n_modes`.
    HasNegative,
}

/// One critical eigenmode with its bus participation.
#[derive(Debug, Clone)]
pub struct CriticalMode {
    /// Position of this eigenvalue in [`ModalReport::eigenvalues`].
    pub eig_index: usize,
    pub eigenvalue: Complex64,

    /// Raw and max-normalized participation factors for every PQ bus,
    /// in the input PQ ordering.
    pub raw_pf: Vec<f64>,
    pub normalized_pf: Vec<f64>,

    /// Top-ranked buses by descending normalized participation factor,
    /// their positions in the PQ ordering, and their factors.
    pub critical_buses: Vec<usize>,
    pub pf_indices: Vec<usize>,
    pub largest_normalized_pf: Vec<f64>,
    pub largest_raw_pf: Vec<f64>,
}

/// Result of the modal analysis of one Jacobian block.
#[derive(Debug, Clone)]
pub struct ModalReport {
    pub selection: ModeSelection,
    pub modes: Vec<CriticalMode>,
    /// The full spectrum in the order returned by the eigensolver.
    pub eigenvalues: Vec<Complex64>,
}

/// Eigen-decomposes a (square) Jacobian block, usually J4, and identifies
/// the critical mode(s) and the participation factor of each PQ bus.
///
/// `pq` supplies the bus ids for the block's rows/columns; participation
/// factor k of a mode is `|u_k| * |w_k|` where `u` and `w` are the right and
/// left eigenvectors of that mode, normalized within the mode so the largest
/// factor is 1.0. Left eigenvectors are taken as the rows of the inverse of
/// the right eigenvector matrix.
pub fn modal_analysis(j: MatRef<'_, f64>, pq: &[usize], opt: &ModalOpt) -> Result<ModalReport> {
    let n = j.nrows();
    debug_assert_eq!(n, j.ncols());
    debug_assert_eq!(n, pq.len());

    let jc = Mat::<Complex64>::from_fn(n, n, |i, k| Complex64::new(j[(i, k)], 0.0));
    let evd = jc.as_ref().eigen().map_err(|_| Error::NonConvergentEigen)?;

    let right = evd.U();
    let s = evd.S().column_vector().to_owned();
    let eigenvalues: Vec<Complex64> = (0..n).map(|i| s[i]).collect();
    log::debug!("eigenvalues: {}", format_rect_vec(&eigenvalues));

    // W U = I, so row i of W is the left eigenvector of mode i.
    let left = right.partial_piv_lu().solve(Mat::<Complex64>::identity(n, n));
    for i in 0..n {
        for k in 0..n {
            let z = left[(i, k)];
            if !z.re.is_finite() || !z.im.is_finite() {
                return Err(Error::SingularMatrix);
            }
        }
    }

    let (selection, critical) = select_modes(&eigenvalues, opt.n_modes);
    log::debug!("selection {:?}: modes {:?}", selection, critical);

    let modes = critical
        .into_iter()
        .map(|eig_index| {
            let raw_pf: Vec<f64> = (0..n)
                .map(|k| right[(k, eig_index)].norm() * left[(eig_index, k)].norm())
                .collect();

            let max_pf = raw_pf.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let normalized_pf: Vec<f64> = if max_pf > 0.0 {
                raw_pf.iter().map(|p| p / max_pf).collect()
            } else {
                raw_pf.clone()
            };

            // rank descending; stable, so equal factors keep PQ order
            let mut pf_indices: Vec<usize> = (0..n).collect();
            pf_indices.sort_by(|&a, &b| normalized_pf[b].total_cmp(&normalized_pf[a]));
            pf_indices.truncate(opt.n_buses);

            CriticalMode {
                eig_index,
                eigenvalue: eigenvalues[eig_index],
                critical_buses: pf_indices.iter().map(|&i| pq[i]).collect(),
                largest_normalized_pf: pf_indices.iter().map(|&i| normalized_pf[i]).collect(),
                largest_raw_pf: pf_indices.iter().map(|&i| raw_pf[i]).collect(),
                pf_indices,
                raw_pf,
                normalized_pf,
            }
        })
        .collect();

    Ok(ModalReport {
        selection,
        modes,
        eigenvalues,
    })
}

/// Inverse of a dense real block, or `SingularMatrix` when no inverse is
/// available. Callers are expected to skip the operating condition rather
/// than abort on the error.
pub fn try_inverse(m: MatRef<'_, f64>) -> Result<Mat<f64>> {
    let n = m.nrows();
    debug_assert_eq!(n, m.ncols());

    let inv = m.partial_piv_lu().solve(Mat::<f64>::identity(n, n));
    for i in 0..n {
        for k in 0..n {
            if !inv[(i, k)].is_finite() {
                return Err(Error::SingularMatrix);
            }
        }
    }
    Ok(inv)
}

/// Applies the two-branch critical-mode rule to a spectrum.
fn select_modes(eigenvalues: &[Complex64], n_modes: usize) -> (ModeSelection, Vec<usize>) {
    if eigenvalues.iter().all(|e| e.re >= 0.0) {
        let mut order: Vec<usize> = (0..eigenvalues.len()).collect();
        order.sort_by(|&a, &b| eigenvalues[a].norm().total_cmp(&eigenvalues[b].norm()));
        order.truncate(n_modes);
        (ModeSelection::AllNonNegative, order)
    } else {
        let most_negative = eigenvalues
            .iter()
            .enumerate()
            .filter(|(_, e)| e.re < 0.0)
            .reduce(|min, e| if e.1.re < min.1.re { e } else { min })
            .map(|(i, _)| i);
        (ModeSelection::HasNegative, most_negative.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diag(values: &[f64]) -> Mat<f64> {
        Mat::from_fn(values.len(), values.len(), |i, k| {
            if i == k {
                values[i]
            } else {
                0.0
            }
        })
    }

    fn assert_near(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{} != {}", a, b);
    }

    #[test]
    fn test_all_nonnegative_picks_smallest_magnitude() -> anyhow::Result<()> {
        let j = diag(&[9.0, 2.0, 7.0, 4.0]);
        let pq = vec![101, 102, 103, 104];
        let opt = ModalOptBuilder::default()
            .n_modes(2)
            .n_buses(1)
            .build()?;

        let report = modal_analysis(j.as_ref(), &pq, &opt)?;

        assert_eq!(report.selection, ModeSelection::AllNonNegative);
        assert_eq!(report.modes.len(), 2);
        assert_near(report.modes[0].eigenvalue.re, 2.0);
        assert_eq!(report.modes[0].critical_buses, vec![102]);
        assert_near(report.modes[1].eigenvalue.re, 4.0);
        assert_eq!(report.modes[1].critical_buses, vec![104]);
        Ok(())
    }

    #[test]
    fn test_negative_real_part_overrides_magnitude() -> anyhow::Result<()> {
        // -0.5 is the smallest magnitude, but -2 is the most negative and
        // must win; n_modes is not honored in this branch.
        let j = diag(&[5.0, -2.0, 3.0, -0.5]);
        let pq = vec![101, 102, 103, 104];
        let opt = ModalOptBuilder::default()
            .n_modes(3)
            .n_buses(1)
            .build()?;

        let report = modal_analysis(j.as_ref(), &pq, &opt)?;

        assert_eq!(report.selection, ModeSelection::HasNegative);
        assert_eq!(report.modes.len(), 1);
        assert_near(report.modes[0].eigenvalue.re, -2.0);
        assert_eq!(report.modes[0].critical_buses, vec![102]);
        Ok(())
    }

    #[test]
    fn test_participation_factors_normalized() -> anyhow::Result<()> {
        // non-diagonal symmetric block with a strictly positive spectrum
        let j = Mat::<f64>::from_fn(3, 3, |i, k| match (i, k) {
            (0, 0) => 4.0,
            (1, 1) => 3.0,
            (2, 2) => 2.0,
            (0, 1) | (1, 0) => 1.0,
            (1, 2) | (2, 1) => 1.0,
            _ => 0.0,
        });
        let opt = ModalOpt::default();

        let report = modal_analysis(j.as_ref(), &[1, 2, 3], &opt)?;

        for mode in &report.modes {
            let max = mode
                .normalized_pf
                .iter()
                .copied()
                .fold(f64::NEG_INFINITY, f64::max);
            assert_near(max, 1.0);
            assert!(mode.normalized_pf.iter().all(|&p| (0.0..=1.0 + 1e-12).contains(&p)));
        }
        Ok(())
    }

    #[test]
    fn test_try_inverse() -> anyhow::Result<()> {
        let m = Mat::<f64>::from_fn(2, 2, |i, k| if i == k { 2.0 } else { 1.0 });
        let inv = try_inverse(m.as_ref())?;

        // m * inv == I
        let prod = &m * &inv;
        for i in 0..2 {
            for k in 0..2 {
                let expect = if i == k { 1.0 } else { 0.0 };
                assert!((prod[(i, k)] - expect).abs() < 1e-12);
            }
        }

        let singular = Mat::<f64>::from_fn(2, 2, |i, _| if i == 0 { 1.0 } else { 2.0 });
        assert_eq!(
            try_inverse(singular.as_ref()).unwrap_err(),
            crate::error::Error::SingularMatrix
        );
        Ok(())
    }

    #[test]
    fn test_eig_index_points_into_spectrum() -> anyhow::Result<()> {
        let j = diag(&[9.0, 2.0, 7.0]);
        let report = modal_analysis(j.as_ref(), &[1, 2, 3], &ModalOpt::default())?;

        let mode = &report.modes[0];
        assert_near((report.eigenvalues[mode.eig_index] - mode.eigenvalue).norm(), 0.0);
        Ok(())
    }
}
