use thiserror::Error;

/// Analysis errors. All of these are recoverable at the granularity of a
/// single operating condition: a batch driver should log and move on to the
/// next condition rather than abort the sweep.
#[derive(Debug, Error, PartialEq)]
pub enum Error {
    /// A branch record or bus subset references a bus with no voltage/angle
    /// entry (or one missing from the bus ordering).
    #[error("no voltage/angle data for bus {0}")]
    MissingBusData(usize),

    /// The eigendecomposition of the Jacobian block did not converge.
    #[error("eigendecomposition did not converge")]
    NonConvergentEigen,

    /// The right eigenvector matrix could not be inverted, so no left
    /// eigenvectors (and no participation factors) are available.
    #[error("singular matrix: inverse unavailable")]
    SingularMatrix,
}

pub type Result<T> = std::result::Result<T, Error>;
