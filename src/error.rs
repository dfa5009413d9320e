use thiserror::Error;

/// Errors surfaced at the boundaries of the engine.
///
/// Per the error taxonomy this crate follows: malformed input and resource
/// exhaustion are fatal and bubble up via this type; budget-exceeded,
/// duplicate-tour, and no-legal-move conditions are recovered locally by the
/// searchers and driver and never become an `Error`.
#[derive(Debug, Error)]
pub enum Error {
    #[error("dimension mismatch: expected {expected} nodes, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("node index {0} out of range")]
    NodeOutOfRange(usize),

    #[error("duplicate node id {0} in input section")]
    DuplicateNode(usize),

    #[error("cost matrix is not square: {rows} rows, {cols} cols")]
    MatrixNotSquare { rows: usize, cols: usize },

    #[error("candidate set for node {0} is empty")]
    EmptyCandidateSet(usize),

    #[error("tour order has length {got}, expected {expected}")]
    BadTourOrder { expected: usize, got: usize },

    #[error("tour order is not a permutation of 0..dimension")]
    NotAPermutation,

    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

pub type Result<T> = std::result::Result<T, Error>;
