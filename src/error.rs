use thiserror::Error;

/// Errors raised while building a similarity matrix or running the solver.
#[derive(Error, Debug)]
pub enum ApError {
    /// Zero points, or a zero-sized similarity matrix
    #[error("similarity matrix is empty")]
    Empty,

    /// Similarity input is not n x n
    #[error("similarity matrix must be square, got {rows}x{cols}")]
    NotSquare { rows: usize, cols: usize },

    /// Point vectors of unequal length handed to the similarity builder
    #[error("point {index} has {found} dimensions, expected {expected}")]
    DimensionMismatch {
        index: usize,
        expected: usize,
        found: usize,
    },

    #[error("unknown diagonal policy: {0}")]
    InvalidDiagonal(String),

    #[error("unknown initialization: {0}")]
    InvalidInitialization(String),

    #[error("unable to start worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// A job panicked; the phase it belonged to never completed
    #[error("worker failed during {phase} phase: {message}")]
    WorkerPanic { phase: &'static str, message: String },

    #[error("labels are not available before fit completes")]
    NotFitted,
}

pub type Result<T> = std::result::Result<T, ApError>;
