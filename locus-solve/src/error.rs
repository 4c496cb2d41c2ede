//! Error types for triangulation and the batch pipeline.

use locus_data::DataError;
use thiserror::Error;

/// Per-track failure. The pipeline logs these and drops the track.
#[derive(Debug, Error)]
pub enum TriangulationError {
    #[error("need at least 2 rays, got {0}")]
    TooFewRays(usize),

    #[error("least-squares solve failed: {0}")]
    Solve(&'static str),

    #[error("solution is not finite")]
    NonFinite,
}

/// Run-level failure; aborts the batch step.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Data(#[from] DataError),

    #[error("no camera intrinsics: pass a cameras file or fallback intrinsics")]
    NoIntrinsics,

    #[error("invalid fallback intrinsics {0:?}: focal lengths must be positive")]
    InvalidIntrinsics([f64; 4]),

    #[error("box size must be positive and finite, got {0}")]
    InvalidBoxSize(f64),
}
