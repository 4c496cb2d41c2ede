//! Locus Solve Crate
//!
//! Locates tracked 2D detections in 3D. Each detection is back-projected
//! through its frame's camera into a world ray, rays are grouped per track,
//! and every track is reduced to the point closest (in the least-squares
//! sense) to all of its rays.
//!
//! ## Modules
//!
//! - [`projector`]: pinhole back-projection of pixels into rays
//! - [`resolve`]: tolerant frame name lookup against the pose registry
//! - [`aggregate`]: grouping detections into per-track ray bundles
//! - [`triangulate`]: least-squares multi-ray intersection
//! - [`pipeline`]: the batch step tying inputs and outputs together

pub mod aggregate;
pub mod error;
pub mod pipeline;
pub mod projector;
pub mod ray;
pub mod resolve;
pub mod triangulate;

pub use aggregate::{
    AggregateStats, TrackBundle, TrackGroup, aggregate, aggregate_with_stats, group_tracks,
};
pub use error::{PipelineError, TriangulationError};
pub use pipeline::{FallbackIntrinsics, PipelineConfig, RunSummary, run};
pub use projector::project;
pub use ray::Ray;
pub use resolve::{frame_stem, resolve_frame};
pub use triangulate::{triangulate, triangulate_all, triangulate_bundle};
