//! Locus Data Crate
//!
//! Input and output formats for locating tracked detections in 3D:
//! COLMAP text camera/pose files, the per-frame detection table, and
//! ASCII PLY export of the resulting points.
//! This crate is solver-agnostic and focuses on parsing and serialization.

pub mod colmap;
pub mod detections;
pub mod error;
pub mod labels;
pub mod ply;
pub mod registry;
pub mod types;

pub use colmap::{load_intrinsics, load_poses, parse_intrinsics, parse_poses};
pub use detections::{load_detections, parse_detections};
pub use error::DataError;
pub use labels::{LabelRecord, export_labels, load_labels, write_labels};
pub use ply::{
    DEFAULT_COLOR, PlyHeader, PlyVertex, export_boxes, export_points, export_wireframe,
    load_points_from_ply, read_header,
};
pub use registry::PoseRegistry;
pub use types::{CameraId, CameraPose, Detection, Intrinsics, TrackId, TrackPoint};
