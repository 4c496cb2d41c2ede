//! Read-only lookup of camera intrinsics and per-frame poses.

use crate::colmap::{load_intrinsics, load_poses};
use crate::error::DataError;
use crate::types::{CameraId, CameraPose, Intrinsics};
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

/// Intrinsics source for a registry.
#[derive(Debug, Clone)]
enum CameraTable {
    /// Per-camera intrinsics from `cameras.txt`.
    PerCamera(HashMap<CameraId, Intrinsics>),
    /// One set of intrinsics used for every camera id.
    Shared(Intrinsics),
}

/// Camera intrinsics and frame poses for one run.
///
/// Built once, then shared immutably by every track worker.
#[derive(Debug, Clone)]
pub struct PoseRegistry {
    cameras: CameraTable,
    poses: HashMap<String, CameraPose>,
}

impl PoseRegistry {
    pub fn new(intrinsics: HashMap<CameraId, Intrinsics>, poses: HashMap<String, CameraPose>) -> Self {
        Self {
            cameras: CameraTable::PerCamera(intrinsics),
            poses,
        }
    }

    /// Registry where every frame uses the same intrinsics, regardless of
    /// the camera id recorded in its pose.
    pub fn with_shared_intrinsics(intrinsics: Intrinsics, poses: HashMap<String, CameraPose>) -> Self {
        Self {
            cameras: CameraTable::Shared(intrinsics),
            poses,
        }
    }

    /// Load `cameras.txt` and `images.txt`.
    pub fn load<P: AsRef<Path>, Q: AsRef<Path>>(cameras: P, images: Q) -> Result<Self, DataError> {
        let intrinsics = load_intrinsics(cameras)?;
        let poses = load_poses(images)?;
        info!(
            "Pose registry ready: {} cameras, {} frames",
            intrinsics.len(),
            poses.len()
        );
        Ok(Self::new(intrinsics, poses))
    }

    pub fn pose(&self, frame: &str) -> Option<&CameraPose> {
        self.poses.get(frame)
    }

    /// Registry key and pose for `frame`; the key outlives the query string.
    pub fn pose_entry(&self, frame: &str) -> Option<(&str, &CameraPose)> {
        self.poses
            .get_key_value(frame)
            .map(|(key, pose)| (key.as_str(), pose))
    }

    pub fn contains_frame(&self, frame: &str) -> bool {
        self.poses.contains_key(frame)
    }

    pub fn intrinsics(&self, camera_id: CameraId) -> Option<&Intrinsics> {
        match &self.cameras {
            CameraTable::PerCamera(table) => table.get(&camera_id),
            CameraTable::Shared(intrinsics) => Some(intrinsics),
        }
    }

    pub fn frame_count(&self) -> usize {
        self.poses.len()
    }

    pub fn camera_count(&self) -> usize {
        match &self.cameras {
            CameraTable::PerCamera(table) => table.len(),
            CameraTable::Shared(_) => 1,
        }
    }

    /// Frame names in the registry, in no particular order.
    pub fn frames(&self) -> impl Iterator<Item = &str> {
        self.poses.keys().map(String::as_str)
    }
}
