//! Core data types shared by the registry, the solver and the exporters.
//!
//! All geometry is double precision; camera poses from structure-from-motion
//! solvers routinely sit far from the origin where f32 loses millimetres.

use glam::{DMat3, DQuat, DVec3};

/// COLMAP camera identifier.
pub type CameraId = u32;

/// Tracker-assigned object identifier.
pub type TrackId = i64;

/// Pinhole intrinsics, without lens distortion.
#[derive(Debug, Clone, PartialEq)]
pub struct Intrinsics {
    pub focal_x: f64,
    pub focal_y: f64,
    pub principal_x: f64,
    pub principal_y: f64,
    /// Camera model tag as written in the source file (e.g. `SIMPLE_RADIAL`).
    pub model: String,
    pub width: u32,
    pub height: u32,
}

impl Intrinsics {
    /// Create pinhole intrinsics with separate focal lengths.
    pub fn new(focal_x: f64, focal_y: f64, principal_x: f64, principal_y: f64) -> Self {
        Self {
            focal_x,
            focal_y,
            principal_x,
            principal_y,
            model: "PINHOLE".to_string(),
            width: 0,
            height: 0,
        }
    }

    /// Create pinhole intrinsics sharing one focal length for both axes.
    pub fn simple(focal: f64, principal_x: f64, principal_y: f64) -> Self {
        Self {
            model: "SIMPLE_PINHOLE".to_string(),
            ..Self::new(focal, focal, principal_x, principal_y)
        }
    }

    /// Map a pixel to normalized image coordinates on the `z = 1` plane.
    pub fn normalize(&self, pixel_x: f64, pixel_y: f64) -> (f64, f64) {
        (
            (pixel_x - self.principal_x) / self.focal_x,
            (pixel_y - self.principal_y) / self.focal_y,
        )
    }

    /// Both focal lengths finite and strictly positive.
    pub fn is_valid(&self) -> bool {
        self.focal_x.is_finite()
            && self.focal_y.is_finite()
            && self.focal_x > 0.0
            && self.focal_y > 0.0
            && self.principal_x.is_finite()
            && self.principal_y.is_finite()
    }
}

/// World-to-camera extrinsics of one registered frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPose {
    /// Orthonormal rotation taking world vectors into the camera frame.
    pub rotation: DMat3,
    /// Translation of the world-to-camera transform.
    pub translation: DVec3,
    pub camera_id: CameraId,
}

impl CameraPose {
    /// Build a pose from a unit quaternion and translation.
    pub fn from_quat(rotation: DQuat, translation: DVec3, camera_id: CameraId) -> Self {
        Self {
            rotation: DMat3::from_quat(rotation),
            translation,
            camera_id,
        }
    }

    /// Identity rotation at the given translation.
    pub fn from_translation(translation: DVec3, camera_id: CameraId) -> Self {
        Self {
            rotation: DMat3::IDENTITY,
            translation,
            camera_id,
        }
    }

    /// Camera optical center in world coordinates, `-Rᵀ t`.
    pub fn center(&self) -> DVec3 {
        -(self.rotation.transpose() * self.translation)
    }
}

/// One tracked observation in one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    /// Frame identifier as it appears in the detection table.
    pub frame: String,
    pub track_id: TrackId,
    pub class_label: String,
    pub pixel_x: f64,
    pub pixel_y: f64,
}

impl Detection {
    pub fn new(
        frame: impl Into<String>,
        track_id: TrackId,
        class_label: impl Into<String>,
        pixel_x: f64,
        pixel_y: f64,
    ) -> Self {
        Self {
            frame: frame.into(),
            track_id,
            class_label: class_label.into(),
            pixel_x,
            pixel_y,
        }
    }
}

/// A located track: one 3D point per surviving track.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackPoint {
    pub track_id: TrackId,
    pub class_label: String,
    /// Position in world space.
    pub position: DVec3,
    /// Number of rays the position was solved from.
    pub ray_count: usize,
    /// Root-mean-square perpendicular distance from the position to its rays.
    pub rms_residual: f64,
}

impl TrackPoint {
    /// Create a point with no solve diagnostics attached.
    pub fn new(track_id: TrackId, class_label: impl Into<String>, position: DVec3) -> Self {
        Self {
            track_id,
            class_label: class_label.into(),
            position,
            ray_count: 0,
            rms_residual: 0.0,
        }
    }
}
