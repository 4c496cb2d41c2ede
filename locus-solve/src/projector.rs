//! Pinhole back-projection of pixels into world rays.

use crate::ray::Ray;
use glam::DVec3;
use locus_data::{CameraPose, Intrinsics};

/// Back-project a pixel into a world-space ray.
///
/// The pose maps world to camera, so the ray starts at the camera center and
/// a camera-frame direction maps to the world by `Rᵀ`. Callers must reject
/// intrinsics with zero focal length beforehand.
pub fn project(pixel_x: f64, pixel_y: f64, intrinsics: &Intrinsics, pose: &CameraPose) -> Ray {
    let (x_cam, y_cam) = intrinsics.normalize(pixel_x, pixel_y);
    let camera_to_world = pose.rotation.transpose();
    let direction = camera_to_world * DVec3::new(x_cam, y_cam, 1.0);

    Ray {
        origin: pose.center(),
        direction: direction.normalize(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use glam::{DMat3, DQuat};

    fn intrinsics() -> Intrinsics {
        Intrinsics::new(1000.0, 1000.0, 960.0, 540.0)
    }

    #[test]
    fn test_principal_point_looks_down_optical_axis() {
        let pose = CameraPose::from_translation(DVec3::ZERO, 1);
        let ray = project(960.0, 540.0, &intrinsics(), &pose);
        assert!(ray.origin.abs_diff_eq(DVec3::ZERO, 1e-12));
        assert!(ray.direction.abs_diff_eq(DVec3::Z, 1e-12));
    }

    #[test]
    fn test_direction_is_unit() {
        let pose = CameraPose::from_quat(
            DQuat::from_euler(glam::EulerRot::XYZ, 0.3, -0.2, 1.1),
            DVec3::new(4.0, -2.0, 7.0),
            1,
        );
        let ray = project(12.0, 1070.0, &intrinsics(), &pose);
        assert_abs_diff_eq!(ray.direction.length(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_ray_passes_through_observed_point() {
        // Place a camera, project a known world point to a pixel, then check
        // the back-projected ray hits the point.
        let rotation = DQuat::from_rotation_y(0.4) * DQuat::from_rotation_x(-0.1);
        let center = DVec3::new(2.0, -1.0, -3.0);
        let r = DMat3::from_quat(rotation);
        let pose = CameraPose {
            rotation: r,
            translation: -(r * center),
            camera_id: 1,
        };
        let world = DVec3::new(0.5, 0.25, 6.0);
        let cam = r * world + pose.translation;
        let k = Intrinsics::new(800.0, 820.0, 640.0, 360.0);
        let px = k.focal_x * cam.x / cam.z + k.principal_x;
        let py = k.focal_y * cam.y / cam.z + k.principal_y;

        let ray = project(px, py, &k, &pose);
        assert!(ray.origin.abs_diff_eq(center, 1e-9));
        assert_abs_diff_eq!(ray.distance_to(world), 0.0, epsilon = 1e-9);
        assert!((world - ray.origin).dot(ray.direction) > 0.0);
    }

    #[test]
    fn test_origin_for_translated_camera() {
        let pose = CameraPose::from_translation(DVec3::new(-1.0, 0.0, 0.0), 1);
        let ray = project(960.0, 540.0, &intrinsics(), &pose);
        assert!(ray.origin.abs_diff_eq(DVec3::new(1.0, 0.0, 0.0), 1e-12));
    }
}
