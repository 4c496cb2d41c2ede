//! Least-squares intersection of many rays.
//!
//! For rays `(o_i, d_i)` with unit `d_i`, the point `x` minimizing
//! `Σ |(I - d_i d_iᵀ)(x - o_i)|²` solves the normal equations
//!
//! ```text
//! (Σ P_i) x = Σ P_i o_i,    P_i = I - d_i d_iᵀ
//! ```
//!
//! `Σ P_i` is singular when every ray is parallel, so the system is solved
//! through an SVD that returns the minimum-norm solution instead of failing.

use crate::aggregate::TrackBundle;
use crate::error::TriangulationError;
use crate::ray::Ray;
use glam::{DMat3, DVec3};
use locus_data::TrackPoint;
use nalgebra::{Matrix3, Vector3};
use tracing::{debug, info, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Singular values below this fraction of the largest are treated as zero.
const RELATIVE_RANK_TOLERANCE: f64 = 1e-12;

/// Projector onto the plane orthogonal to unit `d`.
fn orthogonal_projector(d: DVec3) -> DMat3 {
    DMat3::IDENTITY - DMat3::from_cols(d * d.x, d * d.y, d * d.z)
}

/// Point minimizing the summed squared perpendicular distance to `rays`.
///
/// Every direction must already be unit length. Uses all rays.
pub fn triangulate(rays: &[Ray]) -> Result<DVec3, TriangulationError> {
    if rays.len() < 2 {
        return Err(TriangulationError::TooFewRays(rays.len()));
    }

    let (a, b) = normal_equations(rays);
    solve_normal_equations(a, b, rays)
}

/// Accumulate `(Σ P_i, Σ P_i o_i)`.
fn normal_equations(rays: &[Ray]) -> (DMat3, DVec3) {
    rays.iter()
        .fold((DMat3::ZERO, DVec3::ZERO), |(a, b), ray| {
            let p = orthogonal_projector(ray.direction);
            (a + p, b + p * ray.origin)
        })
}

fn solve_normal_equations(a: DMat3, b: DVec3, rays: &[Ray]) -> Result<DVec3, TriangulationError> {
    if a == DMat3::ZERO {
        let mean = rays.iter().map(|r| r.origin).sum::<DVec3>() / rays.len() as f64;
        debug!("Zero normal matrix, using mean of {} origins", rays.len());
        return Ok(mean);
    }
    solve_min_norm(a, b)
}

fn solve_min_norm(a: DMat3, b: DVec3) -> Result<DVec3, TriangulationError> {
    let a = Matrix3::from_column_slice(&a.to_cols_array());
    let b = Vector3::new(b.x, b.y, b.z);

    let svd = a.svd(true, true);
    let eps = svd.singular_values.max() * RELATIVE_RANK_TOLERANCE;
    let rank = svd.singular_values.iter().filter(|s| **s > eps).count();
    if rank < 3 {
        debug!("Rank-deficient ray system (rank {}), using minimum-norm solution", rank);
    }

    let x = svd.solve(&b, eps).map_err(TriangulationError::Solve)?;
    Ok(DVec3::new(x[0], x[1], x[2]))
}

/// Root-mean-square perpendicular distance from `point` to `rays`.
pub fn rms_residual(point: DVec3, rays: &[Ray]) -> f64 {
    if rays.is_empty() {
        return 0.0;
    }
    let sum: f64 = rays.iter().map(|r| r.distance_to(point).powi(2)).sum();
    (sum / rays.len() as f64).sqrt()
}

/// Locate one track.
pub fn triangulate_bundle(bundle: TrackBundle) -> Result<TrackPoint, TriangulationError> {
    let position = triangulate(&bundle.rays)?;
    if !position.is_finite() {
        return Err(TriangulationError::NonFinite);
    }
    Ok(TrackPoint {
        track_id: bundle.track_id,
        rms_residual: rms_residual(position, &bundle.rays),
        ray_count: bundle.rays.len(),
        class_label: bundle.class_label,
        position,
    })
}

fn locate(bundle: TrackBundle) -> Option<TrackPoint> {
    let track_id = bundle.track_id;
    match triangulate_bundle(bundle) {
        Ok(point) => {
            debug!(
                "Track {} ({}) at ({:.4}, {:.4}, {:.4}) from {} rays, rms {:.4}",
                point.track_id,
                point.class_label,
                point.position.x,
                point.position.y,
                point.position.z,
                point.ray_count,
                point.rms_residual
            );
            Some(point)
        }
        Err(e) => {
            warn!("Dropping track {}: {}", track_id, e);
            None
        }
    }
}

/// Locate every bundle, preserving input order. Failed tracks are logged and
/// skipped.
pub fn triangulate_all(bundles: Vec<TrackBundle>) -> Vec<TrackPoint> {
    let total = bundles.len();

    #[cfg(feature = "parallel")]
    let points: Vec<TrackPoint> = bundles.into_par_iter().filter_map(locate).collect();

    #[cfg(not(feature = "parallel"))]
    let points: Vec<TrackPoint> = bundles.into_iter().filter_map(locate).collect();

    info!("Triangulated {} of {} tracks", points.len(), total);
    points
}
