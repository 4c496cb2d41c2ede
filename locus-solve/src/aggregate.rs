//! Track aggregation: detections grouped per track and turned into rays.

use crate::projector::project;
use crate::ray::Ray;
use crate::resolve::resolve_frame;
use locus_data::{Detection, PoseRegistry, TrackId};
use std::collections::HashMap;
use tracing::{debug, info, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Minimum number of rays for a track to have a unique intersection.
pub const MIN_RAYS: usize = 2;

/// Detections of one track, in table order.
#[derive(Debug, Clone)]
pub struct TrackGroup<'a> {
    pub track_id: TrackId,
    /// Class of the first detection of the track.
    pub class_label: &'a str,
    pub detections: Vec<&'a Detection>,
}

/// World rays of one track, ready for triangulation.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackBundle {
    pub track_id: TrackId,
    pub class_label: String,
    pub rays: Vec<Ray>,
}

/// Counters describing what aggregation kept and dropped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AggregateStats {
    pub detections: usize,
    pub unresolved_frames: usize,
    pub missing_intrinsics: usize,
    pub tracks_seen: usize,
    pub tracks_too_short: usize,
    pub tracks_kept: usize,
}

/// Group detections by track id, in order of first appearance.
pub fn group_tracks(detections: &[Detection]) -> Vec<TrackGroup<'_>> {
    let mut index: HashMap<TrackId, usize> = HashMap::new();
    let mut groups: Vec<TrackGroup<'_>> = Vec::new();

    for detection in detections {
        let slot = *index.entry(detection.track_id).or_insert_with(|| {
            groups.push(TrackGroup {
                track_id: detection.track_id,
                class_label: &detection.class_label,
                detections: Vec::new(),
            });
            groups.len() - 1
        });
        let group = &mut groups[slot];
        if group.class_label != detection.class_label {
            debug!(
                "Track {} mixes classes {:?} and {:?}, keeping the first",
                group.track_id, group.class_label, detection.class_label
            );
        }
        group.detections.push(detection);
    }

    groups
}

#[derive(Debug, Default)]
struct BundleOutcome {
    bundle: Option<TrackBundle>,
    unresolved_frames: usize,
    missing_intrinsics: usize,
}

fn build_bundle(group: &TrackGroup<'_>, registry: &PoseRegistry) -> BundleOutcome {
    let mut outcome = BundleOutcome::default();
    let mut rays = Vec::with_capacity(group.detections.len());

    for detection in &group.detections {
        let Some(frame) = resolve_frame(&detection.frame, registry) else {
            warn!(
                "Track {}: frame {:?} has no pose (tried exact name and .jpg/.jpeg/.png), skipping detection",
                group.track_id, detection.frame
            );
            outcome.unresolved_frames += 1;
            continue;
        };
        let Some(pose) = registry.pose(frame) else {
            outcome.unresolved_frames += 1;
            continue;
        };
        let Some(intrinsics) = registry.intrinsics(pose.camera_id) else {
            warn!(
                "Track {}: frame {} uses camera {} with no intrinsics, skipping detection",
                group.track_id, frame, pose.camera_id
            );
            outcome.missing_intrinsics += 1;
            continue;
        };
        rays.push(project(detection.pixel_x, detection.pixel_y, intrinsics, pose));
    }

    if rays.len() < MIN_RAYS {
        warn!(
            "Track {} ({}): {} of {} detections resolved, need at least {}, dropping track",
            group.track_id,
            group.class_label,
            rays.len(),
            group.detections.len(),
            MIN_RAYS
        );
        return outcome;
    }

    outcome.bundle = Some(TrackBundle {
        track_id: group.track_id,
        class_label: group.class_label.to_string(),
        rays,
    });
    outcome
}

/// Build one ray bundle per track with at least two resolvable detections.
pub fn aggregate(detections: &[Detection], registry: &PoseRegistry) -> Vec<TrackBundle> {
    aggregate_with_stats(detections, registry).0
}

/// [`aggregate`], also reporting what was dropped.
pub fn aggregate_with_stats(
    detections: &[Detection],
    registry: &PoseRegistry,
) -> (Vec<TrackBundle>, AggregateStats) {
    let groups = group_tracks(detections);

    #[cfg(feature = "parallel")]
    let outcomes: Vec<BundleOutcome> = groups
        .par_iter()
        .map(|group| build_bundle(group, registry))
        .collect();

    #[cfg(not(feature = "parallel"))]
    let outcomes: Vec<BundleOutcome> = groups
        .iter()
        .map(|group| build_bundle(group, registry))
        .collect();

    let mut stats = AggregateStats {
        detections: detections.len(),
        tracks_seen: groups.len(),
        ..Default::default()
    };
    let mut bundles = Vec::with_capacity(outcomes.len());
    for outcome in outcomes {
        stats.unresolved_frames += outcome.unresolved_frames;
        stats.missing_intrinsics += outcome.missing_intrinsics;
        match outcome.bundle {
            Some(bundle) => bundles.push(bundle),
            None => stats.tracks_too_short += 1,
        }
    }
    stats.tracks_kept = bundles.len();

    info!(
        "Aggregated {} detections into {} of {} tracks ({} unresolved frames, {} without intrinsics)",
        stats.detections,
        stats.tracks_kept,
        stats.tracks_seen,
        stats.unresolved_frames,
        stats.missing_intrinsics
    );
    (bundles, stats)
}
