//! `images.txt` parsing.
//!
//! Every registered image occupies two lines:
//!
//! ```text
//! IMAGE_ID QW QX QY QZ TX TY TZ CAMERA_ID NAME
//! POINTS2D[] as (X, Y, POINT3D_ID)
//! ```
//!
//! The second line may be empty when an image has no observations, so the
//! parser consumes records as fixed pairs instead of relying on blank lines.

use super::{is_skippable, raw_lines};
use crate::error::DataError;
use crate::types::{CameraId, CameraPose};
use glam::{DQuat, DVec3};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{debug, info, warn};

const POSE_FIELDS: usize = 10;

/// Parse pose records from any buffered reader, keyed by image name.
pub fn parse_poses<R: BufRead>(reader: R) -> Result<HashMap<String, CameraPose>, DataError> {
    let mut poses = HashMap::new();
    let mut lines = raw_lines(reader).enumerate();

    while let Some((index, bytes)) = lines.next() {
        let bytes = bytes?;
        if is_skippable(&bytes) {
            continue;
        }
        let line_no = index + 1;

        // The auxiliary observation line belongs to this record whether or
        // not the record itself parses. It is never decoded.
        if let Some((_, aux)) = lines.next() {
            aux?;
        }

        let Ok(line) = String::from_utf8(bytes) else {
            warn!("Skipping pose record on line {}: not valid UTF-8", line_no);
            continue;
        };

        match parse_pose_line(&line) {
            Ok((name, pose)) => {
                if poses.insert(name.clone(), pose).is_some() {
                    warn!(
                        "Duplicate frame {:?} on line {}, keeping the later pose",
                        name, line_no
                    );
                }
            }
            Err(reason) => {
                warn!(
                    "Skipping malformed pose record on line {} ({}): {:?}",
                    line_no,
                    reason,
                    line.trim()
                );
            }
        }
    }

    debug!("Parsed {} camera poses", poses.len());
    Ok(poses)
}

/// Load poses from an `images.txt` file.
#[tracing::instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn load_poses<P: AsRef<Path>>(path: P) -> Result<HashMap<String, CameraPose>, DataError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| DataError::io(path, e))?;
    let poses = parse_poses(BufReader::new(file)).map_err(|e| e.at_path(path))?;
    info!("Loaded {} frame poses from {}", poses.len(), path.display());
    Ok(poses)
}

fn parse_pose_line(line: &str) -> Result<(String, CameraPose), String> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() != POSE_FIELDS {
        return Err(format!(
            "expected {} fields, found {}",
            POSE_FIELDS,
            parts.len()
        ));
    }

    let number = |i: usize| -> Result<f64, String> {
        parts[i]
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| format!("invalid number {:?} in field {}", parts[i], i))
    };

    // Stored w-first; glam wants (x, y, z, w).
    let (qw, qx, qy, qz) = (number(1)?, number(2)?, number(3)?, number(4)?);
    let quat = DQuat::from_xyzw(qx, qy, qz, qw);
    let norm = quat.length();
    if norm < 1e-12 {
        return Err("zero-length rotation quaternion".to_string());
    }

    let translation = DVec3::new(number(5)?, number(6)?, number(7)?);
    let camera_id: CameraId = parts[8]
        .parse()
        .map_err(|_| format!("invalid camera id {:?}", parts[8]))?;
    let name = parts[9].to_string();

    Ok((
        name,
        CameraPose::from_quat(quat / norm, translation, camera_id),
    ))
}
