//! `cameras.txt` parsing.
//!
//! Each record is `CAMERA_ID MODEL WIDTH HEIGHT PARAMS[]`. Only the pinhole
//! part of the parameter list is kept; distortion terms are ignored.

use super::{is_skippable, raw_lines};
use crate::error::DataError;
use crate::types::{CameraId, Intrinsics};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{debug, info, warn};

/// Models whose parameter list starts with `fx fy cx cy`.
/// Everything else is read as `f cx cy`.
const SEPARATE_FOCAL_MODELS: &[&str] = &[
    "PINHOLE",
    "OPENCV",
    "OPENCV_FISHEYE",
    "FULL_OPENCV",
    "FOV",
    "THIN_PRISM_FISHEYE",
];

/// Index of the first intrinsic parameter in a record.
const PARAMS_START: usize = 4;

/// Parse intrinsics records from any buffered reader.
///
/// Malformed records are skipped with a warning; an empty source yields an
/// empty map.
pub fn parse_intrinsics<R: BufRead>(reader: R) -> Result<HashMap<CameraId, Intrinsics>, DataError> {
    let mut cameras = HashMap::new();

    for (index, bytes) in raw_lines(reader).enumerate() {
        let bytes = bytes?;
        if is_skippable(&bytes) {
            continue;
        }
        let line_no = index + 1;
        let Ok(line) = String::from_utf8(bytes) else {
            warn!("Skipping camera record on line {}: not valid UTF-8", line_no);
            continue;
        };

        match parse_camera_line(&line) {
            Ok((camera_id, intrinsics)) => {
                if !intrinsics.is_valid() {
                    warn!(
                        "Skipping camera {} on line {}: focal length must be positive and finite: {:?}",
                        camera_id,
                        line_no,
                        line.trim()
                    );
                    continue;
                }
                if cameras.insert(camera_id, intrinsics).is_some() {
                    warn!(
                        "Duplicate camera id {} on line {}, keeping the later record",
                        camera_id, line_no
                    );
                }
            }
            Err(reason) => {
                warn!(
                    "Skipping malformed camera record on line {} ({}): {:?}",
                    line_no,
                    reason,
                    line.trim()
                );
            }
        }
    }

    debug!("Parsed {} camera intrinsics", cameras.len());
    Ok(cameras)
}

/// Load intrinsics from a `cameras.txt` file.
#[tracing::instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn load_intrinsics<P: AsRef<Path>>(path: P) -> Result<HashMap<CameraId, Intrinsics>, DataError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| DataError::io(path, e))?;
    let cameras = parse_intrinsics(BufReader::new(file)).map_err(|e| e.at_path(path))?;
    info!("Loaded {} cameras from {}", cameras.len(), path.display());
    Ok(cameras)
}

fn parse_camera_line(line: &str) -> Result<(CameraId, Intrinsics), String> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() < PARAMS_START + 3 {
        return Err(format!(
            "expected at least {} fields, found {}",
            PARAMS_START + 3,
            parts.len()
        ));
    }

    let camera_id: CameraId = parts[0]
        .parse()
        .map_err(|_| format!("invalid camera id {:?}", parts[0]))?;
    let model = parts[1].to_string();
    let width = parse_dimension(parts[2]);
    let height = parse_dimension(parts[3]);

    // Only the pinhole prefix of the parameter list is read; distortion terms
    // and anything after them are ignored.
    let separate_focal = SEPARATE_FOCAL_MODELS.contains(&model.as_str());
    let wanted = if separate_focal { 4 } else { 3 };
    let Some(fields) = parts.get(PARAMS_START..PARAMS_START + wanted) else {
        return Err(format!("model {} needs {} parameters", model, wanted));
    };
    let params = fields
        .iter()
        .map(|p| p.parse::<f64>().map_err(|_| format!("invalid parameter {:?}", p)))
        .collect::<Result<Vec<_>, _>>()?;

    let (focal_x, focal_y, principal_x, principal_y) = if separate_focal {
        (params[0], params[1], params[2], params[3])
    } else {
        (params[0], params[0], params[1], params[2])
    };

    Ok((
        camera_id,
        Intrinsics {
            focal_x,
            focal_y,
            principal_x,
            principal_y,
            model,
            width,
            height,
        },
    ))
}

/// Image size is informational; unreadable values become 0.
/// Some exporters write sizes as floats.
fn parse_dimension(field: &str) -> u32 {
    field
        .parse::<u32>()
        .ok()
        .or_else(|| {
            field
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite() && *v >= 0.0)
                .map(|v| v as u32)
        })
        .unwrap_or_else(|| {
            debug!("Unreadable image dimension {:?}, using 0", field);
            0
        })
}
