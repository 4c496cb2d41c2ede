//! Detection table loading.
//!
//! The table is a CSV file with a header row containing at least
//! `frame, track_id, class, center_x, center_y`. Extra columns are ignored.

use crate::error::DataError;
use crate::types::{Detection, TrackId};
use csv::{ReaderBuilder, StringRecord, Trim};
use serde::Deserialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};

pub const REQUIRED_COLUMNS: [&str; 5] = ["frame", "track_id", "class", "center_x", "center_y"];

#[derive(Debug, Deserialize)]
struct DetectionRow {
    frame: String,
    track_id: String,
    #[serde(rename = "class")]
    class_label: String,
    center_x: f64,
    center_y: f64,
}

/// Parse a detection table from any reader.
///
/// Fails with [`DataError::MissingColumns`] when the header lacks a required
/// column. Rows that do not parse are skipped with a warning.
pub fn parse_detections<R: Read>(reader: R) -> Result<Vec<Detection>, DataError> {
    let mut csv = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers: StringRecord = csv
        .headers()?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim())
        .collect();
    let found: Vec<String> = headers.iter().map(str::to_string).collect();
    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|col| !found.iter().any(|h| h == *col))
        .map(|col| col.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(DataError::MissingColumns { missing, found });
    }
    csv.set_headers(headers);

    let mut detections = Vec::new();
    for (index, row) in csv.deserialize::<DetectionRow>().enumerate() {
        // Header is line 1.
        let line_no = index + 2;
        let row = match row {
            Ok(row) => row,
            Err(e) => {
                warn!("Skipping detection row {}: {}", line_no, e);
                continue;
            }
        };

        let Some(track_id) = parse_track_id(&row.track_id) else {
            warn!(
                "Skipping detection row {}: invalid track id {:?}",
                line_no, row.track_id
            );
            continue;
        };
        if !row.center_x.is_finite() || !row.center_y.is_finite() {
            warn!(
                "Skipping detection row {} (track {}): non-finite center ({}, {})",
                line_no, track_id, row.center_x, row.center_y
            );
            continue;
        }

        detections.push(Detection {
            frame: row.frame,
            track_id,
            class_label: row.class_label,
            pixel_x: row.center_x,
            pixel_y: row.center_y,
        });
    }

    debug!("Parsed {} detections", detections.len());
    Ok(detections)
}

/// Load a detection table from a CSV file.
#[tracing::instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn load_detections<P: AsRef<Path>>(path: P) -> Result<Vec<Detection>, DataError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| DataError::io(path, e))?;
    let detections = parse_detections(file)?;
    info!("Loaded {} detections from {}", detections.len(), path.display());
    Ok(detections)
}

/// Track ids written by dataframe tools may come out as `7.0`.
fn parse_track_id(raw: &str) -> Option<TrackId> {
    raw.parse::<TrackId>().ok().or_else(|| {
        raw.parse::<f64>()
            .ok()
            .filter(|v| v.is_finite() && v.fract() == 0.0)
            .map(|v| v as TrackId)
    })
}
