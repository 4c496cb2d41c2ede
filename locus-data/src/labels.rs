//! JSON sidecar carrying the class label of every exported point.
//!
//! PLY viewers ignore string properties, so labels travel separately, in the
//! same order as the vertices of the point cloud.

use crate::error::DataError;
use crate::types::{TrackId, TrackPoint};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelRecord {
    pub track_id: TrackId,
    #[serde(rename = "class")]
    pub class_label: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub rays: usize,
    pub rms_residual: f64,
}

impl From<&TrackPoint> for LabelRecord {
    fn from(point: &TrackPoint) -> Self {
        Self {
            track_id: point.track_id,
            class_label: point.class_label.clone(),
            x: point.position.x,
            y: point.position.y,
            z: point.position.z,
            rays: point.ray_count,
            rms_residual: point.rms_residual,
        }
    }
}

/// Write the label records for `points` as a pretty-printed JSON array.
pub fn write_labels<W: Write>(mut w: W, points: &[TrackPoint]) -> io::Result<()> {
    let records: Vec<LabelRecord> = points.iter().map(LabelRecord::from).collect();
    serde_json::to_writer_pretty(&mut w, &records)?;
    w.flush()
}

/// Write the label sidecar for `points`.
#[tracing::instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn export_labels<P: AsRef<Path>>(path: P, points: &[TrackPoint]) -> Result<(), DataError> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|e| DataError::io(path, e))?;
    write_labels(BufWriter::new(file), points).map_err(|e| DataError::io(path, e))?;

    info!("Saved {} labels to {}", points.len(), path.display());
    Ok(())
}

/// Read a label sidecar back.
pub fn load_labels<P: AsRef<Path>>(path: P) -> Result<Vec<LabelRecord>, DataError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| DataError::io(path, e))?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}
