//! PLY point loading, used to check exported files

use crate::error::DataError;
use crate::ply::PlyVertex;
use glam::DVec3;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::{debug, info, warn};

// Face structure for PLY files
#[derive(Deserialize, Debug)]
#[allow(dead_code)]
struct PlyFace {
    vertex_indices: Vec<i32>,
}

// PLY file structure
#[derive(Deserialize, Debug)]
struct PlyFile {
    #[serde(rename = "vertex")]
    vertex: Vec<HashMap<String, JsonValue>>,
    #[serde(default, rename = "face")]
    face: Vec<PlyFace>,
}

/// Load vertex positions and colors from a PLY file.
///
/// Colors default to [`DEFAULT_COLOR`](crate::ply::DEFAULT_COLOR) when the
/// file has no color properties.
#[tracing::instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn load_points_from_ply<P: AsRef<Path>>(path: P) -> Result<Vec<PlyVertex>, DataError> {
    let path = path.as_ref();
    debug!("Loading PLY vertices from: {}", path.display());
    let file = File::open(path).map_err(|e| DataError::io(path, e))?;
    let reader = BufReader::new(file);

    let ply_data: PlyFile = serde_ply::from_reader(reader).map_err(|e| {
        warn!("Failed to parse PLY file: {}", e);
        DataError::Ply(e.to_string())
    })?;

    info!(
        "PLY file parsed: {} vertices, {} faces",
        ply_data.vertex.len(),
        ply_data.face.len()
    );

    fn get_f64(prop: Option<&JsonValue>) -> Option<f64> {
        prop.and_then(JsonValue::as_f64)
    }

    fn get_u8(prop: Option<&JsonValue>) -> Option<u8> {
        prop.and_then(JsonValue::as_u64).map(|u| u.min(255) as u8)
    }

    let mut vertices = Vec::with_capacity(ply_data.vertex.len());
    for (i, vertex) in ply_data.vertex.iter().enumerate() {
        let coord = |name: &str| {
            get_f64(vertex.get(name))
                .ok_or_else(|| DataError::Ply(format!("Missing '{}' at vertex {}", name, i)))
        };
        let position = DVec3::new(coord("x")?, coord("y")?, coord("z")?);

        let color = match (
            get_u8(vertex.get("red")),
            get_u8(vertex.get("green")),
            get_u8(vertex.get("blue")),
        ) {
            (Some(r), Some(g), Some(b)) => [r, g, b],
            _ => crate::ply::DEFAULT_COLOR,
        };

        vertices.push(PlyVertex { position, color });
    }

    debug!("Loaded {} vertices from PLY file", vertices.len());
    Ok(vertices)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ply::{DEFAULT_COLOR, export_boxes, export_points};
    use crate::types::TrackPoint;

    #[test]
    fn test_exported_points_load_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("points.ply");
        let points = vec![
            TrackPoint::new(1, "crack", DVec3::new(0.5, -1.25, 3.0)),
            TrackPoint::new(2, "crack", DVec3::new(2.0, 0.0, 4.5)),
            TrackPoint::new(3, "rust", DVec3::new(-7.0, 1.5, 9.0)),
        ];
        export_points(&path, &points, DEFAULT_COLOR).unwrap();

        let loaded = load_points_from_ply(&path).unwrap();
        assert_eq!(loaded.len(), points.len());
        for (vertex, point) in loaded.iter().zip(&points) {
            assert!(vertex.position.abs_diff_eq(point.position, 1e-12));
            assert_eq!(vertex.color, DEFAULT_COLOR);
        }
    }

    #[test]
    fn test_exported_boxes_load_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("boxes.ply");
        let points = vec![
            TrackPoint::new(1, "crack", DVec3::ZERO),
            TrackPoint::new(2, "crack", DVec3::ONE),
        ];
        export_boxes(&path, &points, 0.2, [0, 255, 0]).unwrap();

        let loaded = load_points_from_ply(&path).unwrap();
        assert_eq!(loaded.len(), 16);
        assert!(loaded.iter().all(|v| v.color == [0, 255, 0]));
    }

    #[test]
    fn test_missing_file() {
        let err = load_points_from_ply("/nonexistent/locus/points.ply").unwrap_err();
        assert!(matches!(err, DataError::Io { .. }));
    }
}
