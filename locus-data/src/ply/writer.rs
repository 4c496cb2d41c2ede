//! ASCII PLY writers for located tracks.
//!
//! Three layouts are produced:
//! - a point cloud, one vertex per track;
//! - a box mesh, one closed cube (8 vertices, 12 triangles) per track;
//! - a wireframe, one cube outline (8 vertices, 12 edges) per track.

use crate::error::DataError;
use crate::types::{TrackId, TrackPoint};
use glam::DVec3;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use tracing::info;

/// Vertex color used when none is requested.
pub const DEFAULT_COLOR: [u8; 3] = [255, 0, 0];

pub const BOX_VERTICES_PER_POINT: usize = 8;
pub const BOX_FACES_PER_POINT: usize = 12;
pub const WIREFRAME_EDGES_PER_POINT: usize = 12;

// Corner `i` sits at (bit 2, bit 1, bit 0) = (x, y, z) signs.
const CUBE_CORNERS: [[f64; 3]; BOX_VERTICES_PER_POINT] = [
    [-1.0, -1.0, -1.0],
    [-1.0, -1.0, 1.0],
    [-1.0, 1.0, -1.0],
    [-1.0, 1.0, 1.0],
    [1.0, -1.0, -1.0],
    [1.0, -1.0, 1.0],
    [1.0, 1.0, -1.0],
    [1.0, 1.0, 1.0],
];

const CUBE_FACES: [[usize; 3]; BOX_FACES_PER_POINT] = [
    [0, 1, 3],
    [0, 3, 2], // -x
    [4, 6, 7],
    [4, 7, 5], // +x
    [0, 4, 5],
    [0, 5, 1], // -y
    [2, 3, 7],
    [2, 7, 6], // +y
    [0, 2, 6],
    [0, 6, 4], // -z
    [1, 5, 7],
    [1, 7, 3], // +z
];

const CUBE_EDGES: [[usize; 2]; WIREFRAME_EDGES_PER_POINT] = [
    [0, 1],
    [2, 3],
    [4, 5],
    [6, 7],
    [0, 2],
    [1, 3],
    [4, 6],
    [5, 7],
    [0, 4],
    [1, 5],
    [2, 6],
    [3, 7],
];

const TRACK_PALETTE: [[u8; 3]; 8] = [
    [230, 25, 75],
    [60, 180, 75],
    [255, 225, 25],
    [0, 130, 200],
    [245, 130, 48],
    [145, 30, 180],
    [70, 240, 240],
    [240, 50, 230],
];

/// Stable per-track color for wireframe output.
pub fn track_color(track_id: TrackId) -> [u8; 3] {
    TRACK_PALETTE[track_id.rem_euclid(TRACK_PALETTE.len() as TrackId) as usize]
}

fn cube_corners(center: DVec3, box_size: f64) -> impl Iterator<Item = DVec3> {
    let half = box_size * 0.5;
    CUBE_CORNERS
        .iter()
        .map(move |c| center + DVec3::from_array(*c) * half)
}

fn write_header<W: Write>(
    w: &mut W,
    vertices: usize,
    faces: Option<usize>,
    edges: Option<usize>,
) -> io::Result<()> {
    writeln!(w, "ply")?;
    writeln!(w, "format ascii 1.0")?;
    writeln!(w, "comment generated by locus")?;
    writeln!(w, "element vertex {}", vertices)?;
    writeln!(w, "property double x")?;
    writeln!(w, "property double y")?;
    writeln!(w, "property double z")?;
    writeln!(w, "property uchar red")?;
    writeln!(w, "property uchar green")?;
    writeln!(w, "property uchar blue")?;
    if let Some(faces) = faces {
        writeln!(w, "element face {}", faces)?;
        writeln!(w, "property list uchar int vertex_indices")?;
    }
    if let Some(edges) = edges {
        writeln!(w, "element edge {}", edges)?;
        writeln!(w, "property int vertex1")?;
        writeln!(w, "property int vertex2")?;
    }
    writeln!(w, "end_header")
}

// `Display` for f64 prints the shortest string that parses back exactly.
fn write_vertex<W: Write>(w: &mut W, p: DVec3, [r, g, b]: [u8; 3]) -> io::Result<()> {
    writeln!(w, "{} {} {} {} {} {}", p.x, p.y, p.z, r, g, b)
}

/// Write one vertex per point, no faces.
pub fn write_points<W: Write>(mut w: W, points: &[TrackPoint], color: [u8; 3]) -> io::Result<()> {
    write_header(&mut w, points.len(), None, None)?;
    for point in points {
        write_vertex(&mut w, point.position, color)?;
    }
    w.flush()
}

/// Write one closed cube of edge length `box_size` per point.
pub fn write_boxes<W: Write>(
    mut w: W,
    points: &[TrackPoint],
    box_size: f64,
    color: [u8; 3],
) -> io::Result<()> {
    write_header(
        &mut w,
        points.len() * BOX_VERTICES_PER_POINT,
        Some(points.len() * BOX_FACES_PER_POINT),
        None,
    )?;
    for point in points {
        for corner in cube_corners(point.position, box_size) {
            write_vertex(&mut w, corner, color)?;
        }
    }
    for base in (0..points.len()).map(|i| i * BOX_VERTICES_PER_POINT) {
        for [a, b, c] in CUBE_FACES {
            writeln!(w, "3 {} {} {}", base + a, base + b, base + c)?;
        }
    }
    w.flush()
}

/// Write one cube outline of edge length `box_size` per point, colored by track.
pub fn write_wireframe<W: Write>(mut w: W, points: &[TrackPoint], box_size: f64) -> io::Result<()> {
    write_header(
        &mut w,
        points.len() * BOX_VERTICES_PER_POINT,
        None,
        Some(points.len() * WIREFRAME_EDGES_PER_POINT),
    )?;
    for point in points {
        let color = track_color(point.track_id);
        for corner in cube_corners(point.position, box_size) {
            write_vertex(&mut w, corner, color)?;
        }
    }
    for base in (0..points.len()).map(|i| i * BOX_VERTICES_PER_POINT) {
        for [a, b] in CUBE_EDGES {
            writeln!(w, "{} {}", base + a, base + b)?;
        }
    }
    w.flush()
}

fn export_with<F>(path: &Path, write: F) -> Result<(), DataError>
where
    F: FnOnce(BufWriter<File>) -> io::Result<()>,
{
    let file = File::create(path).map_err(|e| DataError::io(path, e))?;
    write(BufWriter::new(file)).map_err(|e| DataError::io(path, e))
}

/// Export a point cloud PLY.
#[tracing::instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn export_points<P: AsRef<Path>>(
    path: P,
    points: &[TrackPoint],
    color: [u8; 3],
) -> Result<(), DataError> {
    let path = path.as_ref();
    export_with(path, |w| write_points(w, points, color))?;
    info!("Saved {} points to {}", points.len(), path.display());
    Ok(())
}

/// Export a box mesh PLY.
#[tracing::instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn export_boxes<P: AsRef<Path>>(
    path: P,
    points: &[TrackPoint],
    box_size: f64,
    color: [u8; 3],
) -> Result<(), DataError> {
    let path = path.as_ref();
    export_with(path, |w| write_boxes(w, points, box_size, color))?;
    info!(
        "Saved {} boxes (size {}) to {}",
        points.len(),
        box_size,
        path.display()
    );
    Ok(())
}

/// Export a wireframe PLY.
#[tracing::instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn export_wireframe<P: AsRef<Path>>(
    path: P,
    points: &[TrackPoint],
    box_size: f64,
) -> Result<(), DataError> {
    let path = path.as_ref();
    export_with(path, |w| write_wireframe(w, points, box_size))?;
    info!(
        "Saved {} wireframe boxes to {}",
        points.len(),
        path.display()
    );
    Ok(())
}
