//! PLY vertex data structures

use glam::DVec3;

/// Vertex read back from an exported PLY file.
#[derive(Debug, Clone, PartialEq)]
pub struct PlyVertex {
    pub position: DVec3,
    /// RGB color, 0-255.
    pub color: [u8; 3],
}
