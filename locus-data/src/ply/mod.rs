//! PLY export and loading

mod header;
mod loader;
mod vertex;
mod writer;

pub use header::{PlyElement, PlyHeader, read_header};
pub use loader::load_points_from_ply;
pub use vertex::PlyVertex;
pub use writer::{
    BOX_FACES_PER_POINT, BOX_VERTICES_PER_POINT, DEFAULT_COLOR, WIREFRAME_EDGES_PER_POINT,
    export_boxes, export_points, export_wireframe, track_color, write_boxes, write_points,
    write_wireframe,
};
