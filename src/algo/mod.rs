//! Bulk mesh algorithms.
//!
//! Algorithms that fill vertical components from mesh geometry and
//! topology. They follow one discipline: the target component must already
//! be enabled, reads are shared, and writes go only to each element's own
//! slot. The parallel paths rely on exactly that.

mod adjacency;
mod normals;

pub use adjacency::{
    update_face_adjacent_faces, update_vertex_adjacent_faces, update_vertex_adjacent_vertices,
};
pub use normals::{compute_face_normals, compute_vertex_normals, NormalsOptions};
