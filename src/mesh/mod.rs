//! Core mesh types.
//!
//! This module provides the concrete mesh flavors assembled from the
//! element containers, and everything that needs a whole-mesh view:
//! construction, cross-container reference maintenance, cross-mesh import,
//! buffer extraction, and the type-erased handle.
//!
//! # Flavors
//!
//! - [`TriMesh`], [`QuadMesh`]: indexed meshes whose faces have a
//!   compile-time arity ([`Mesh`] over fixed-size reference storage),
//! - [`PolyMesh`]: indexed mesh with variable-arity faces,
//! - [`DcelMesh`]: half-edge topology, adjacency derived by walking links.
//!
//! # Construction
//!
//! Meshes are typically built from face-vertex lists:
//!
//! ```
//! use trellis::mesh::{build_from_triangles, TriMesh};
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.5, 1.0, 0.0),
//! ];
//! let faces = vec![[0, 1, 2]];
//!
//! let mesh: TriMesh = build_from_triangles(&vertices, &faces).unwrap();
//! assert_eq!(mesh.num_vertices(), 3);
//! ```

mod any;
mod buffers;
mod builder;
mod dcel;
#[allow(clippy::module_inception)]
mod mesh;

pub use any::{AnyMesh, MeshType};
pub use builder::{build_from_polygons, build_from_quads, build_from_triangles};
pub use dcel::{
    DcelFace, DcelHalfEdge, DcelMesh, DcelVertex, FaceHalfEdgeIter, VertexHalfEdgeIter,
};
pub use mesh::{Mesh, PolyMesh, QuadMesh, TriMesh};
