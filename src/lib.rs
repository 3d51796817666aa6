//! # Trellis
//!
//! Composable polygon mesh data structures for geometry processing.
//!
//! Trellis provides mesh types assembled from per-element *components*:
//! mandatory attributes stored inline in every element (position, flags,
//! face vertex references) and optional attributes stored in parallel
//! arrays owned by the element containers, togglable at runtime (normals,
//! colors, quality, tex coords, adjacency, runtime-named custom data).
//!
//! ## Features
//!
//! - **Typed element handles**: references between elements are indices,
//!   so growing a container never invalidates them
//! - **Optional components**: enable exactly the attributes an algorithm
//!   needs, pay nothing for the rest
//! - **Custom components**: attach arbitrarily-typed named attributes at
//!   runtime, with type-checked access
//! - **Deferred deletion**: tombstone elements mid-pass, reclaim space in
//!   one explicit compaction that remaps every stored reference
//! - **Cross-mesh import**: convert between triangle, quad, polygon, and
//!   half-edge flavors, carrying every component both types support
//! - **Flexible indexing**: 16-bit, 32-bit, and 64-bit element indices
//!
//! ## Quick Start
//!
//! ```
//! use trellis::prelude::*;
//! use nalgebra::Point3;
//!
//! // Build a triangle mesh from a face-vertex list
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(1.0, 1.0, 0.0),
//!     Point3::new(0.0, 1.0, 0.0),
//! ];
//! let faces = vec![[0, 1, 2], [0, 2, 3]];
//! let mut mesh: TriMesh = build_from_triangles(&vertices, &faces).unwrap();
//!
//! // Enable an optional component and use it
//! mesh.vertices_mut().enable_colors();
//! mesh.vertices_mut().set_color(VertexId::new(0), Color::RED).unwrap();
//!
//! // Tombstone a face, then reclaim storage
//! mesh.delete_face(FaceId::new(1));
//! let face_map = mesh.compact_faces();
//! assert_eq!(mesh.num_faces(), 1);
//! assert_eq!(face_map.num_removed(), 1);
//!
//! // Vertex data is untouched by face compaction
//! assert_eq!(mesh.vertices().color(VertexId::new(0)).unwrap(), Color::RED);
//! ```
//!
//! ## Custom Components
//!
//! ```
//! use trellis::prelude::*;
//! use nalgebra::Point3;
//!
//! let mut mesh: TriMesh = TriMesh::new();
//! let v = mesh.add_vertex(Point3::origin());
//!
//! mesh.vertices_mut().add_custom::<i32>("flag").unwrap();
//! mesh.vertices_mut().set_custom("flag", v, 4).unwrap();
//! assert_eq!(*mesh.vertices().custom::<i32>("flag", v).unwrap(), 4);
//!
//! // Wrong-type access is a recoverable error, not a crash
//! assert!(mesh.vertices().custom::<f64>("flag", v).is_err());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod algo;
pub mod capability;
pub mod component;
pub mod container;
pub mod error;
pub mod index;
pub mod mesh;

/// Prelude module for convenient imports.
///
/// ```
/// use trellis::prelude::*;
/// ```
pub mod prelude {
    pub use crate::algo::{compute_face_normals, compute_vertex_normals, NormalsOptions};
    pub use crate::capability::MeshCapabilities;
    pub use crate::component::{Color, DynRefs, ElementFlags, FixedRefs, RefList};
    pub use crate::container::{Face, FaceContainer, Vertex, VertexContainer};
    pub use crate::error::{MeshError, Result};
    pub use crate::index::{FaceId, HalfEdgeId, IndexMap, MeshIndex, VertexId};
    pub use crate::mesh::{
        build_from_polygons, build_from_quads, build_from_triangles, AnyMesh, DcelMesh, Mesh,
        MeshType, PolyMesh, QuadMesh, TriMesh,
    };
}

// Re-export nalgebra types for convenience
pub use nalgebra;

#[cfg(test)]
mod tests {
    use super::prelude::*;
    use nalgebra::Point3;

    #[test]
    fn test_two_triangle_quad_scenario() {
        // Build the 2-triangle quad, color vertex 0 red, drop face 1,
        // compact faces, and check nothing else moved.
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let faces = vec![[0, 1, 2], [0, 2, 3]];
        let mut mesh: TriMesh = build_from_triangles(&vertices, &faces).unwrap();

        mesh.vertices_mut().enable_colors();
        mesh.vertices_mut()
            .set_color(VertexId::new(0), Color::RED)
            .unwrap();

        mesh.delete_face(FaceId::new(1));
        mesh.compact_faces();

        assert_eq!(mesh.num_faces(), 1);
        let corners: Vec<usize> = mesh
            .face_vertices(FaceId::new(0))
            .map(|v| v.index())
            .collect();
        assert_eq!(corners, vec![0, 1, 2]);
        for (i, &expected) in vertices[..3].iter().enumerate() {
            assert_eq!(mesh.position(VertexId::new(i)), &expected);
        }
        assert_eq!(
            mesh.vertices().color(VertexId::new(0)).unwrap(),
            Color::RED
        );
    }

    #[test]
    fn test_mesh_flavor_conversion() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
        ];
        let tri: TriMesh = build_from_triangles(&vertices, &[[0, 1, 2]]).unwrap();
        let poly = PolyMesh::import_from(&tri).unwrap();
        let back = TriMesh::import_from(&poly).unwrap();
        assert_eq!(back.num_vertices(), 3);
        assert_eq!(back.num_faces(), 1);
    }
}
