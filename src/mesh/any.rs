//! Type-erased mesh handle.
//!
//! Generic tooling (an action framework, a processing pipeline) often needs
//! to pass "some supported mesh" around without being generic itself.
//! [`AnyMesh`] wraps every concrete mesh flavor behind one enum; the
//! [`MeshType`] tag lets such tooling dispatch back to the concrete type it
//! was compiled against. The core does not depend on any such framework;
//! only the handle lives here.

use crate::capability::MeshCapabilities;
use crate::index::MeshIndex;

use super::dcel::DcelMesh;
use super::mesh::{PolyMesh, QuadMesh, TriMesh};

/// Tag naming a concrete mesh flavor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MeshType {
    /// [`TriMesh`]: fixed 3-vertex faces.
    Tri,
    /// [`QuadMesh`]: fixed 4-vertex faces.
    Quad,
    /// [`PolyMesh`]: variable-arity faces.
    Poly,
    /// [`DcelMesh`]: half-edge topology.
    Dcel,
}

/// A handle holding any supported concrete mesh.
#[derive(Debug, Clone)]
pub enum AnyMesh<I: MeshIndex = u32> {
    /// A triangle mesh.
    Tri(TriMesh<I>),
    /// A quad mesh.
    Quad(QuadMesh<I>),
    /// A polygon mesh.
    Poly(PolyMesh<I>),
    /// A half-edge mesh.
    Dcel(DcelMesh<I>),
}

impl<I: MeshIndex> AnyMesh<I> {
    /// The tag of the wrapped mesh flavor.
    pub fn mesh_type(&self) -> MeshType {
        match self {
            AnyMesh::Tri(_) => MeshType::Tri,
            AnyMesh::Quad(_) => MeshType::Quad,
            AnyMesh::Poly(_) => MeshType::Poly,
            AnyMesh::Dcel(_) => MeshType::Dcel,
        }
    }

    /// The mesh name, where the flavor carries one.
    pub fn name(&self) -> &str {
        match self {
            AnyMesh::Tri(m) => m.name(),
            AnyMesh::Quad(m) => m.name(),
            AnyMesh::Poly(m) => m.name(),
            AnyMesh::Dcel(_) => "",
        }
    }

    /// Number of live vertices.
    pub fn num_vertices(&self) -> usize {
        match self {
            AnyMesh::Tri(m) => m.num_vertices(),
            AnyMesh::Quad(m) => m.num_vertices(),
            AnyMesh::Poly(m) => m.num_vertices(),
            AnyMesh::Dcel(m) => m.num_vertices(),
        }
    }

    /// Number of live faces.
    pub fn num_faces(&self) -> usize {
        match self {
            AnyMesh::Tri(m) => m.num_faces(),
            AnyMesh::Quad(m) => m.num_faces(),
            AnyMesh::Poly(m) => m.num_faces(),
            AnyMesh::Dcel(m) => m.num_faces(),
        }
    }

    /// The capabilities currently enabled on the wrapped mesh.
    pub fn enabled_capabilities(&self) -> MeshCapabilities {
        match self {
            AnyMesh::Tri(m) => m.enabled_capabilities(),
            AnyMesh::Quad(m) => m.enabled_capabilities(),
            AnyMesh::Poly(m) => m.enabled_capabilities(),
            AnyMesh::Dcel(m) => m.enabled_capabilities(),
        }
    }

    /// Borrow the wrapped triangle mesh, if that is the flavor held.
    pub fn as_tri(&self) -> Option<&TriMesh<I>> {
        match self {
            AnyMesh::Tri(m) => Some(m),
            _ => None,
        }
    }

    /// Borrow the wrapped quad mesh, if that is the flavor held.
    pub fn as_quad(&self) -> Option<&QuadMesh<I>> {
        match self {
            AnyMesh::Quad(m) => Some(m),
            _ => None,
        }
    }

    /// Borrow the wrapped polygon mesh, if that is the flavor held.
    pub fn as_poly(&self) -> Option<&PolyMesh<I>> {
        match self {
            AnyMesh::Poly(m) => Some(m),
            _ => None,
        }
    }

    /// Borrow the wrapped half-edge mesh, if that is the flavor held.
    pub fn as_dcel(&self) -> Option<&DcelMesh<I>> {
        match self {
            AnyMesh::Dcel(m) => Some(m),
            _ => None,
        }
    }
}

impl<I: MeshIndex> From<TriMesh<I>> for AnyMesh<I> {
    fn from(mesh: TriMesh<I>) -> Self {
        AnyMesh::Tri(mesh)
    }
}

impl<I: MeshIndex> From<QuadMesh<I>> for AnyMesh<I> {
    fn from(mesh: QuadMesh<I>) -> Self {
        AnyMesh::Quad(mesh)
    }
}

impl<I: MeshIndex> From<PolyMesh<I>> for AnyMesh<I> {
    fn from(mesh: PolyMesh<I>) -> Self {
        AnyMesh::Poly(mesh)
    }
}

impl<I: MeshIndex> From<DcelMesh<I>> for AnyMesh<I> {
    fn from(mesh: DcelMesh<I>) -> Self {
        AnyMesh::Dcel(mesh)
    }
}

#[cfg(test)]
mod tests {
    use nalgebra::Point3;

    use super::*;

    #[test]
    fn test_tag_and_dispatch() {
        let mut tri = TriMesh::new();
        let v0 = tri.add_vertex(Point3::new(0.0, 0.0, 0.0));
        let v1 = tri.add_vertex(Point3::new(1.0, 0.0, 0.0));
        let v2 = tri.add_vertex(Point3::new(0.0, 1.0, 0.0));
        tri.add_face(&[v0, v1, v2]).unwrap();
        tri.set_name("probe");

        let any: AnyMesh = tri.into();
        assert_eq!(any.mesh_type(), MeshType::Tri);
        assert_eq!(any.name(), "probe");
        assert_eq!(any.num_vertices(), 3);
        assert_eq!(any.num_faces(), 1);
        assert!(any.as_tri().is_some());
        assert!(any.as_poly().is_none());
    }

    #[test]
    fn test_dcel_flavor() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
        ];
        let dcel: DcelMesh = DcelMesh::from_triangles(&vertices, &[[0, 1, 2]]).unwrap();
        let any: AnyMesh = dcel.into();
        assert_eq!(any.mesh_type(), MeshType::Dcel);
        assert!(any
            .enabled_capabilities()
            .has(MeshCapabilities::HALF_EDGES));
    }
}
