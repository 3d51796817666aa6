//! Bulk adjacency computation.
//!
//! Fills the stored adjacency components of an indexed mesh from its face
//! lists. The target component must be enabled first; these functions
//! never enable it themselves.
//!
//! A half-edge mesh never needs any of this: it derives adjacency by
//! walking links, which is why [`DcelMesh`](crate::mesh::DcelMesh)
//! does not carry the stored-adjacency components these functions fill.

use std::collections::HashMap;

use crate::component::{DynRefs, RefList};
use crate::error::{MeshError, Result};
use crate::index::{FaceId, MeshIndex, VertexId};
use crate::mesh::Mesh;

/// Fill every vertex's adjacent-face list with its incident live faces,
/// in face storage order.
pub fn update_vertex_adjacent_faces<R, I>(mesh: &mut Mesh<R, I>) -> Result<()>
where
    R: RefList<VertexId<I>>,
    I: MeshIndex,
{
    if !mesh.vertices().has_adjacent_faces() {
        return Err(MeshError::ComponentNotEnabled {
            component: "vertex adjacent faces",
        });
    }

    let mut lists: Vec<DynRefs<FaceId<I>>> =
        vec![DynRefs::new(); mesh.vertices().slot_count()];
    for (f, face) in mesh.faces().iter() {
        for &c in face.vertices().as_slice() {
            if c.is_valid() {
                lists[c.index()].push(f);
            }
        }
    }
    for v in mesh.vertex_ids().collect::<Vec<_>>() {
        *mesh.vertices_mut().adjacent_faces_mut(v)? =
            std::mem::take(&mut lists[v.index()]);
    }
    Ok(())
}

/// Fill every vertex's adjacent-vertex list with the vertices it shares a
/// face edge with, first-seen order, no duplicates.
pub fn update_vertex_adjacent_vertices<R, I>(mesh: &mut Mesh<R, I>) -> Result<()>
where
    R: RefList<VertexId<I>>,
    I: MeshIndex,
{
    if !mesh.vertices().has_adjacent_vertices() {
        return Err(MeshError::ComponentNotEnabled {
            component: "vertex adjacent vertices",
        });
    }

    let mut lists: Vec<DynRefs<VertexId<I>>> =
        vec![DynRefs::new(); mesh.vertices().slot_count()];
    for (_, face) in mesh.faces().iter() {
        let corners = face.vertices().as_slice();
        let n = corners.len();
        for i in 0..n {
            let a = corners[i];
            let b = corners[(i + 1) % n];
            if !a.is_valid() || !b.is_valid() {
                continue;
            }
            if !lists[a.index()].contains(b) {
                lists[a.index()].push(b);
            }
            if !lists[b.index()].contains(a) {
                lists[b.index()].push(a);
            }
        }
    }
    for v in mesh.vertex_ids().collect::<Vec<_>>() {
        *mesh.vertices_mut().adjacent_vertices_mut(v)? =
            std::mem::take(&mut lists[v.index()]);
    }
    Ok(())
}

/// Fill every face's adjacent-face list, one entry per boundary edge.
///
/// Entry `i` is the face across edge `(i, i+1 mod n)`, or invalid where
/// that edge is a boundary or non-manifold edge.
pub fn update_face_adjacent_faces<R, I>(mesh: &mut Mesh<R, I>) -> Result<()>
where
    R: RefList<VertexId<I>>,
    I: MeshIndex,
{
    if !mesh.faces().has_adjacent_faces() {
        return Err(MeshError::ComponentNotEnabled {
            component: "face adjacent faces",
        });
    }

    // Undirected edge -> incident faces.
    let mut edge_faces: HashMap<(usize, usize), Vec<FaceId<I>>> = HashMap::new();
    for (f, face) in mesh.faces().iter() {
        let corners = face.vertices().as_slice();
        let n = corners.len();
        for i in 0..n {
            let a = corners[i];
            let b = corners[(i + 1) % n];
            if !a.is_valid() || !b.is_valid() {
                continue;
            }
            let key = (a.index().min(b.index()), a.index().max(b.index()));
            edge_faces.entry(key).or_default().push(f);
        }
    }

    let ids: Vec<FaceId<I>> = mesh.face_ids().collect();
    for f in ids {
        let corners: Vec<VertexId<I>> =
            mesh.face(f).vertices().as_slice().to_vec();
        let n = corners.len();
        let mut neighbors = DynRefs::new();
        for i in 0..n {
            let a = corners[i];
            let b = corners[(i + 1) % n];
            let mut neighbor = FaceId::invalid();
            if a.is_valid() && b.is_valid() {
                let key = (a.index().min(b.index()), a.index().max(b.index()));
                if let Some(incident) = edge_faces.get(&key) {
                    // Exactly two incident faces make a manifold edge.
                    if incident.len() == 2 {
                        neighbor = if incident[0] == f {
                            incident[1]
                        } else {
                            incident[0]
                        };
                    }
                }
            }
            neighbors.push(neighbor);
        }
        *mesh.faces_mut().adjacent_faces_mut(f)? = neighbors;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use nalgebra::Point3;

    use super::*;
    use crate::mesh::{build_from_triangles, TriMesh};

    fn quad() -> TriMesh {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        build_from_triangles(&vertices, &[[0, 1, 2], [0, 2, 3]]).unwrap()
    }

    #[test]
    fn test_vertex_adjacent_faces() {
        let mut mesh = quad();
        mesh.vertices_mut().enable_adjacent_faces();
        update_vertex_adjacent_faces(&mut mesh).unwrap();

        // Vertex 0 and 2 touch both faces, 1 and 3 touch one.
        let count = |i: usize| {
            mesh.vertices()
                .adjacent_faces(VertexId::new(i))
                .unwrap()
                .len()
        };
        assert_eq!(count(0), 2);
        assert_eq!(count(1), 1);
        assert_eq!(count(2), 2);
        assert_eq!(count(3), 1);
    }

    #[test]
    fn test_vertex_adjacent_vertices() {
        let mut mesh = quad();
        mesh.vertices_mut().enable_adjacent_vertices();
        update_vertex_adjacent_vertices(&mut mesh).unwrap();

        let mut around0: Vec<usize> = mesh
            .vertices()
            .adjacent_vertices(VertexId::new(0))
            .unwrap()
            .iter()
            .map(|v| v.index())
            .collect();
        around0.sort_unstable();
        assert_eq!(around0, vec![1, 2, 3]);

        let around1: Vec<usize> = mesh
            .vertices()
            .adjacent_vertices(VertexId::new(1))
            .unwrap()
            .iter()
            .map(|v| v.index())
            .collect();
        assert_eq!(around1.len(), 2);
    }

    #[test]
    fn test_face_adjacent_faces_across_shared_edge() {
        let mut mesh = quad();
        mesh.faces_mut().enable_adjacent_faces();
        update_face_adjacent_faces(&mut mesh).unwrap();

        // Face 0 is {0, 1, 2}: its edge (2, 0) is shared with face 1.
        let adj0 = mesh.faces().adjacent_faces(FaceId::new(0)).unwrap();
        assert_eq!(adj0.len(), 3);
        assert!(!adj0.get(0).is_valid()); // edge (0,1): boundary
        assert!(!adj0.get(1).is_valid()); // edge (1,2): boundary
        assert_eq!(adj0.get(2), FaceId::new(1)); // edge (2,0): shared

        let adj1 = mesh.faces().adjacent_faces(FaceId::new(1)).unwrap();
        assert_eq!(adj1.get(0), FaceId::new(0)); // edge (0,2): shared
    }

    #[test]
    fn test_requires_enabled_component() {
        let mut mesh = quad();
        assert!(matches!(
            update_face_adjacent_faces(&mut mesh),
            Err(MeshError::ComponentNotEnabled { .. })
        ));
    }
}
