//! Mesh construction utilities.
//!
//! This module provides functions for building meshes from face-vertex
//! lists as commonly produced by file parsers: a flat vertex position
//! array plus per-face corner index lists.

use nalgebra::Point3;

use super::mesh::{PolyMesh, QuadMesh, TriMesh};
use crate::error::{MeshError, Result};
use crate::index::{MeshIndex, VertexId};

fn validate_face(fi: usize, corners: &[usize], num_vertices: usize) -> Result<()> {
    for &vi in corners {
        if vi >= num_vertices {
            return Err(MeshError::InvalidVertexIndex {
                face: fi,
                vertex: vi,
            });
        }
    }
    for (i, &a) in corners.iter().enumerate() {
        if corners[i + 1..].contains(&a) {
            return Err(MeshError::DegenerateFace { face: fi });
        }
    }
    Ok(())
}

/// Build a triangle mesh from vertices and triangle faces.
///
/// # Arguments
/// * `vertices` - List of vertex positions
/// * `faces` - List of triangle faces, each as `[v0, v1, v2]` indices
///
/// # Example
/// ```
/// use trellis::mesh::{build_from_triangles, TriMesh};
/// use nalgebra::Point3;
///
/// let vertices = vec![
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(0.5, 1.0, 0.0),
/// ];
/// let faces = vec![[0, 1, 2]];
///
/// let mesh: TriMesh = build_from_triangles(&vertices, &faces).unwrap();
/// assert_eq!(mesh.num_vertices(), 3);
/// assert_eq!(mesh.num_faces(), 1);
/// ```
pub fn build_from_triangles<I: MeshIndex>(
    vertices: &[Point3<f64>],
    faces: &[[usize; 3]],
) -> Result<TriMesh<I>> {
    if faces.is_empty() {
        return Err(MeshError::EmptyMesh);
    }
    for (fi, face) in faces.iter().enumerate() {
        validate_face(fi, face, vertices.len())?;
    }

    let mut mesh = TriMesh::with_capacity(vertices.len(), faces.len());
    let ids: Vec<VertexId<I>> = vertices.iter().map(|&p| mesh.add_vertex(p)).collect();
    for face in faces {
        mesh.add_face(&[ids[face[0]], ids[face[1]], ids[face[2]]])?;
    }
    Ok(mesh)
}

/// Build a quad mesh from vertices and quad faces.
///
/// # Arguments
/// * `vertices` - List of vertex positions
/// * `faces` - List of quad faces, each as `[v0, v1, v2, v3]` indices
pub fn build_from_quads<I: MeshIndex>(
    vertices: &[Point3<f64>],
    faces: &[[usize; 4]],
) -> Result<QuadMesh<I>> {
    if faces.is_empty() {
        return Err(MeshError::EmptyMesh);
    }
    for (fi, face) in faces.iter().enumerate() {
        validate_face(fi, face, vertices.len())?;
    }

    let mut mesh = QuadMesh::with_capacity(vertices.len(), faces.len());
    let ids: Vec<VertexId<I>> = vertices.iter().map(|&p| mesh.add_vertex(p)).collect();
    for face in faces {
        mesh.add_face(&[ids[face[0]], ids[face[1]], ids[face[2]], ids[face[3]]])?;
    }
    Ok(mesh)
}

/// Build a polygon mesh from vertices and arbitrary-arity faces.
///
/// Faces with fewer than 3 corners are rejected as degenerate.
pub fn build_from_polygons<I: MeshIndex>(
    vertices: &[Point3<f64>],
    faces: &[Vec<usize>],
) -> Result<PolyMesh<I>> {
    if faces.is_empty() {
        return Err(MeshError::EmptyMesh);
    }
    for (fi, face) in faces.iter().enumerate() {
        if face.len() < 3 {
            return Err(MeshError::DegenerateFace { face: fi });
        }
        validate_face(fi, face, vertices.len())?;
    }

    let mut mesh = PolyMesh::with_capacity(vertices.len(), faces.len());
    let ids: Vec<VertexId<I>> = vertices.iter().map(|&p| mesh.add_vertex(p)).collect();
    for face in faces {
        let corners: Vec<VertexId<I>> = face.iter().map(|&vi| ids[vi]).collect();
        mesh.add_face(&corners)?;
    }
    tracing::debug!(
        vertices = mesh.num_vertices(),
        faces = mesh.num_faces(),
        "built polygon mesh"
    );
    Ok(mesh)
}
