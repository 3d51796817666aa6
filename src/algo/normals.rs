//! Bulk normal computation.
//!
//! Fills the vertical normal components of an indexed mesh from its
//! geometry. The target slot must be enabled first; the functions fail with
//! [`MeshError::ComponentNotEnabled`] otherwise rather than enabling it
//! behind the caller's back.
//!
//! The parallel path reads shared mesh state and computes into a scratch
//! vector, then writes each element's own slot. No callback ever writes
//! another element's data, which is the contract that makes the
//! parallelism safe without locks.
//!
//! # Example
//!
//! ```
//! use trellis::algo::{compute_face_normals, NormalsOptions};
//! use trellis::mesh::{build_from_triangles, TriMesh};
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.5, 1.0, 0.0),
//! ];
//! let mut mesh: TriMesh = build_from_triangles(&vertices, &[[0, 1, 2]]).unwrap();
//!
//! mesh.faces_mut().enable_normals();
//! compute_face_normals(&mut mesh, &NormalsOptions::default()).unwrap();
//! ```

use nalgebra::{Point3, Vector3};
use rayon::prelude::*;

use crate::component::RefList;
use crate::error::{MeshError, Result};
use crate::index::{FaceId, MeshIndex, VertexId};
use crate::mesh::Mesh;

/// Options for bulk normal computation.
#[derive(Debug, Clone)]
pub struct NormalsOptions {
    /// Whether to use parallel execution (default: true).
    pub parallel: bool,
}

impl Default for NormalsOptions {
    fn default() -> Self {
        Self { parallel: true }
    }
}

impl NormalsOptions {
    /// Set whether to use parallel execution.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Create options for single-threaded execution.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }
}

// Area-weighted polygon normal by Newell's method. Exact for triangles,
// robust for non-planar polygons.
fn polygon_normal(points: &[Point3<f64>]) -> Vector3<f64> {
    let mut n = Vector3::zeros();
    for i in 0..points.len() {
        let p = points[i];
        let q = points[(i + 1) % points.len()];
        n.x += (p.y - q.y) * (p.z + q.z);
        n.y += (p.z - q.z) * (p.x + q.x);
        n.z += (p.x - q.x) * (p.y + q.y);
    }
    n
}

fn normalized_or_zero(n: Vector3<f64>) -> Vector3<f64> {
    let norm = n.norm();
    if norm > 0.0 {
        n / norm
    } else {
        Vector3::zeros()
    }
}

fn face_normal_raw<R, I>(mesh: &Mesh<R, I>, f: FaceId<I>) -> Vector3<f64>
where
    R: RefList<VertexId<I>>,
    I: MeshIndex,
{
    let corners = mesh.face(f).vertices().as_slice();
    if corners.iter().any(|c| !c.is_valid()) {
        return Vector3::zeros();
    }
    let points: Vec<Point3<f64>> = corners.iter().map(|&c| *mesh.position(c)).collect();
    polygon_normal(&points)
}

/// Compute the normal of every live face into the face normal component.
///
/// Faces referencing invalid vertices get a zero normal.
pub fn compute_face_normals<R, I>(mesh: &mut Mesh<R, I>, options: &NormalsOptions) -> Result<()>
where
    R: RefList<VertexId<I>>,
    I: MeshIndex,
{
    if !mesh.faces().has_normals() {
        return Err(MeshError::ComponentNotEnabled {
            component: "face normals",
        });
    }

    let ids: Vec<FaceId<I>> = mesh.face_ids().collect();
    let snapshot: &Mesh<R, I> = &*mesh;
    let normals: Vec<Vector3<f64>> = if options.parallel {
        ids.par_iter()
            .map(|&f| normalized_or_zero(face_normal_raw(snapshot, f)))
            .collect()
    } else {
        ids.iter()
            .map(|&f| normalized_or_zero(face_normal_raw(snapshot, f)))
            .collect()
    };

    for (f, n) in ids.into_iter().zip(normals) {
        mesh.faces_mut().set_normal(f, n)?;
    }
    Ok(())
}

/// Compute the area-weighted normal of every live vertex into the vertex
/// normal component.
///
/// With the vertex adjacent-face component enabled, each vertex gathers
/// from its adjacency list and the work runs element-parallel. Without it,
/// a sequential pass scatters face contributions onto the corner vertices.
pub fn compute_vertex_normals<R, I>(mesh: &mut Mesh<R, I>, options: &NormalsOptions) -> Result<()>
where
    R: RefList<VertexId<I>>,
    I: MeshIndex,
{
    if !mesh.vertices().has_normals() {
        return Err(MeshError::ComponentNotEnabled {
            component: "vertex normals",
        });
    }

    if mesh.vertices().has_adjacent_faces() {
        let ids: Vec<VertexId<I>> = mesh.vertex_ids().collect();
        let snapshot: &Mesh<R, I> = &*mesh;
        let gather = |&v: &VertexId<I>| -> Vector3<f64> {
            let mut sum = Vector3::zeros();
            // Enabled and in range by construction of `ids`.
            if let Ok(adj) = snapshot.vertices().adjacent_faces(v) {
                for f in adj.iter() {
                    if f.is_valid() && !snapshot.faces().is_deleted(f) {
                        sum += face_normal_raw(snapshot, f);
                    }
                }
            }
            normalized_or_zero(sum)
        };

        let normals: Vec<Vector3<f64>> = if options.parallel {
            ids.par_iter().map(gather).collect()
        } else {
            ids.iter().map(gather).collect()
        };

        for (v, n) in ids.into_iter().zip(normals) {
            mesh.vertices_mut().set_normal(v, n)?;
        }
    } else {
        let mut sums = vec![Vector3::zeros(); mesh.vertices().slot_count()];
        for f in mesh.face_ids().collect::<Vec<_>>() {
            let n = face_normal_raw(mesh, f);
            for c in mesh.face(f).vertices().as_slice() {
                if c.is_valid() {
                    sums[c.index()] += n;
                }
            }
        }
        for v in mesh.vertex_ids().collect::<Vec<_>>() {
            mesh.vertices_mut()
                .set_normal(v, normalized_or_zero(sums[v.index()]))?;
        }
    }
    Ok(())
}
