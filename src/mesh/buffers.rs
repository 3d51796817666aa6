//! Flat buffer extraction for the renderer boundary.
//!
//! Renderers consume contiguous arrays, not element containers. These
//! methods derive flat `f32` attribute buffers and `u32` triangle index
//! buffers on demand from the live elements: tombstoned elements are
//! skipped and indices are emitted against the packed live order, so the
//! output is directly uploadable no matter how much garbage the mesh is
//! carrying. Nothing here depends on any rendering types.

use crate::component::RefList;
use crate::error::Result;
use crate::index::{MeshIndex, VertexId};

use super::dcel::DcelMesh;
use super::mesh::Mesh;

// Packed position of every live vertex slot; u32::MAX marks tombstones.
fn packed_order<T>(slots: usize, live: impl Iterator<Item = T>, index: impl Fn(T) -> usize) -> Vec<u32> {
    let mut packed = vec![u32::MAX; slots];
    for (n, item) in live.enumerate() {
        packed[index(item)] = n as u32;
    }
    packed
}

impl<R, I: MeshIndex> Mesh<R, I>
where
    R: RefList<VertexId<I>>,
{
    /// Positions of all live vertices as `[x, y, z]` floats, packed order.
    pub fn positions_f32(&self) -> Vec<[f32; 3]> {
        self.vertices()
            .iter()
            .map(|(_, v)| {
                [
                    v.position.x as f32,
                    v.position.y as f32,
                    v.position.z as f32,
                ]
            })
            .collect()
    }

    /// Normals of all live vertices as `[x, y, z]` floats, packed order.
    ///
    /// Requires the vertex normal component to be enabled.
    pub fn normals_f32(&self) -> Result<Vec<[f32; 3]>> {
        let normals = self.vertices().normals()?;
        Ok(self
            .vertices()
            .ids()
            .map(|id| {
                let n = normals[id.index()];
                [n.x as f32, n.y as f32, n.z as f32]
            })
            .collect())
    }

    /// Colors of all live vertices as `[r, g, b, a]` floats, packed order.
    ///
    /// Requires the vertex color component to be enabled.
    pub fn colors_f32(&self) -> Result<Vec<[f32; 4]>> {
        let colors = self.vertices().colors()?;
        Ok(self
            .vertices()
            .ids()
            .map(|id| colors[id.index()].to_f32_array())
            .collect())
    }

    /// Triangle indices over the packed live vertex order.
    ///
    /// Polygon faces are fan-triangulated around their first corner. Faces
    /// referencing invalid or tombstoned vertices are skipped.
    pub fn triangle_indices(&self) -> Vec<u32> {
        let packed = packed_order(
            self.vertices().slot_count(),
            self.vertices().ids(),
            |id: VertexId<I>| id.index(),
        );

        let mut indices = Vec::new();
        for (_, face) in self.faces().iter() {
            let corners = face.vertices().as_slice();
            if corners.len() < 3 {
                continue;
            }
            let resolved: Option<Vec<u32>> = corners
                .iter()
                .map(|c| {
                    if !c.is_valid() {
                        return None;
                    }
                    let p = packed[c.index()];
                    (p != u32::MAX).then_some(p)
                })
                .collect();
            let Some(resolved) = resolved else { continue };

            for i in 1..resolved.len() - 1 {
                indices.push(resolved[0]);
                indices.push(resolved[i]);
                indices.push(resolved[i + 1]);
            }
        }
        indices
    }
}

impl<I: MeshIndex> DcelMesh<I> {
    /// Positions of all live vertices as `[x, y, z]` floats, packed order.
    pub fn positions_f32(&self) -> Vec<[f32; 3]> {
        self.vertices()
            .map(|(_, v)| {
                [
                    v.position.x as f32,
                    v.position.y as f32,
                    v.position.z as f32,
                ]
            })
            .collect()
    }

    /// Normals of all live vertices as `[x, y, z]` floats, packed order.
    ///
    /// Requires the vertex normal component to be enabled.
    pub fn normals_f32(&self) -> Result<Vec<[f32; 3]>> {
        let normals = self.vertex_normal_slice()?;
        Ok(self
            .vertex_ids()
            .map(|id| {
                let n = normals[id.index()];
                [n.x as f32, n.y as f32, n.z as f32]
            })
            .collect())
    }

    /// Triangle indices over the packed live vertex order.
    ///
    /// Faces referencing tombstoned vertices are skipped.
    pub fn triangle_indices(&self) -> Vec<u32> {
        let packed = packed_order(
            self.vertex_slot_count(),
            self.vertex_ids(),
            |id: VertexId<I>| id.index(),
        );

        let mut indices = Vec::new();
        for f in self.face_ids() {
            let tri = self.face_triangle(f);
            let resolved: Option<Vec<u32>> = tri
                .iter()
                .map(|c| {
                    if !c.is_valid() {
                        return None;
                    }
                    let p = packed[c.index()];
                    (p != u32::MAX).then_some(p)
                })
                .collect();
            if let Some(resolved) = resolved {
                indices.extend_from_slice(&resolved);
            }
        }
        indices
    }
}

#[cfg(test)]
mod tests {
    use nalgebra::Point3;

    use super::super::mesh::TriMesh;
    use crate::component::Color;
    use crate::index::{FaceId, VertexId};

    fn quad() -> TriMesh {
        let mut mesh = TriMesh::new();
        let v0 = mesh.add_vertex(Point3::new(0.0, 0.0, 0.0));
        let v1 = mesh.add_vertex(Point3::new(1.0, 0.0, 0.0));
        let v2 = mesh.add_vertex(Point3::new(1.0, 1.0, 0.0));
        let v3 = mesh.add_vertex(Point3::new(0.0, 1.0, 0.0));
        mesh.add_face(&[v0, v1, v2]).unwrap();
        mesh.add_face(&[v0, v2, v3]).unwrap();
        mesh
    }

    #[test]
    fn test_positions_and_indices() {
        let mesh = quad();
        let positions = mesh.positions_f32();
        assert_eq!(positions.len(), 4);
        assert_eq!(positions[2], [1.0, 1.0, 0.0]);

        let indices = mesh.triangle_indices();
        assert_eq!(indices, vec![0, 1, 2, 0, 2, 3]);
    }

    #[test]
    fn test_indices_follow_packed_order_after_deletion() {
        let mut mesh = quad();
        // Tombstone vertex 1 without compacting: face 0 references it and
        // must be dropped from the index buffer; face 1 re-indexes against
        // the packed order 0->0, 2->1, 3->2.
        mesh.delete_vertex(VertexId::new(1));

        let positions = mesh.positions_f32();
        assert_eq!(positions.len(), 3);

        let indices = mesh.triangle_indices();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn test_colors_require_component() {
        let mut mesh = quad();
        assert!(mesh.colors_f32().is_err());

        mesh.vertices_mut().enable_colors();
        mesh.vertices_mut()
            .set_color(VertexId::new(0), Color::RED)
            .unwrap();
        let colors = mesh.colors_f32().unwrap();
        assert_eq!(colors.len(), 4);
        assert_eq!(colors[0], [1.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_deleted_face_skipped() {
        let mut mesh = quad();
        mesh.delete_face(FaceId::new(0));
        assert_eq!(mesh.triangle_indices(), vec![0, 2, 3]);
    }

    #[test]
    fn test_dcel_buffers() {
        use super::super::dcel::DcelMesh;

        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
        ];
        let mut mesh: DcelMesh = DcelMesh::from_triangles(&vertices, &[[0, 1, 2]]).unwrap();
        assert_eq!(mesh.positions_f32().len(), 3);
        assert_eq!(mesh.triangle_indices(), vec![0, 1, 2]);

        mesh.enable_vertex_normals();
        mesh.update_vertex_normals().unwrap();
        let normals = mesh.normals_f32().unwrap();
        assert_eq!(normals.len(), 3);
        assert!((normals[0][2].abs() - 1.0).abs() < 1e-6);
    }
}
