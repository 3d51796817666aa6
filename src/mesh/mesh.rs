//! Polygonal mesh aggregation.
//!
//! A [`Mesh`] owns one vertex container and one face container plus the
//! mesh-level components (name, transform, texture paths, custom values).
//! The face reference storage is a type parameter, so the concrete mesh
//! flavors are distinct compile-time types:
//!
//! - [`TriMesh`]: every face has exactly 3 vertices,
//! - [`QuadMesh`]: every face has exactly 4 vertices,
//! - [`PolyMesh`]: faces are general polygons.
//!
//! The mesh coordinates what no single container can: after a container
//! compacts, every reference *into* it held by the other container (and by
//! its own adjacency lists) is rewritten through the returned index table.
//! Cross-mesh [`import`](Mesh::import_from) converts between flavors while
//! carrying every component both types support.

use std::path::PathBuf;

use nalgebra::{Matrix4, Point3};

use crate::capability::MeshCapabilities;
use crate::component::{CustomValues, DynRefs, FixedRefs, RefList};
use crate::container::{Face, FaceContainer, Vertex, VertexContainer};
use crate::error::{MeshError, Result};
use crate::index::{FaceId, IndexMap, MeshIndex, VertexId};

/// A polygonal mesh assembled from a vertex and a face container.
///
/// `R` is the per-face vertex reference storage; see the
/// [module docs](self) for the concrete flavors.
#[derive(Debug, Clone)]
pub struct Mesh<R, I: MeshIndex = u32>
where
    R: RefList<VertexId<I>>,
{
    name: String,
    vertices: VertexContainer<I>,
    faces: FaceContainer<R, I>,
    transform: Matrix4<f64>,
    texture_paths: Vec<PathBuf>,
    custom: CustomValues,
}

/// A triangle mesh: every face references exactly 3 vertices.
pub type TriMesh<I = u32> = Mesh<FixedRefs<VertexId<I>, 3>, I>;
/// A quad mesh: every face references exactly 4 vertices.
pub type QuadMesh<I = u32> = Mesh<FixedRefs<VertexId<I>, 4>, I>;
/// A general polygon mesh: faces reference any number of vertices.
pub type PolyMesh<I = u32> = Mesh<DynRefs<VertexId<I>>, I>;

impl<R, I: MeshIndex> Default for Mesh<R, I>
where
    R: RefList<VertexId<I>>,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<R, I: MeshIndex> Mesh<R, I>
where
    R: RefList<VertexId<I>>,
{
    /// Create a new empty mesh.
    pub fn new() -> Self {
        Self {
            name: String::new(),
            vertices: VertexContainer::new(),
            faces: FaceContainer::new(),
            transform: Matrix4::identity(),
            texture_paths: Vec::new(),
            custom: CustomValues::new(),
        }
    }

    /// Create a mesh with pre-allocated capacity.
    pub fn with_capacity(num_vertices: usize, num_faces: usize) -> Self {
        let mut mesh = Self::new();
        mesh.vertices = VertexContainer::with_capacity(num_vertices);
        mesh.faces = FaceContainer::with_capacity(num_faces);
        mesh
    }

    // ==================== Mesh components ====================

    /// The mesh name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Set the mesh name.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// The mesh transform matrix.
    #[inline]
    pub fn transform(&self) -> &Matrix4<f64> {
        &self.transform
    }

    /// Set the mesh transform matrix.
    pub fn set_transform(&mut self, transform: Matrix4<f64>) {
        self.transform = transform;
    }

    /// The texture paths attached to this mesh.
    #[inline]
    pub fn texture_paths(&self) -> &[PathBuf] {
        &self.texture_paths
    }

    /// Append a texture path.
    pub fn add_texture_path(&mut self, path: impl Into<PathBuf>) {
        self.texture_paths.push(path.into());
    }

    /// The per-mesh custom components.
    #[inline]
    pub fn custom_values(&self) -> &CustomValues {
        &self.custom
    }

    /// Mutable access to the per-mesh custom components.
    #[inline]
    pub fn custom_values_mut(&mut self) -> &mut CustomValues {
        &mut self.custom
    }

    // ==================== Containers ====================

    /// The vertex container.
    #[inline]
    pub fn vertices(&self) -> &VertexContainer<I> {
        &self.vertices
    }

    /// Mutable access to the vertex container.
    #[inline]
    pub fn vertices_mut(&mut self) -> &mut VertexContainer<I> {
        &mut self.vertices
    }

    /// The face container.
    #[inline]
    pub fn faces(&self) -> &FaceContainer<R, I> {
        &self.faces
    }

    /// Mutable access to the face container.
    #[inline]
    pub fn faces_mut(&mut self) -> &mut FaceContainer<R, I> {
        &mut self.faces
    }

    // ==================== Accessors ====================

    /// Number of live vertices.
    #[inline]
    pub fn num_vertices(&self) -> usize {
        self.vertices.live_count()
    }

    /// Number of live faces.
    #[inline]
    pub fn num_faces(&self) -> usize {
        self.faces.live_count()
    }

    /// Get a vertex by id.
    ///
    /// # Panics
    /// Panics if the id is invalid or past the end of the container.
    #[inline]
    pub fn vertex(&self, id: VertexId<I>) -> &Vertex<I> {
        self.vertices.vertex(id)
    }

    /// Get a face by id.
    ///
    /// # Panics
    /// Panics if the id is invalid or past the end of the container.
    #[inline]
    pub fn face(&self, id: FaceId<I>) -> &Face<R, I> {
        self.faces.face(id)
    }

    /// Get the position of a vertex.
    #[inline]
    pub fn position(&self, id: VertexId<I>) -> &Point3<f64> {
        self.vertices.position(id)
    }

    /// Set the position of a vertex.
    #[inline]
    pub fn set_position(&mut self, id: VertexId<I>, position: Point3<f64>) {
        self.vertices.set_position(id, position);
    }

    /// Iterate over the ids of all live vertices.
    pub fn vertex_ids(&self) -> impl Iterator<Item = VertexId<I>> + '_ {
        self.vertices.ids()
    }

    /// Iterate over the ids of all live faces.
    pub fn face_ids(&self) -> impl Iterator<Item = FaceId<I>> + '_ {
        self.faces.ids()
    }

    /// Iterate over the corner vertex ids of a face.
    pub fn face_vertices(&self, id: FaceId<I>) -> impl Iterator<Item = VertexId<I>> + '_ {
        self.faces.face(id).vertices().as_slice().iter().copied()
    }

    // ==================== Construction ====================

    /// Add a vertex and return its id.
    pub fn add_vertex(&mut self, position: Point3<f64>) -> VertexId<I> {
        self.vertices.push(position)
    }

    /// Add a face from its corner vertex ids and return its id.
    ///
    /// Every corner must be a valid id of an existing vertex, corners must
    /// be pairwise distinct, and for fixed-arity meshes the corner count
    /// must match the arity.
    pub fn add_face(&mut self, corners: &[VertexId<I>]) -> Result<FaceId<I>> {
        let face_index = self.faces.slot_count();
        for &corner in corners {
            if !corner.is_valid() || corner.index() >= self.vertices.slot_count() {
                return Err(MeshError::InvalidVertexIndex {
                    face: face_index,
                    vertex: corner.index(),
                });
            }
        }
        for (i, &a) in corners.iter().enumerate() {
            if corners[i + 1..].contains(&a) {
                return Err(MeshError::DegenerateFace { face: face_index });
            }
        }
        self.faces.push_from_ids(corners)
    }

    // ==================== Deletion and compaction ====================

    /// Tombstone a vertex. Physical removal happens at compaction.
    pub fn delete_vertex(&mut self, id: VertexId<I>) {
        self.vertices.delete(id);
    }

    /// Tombstone a face. Physical removal happens at compaction.
    pub fn delete_face(&mut self, id: FaceId<I>) {
        self.faces.delete(id);
    }

    /// Compact the vertex container and rewrite every reference to a
    /// vertex held anywhere in the mesh.
    ///
    /// References to removed vertices become invalid. The face container's
    /// element array is untouched. Returns the vertex remap table so
    /// callers can translate vertex ids they hold themselves.
    pub fn compact_vertices(&mut self) -> IndexMap<I> {
        let map = self.vertices.compact();
        if !map.is_identity() {
            self.faces.remap_vertex_refs(&map);
            self.vertices.remap_vertex_refs(&map);
        }
        map
    }

    /// Compact the face container and rewrite every reference to a face
    /// held anywhere in the mesh.
    ///
    /// References to removed faces become invalid. The vertex container's
    /// element array is untouched. Returns the face remap table so callers
    /// can translate face ids they hold themselves.
    pub fn compact_faces(&mut self) -> IndexMap<I> {
        let map = self.faces.compact();
        if !map.is_identity() {
            self.vertices.remap_face_refs(&map);
            self.faces.remap_face_refs(&map);
        }
        map
    }

    /// Compact both containers.
    ///
    /// Returns the vertex and face remap tables. With nothing tombstoned
    /// this is a no-op returning identity tables.
    pub fn garbage_collect(&mut self) -> (IndexMap<I>, IndexMap<I>) {
        let vmap = self.compact_vertices();
        let fmap = self.compact_faces();
        tracing::debug!(
            vertices_removed = vmap.num_removed(),
            faces_removed = fmap.num_removed(),
            "garbage collected mesh"
        );
        (vmap, fmap)
    }

    // ==================== Geometry ====================

    /// Compute the axis-aligned bounding box over live vertices.
    ///
    /// Returns `None` for a mesh with no live vertices.
    pub fn compute_bounding_box(&self) -> Option<(Point3<f64>, Point3<f64>)> {
        let mut iter = self.vertices.iter().map(|(_, v)| v.position);
        let first = iter.next()?;
        let mut min = first;
        let mut max = first;
        for p in iter {
            for i in 0..3 {
                min[i] = min[i].min(p[i]);
                max[i] = max[i].max(p[i]);
            }
        }
        Some((min, max))
    }

    // ==================== Capabilities ====================

    /// The capabilities this mesh *type* can hold.
    pub fn supported_capabilities() -> MeshCapabilities {
        MeshCapabilities::VERTICES
            | MeshCapabilities::VERTEX_NORMALS
            | MeshCapabilities::VERTEX_COLORS
            | MeshCapabilities::VERTEX_QUALITY
            | MeshCapabilities::VERTEX_TEX_COORDS
            | MeshCapabilities::VERTEX_ADJACENT_FACES
            | MeshCapabilities::VERTEX_ADJACENT_VERTICES
            | MeshCapabilities::FACES
            | MeshCapabilities::FACE_NORMALS
            | MeshCapabilities::FACE_COLORS
            | MeshCapabilities::FACE_QUALITY
            | MeshCapabilities::WEDGE_TEX_COORDS
            | MeshCapabilities::FACE_ADJACENT_FACES
    }

    /// The capabilities currently enabled on this mesh instance.
    pub fn enabled_capabilities(&self) -> MeshCapabilities {
        let mut caps = MeshCapabilities::VERTICES | MeshCapabilities::FACES;
        if self.vertices.has_normals() {
            caps = caps.with(MeshCapabilities::VERTEX_NORMALS);
        }
        if self.vertices.has_colors() {
            caps = caps.with(MeshCapabilities::VERTEX_COLORS);
        }
        if self.vertices.has_quality() {
            caps = caps.with(MeshCapabilities::VERTEX_QUALITY);
        }
        if self.vertices.has_tex_coords() {
            caps = caps.with(MeshCapabilities::VERTEX_TEX_COORDS);
        }
        if self.vertices.has_adjacent_faces() {
            caps = caps.with(MeshCapabilities::VERTEX_ADJACENT_FACES);
        }
        if self.vertices.has_adjacent_vertices() {
            caps = caps.with(MeshCapabilities::VERTEX_ADJACENT_VERTICES);
        }
        if self.faces.has_normals() {
            caps = caps.with(MeshCapabilities::FACE_NORMALS);
        }
        if self.faces.has_colors() {
            caps = caps.with(MeshCapabilities::FACE_COLORS);
        }
        if self.faces.has_quality() {
            caps = caps.with(MeshCapabilities::FACE_QUALITY);
        }
        if self.faces.has_wedge_tex_coords() {
            caps = caps.with(MeshCapabilities::WEDGE_TEX_COORDS);
        }
        if self.faces.has_adjacent_faces() {
            caps = caps.with(MeshCapabilities::FACE_ADJACENT_FACES);
        }
        caps
    }

    /// Enable every optional component named in `caps` that this mesh type
    /// supports; capabilities it cannot hold are silently dropped.
    ///
    /// This is the load-side half of codec negotiation: pass the format's
    /// capability set and the mesh ends up with exactly the attributes both
    /// sides can represent.
    pub fn enable_capabilities(&mut self, caps: MeshCapabilities) {
        let caps = caps & Self::supported_capabilities();
        if caps.has(MeshCapabilities::VERTEX_NORMALS) {
            self.vertices.enable_normals();
        }
        if caps.has(MeshCapabilities::VERTEX_COLORS) {
            self.vertices.enable_colors();
        }
        if caps.has(MeshCapabilities::VERTEX_QUALITY) {
            self.vertices.enable_quality();
        }
        if caps.has(MeshCapabilities::VERTEX_TEX_COORDS) {
            self.vertices.enable_tex_coords();
        }
        if caps.has(MeshCapabilities::VERTEX_ADJACENT_FACES) {
            self.vertices.enable_adjacent_faces();
        }
        if caps.has(MeshCapabilities::VERTEX_ADJACENT_VERTICES) {
            self.vertices.enable_adjacent_vertices();
        }
        if caps.has(MeshCapabilities::FACE_NORMALS) {
            self.faces.enable_normals();
        }
        if caps.has(MeshCapabilities::FACE_COLORS) {
            self.faces.enable_colors();
        }
        if caps.has(MeshCapabilities::FACE_QUALITY) {
            self.faces.enable_quality();
        }
        if caps.has(MeshCapabilities::WEDGE_TEX_COORDS) {
            self.faces.enable_wedge_tex_coords();
        }
        if caps.has(MeshCapabilities::FACE_ADJACENT_FACES) {
            self.faces.enable_adjacent_faces();
        }
    }

    // ==================== Cross-mesh import ====================

    /// Build a mesh of this type from a mesh of a possibly different type.
    ///
    /// Live elements are imported in order with fresh contiguous ids (a
    /// tombstoned source element is not carried). Every component enabled
    /// in the source is enabled here and copied; components this type
    /// cannot hold are dropped; components only this type holds stay at
    /// their defaults. Reference components are translated element-wise
    /// through the fresh id assignment.
    ///
    /// Converting into a fixed-arity mesh fails with
    /// [`MeshError::ShapeMismatch`] if any live source face has a
    /// different corner count.
    pub fn import_from<S>(other: &Mesh<S, I>) -> Result<Self>
    where
        S: RefList<VertexId<I>>,
    {
        if let Some(arity) = R::FIXED_SIZE {
            for (id, face) in other.faces.iter() {
                if face.vertex_count() != arity {
                    return Err(MeshError::ShapeMismatch {
                        face: id.index(),
                        expected: arity,
                        actual: face.vertex_count(),
                    });
                }
            }
        }

        let mut mesh = Self::with_capacity(other.num_vertices(), other.num_faces());
        mesh.name = other.name.clone();
        mesh.transform = other.transform;
        mesh.texture_paths = other.texture_paths.clone();
        mesh.custom = other.custom.clone();

        // Vertices, live only, fresh contiguous ids.
        if other.vertices.has_normals() {
            mesh.vertices.enable_normals();
        }
        if other.vertices.has_colors() {
            mesh.vertices.enable_colors();
        }
        if other.vertices.has_quality() {
            mesh.vertices.enable_quality();
        }
        if other.vertices.has_tex_coords() {
            mesh.vertices.enable_tex_coords();
        }
        if other.vertices.has_adjacent_faces() {
            mesh.vertices.enable_adjacent_faces();
        }
        if other.vertices.has_adjacent_vertices() {
            mesh.vertices.enable_adjacent_vertices();
        }

        let mut vmap = IndexMap::with_removed(other.vertices.slot_count());
        for (old_id, vert) in other.vertices.iter() {
            let new_id = mesh.vertices.push(vert.position);
            vmap.set(old_id.index(), new_id.index());
            *mesh.vertices.vertex_mut(new_id).flags_mut() = vert.flags();

            if other.vertices.has_normals() {
                mesh.vertices.set_normal(new_id, other.vertices.normal(old_id)?)?;
            }
            if other.vertices.has_colors() {
                mesh.vertices.set_color(new_id, other.vertices.color(old_id)?)?;
            }
            if other.vertices.has_quality() {
                mesh.vertices.set_quality(new_id, other.vertices.quality(old_id)?)?;
            }
            if other.vertices.has_tex_coords() {
                mesh.vertices
                    .set_tex_coord(new_id, other.vertices.tex_coord(old_id)?)?;
            }
            // Adjacency lists are copied verbatim and translated below,
            // once both remap tables are complete.
            if other.vertices.has_adjacent_faces() {
                *mesh.vertices.adjacent_faces_mut(new_id)? =
                    other.vertices.adjacent_faces(old_id)?.clone();
            }
            if other.vertices.has_adjacent_vertices() {
                *mesh.vertices.adjacent_vertices_mut(new_id)? =
                    other.vertices.adjacent_vertices(old_id)?.clone();
            }
        }

        let vertex_keep: Vec<usize> = other.vertices.iter().map(|(id, _)| id.index()).collect();
        let mut vertex_custom = other.vertices.custom_components().clone();
        vertex_custom.retain_indices(&vertex_keep);
        *mesh.vertices.custom_components_mut() = vertex_custom;

        // Faces, live only, corner references translated through vmap.
        if other.faces.has_normals() {
            mesh.faces.enable_normals();
        }
        if other.faces.has_colors() {
            mesh.faces.enable_colors();
        }
        if other.faces.has_quality() {
            mesh.faces.enable_quality();
        }
        if other.faces.has_wedge_tex_coords() {
            mesh.faces.enable_wedge_tex_coords();
        }
        if other.faces.has_adjacent_faces() {
            mesh.faces.enable_adjacent_faces();
        }

        let mut fmap = IndexMap::with_removed(other.faces.slot_count());
        for (old_id, face) in other.faces.iter() {
            let mut verts = R::default();
            verts.import_refs(face.vertices());
            verts.remap(&vmap);
            let new_id = mesh.faces.push(verts);
            fmap.set(old_id.index(), new_id.index());
            *mesh.faces.face_mut(new_id).flags_mut() = face.flags();

            if other.faces.has_normals() {
                mesh.faces.set_normal(new_id, other.faces.normal(old_id)?)?;
            }
            if other.faces.has_colors() {
                mesh.faces.set_color(new_id, other.faces.color(old_id)?)?;
            }
            if other.faces.has_quality() {
                mesh.faces.set_quality(new_id, other.faces.quality(old_id)?)?;
            }
            if other.faces.has_wedge_tex_coords() {
                let coords = other.faces.wedge_tex_coords(old_id)?;
                if !coords.is_empty() {
                    mesh.faces.set_wedge_tex_coords(new_id, coords)?;
                }
            }
            if other.faces.has_adjacent_faces() {
                *mesh.faces.adjacent_faces_mut(new_id)? =
                    other.faces.adjacent_faces(old_id)?.clone();
            }
        }

        let face_keep: Vec<usize> = other.faces.iter().map(|(id, _)| id.index()).collect();
        let mut face_custom = other.faces.custom_components().clone();
        face_custom.retain_indices(&face_keep);
        *mesh.faces.custom_components_mut() = face_custom;

        // Translate the adjacency lists copied above.
        mesh.vertices.remap_vertex_refs(&vmap);
        mesh.vertices.remap_face_refs(&fmap);
        mesh.faces.remap_face_refs(&fmap);

        tracing::debug!(
            vertices = mesh.num_vertices(),
            faces = mesh.num_faces(),
            "imported mesh"
        );
        Ok(mesh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::Color;

    fn quad_mesh_two_triangles() -> TriMesh {
        // The canonical 2-triangle unit quad.
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
    fn test_add_face_validation() {
        let mut mesh: TriMesh = TriMesh::new();
        let v0 = mesh.add_vertex(Point3::origin());
        let v1 = mesh.add_vertex(Point3::new(1.0, 0.0, 0.0));
        let v2 = mesh.add_vertex(Point3::new(0.0, 1.0, 0.0));

        assert!(mesh.add_face(&[v0, v1, v2]).is_ok());
        assert!(matches!(
            mesh.add_face(&[v0, v1, VertexId::new(99)]),
            Err(MeshError::InvalidVertexIndex { vertex: 99, .. })
        ));
        assert!(matches!(
            mesh.add_face(&[v0, v1, v0]),
            Err(MeshError::DegenerateFace { .. })
        ));
        assert!(matches!(
            mesh.add_face(&[v0, v1]),
            Err(MeshError::SizeMismatch { .. })
        ));
    }

    #[test]
    fn test_delete_face_and_compact_faces() {
        // Delete face 1 of the 2-triangle quad, compact
        // faces; the vertex container is untouched.
        let mut mesh = quad_mesh_two_triangles();
        mesh.vertices_mut().enable_colors();
        mesh.vertices_mut()
            .set_color(VertexId::new(0), Color::RED)
            .unwrap();

        mesh.delete_face(FaceId::new(1));
        let fmap = mesh.compact_faces();

        assert_eq!(mesh.num_faces(), 1);
        assert_eq!(fmap.num_removed(), 1);
        assert_eq!(mesh.num_vertices(), 4);

        let face = mesh.face(FaceId::new(0));
        let corners: Vec<usize> = face.vertices().as_slice().iter().map(|v| v.index()).collect();
        assert_eq!(corners, vec![0, 1, 2]);
        assert_eq!(mesh.position(VertexId::new(2)), &Point3::new(1.0, 1.0, 0.0));
        assert_eq!(
            mesh.vertices().color(VertexId::new(0)).unwrap(),
            Color::RED
        );
    }

    #[test]
    fn test_compact_vertices_rewrites_face_refs() {
        let mut mesh = quad_mesh_two_triangles();

        // Drop vertex 1; the faces referencing it must see it nulled and
        // the others retargeted.
        mesh.delete_vertex(VertexId::new(1));
        let vmap = mesh.compact_vertices();

        assert_eq!(mesh.num_vertices(), 3);
        assert_eq!(vmap.get(0), Some(0));
        assert_eq!(vmap.get(1), None);
        assert_eq!(vmap.get(2), Some(1));
        assert_eq!(vmap.get(3), Some(2));

        // Face 0 was {0, 1, 2}: corner 1 now invalid, corner 2 moved to 1.
        let f0 = mesh.face(FaceId::new(0));
        assert_eq!(f0.vertex(0).index(), 0);
        assert!(!f0.vertex(1).is_valid());
        assert_eq!(f0.vertex(2).index(), 1);

        // Face 1 was {0, 2, 3}: all survive.
        let f1 = mesh.face(FaceId::new(1));
        let corners: Vec<usize> = f1.vertices().as_slice().iter().map(|v| v.index()).collect();
        assert_eq!(corners, vec![0, 1, 2]);
        // The retargeted corner still resolves to the same point.
        assert_eq!(mesh.position(f1.vertex(1)), &Point3::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn test_garbage_collect_noop_is_identity() {
        let mut mesh = quad_mesh_two_triangles();
        mesh.vertices_mut().enable_quality();
        mesh.vertices_mut()
            .set_quality(VertexId::new(3), 2.5)
            .unwrap();
        let before: Vec<Point3<f64>> =
            mesh.vertex_ids().map(|v| *mesh.position(v)).collect();

        let (vmap, fmap) = mesh.garbage_collect();
        assert!(vmap.is_identity());
        assert!(fmap.is_identity());

        let after: Vec<Point3<f64>> = mesh.vertex_ids().map(|v| *mesh.position(v)).collect();
        assert_eq!(before, after);
        assert_eq!(mesh.vertices().quality(VertexId::new(3)).unwrap(), 2.5);
        let corners: Vec<usize> = mesh
            .face(FaceId::new(1))
            .vertices()
            .as_slice()
            .iter()
            .map(|v| v.index())
            .collect();
        assert_eq!(corners, vec![0, 2, 3]);
    }

    #[test]
    fn test_index_invariant_after_mutations() {
        let mut mesh = quad_mesh_two_triangles();
        mesh.delete_vertex(VertexId::new(2));
        mesh.garbage_collect();

        for (i, id) in mesh.vertex_ids().enumerate() {
            assert_eq!(id.index(), i);
            assert_eq!(mesh.vertex(id).index(), i);
        }
        for (i, id) in mesh.face_ids().enumerate() {
            assert_eq!(id.index(), i);
            assert_eq!(mesh.face(id).index(), i);
        }
    }

    #[test]
    fn test_storage_growth_keeps_references_valid() {
        // References are indices: growing the vertex storage must leave
        // every face corner resolving to the same logical vertex.
        let mut mesh = quad_mesh_two_triangles();
        let targets: Vec<Point3<f64>> = mesh
            .face_vertices(FaceId::new(0))
            .map(|v| *mesh.position(v))
            .collect();

        mesh.vertices_mut().reserve(1 << 12);
        for i in 0..100 {
            mesh.add_vertex(Point3::new(i as f64, -1.0, -1.0));
        }

        let after: Vec<Point3<f64>> = mesh
            .face_vertices(FaceId::new(0))
            .map(|v| *mesh.position(v))
            .collect();
        assert_eq!(targets, after);
    }

    #[test]
    fn test_custom_component_scenario() {
        // Per-vertex "flag" of integer type over 10
        // vertices; 4 at index 0, 8 elsewhere.
        let mut mesh: TriMesh = TriMesh::new();
        for i in 0..10 {
            mesh.add_vertex(Point3::new(i as f64, 0.0, 0.0));
        }
        mesh.vertices_mut().add_custom::<i32>("flag").unwrap();
        for id in mesh.vertex_ids().collect::<Vec<_>>() {
            mesh.vertices_mut().set_custom("flag", id, 8).unwrap();
        }
        mesh.vertices_mut()
            .set_custom("flag", VertexId::new(0), 4)
            .unwrap();

        assert_eq!(
            *mesh.vertices().custom::<i32>("flag", VertexId::new(0)).unwrap(),
            4
        );
        assert_eq!(
            *mesh.vertices().custom::<i32>("flag", VertexId::new(9)).unwrap(),
            8
        );

        mesh.vertices_mut().remove_custom("flag").unwrap();
        assert!(!mesh.vertices().has_custom("flag"));
    }

    #[test]
    fn test_enabled_capabilities_track_components() {
        let mut mesh = quad_mesh_two_triangles();
        let caps = mesh.enabled_capabilities();
        assert!(caps.has(MeshCapabilities::VERTICES | MeshCapabilities::FACES));
        assert!(!caps.has(MeshCapabilities::VERTEX_COLORS));

        mesh.enable_capabilities(
            MeshCapabilities::VERTEX_COLORS | MeshCapabilities::FACE_NORMALS,
        );
        let caps = mesh.enabled_capabilities();
        assert!(caps.has(MeshCapabilities::VERTEX_COLORS));
        assert!(caps.has(MeshCapabilities::FACE_NORMALS));
        assert!(mesh.vertices().has_colors());
        assert!(mesh.faces().has_normals());
    }

    #[test]
    fn test_import_tri_to_poly() {
        let mut src = quad_mesh_two_triangles();
        src.set_name("quad");
        src.vertices_mut().enable_colors();
        src.vertices_mut()
            .set_color(VertexId::new(1), Color::GREEN)
            .unwrap();
        src.faces_mut().enable_quality();
        src.faces_mut().set_quality(FaceId::new(1), 0.5).unwrap();
        src.vertices_mut().add_custom::<u8>("layer").unwrap();
        src.vertices_mut()
            .set_custom("layer", VertexId::new(2), 3u8)
            .unwrap();

        let poly = PolyMesh::import_from(&src).unwrap();
        assert_eq!(poly.name(), "quad");
        assert_eq!(poly.num_vertices(), 4);
        assert_eq!(poly.num_faces(), 2);
        assert_eq!(
            poly.vertices().color(VertexId::new(1)).unwrap(),
            Color::GREEN
        );
        assert_eq!(poly.faces().quality(FaceId::new(1)).unwrap(), 0.5);
        assert_eq!(
            *poly.vertices().custom::<u8>("layer", VertexId::new(2)).unwrap(),
            3
        );
        let corners: Vec<usize> = poly
            .face(FaceId::new(1))
            .vertices()
            .as_slice()
            .iter()
            .map(|v| v.index())
            .collect();
        assert_eq!(corners, vec![0, 2, 3]);
    }

    #[test]
    fn test_import_poly_to_tri_requires_triangles() {
        let mut poly: PolyMesh = PolyMesh::new();
        let v: Vec<_> = (0..4)
            .map(|i| poly.add_vertex(Point3::new(i as f64, 0.0, 0.0)))
            .collect();
        poly.add_face(&[v[0], v[1], v[2]]).unwrap();

        // All triangles: conversion succeeds.
        let tri = TriMesh::import_from(&poly).unwrap();
        assert_eq!(tri.num_faces(), 1);

        // Add a quad face: conversion now fails, naming the face.
        poly.add_face(&[v[0], v[1], v[2], v[3]]).unwrap();
        match TriMesh::import_from(&poly) {
            Err(MeshError::ShapeMismatch {
                face,
                expected,
                actual,
            }) => {
                assert_eq!(face, 1);
                assert_eq!(expected, 3);
                assert_eq!(actual, 4);
            }
            other => panic!("expected ShapeMismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_import_skips_tombstoned_elements() {
        let mut src = quad_mesh_two_triangles();
        src.delete_face(FaceId::new(0));
        src.delete_vertex(VertexId::new(1));

        let poly = PolyMesh::import_from(&src).unwrap();
        assert_eq!(poly.num_vertices(), 3);
        assert_eq!(poly.num_faces(), 1);
        // Source face {0, 2, 3} maps onto the packed vertex ids {0, 1, 2}.
        let corners: Vec<usize> = poly
            .face(FaceId::new(0))
            .vertices()
            .as_slice()
            .iter()
            .map(|v| v.index())
            .collect();
        assert_eq!(corners, vec![0, 1, 2]);
    }

    #[test]
    fn test_bounding_box_skips_deleted() {
        let mut mesh = quad_mesh_two_triangles();
        mesh.add_vertex(Point3::new(100.0, 100.0, 100.0));
        let far = VertexId::new(4);
        mesh.delete_vertex(far);

        let (min, max) = mesh.compute_bounding_box().unwrap();
        assert_eq!(min, Point3::new(0.0, 0.0, 0.0));
        assert_eq!(max, Point3::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn test_mesh_custom_values() {
        let mut mesh: TriMesh = TriMesh::new();
        mesh.custom_values_mut()
            .add::<f64>("scale", 2.0)
            .unwrap();
        assert_eq!(*mesh.custom_values().get::<f64>("scale").unwrap(), 2.0);
        assert!(mesh.custom_values().get::<i32>("scale").is_err());
    }
}
