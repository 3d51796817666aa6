//! The vertex element and its container.

use nalgebra::{Point2, Point3, Vector3};

use super::{compact_in_place, vertical_component};
use crate::component::{Color, CustomComponents, CustomValue, DynRefs, ElementFlags, RefList};
use crate::error::{MeshError, Result};
use crate::index::{FaceId, IndexMap, MeshIndex, VertexId};

/// A vertex element.
///
/// Carries the mandatory components inline: position and flags. Everything
/// else (normal, color, quality, texture coordinate, adjacency, custom
/// attributes) is a vertical component owned by the [`VertexContainer`]
/// and addressed through the vertex's id.
#[derive(Debug, Clone, PartialEq)]
pub struct Vertex<I: MeshIndex = u32> {
    /// The 3D position of this vertex.
    pub position: Point3<f64>,
    flags: ElementFlags,
    index: I,
}

impl<I: MeshIndex> Vertex<I> {
    pub(crate) fn new(position: Point3<f64>, index: I) -> Self {
        Self {
            position,
            flags: ElementFlags::new(),
            index,
        }
    }

    /// This vertex's ordinal position in its container.
    #[inline]
    pub fn index(&self) -> usize {
        self.index.to_usize()
    }

    /// This vertex's flags.
    #[inline]
    pub fn flags(&self) -> ElementFlags {
        self.flags
    }

    /// Mutable access to this vertex's flags.
    ///
    /// The deleted flag is not reachable through this; deletion goes
    /// through [`VertexContainer::delete`].
    #[inline]
    pub fn flags_mut(&mut self) -> &mut ElementFlags {
        &mut self.flags
    }

    /// Check the deleted flag.
    #[inline]
    pub fn is_deleted(&self) -> bool {
        self.flags.is_deleted()
    }

    pub(crate) fn set_index(&mut self, index: usize) {
        self.index = I::from_usize(index);
    }

    pub(crate) fn mark_deleted(&mut self) {
        self.flags.set_deleted();
    }
}

/// The container owning all vertices of a mesh.
///
/// See the [module docs](crate::container) for the storage discipline and
/// invariants.
#[derive(Debug, Clone)]
pub struct VertexContainer<I: MeshIndex = u32> {
    verts: Vec<Vertex<I>>,
    num_deleted: usize,
    normals: Option<Vec<Vector3<f64>>>,
    colors: Option<Vec<Color>>,
    quality: Option<Vec<f64>>,
    tex_coords: Option<Vec<Point2<f64>>>,
    adj_faces: Option<Vec<DynRefs<FaceId<I>>>>,
    adj_vertices: Option<Vec<DynRefs<VertexId<I>>>>,
    custom: CustomComponents,
}

impl<I: MeshIndex> Default for VertexContainer<I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: MeshIndex> VertexContainer<I> {
    /// Create an empty container.
    pub fn new() -> Self {
        Self {
            verts: Vec::new(),
            num_deleted: 0,
            normals: None,
            colors: None,
            quality: None,
            tex_coords: None,
            adj_faces: None,
            adj_vertices: None,
            custom: CustomComponents::new(),
        }
    }

    /// Create an empty container with pre-allocated element capacity.
    pub fn with_capacity(n: usize) -> Self {
        let mut container = Self::new();
        container.verts.reserve(n);
        container
    }

    // ==================== Counts ====================

    /// Number of element slots, tombstoned ones included.
    #[inline]
    pub fn slot_count(&self) -> usize {
        self.verts.len()
    }

    /// Number of live (not tombstoned) vertices.
    #[inline]
    pub fn live_count(&self) -> usize {
        self.verts.len() - self.num_deleted
    }

    /// Number of tombstoned vertices awaiting compaction.
    #[inline]
    pub fn deleted_count(&self) -> usize {
        self.num_deleted
    }

    /// Check if the container holds no live vertices.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.live_count() == 0
    }

    // ==================== Element access ====================

    /// Get a vertex by id.
    ///
    /// # Panics
    /// Panics if the id is invalid or past the end of the container.
    #[inline]
    pub fn vertex(&self, id: VertexId<I>) -> &Vertex<I> {
        &self.verts[id.index()]
    }

    /// Get a mutable vertex by id.
    ///
    /// # Panics
    /// Panics if the id is invalid or past the end of the container.
    #[inline]
    pub fn vertex_mut(&mut self, id: VertexId<I>) -> &mut Vertex<I> {
        &mut self.verts[id.index()]
    }

    /// Get the position of a vertex.
    #[inline]
    pub fn position(&self, id: VertexId<I>) -> &Point3<f64> {
        &self.vertex(id).position
    }

    /// Set the position of a vertex.
    #[inline]
    pub fn set_position(&mut self, id: VertexId<I>, position: Point3<f64>) {
        self.vertex_mut(id).position = position;
    }

    /// Check if a vertex is tombstoned.
    #[inline]
    pub fn is_deleted(&self, id: VertexId<I>) -> bool {
        self.vertex(id).is_deleted()
    }

    // ==================== Iteration ====================

    /// Iterate over the ids of all live vertices, in storage order.
    pub fn ids(&self) -> impl Iterator<Item = VertexId<I>> + '_ {
        self.verts
            .iter()
            .enumerate()
            .filter(|(_, v)| !v.is_deleted())
            .map(|(i, _)| VertexId::new(i))
    }

    /// Iterate over all live vertices with their ids, in storage order.
    pub fn iter(&self) -> impl Iterator<Item = (VertexId<I>, &Vertex<I>)> + '_ {
        self.verts
            .iter()
            .enumerate()
            .filter(|(_, v)| !v.is_deleted())
            .map(|(i, v)| (VertexId::new(i), v))
    }

    // ==================== Mutation ====================

    /// Append a vertex and return its id.
    ///
    /// Every enabled vertical component array grows in lock-step with a
    /// default value.
    pub fn push(&mut self, position: Point3<f64>) -> VertexId<I> {
        let id = VertexId::new(self.verts.len());
        self.verts.push(Vertex::new(position, I::from_usize(id.index())));
        if let Some(arr) = &mut self.normals {
            arr.push(Vector3::zeros());
        }
        if let Some(arr) = &mut self.colors {
            arr.push(Color::WHITE);
        }
        if let Some(arr) = &mut self.quality {
            arr.push(0.0);
        }
        if let Some(arr) = &mut self.tex_coords {
            arr.push(Point2::origin());
        }
        if let Some(arr) = &mut self.adj_faces {
            arr.push(DynRefs::new());
        }
        if let Some(arr) = &mut self.adj_vertices {
            arr.push(DynRefs::new());
        }
        self.custom.push_default();
        id
    }

    /// Reserve capacity for `n` additional vertices in the element array
    /// and every enabled vertical array.
    pub fn reserve(&mut self, n: usize) {
        self.verts.reserve(n);
        if let Some(arr) = &mut self.normals {
            arr.reserve(n);
        }
        if let Some(arr) = &mut self.colors {
            arr.reserve(n);
        }
        if let Some(arr) = &mut self.quality {
            arr.reserve(n);
        }
        if let Some(arr) = &mut self.tex_coords {
            arr.reserve(n);
        }
        if let Some(arr) = &mut self.adj_faces {
            arr.reserve(n);
        }
        if let Some(arr) = &mut self.adj_vertices {
            arr.reserve(n);
        }
    }

    /// Resize to exactly `n` element slots.
    ///
    /// Growth appends default vertices at the origin; shrinking drops the
    /// tail, tombstoned or not. Vertical arrays follow in lock-step.
    pub fn resize(&mut self, n: usize) {
        let len = self.verts.len();
        if n < len {
            self.num_deleted -= self.verts[n..].iter().filter(|v| v.is_deleted()).count();
            self.verts.truncate(n);
        } else {
            self.verts.reserve(n - len);
            for i in len..n {
                self.verts.push(Vertex::new(Point3::origin(), I::from_usize(i)));
            }
        }
        if let Some(arr) = &mut self.normals {
            arr.resize(n, Vector3::zeros());
        }
        if let Some(arr) = &mut self.colors {
            arr.resize(n, Color::WHITE);
        }
        if let Some(arr) = &mut self.quality {
            arr.resize(n, 0.0);
        }
        if let Some(arr) = &mut self.tex_coords {
            arr.resize(n, Point2::origin());
        }
        if let Some(arr) = &mut self.adj_faces {
            arr.resize(n, DynRefs::new());
        }
        if let Some(arr) = &mut self.adj_vertices {
            arr.resize(n, DynRefs::new());
        }
        self.custom.resize_default(n);
    }

    /// Remove every vertex. Enabled components stay enabled, emptied.
    pub fn clear(&mut self) {
        self.verts.clear();
        self.num_deleted = 0;
        if let Some(arr) = &mut self.normals {
            arr.clear();
        }
        if let Some(arr) = &mut self.colors {
            arr.clear();
        }
        if let Some(arr) = &mut self.quality {
            arr.clear();
        }
        if let Some(arr) = &mut self.tex_coords {
            arr.clear();
        }
        if let Some(arr) = &mut self.adj_faces {
            arr.clear();
        }
        if let Some(arr) = &mut self.adj_vertices {
            arr.clear();
        }
        self.custom.clear();
    }

    /// Tombstone a vertex.
    ///
    /// The slot stays addressable until [`compact`](Self::compact) runs;
    /// only the live count changes. Deleting a tombstoned vertex is a
    /// no-op.
    pub fn delete(&mut self, id: VertexId<I>) {
        let vertex = &mut self.verts[id.index()];
        if !vertex.is_deleted() {
            vertex.mark_deleted();
            self.num_deleted += 1;
        }
    }

    /// Physically remove tombstoned vertices.
    ///
    /// Survivors keep their relative order and get fresh consecutive
    /// indices; every enabled vertical array and custom component array is
    /// remapped identically. Returns the old-index → new-index table the
    /// owner uses to rewrite references into this container. With nothing
    /// tombstoned this is a no-op returning the identity table.
    pub fn compact(&mut self) -> IndexMap<I> {
        let len = self.verts.len();
        if self.num_deleted == 0 {
            return IndexMap::identity(len);
        }

        let mut map = IndexMap::with_removed(len);
        let mut keep = Vec::with_capacity(len - self.num_deleted);
        for (i, v) in self.verts.iter().enumerate() {
            if !v.is_deleted() {
                map.set(i, keep.len());
                keep.push(i);
            }
        }

        compact_in_place(&mut self.verts, &keep);
        for (i, v) in self.verts.iter_mut().enumerate() {
            v.set_index(i);
        }
        if let Some(arr) = &mut self.normals {
            compact_in_place(arr, &keep);
        }
        if let Some(arr) = &mut self.colors {
            compact_in_place(arr, &keep);
        }
        if let Some(arr) = &mut self.quality {
            compact_in_place(arr, &keep);
        }
        if let Some(arr) = &mut self.tex_coords {
            compact_in_place(arr, &keep);
        }
        if let Some(arr) = &mut self.adj_faces {
            compact_in_place(arr, &keep);
        }
        if let Some(arr) = &mut self.adj_vertices {
            compact_in_place(arr, &keep);
        }
        self.custom.retain_indices(&keep);
        self.num_deleted = 0;

        tracing::debug!(
            removed = map.num_removed(),
            live = self.verts.len(),
            "compacted vertex container"
        );
        map
    }

    // ==================== Reference remapping ====================

    /// Rewrite the vertex→vertex adjacency lists through a vertex
    /// compaction table.
    pub(crate) fn remap_vertex_refs(&mut self, map: &IndexMap<I>) {
        if let Some(arr) = &mut self.adj_vertices {
            for refs in arr {
                refs.remap(map);
            }
        }
    }

    /// Rewrite the vertex→face adjacency lists through a face compaction
    /// table.
    pub(crate) fn remap_face_refs(&mut self, map: &IndexMap<I>) {
        if let Some(arr) = &mut self.adj_faces {
            for refs in arr {
                refs.remap(map);
            }
        }
    }

    // ==================== Optional components ====================

    vertical_component!(
        normals, verts, Vector3<f64>, Vector3::zeros(), "vertex normals", VertexId<I>,
        enable_normals, disable_normals, has_normals, normal, set_normal, normals
    );

    vertical_component!(
        colors, verts, Color, Color::WHITE, "vertex colors", VertexId<I>,
        enable_colors, disable_colors, has_colors, color, set_color, colors
    );

    vertical_component!(
        quality, verts, f64, 0.0, "vertex quality", VertexId<I>,
        enable_quality, disable_quality, has_quality, quality, set_quality, qualities
    );

    vertical_component!(
        tex_coords, verts, Point2<f64>, Point2::origin(), "vertex tex coords", VertexId<I>,
        enable_tex_coords, disable_tex_coords, has_tex_coords, tex_coord, set_tex_coord, tex_coords
    );

    /// Enable the vertex→face adjacency component with empty lists.
    pub fn enable_adjacent_faces(&mut self) {
        if self.adj_faces.is_none() {
            self.adj_faces = Some(vec![DynRefs::new(); self.verts.len()]);
        }
    }

    /// Disable the vertex→face adjacency component, discarding its lists.
    pub fn disable_adjacent_faces(&mut self) {
        self.adj_faces = None;
    }

    /// Check if the vertex→face adjacency component is enabled.
    pub fn has_adjacent_faces(&self) -> bool {
        self.adj_faces.is_some()
    }

    /// Get the adjacent-face list of one vertex.
    pub fn adjacent_faces(&self, id: VertexId<I>) -> Result<&DynRefs<FaceId<I>>> {
        let arr = self.adj_faces.as_ref().ok_or(MeshError::ComponentNotEnabled {
            component: "vertex adjacent faces",
        })?;
        arr.get(id.index()).ok_or(MeshError::OutOfRange {
            index: id.index(),
            len: arr.len(),
        })
    }

    /// Get the mutable adjacent-face list of one vertex.
    pub fn adjacent_faces_mut(&mut self, id: VertexId<I>) -> Result<&mut DynRefs<FaceId<I>>> {
        let arr = self.adj_faces.as_mut().ok_or(MeshError::ComponentNotEnabled {
            component: "vertex adjacent faces",
        })?;
        let len = arr.len();
        arr.get_mut(id.index()).ok_or(MeshError::OutOfRange {
            index: id.index(),
            len,
        })
    }

    /// Enable the vertex→vertex adjacency component with empty lists.
    pub fn enable_adjacent_vertices(&mut self) {
        if self.adj_vertices.is_none() {
            self.adj_vertices = Some(vec![DynRefs::new(); self.verts.len()]);
        }
    }

    /// Disable the vertex→vertex adjacency component, discarding its lists.
    pub fn disable_adjacent_vertices(&mut self) {
        self.adj_vertices = None;
    }

    /// Check if the vertex→vertex adjacency component is enabled.
    pub fn has_adjacent_vertices(&self) -> bool {
        self.adj_vertices.is_some()
    }

    /// Get the adjacent-vertex list of one vertex.
    pub fn adjacent_vertices(&self, id: VertexId<I>) -> Result<&DynRefs<VertexId<I>>> {
        let arr = self
            .adj_vertices
            .as_ref()
            .ok_or(MeshError::ComponentNotEnabled {
                component: "vertex adjacent vertices",
            })?;
        arr.get(id.index()).ok_or(MeshError::OutOfRange {
            index: id.index(),
            len: arr.len(),
        })
    }

    /// Get the mutable adjacent-vertex list of one vertex.
    pub fn adjacent_vertices_mut(&mut self, id: VertexId<I>) -> Result<&mut DynRefs<VertexId<I>>> {
        let arr = self
            .adj_vertices
            .as_mut()
            .ok_or(MeshError::ComponentNotEnabled {
                component: "vertex adjacent vertices",
            })?;
        let len = arr.len();
        arr.get_mut(id.index()).ok_or(MeshError::OutOfRange {
            index: id.index(),
            len,
        })
    }

    // ==================== Custom components ====================

    /// Add a per-vertex custom component named `name` with value type `T`.
    pub fn add_custom<T: CustomValue>(&mut self, name: &str) -> Result<()> {
        self.custom.add::<T>(name)
    }

    /// Remove the per-vertex custom component named `name`.
    pub fn remove_custom(&mut self, name: &str) -> Result<()> {
        self.custom.remove(name)
    }

    /// Check if a per-vertex custom component named `name` exists.
    pub fn has_custom(&self, name: &str) -> bool {
        self.custom.has(name)
    }

    /// Get the custom value of one vertex.
    pub fn custom<T: CustomValue>(&self, name: &str, id: VertexId<I>) -> Result<&T> {
        self.custom.get(name, id.index())
    }

    /// Set the custom value of one vertex.
    pub fn set_custom<T: CustomValue>(
        &mut self,
        name: &str,
        id: VertexId<I>,
        value: T,
    ) -> Result<()> {
        self.custom.set(name, id.index(), value)
    }

    /// Iterate over the names of the per-vertex custom components.
    pub fn custom_names(&self) -> impl Iterator<Item = &str> {
        self.custom.names()
    }

    pub(crate) fn custom_components(&self) -> &CustomComponents {
        &self.custom
    }

    pub(crate) fn custom_components_mut(&mut self) -> &mut CustomComponents {
        &mut self.custom
    }
}
