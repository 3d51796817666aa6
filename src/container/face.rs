//! The face element and its container.
//!
//! A face's vertex references are its only structural component, and their
//! storage shape is a type parameter: [`FixedRefs`] for meshes whose faces
//! all have the same compile-time arity (triangle and quad meshes),
//! [`DynRefs`] for general polygon meshes. Everything else about the two
//! container flavors is identical, so they share this one generic
//! implementation.

use nalgebra::{Point2, Vector3};

use super::{compact_in_place, vertical_component};
use crate::component::{
    Color, CustomComponents, CustomValue, DynRefs, ElementFlags, FixedRefs, RefList,
};
use crate::error::{MeshError, Result};
use crate::index::{FaceId, IndexMap, MeshIndex, VertexId};

/// A face element.
///
/// Carries the mandatory components inline: the vertex reference list and
/// flags. Per-face normal, color, quality, wedge tex coords, adjacency and
/// custom attributes are vertical components owned by the
/// [`FaceContainer`].
#[derive(Debug, Clone, PartialEq)]
pub struct Face<R, I: MeshIndex = u32>
where
    R: RefList<VertexId<I>>,
{
    verts: R,
    flags: ElementFlags,
    index: I,
}

/// A triangle face.
pub type TriFace<I = u32> = Face<FixedRefs<VertexId<I>, 3>, I>;
/// A quadrilateral face.
pub type QuadFace<I = u32> = Face<FixedRefs<VertexId<I>, 4>, I>;
/// A general polygon face.
pub type PolyFace<I = u32> = Face<DynRefs<VertexId<I>>, I>;

impl<R, I: MeshIndex> Face<R, I>
where
    R: RefList<VertexId<I>>,
{
    pub(crate) fn new(verts: R, index: I) -> Self {
        Self {
            verts,
            flags: ElementFlags::new(),
            index,
        }
    }

    /// This face's ordinal position in its container.
    #[inline]
    pub fn index(&self) -> usize {
        self.index.to_usize()
    }

    /// This face's flags.
    #[inline]
    pub fn flags(&self) -> ElementFlags {
        self.flags
    }

    /// Mutable access to this face's flags.
    ///
    /// The deleted flag is not reachable through this; deletion goes
    /// through [`FaceContainer::delete`].
    #[inline]
    pub fn flags_mut(&mut self) -> &mut ElementFlags {
        &mut self.flags
    }

    /// Check the deleted flag.
    #[inline]
    pub fn is_deleted(&self) -> bool {
        self.flags.is_deleted()
    }

    /// This face's vertex reference list.
    #[inline]
    pub fn vertices(&self) -> &R {
        &self.verts
    }

    /// Mutable access to this face's vertex reference list.
    #[inline]
    pub fn vertices_mut(&mut self) -> &mut R {
        &mut self.verts
    }

    /// Number of vertices (corners) of this face.
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.verts.len()
    }

    /// Get corner `i` of this face.
    ///
    /// # Panics
    /// Panics if `i >= vertex_count()`.
    #[inline]
    pub fn vertex(&self, i: usize) -> VertexId<I> {
        self.verts.get(i)
    }

    /// Get corner `i` modulo the corner count; negative input wraps.
    #[inline]
    pub fn vertex_mod(&self, i: isize) -> VertexId<I> {
        self.verts.get_mod(i)
    }

    /// Replace all corners.
    ///
    /// Fixed-arity faces reject input of any other length with
    /// [`MeshError::SizeMismatch`].
    pub fn set_vertices(&mut self, ids: &[VertexId<I>]) -> Result<()> {
        self.verts.set_all(ids)
    }

    /// Check if `id` is a corner of this face.
    #[inline]
    pub fn contains_vertex(&self, id: VertexId<I>) -> bool {
        self.verts.contains(id)
    }

    /// Position of corner `id`, if present.
    #[inline]
    pub fn index_of_vertex(&self, id: VertexId<I>) -> Option<usize> {
        self.verts.index_of(id)
    }

    /// Position `i` such that boundary edge `(i, i+1 mod n)` is `{a, b}`.
    #[inline]
    pub fn index_of_edge(&self, a: VertexId<I>, b: VertexId<I>) -> Option<usize> {
        self.verts.index_of_edge(a, b)
    }

    pub(crate) fn set_index(&mut self, index: usize) {
        self.index = I::from_usize(index);
    }

    pub(crate) fn mark_deleted(&mut self) {
        self.flags.set_deleted();
    }
}

/// The container owning all faces of a mesh.
///
/// See the [module docs](crate::container) for the storage discipline and
/// invariants.
#[derive(Debug, Clone)]
pub struct FaceContainer<R, I: MeshIndex = u32>
where
    R: RefList<VertexId<I>>,
{
    faces: Vec<Face<R, I>>,
    num_deleted: usize,
    normals: Option<Vec<Vector3<f64>>>,
    colors: Option<Vec<Color>>,
    quality: Option<Vec<f64>>,
    wedge_tex_coords: Option<Vec<Vec<Point2<f64>>>>,
    adj_faces: Option<Vec<DynRefs<FaceId<I>>>>,
    custom: CustomComponents,
}

impl<R, I: MeshIndex> Default for FaceContainer<R, I>
where
    R: RefList<VertexId<I>>,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<R, I: MeshIndex> FaceContainer<R, I>
where
    R: RefList<VertexId<I>>,
{
    /// Create an empty container.
    pub fn new() -> Self {
        Self {
            faces: Vec::new(),
            num_deleted: 0,
            normals: None,
            colors: None,
            quality: None,
            wedge_tex_coords: None,
            adj_faces: None,
            custom: CustomComponents::new(),
        }
    }

    /// Create an empty container with pre-allocated element capacity.
    pub fn with_capacity(n: usize) -> Self {
        let mut container = Self::new();
        container.faces.reserve(n);
        container
    }

    // ==================== Counts ====================

    /// Number of element slots, tombstoned ones included.
    #[inline]
    pub fn slot_count(&self) -> usize {
        self.faces.len()
    }

    /// Number of live (not tombstoned) faces.
    #[inline]
    pub fn live_count(&self) -> usize {
        self.faces.len() - self.num_deleted
    }

    /// Number of tombstoned faces awaiting compaction.
    #[inline]
    pub fn deleted_count(&self) -> usize {
        self.num_deleted
    }

    /// Check if the container holds no live faces.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.live_count() == 0
    }

    // ==================== Element access ====================

    /// Get a face by id.
    ///
    /// # Panics
    /// Panics if the id is invalid or past the end of the container.
    #[inline]
    pub fn face(&self, id: FaceId<I>) -> &Face<R, I> {
        &self.faces[id.index()]
    }

    /// Get a mutable face by id.
    ///
    /// # Panics
    /// Panics if the id is invalid or past the end of the container.
    #[inline]
    pub fn face_mut(&mut self, id: FaceId<I>) -> &mut Face<R, I> {
        &mut self.faces[id.index()]
    }

    /// Check if a face is tombstoned.
    #[inline]
    pub fn is_deleted(&self, id: FaceId<I>) -> bool {
        self.face(id).is_deleted()
    }

    // ==================== Iteration ====================

    /// Iterate over the ids of all live faces, in storage order.
    pub fn ids(&self) -> impl Iterator<Item = FaceId<I>> + '_ {
        self.faces
            .iter()
            .enumerate()
            .filter(|(_, f)| !f.is_deleted())
            .map(|(i, _)| FaceId::new(i))
    }

    /// Iterate over all live faces with their ids, in storage order.
    pub fn iter(&self) -> impl Iterator<Item = (FaceId<I>, &Face<R, I>)> + '_ {
        self.faces
            .iter()
            .enumerate()
            .filter(|(_, f)| !f.is_deleted())
            .map(|(i, f)| (FaceId::new(i), f))
    }

    // ==================== Mutation ====================

    /// Append a face with the given reference list and return its id.
    pub fn push(&mut self, verts: R) -> FaceId<I> {
        let id = FaceId::new(self.faces.len());
        self.faces.push(Face::new(verts, I::from_usize(id.index())));
        if let Some(arr) = &mut self.normals {
            arr.push(Vector3::zeros());
        }
        if let Some(arr) = &mut self.colors {
            arr.push(Color::WHITE);
        }
        if let Some(arr) = &mut self.quality {
            arr.push(0.0);
        }
        if let Some(arr) = &mut self.wedge_tex_coords {
            arr.push(Vec::new());
        }
        if let Some(arr) = &mut self.adj_faces {
            arr.push(DynRefs::new());
        }
        self.custom.push_default();
        id
    }

    /// Append a face from a corner id list.
    ///
    /// Fixed-arity containers reject input of any other length with
    /// [`MeshError::SizeMismatch`].
    pub fn push_from_ids(&mut self, ids: &[VertexId<I>]) -> Result<FaceId<I>> {
        let mut verts = R::default();
        verts.set_all(ids)?;
        Ok(self.push(verts))
    }

    /// Reserve capacity for `n` additional faces in the element array and
    /// every enabled vertical array.
    pub fn reserve(&mut self, n: usize) {
        self.faces.reserve(n);
        if let Some(arr) = &mut self.normals {
            arr.reserve(n);
        }
        if let Some(arr) = &mut self.colors {
            arr.reserve(n);
        }
        if let Some(arr) = &mut self.quality {
            arr.reserve(n);
        }
        if let Some(arr) = &mut self.wedge_tex_coords {
            arr.reserve(n);
        }
        if let Some(arr) = &mut self.adj_faces {
            arr.reserve(n);
        }
    }

    /// Resize to exactly `n` element slots.
    ///
    /// Growth appends default faces with invalid corner references;
    /// shrinking drops the tail, tombstoned or not. Vertical arrays follow
    /// in lock-step.
    pub fn resize(&mut self, n: usize) {
        let len = self.faces.len();
        if n < len {
            self.num_deleted -= self.faces[n..].iter().filter(|f| f.is_deleted()).count();
            self.faces.truncate(n);
        } else {
            self.faces.reserve(n - len);
            for i in len..n {
                self.faces.push(Face::new(R::default(), I::from_usize(i)));
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
        if let Some(arr) = &mut self.wedge_tex_coords {
            arr.resize(n, Vec::new());
        }
        if let Some(arr) = &mut self.adj_faces {
            arr.resize(n, DynRefs::new());
        }
        self.custom.resize_default(n);
    }

    /// Remove every face. Enabled components stay enabled, emptied.
    pub fn clear(&mut self) {
        self.faces.clear();
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
        if let Some(arr) = &mut self.wedge_tex_coords {
            arr.clear();
        }
        if let Some(arr) = &mut self.adj_faces {
            arr.clear();
        }
        self.custom.clear();
    }

    /// Tombstone a face.
    ///
    /// The slot stays addressable until [`compact`](Self::compact) runs;
    /// only the live count changes. Deleting a tombstoned face is a no-op.
    pub fn delete(&mut self, id: FaceId<I>) {
        let face = &mut self.faces[id.index()];
        if !face.is_deleted() {
            face.mark_deleted();
            self.num_deleted += 1;
        }
    }

    /// Physically remove tombstoned faces.
    ///
    /// Survivors keep their relative order and get fresh consecutive
    /// indices; every enabled vertical array and custom component array is
    /// remapped identically. Returns the old-index → new-index table the
    /// owner uses to rewrite references into this container. With nothing
    /// tombstoned this is a no-op returning the identity table.
    pub fn compact(&mut self) -> IndexMap<I> {
        let len = self.faces.len();
        if self.num_deleted == 0 {
            return IndexMap::identity(len);
        }

        let mut map = IndexMap::with_removed(len);
        let mut keep = Vec::with_capacity(len - self.num_deleted);
        for (i, f) in self.faces.iter().enumerate() {
            if !f.is_deleted() {
                map.set(i, keep.len());
                keep.push(i);
            }
        }

        compact_in_place(&mut self.faces, &keep);
        for (i, f) in self.faces.iter_mut().enumerate() {
            f.set_index(i);
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
        if let Some(arr) = &mut self.wedge_tex_coords {
            compact_in_place(arr, &keep);
        }
        if let Some(arr) = &mut self.adj_faces {
            compact_in_place(arr, &keep);
        }
        self.custom.retain_indices(&keep);
        self.num_deleted = 0;

        tracing::debug!(
            removed = map.num_removed(),
            live = self.faces.len(),
            "compacted face container"
        );
        map
    }

    // ==================== Reference remapping ====================

    /// Rewrite every face's corner references through a vertex compaction
    /// table.
    pub(crate) fn remap_vertex_refs(&mut self, map: &IndexMap<I>) {
        for face in &mut self.faces {
            face.verts.remap(map);
        }
    }

    /// Rewrite the face→face adjacency lists through a face compaction
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
        normals, faces, Vector3<f64>, Vector3::zeros(), "face normals", FaceId<I>,
        enable_normals, disable_normals, has_normals, normal, set_normal, normals
    );

    vertical_component!(
        colors, faces, Color, Color::WHITE, "face colors", FaceId<I>,
        enable_colors, disable_colors, has_colors, color, set_color, colors
    );

    vertical_component!(
        quality, faces, f64, 0.0, "face quality", FaceId<I>,
        enable_quality, disable_quality, has_quality, quality, set_quality, qualities
    );

    /// Enable the wedge (per-corner) tex coord component with empty lists.
    pub fn enable_wedge_tex_coords(&mut self) {
        if self.wedge_tex_coords.is_none() {
            self.wedge_tex_coords = Some(vec![Vec::new(); self.faces.len()]);
        }
    }

    /// Disable the wedge tex coord component, discarding its values.
    pub fn disable_wedge_tex_coords(&mut self) {
        self.wedge_tex_coords = None;
    }

    /// Check if the wedge tex coord component is enabled.
    pub fn has_wedge_tex_coords(&self) -> bool {
        self.wedge_tex_coords.is_some()
    }

    /// Get the per-corner tex coords of one face.
    ///
    /// The slice is empty until [`set_wedge_tex_coords`] stores values for
    /// the face.
    ///
    /// [`set_wedge_tex_coords`]: Self::set_wedge_tex_coords
    pub fn wedge_tex_coords(&self, id: FaceId<I>) -> Result<&[Point2<f64>]> {
        let arr = self
            .wedge_tex_coords
            .as_ref()
            .ok_or(MeshError::ComponentNotEnabled {
                component: "wedge tex coords",
            })?;
        arr.get(id.index()).map(Vec::as_slice).ok_or(MeshError::OutOfRange {
            index: id.index(),
            len: arr.len(),
        })
    }

    /// Set the per-corner tex coords of one face.
    ///
    /// The input length must equal the face's corner count.
    pub fn set_wedge_tex_coords(&mut self, id: FaceId<I>, coords: &[Point2<f64>]) -> Result<()> {
        let corners = self.face(id).vertex_count();
        if coords.len() != corners {
            return Err(MeshError::SizeMismatch {
                expected: corners,
                actual: coords.len(),
            });
        }
        let arr = self
            .wedge_tex_coords
            .as_mut()
            .ok_or(MeshError::ComponentNotEnabled {
                component: "wedge tex coords",
            })?;
        let len = arr.len();
        let slot = arr.get_mut(id.index()).ok_or(MeshError::OutOfRange {
            index: id.index(),
            len,
        })?;
        slot.clear();
        slot.extend_from_slice(coords);
        Ok(())
    }

    /// Enable the face→face adjacency component with empty lists.
    pub fn enable_adjacent_faces(&mut self) {
        if self.adj_faces.is_none() {
            self.adj_faces = Some(vec![DynRefs::new(); self.faces.len()]);
        }
    }

    /// Disable the face→face adjacency component, discarding its lists.
    pub fn disable_adjacent_faces(&mut self) {
        self.adj_faces = None;
    }

    /// Check if the face→face adjacency component is enabled.
    pub fn has_adjacent_faces(&self) -> bool {
        self.adj_faces.is_some()
    }

    /// Get the adjacent-face list of one face.
    pub fn adjacent_faces(&self, id: FaceId<I>) -> Result<&DynRefs<FaceId<I>>> {
        let arr = self.adj_faces.as_ref().ok_or(MeshError::ComponentNotEnabled {
            component: "face adjacent faces",
        })?;
        arr.get(id.index()).ok_or(MeshError::OutOfRange {
            index: id.index(),
            len: arr.len(),
        })
    }

    /// Get the mutable adjacent-face list of one face.
    pub fn adjacent_faces_mut(&mut self, id: FaceId<I>) -> Result<&mut DynRefs<FaceId<I>>> {
        let arr = self.adj_faces.as_mut().ok_or(MeshError::ComponentNotEnabled {
            component: "face adjacent faces",
        })?;
        let len = arr.len();
        arr.get_mut(id.index()).ok_or(MeshError::OutOfRange {
            index: id.index(),
            len,
        })
    }

    // ==================== Custom components ====================

    /// Add a per-face custom component named `name` with value type `T`.
    pub fn add_custom<T: CustomValue>(&mut self, name: &str) -> Result<()> {
        self.custom.add::<T>(name)
    }

    /// Remove the per-face custom component named `name`.
    pub fn remove_custom(&mut self, name: &str) -> Result<()> {
        self.custom.remove(name)
    }

    /// Check if a per-face custom component named `name` exists.
    pub fn has_custom(&self, name: &str) -> bool {
        self.custom.has(name)
    }

    /// Get the custom value of one face.
    pub fn custom<T: CustomValue>(&self, name: &str, id: FaceId<I>) -> Result<&T> {
        self.custom.get(name, id.index())
    }

    /// Set the custom value of one face.
    pub fn set_custom<T: CustomValue>(
        &mut self,
        name: &str,
        id: FaceId<I>,
        value: T,
    ) -> Result<()> {
        self.custom.set(name, id.index(), value)
    }

    /// Iterate over the names of the per-face custom components.
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

#[cfg(test)]
mod tests {
    use super::*;

    type TriContainer = FaceContainer<FixedRefs<VertexId<u32>, 3>, u32>;
    type PolyContainer = FaceContainer<DynRefs<VertexId<u32>>, u32>;

    fn v(i: usize) -> VertexId<u32> {
        VertexId::new(i)
    }

    #[test]
    fn test_push_from_ids_checks_arity() {
        let mut c = TriContainer::new();
        let f = c.push_from_ids(&[v(0), v(1), v(2)]).unwrap();
        assert_eq!(c.face(f).vertex_count(), 3);

        assert!(matches!(
            c.push_from_ids(&[v(0), v(1)]),
            Err(MeshError::SizeMismatch {
                expected: 3,
                actual: 2
            })
        ));
        assert_eq!(c.live_count(), 1);
    }

    #[test]
    fn test_polygon_faces_accept_any_arity() {
        let mut c = PolyContainer::new();
        let tri = c.push_from_ids(&[v(0), v(1), v(2)]).unwrap();
        let pent = c.push_from_ids(&[v(0), v(2), v(3), v(4), v(5)]).unwrap();
        assert_eq!(c.face(tri).vertex_count(), 3);
        assert_eq!(c.face(pent).vertex_count(), 5);
    }

    #[test]
    fn test_corner_queries() {
        let mut c = TriContainer::new();
        let f = c.push_from_ids(&[v(4), v(7), v(9)]).unwrap();

        let face = c.face(f);
        assert_eq!(face.vertex(1), v(7));
        assert_eq!(face.vertex_mod(-1), v(9));
        assert!(face.contains_vertex(v(4)));
        assert_eq!(face.index_of_vertex(v(9)), Some(2));
        assert_eq!(face.index_of_edge(v(9), v(4)), Some(2));
        assert_eq!(face.index_of_edge(v(4), v(9)), Some(2));
    }

    #[test]
    fn test_wedge_tex_coords_arity() {
        let mut c = TriContainer::new();
        let f = c.push_from_ids(&[v(0), v(1), v(2)]).unwrap();
        c.enable_wedge_tex_coords();

        assert!(c.wedge_tex_coords(f).unwrap().is_empty());

        let coords = [
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(0.0, 1.0),
        ];
        c.set_wedge_tex_coords(f, &coords).unwrap();
        assert_eq!(c.wedge_tex_coords(f).unwrap().len(), 3);

        assert!(matches!(
            c.set_wedge_tex_coords(f, &coords[..2]),
            Err(MeshError::SizeMismatch {
                expected: 3,
                actual: 2
            })
        ));
    }

    #[test]
    fn test_compact_rewrites_indices_and_slots() {
        let mut c = TriContainer::new();
        c.enable_colors();
        let f0 = c.push_from_ids(&[v(0), v(1), v(2)]).unwrap();
        let f1 = c.push_from_ids(&[v(0), v(2), v(3)]).unwrap();
        let f2 = c.push_from_ids(&[v(0), v(3), v(4)]).unwrap();
        c.set_color(f2, Color::BLUE).unwrap();

        c.delete(f0);
        let map = c.compact();

        assert_eq!(c.live_count(), 2);
        assert_eq!(map.get(f1.index()), Some(0));
        assert_eq!(map.get(f2.index()), Some(1));
        for (i, (_, f)) in c.iter().enumerate() {
            assert_eq!(f.index(), i);
        }
        assert_eq!(c.color(FaceId::new(1)).unwrap(), Color::BLUE);
    }

    #[test]
    fn test_remap_vertex_refs_nulls_removed_targets() {
        let mut c = TriContainer::new();
        let f = c.push_from_ids(&[v(0), v(1), v(2)]).unwrap();

        // Vertex 1 removed; 2 shifts down to 1.
        let mut map: IndexMap<u32> = IndexMap::with_removed(3);
        map.set(0, 0);
        map.set(2, 1);
        c.remap_vertex_refs(&map);

        let face = c.face(f);
        assert_eq!(face.vertex(0), v(0));
        assert!(!face.vertex(1).is_valid());
        assert_eq!(face.vertex(2), v(1));
    }
}
