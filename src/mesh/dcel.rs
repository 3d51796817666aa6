//! Half-edge (doubly-connected edge list) mesh.
//!
//! [`DcelMesh`] is the topology-heavy alternative to the indexed
//! [`Mesh`](super::mesh::Mesh) flavors: every edge is split into two
//! half-edges pointing in opposite directions, each knowing its twin, the
//! next and previous half-edge around its face, its origin vertex, and its
//! incident face. Vertices and faces store one incident half-edge each.
//!
//! Adjacency is *derived* by walking these links instead of stored in
//! per-element lists, so this type carries no adjacent-face/adjacent-vertex
//! or wedge components. The two topology models are mutually exclusive by
//! construction, and a mesh type mixing them cannot be written.
//!
//! # Boundary Handling
//!
//! Boundary half-edges (on mesh boundaries) have an invalid face id. Their
//! twins are the interior half-edges. Boundary loops can be traversed using
//! the `next` pointer on boundary half-edges, and boundary vertices always
//! point at an outgoing boundary half-edge.
//!
//! # Deletion
//!
//! Vertices and faces tombstone like container elements and are removed by
//! an explicit [`compact`](DcelMesh::compact), which remaps every link
//! through the returned index tables. Compaction nulls links left dangling
//! by deletion (a half-edge whose face was removed becomes a boundary
//! half-edge); it does not re-stitch topology. Delete incident faces
//! before their vertices if a consistent walkable boundary is needed.

use std::collections::HashMap;

use nalgebra::{Point3, Vector3};

use crate::capability::MeshCapabilities;
use crate::component::{Color, ElementFlags};
use crate::container::vertical_component;
use crate::error::{MeshError, Result};
use crate::index::{FaceId, HalfEdgeId, IndexMap, MeshIndex, VertexId};

/// A vertex in the half-edge mesh.
#[derive(Debug, Clone)]
pub struct DcelVertex<I: MeshIndex = u32> {
    /// The 3D position of this vertex.
    pub position: Point3<f64>,

    /// One outgoing half-edge from this vertex.
    /// For boundary vertices, this is guaranteed to be a boundary half-edge.
    pub halfedge: HalfEdgeId<I>,

    flags: ElementFlags,
    index: I,
}

impl<I: MeshIndex> DcelVertex<I> {
    fn new(position: Point3<f64>, index: I) -> Self {
        Self {
            position,
            halfedge: HalfEdgeId::invalid(),
            flags: ElementFlags::new(),
            index,
        }
    }

    /// This vertex's ordinal position in the mesh.
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
    #[inline]
    pub fn flags_mut(&mut self) -> &mut ElementFlags {
        &mut self.flags
    }

    /// Check the deleted flag.
    #[inline]
    pub fn is_deleted(&self) -> bool {
        self.flags.is_deleted()
    }
}

/// A half-edge in the mesh.
#[derive(Debug, Clone, Copy)]
pub struct DcelHalfEdge<I: MeshIndex = u32> {
    /// The vertex this half-edge originates from.
    pub origin: VertexId<I>,

    /// The opposite half-edge (pointing in the reverse direction).
    pub twin: HalfEdgeId<I>,

    /// The next half-edge around the face (counter-clockwise).
    pub next: HalfEdgeId<I>,

    /// The previous half-edge around the face (clockwise).
    /// This is redundant but speeds up many operations.
    pub prev: HalfEdgeId<I>,

    /// The face this half-edge belongs to.
    /// Invalid for boundary half-edges.
    pub face: FaceId<I>,
}

impl<I: MeshIndex> DcelHalfEdge<I> {
    /// Create a new uninitialized half-edge.
    pub fn new() -> Self {
        Self {
            origin: VertexId::invalid(),
            twin: HalfEdgeId::invalid(),
            next: HalfEdgeId::invalid(),
            prev: HalfEdgeId::invalid(),
            face: FaceId::invalid(),
        }
    }

    /// Check if this half-edge is on the boundary.
    #[inline]
    pub fn is_boundary(&self) -> bool {
        !self.face.is_valid()
    }
}

impl<I: MeshIndex> Default for DcelHalfEdge<I> {
    fn default() -> Self {
        Self::new()
    }
}

/// A face in the half-edge mesh.
#[derive(Debug, Clone)]
pub struct DcelFace<I: MeshIndex = u32> {
    /// One half-edge on the boundary of this face.
    pub halfedge: HalfEdgeId<I>,

    flags: ElementFlags,
    index: I,
}

impl<I: MeshIndex> DcelFace<I> {
    fn new(halfedge: HalfEdgeId<I>, index: I) -> Self {
        Self {
            halfedge,
            flags: ElementFlags::new(),
            index,
        }
    }

    /// This face's ordinal position in the mesh.
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
    #[inline]
    pub fn flags_mut(&mut self) -> &mut ElementFlags {
        &mut self.flags
    }

    /// Check the deleted flag.
    #[inline]
    pub fn is_deleted(&self) -> bool {
        self.flags.is_deleted()
    }
}

/// A half-edge mesh for triangle meshes.
///
/// Stores vertices, half-edges, and faces with full connectivity
/// information, enabling O(1) adjacency queries, plus the same optional
/// vertical attribute slots (normals, colors, quality) the indexed meshes
/// carry.
#[derive(Debug, Clone)]
pub struct DcelMesh<I: MeshIndex = u32> {
    vertices: Vec<DcelVertex<I>>,
    halfedges: Vec<DcelHalfEdge<I>>,
    faces: Vec<DcelFace<I>>,
    num_deleted_vertices: usize,
    num_deleted_faces: usize,
    vertex_normals: Option<Vec<Vector3<f64>>>,
    vertex_colors: Option<Vec<Color>>,
    vertex_quality: Option<Vec<f64>>,
    face_normals: Option<Vec<Vector3<f64>>>,
    face_colors: Option<Vec<Color>>,
    face_quality: Option<Vec<f64>>,
}

impl<I: MeshIndex> Default for DcelMesh<I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: MeshIndex> DcelMesh<I> {
    /// Create a new empty mesh.
    pub fn new() -> Self {
        Self {
            vertices: Vec::new(),
            halfedges: Vec::new(),
            faces: Vec::new(),
            num_deleted_vertices: 0,
            num_deleted_faces: 0,
            vertex_normals: None,
            vertex_colors: None,
            vertex_quality: None,
            face_normals: None,
            face_colors: None,
            face_quality: None,
        }
    }

    /// Create a mesh with pre-allocated capacity.
    pub fn with_capacity(num_vertices: usize, num_faces: usize) -> Self {
        // Each triangle has 3 half-edges, but each interior edge is shared.
        // For a closed mesh: HE = 3F; with boundary, slightly more.
        let num_halfedges = num_faces * 3 + num_faces / 2;

        let mut mesh = Self::new();
        mesh.vertices.reserve(num_vertices);
        mesh.halfedges.reserve(num_halfedges);
        mesh.faces.reserve(num_faces);
        mesh
    }

    // ==================== Accessors ====================

    /// Number of live vertices.
    #[inline]
    pub fn num_vertices(&self) -> usize {
        self.vertices.len() - self.num_deleted_vertices
    }

    /// Number of half-edges.
    #[inline]
    pub fn num_halfedges(&self) -> usize {
        self.halfedges.len()
    }

    /// Number of live faces.
    #[inline]
    pub fn num_faces(&self) -> usize {
        self.faces.len() - self.num_deleted_faces
    }

    /// Number of vertex slots, tombstoned ones included.
    #[inline]
    pub fn vertex_slot_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of face slots, tombstoned ones included.
    #[inline]
    pub fn face_slot_count(&self) -> usize {
        self.faces.len()
    }

    /// Get a vertex by id.
    ///
    /// # Panics
    /// Panics if the id is invalid or past the end of the mesh.
    #[inline]
    pub fn vertex(&self, id: VertexId<I>) -> &DcelVertex<I> {
        &self.vertices[id.index()]
    }

    /// Get a mutable vertex by id.
    ///
    /// # Panics
    /// Panics if the id is invalid or past the end of the mesh.
    #[inline]
    pub fn vertex_mut(&mut self, id: VertexId<I>) -> &mut DcelVertex<I> {
        &mut self.vertices[id.index()]
    }

    /// Get a half-edge by id.
    ///
    /// # Panics
    /// Panics if the id is invalid or past the end of the mesh.
    #[inline]
    pub fn halfedge(&self, id: HalfEdgeId<I>) -> &DcelHalfEdge<I> {
        &self.halfedges[id.index()]
    }

    /// Get a mutable half-edge by id.
    ///
    /// # Panics
    /// Panics if the id is invalid or past the end of the mesh.
    #[inline]
    pub fn halfedge_mut(&mut self, id: HalfEdgeId<I>) -> &mut DcelHalfEdge<I> {
        &mut self.halfedges[id.index()]
    }

    /// Get a face by id.
    ///
    /// # Panics
    /// Panics if the id is invalid or past the end of the mesh.
    #[inline]
    pub fn face(&self, id: FaceId<I>) -> &DcelFace<I> {
        &self.faces[id.index()]
    }

    /// Get a mutable face by id.
    ///
    /// # Panics
    /// Panics if the id is invalid or past the end of the mesh.
    #[inline]
    pub fn face_mut(&mut self, id: FaceId<I>) -> &mut DcelFace<I> {
        &mut self.faces[id.index()]
    }

    /// Get the position of a vertex.
    #[inline]
    pub fn position(&self, v: VertexId<I>) -> &Point3<f64> {
        &self.vertex(v).position
    }

    /// Set the position of a vertex.
    #[inline]
    pub fn set_position(&mut self, v: VertexId<I>, pos: Point3<f64>) {
        self.vertex_mut(v).position = pos;
    }

    // ==================== Topology Queries ====================

    /// Get the twin (opposite) half-edge.
    #[inline]
    pub fn twin(&self, he: HalfEdgeId<I>) -> HalfEdgeId<I> {
        self.halfedge(he).twin
    }

    /// Get the next half-edge around the face.
    #[inline]
    pub fn next(&self, he: HalfEdgeId<I>) -> HalfEdgeId<I> {
        self.halfedge(he).next
    }

    /// Get the previous half-edge around the face.
    #[inline]
    pub fn prev(&self, he: HalfEdgeId<I>) -> HalfEdgeId<I> {
        self.halfedge(he).prev
    }

    /// Get the origin vertex of a half-edge.
    #[inline]
    pub fn origin(&self, he: HalfEdgeId<I>) -> VertexId<I> {
        self.halfedge(he).origin
    }

    /// Get the destination vertex of a half-edge.
    #[inline]
    pub fn dest(&self, he: HalfEdgeId<I>) -> VertexId<I> {
        self.origin(self.twin(he))
    }

    /// Get the face of a half-edge.
    #[inline]
    pub fn face_of(&self, he: HalfEdgeId<I>) -> FaceId<I> {
        self.halfedge(he).face
    }

    /// Check if a half-edge is on the boundary.
    #[inline]
    pub fn is_boundary_halfedge(&self, he: HalfEdgeId<I>) -> bool {
        self.halfedge(he).is_boundary()
    }

    /// Check if a vertex is on the boundary.
    pub fn is_boundary_vertex(&self, v: VertexId<I>) -> bool {
        let start = self.vertex(v).halfedge;
        if !start.is_valid() {
            return true; // Isolated vertex
        }

        // Walk around the vertex using the same logic as VertexHalfEdgeIter
        let mut he = start;
        loop {
            if self.is_boundary_halfedge(he) {
                return true;
            }
            he = self.next(self.twin(he));
            if he == start {
                break;
            }
        }
        false
    }

    /// Check if an edge (represented by one of its half-edges) is on the
    /// boundary.
    #[inline]
    pub fn is_boundary_edge(&self, he: HalfEdgeId<I>) -> bool {
        self.is_boundary_halfedge(he) || self.is_boundary_halfedge(self.twin(he))
    }

    // ==================== Iteration ====================

    /// Iterate over the ids of all live vertices.
    pub fn vertex_ids(&self) -> impl Iterator<Item = VertexId<I>> + '_ {
        self.vertices
            .iter()
            .enumerate()
            .filter(|(_, v)| !v.is_deleted())
            .map(|(i, _)| VertexId::new(i))
    }

    /// Iterate over all live vertices with their ids.
    pub fn vertices(&self) -> impl Iterator<Item = (VertexId<I>, &DcelVertex<I>)> + '_ {
        self.vertices
            .iter()
            .enumerate()
            .filter(|(_, v)| !v.is_deleted())
            .map(|(i, v)| (VertexId::new(i), v))
    }

    /// Iterate over all half-edge ids.
    pub fn halfedge_ids(&self) -> impl Iterator<Item = HalfEdgeId<I>> + '_ {
        (0..self.halfedges.len()).map(HalfEdgeId::new)
    }

    /// Iterate over all half-edges with their ids.
    pub fn halfedges(&self) -> impl Iterator<Item = (HalfEdgeId<I>, &DcelHalfEdge<I>)> + '_ {
        self.halfedges
            .iter()
            .enumerate()
            .map(|(i, he)| (HalfEdgeId::new(i), he))
    }

    /// Iterate over the ids of all live faces.
    pub fn face_ids(&self) -> impl Iterator<Item = FaceId<I>> + '_ {
        self.faces
            .iter()
            .enumerate()
            .filter(|(_, f)| !f.is_deleted())
            .map(|(i, _)| FaceId::new(i))
    }

    /// Iterate over all live faces with their ids.
    pub fn faces(&self) -> impl Iterator<Item = (FaceId<I>, &DcelFace<I>)> + '_ {
        self.faces
            .iter()
            .enumerate()
            .filter(|(_, f)| !f.is_deleted())
            .map(|(i, f)| (FaceId::new(i), f))
    }

    /// Iterate over half-edges around a vertex (outgoing half-edges).
    pub fn vertex_halfedges(&self, v: VertexId<I>) -> VertexHalfEdgeIter<'_, I> {
        VertexHalfEdgeIter::new(self, v)
    }

    /// Iterate over vertices adjacent to a vertex.
    ///
    /// This is the derived replacement for a stored adjacent-vertex list.
    pub fn vertex_neighbors(&self, v: VertexId<I>) -> impl Iterator<Item = VertexId<I>> + '_ {
        self.vertex_halfedges(v).map(|he| self.dest(he))
    }

    /// Iterate over faces adjacent to a vertex.
    ///
    /// This is the derived replacement for a stored adjacent-face list.
    pub fn vertex_faces(&self, v: VertexId<I>) -> impl Iterator<Item = FaceId<I>> + '_ {
        self.vertex_halfedges(v).filter_map(|he| {
            let f = self.face_of(he);
            f.is_valid().then_some(f)
        })
    }

    /// Iterate over half-edges around a face.
    pub fn face_halfedges(&self, f: FaceId<I>) -> FaceHalfEdgeIter<'_, I> {
        FaceHalfEdgeIter::new(self, f)
    }

    /// Iterate over vertices of a face.
    pub fn face_vertices(&self, f: FaceId<I>) -> impl Iterator<Item = VertexId<I>> + '_ {
        self.face_halfedges(f).map(|he| self.origin(he))
    }

    /// Get the three vertices of a triangular face.
    pub fn face_triangle(&self, f: FaceId<I>) -> [VertexId<I>; 3] {
        let he0 = self.face(f).halfedge;
        let he1 = self.next(he0);
        let he2 = self.next(he1);
        [self.origin(he0), self.origin(he1), self.origin(he2)]
    }

    /// Get the positions of the three vertices of a triangular face.
    pub fn face_positions(&self, f: FaceId<I>) -> [Point3<f64>; 3] {
        let [v0, v1, v2] = self.face_triangle(f);
        [*self.position(v0), *self.position(v1), *self.position(v2)]
    }

    // ==================== Geometry ====================

    /// Compute the normal of a face.
    pub fn face_normal(&self, f: FaceId<I>) -> Vector3<f64> {
        let [p0, p1, p2] = self.face_positions(f);
        let e1 = p1 - p0;
        let e2 = p2 - p0;
        e1.cross(&e2).normalize()
    }

    /// Compute the area of a face.
    pub fn face_area(&self, f: FaceId<I>) -> f64 {
        let [p0, p1, p2] = self.face_positions(f);
        let e1 = p1 - p0;
        let e2 = p2 - p0;
        0.5 * e1.cross(&e2).norm()
    }

    /// Compute the area-weighted normal at a vertex.
    pub fn vertex_normal(&self, v: VertexId<I>) -> Vector3<f64> {
        let mut normal = Vector3::zeros();
        for f in self.vertex_faces(v) {
            let [p0, p1, p2] = self.face_positions(f);
            let e1 = p1 - p0;
            let e2 = p2 - p0;
            normal += e1.cross(&e2); // Area-weighted (not normalized)
        }
        normal.normalize()
    }

    /// Compute the length of an edge.
    pub fn edge_length(&self, he: HalfEdgeId<I>) -> f64 {
        let p0 = self.position(self.origin(he));
        let p1 = self.position(self.dest(he));
        (p1 - p0).norm()
    }

    /// Compute the centroid of a face.
    pub fn face_centroid(&self, f: FaceId<I>) -> Point3<f64> {
        let [p0, p1, p2] = self.face_positions(f);
        Point3::from((p0.coords + p1.coords + p2.coords) / 3.0)
    }

    /// Compute the valence (degree) of a vertex.
    pub fn valence(&self, v: VertexId<I>) -> usize {
        self.vertex_halfedges(v).count()
    }

    /// Compute the bounding box over live vertices.
    pub fn bounding_box(&self) -> Option<(Point3<f64>, Point3<f64>)> {
        let mut iter = self.vertices().map(|(_, v)| v.position);
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

    /// Compute the total surface area over live faces.
    pub fn surface_area(&self) -> f64 {
        self.face_ids().map(|f| self.face_area(f)).sum()
    }

    // ==================== Construction ====================

    /// Add a new vertex and return its id.
    ///
    /// Every enabled vertex attribute array grows in lock-step.
    pub fn add_vertex(&mut self, position: Point3<f64>) -> VertexId<I> {
        let id = VertexId::new(self.vertices.len());
        self.vertices
            .push(DcelVertex::new(position, I::from_usize(id.index())));
        if let Some(arr) = &mut self.vertex_normals {
            arr.push(Vector3::zeros());
        }
        if let Some(arr) = &mut self.vertex_colors {
            arr.push(Color::WHITE);
        }
        if let Some(arr) = &mut self.vertex_quality {
            arr.push(0.0);
        }
        id
    }

    /// Build a half-edge mesh from vertices and triangle faces.
    ///
    /// # Arguments
    /// * `vertices` - List of vertex positions
    /// * `faces` - List of triangle faces, each as `[v0, v1, v2]` indices
    ///
    /// # Example
    /// ```
    /// use trellis::mesh::DcelMesh;
    /// use nalgebra::Point3;
    ///
    /// let vertices = vec![
    ///     Point3::new(0.0, 0.0, 0.0),
    ///     Point3::new(1.0, 0.0, 0.0),
    ///     Point3::new(0.5, 1.0, 0.0),
    /// ];
    /// let faces = vec![[0, 1, 2]];
    ///
    /// let mesh: DcelMesh = DcelMesh::from_triangles(&vertices, &faces).unwrap();
    /// assert_eq!(mesh.num_vertices(), 3);
    /// assert_eq!(mesh.num_halfedges(), 6);
    /// ```
    pub fn from_triangles(vertices: &[Point3<f64>], faces: &[[usize; 3]]) -> Result<Self> {
        if faces.is_empty() {
            return Err(MeshError::EmptyMesh);
        }

        // Validate vertex indices and degeneracy
        for (fi, face) in faces.iter().enumerate() {
            for &vi in face {
                if vi >= vertices.len() {
                    return Err(MeshError::InvalidVertexIndex {
                        face: fi,
                        vertex: vi,
                    });
                }
            }
            if face[0] == face[1] || face[1] == face[2] || face[0] == face[2] {
                return Err(MeshError::DegenerateFace { face: fi });
            }
        }

        let mut mesh = Self::with_capacity(vertices.len(), faces.len());

        let vertex_ids: Vec<VertexId<I>> =
            vertices.iter().map(|&pos| mesh.add_vertex(pos)).collect();

        // Map from directed edge (v0, v1) to half-edge id
        let mut edge_map: HashMap<(usize, usize), HalfEdgeId<I>> = HashMap::new();

        // First pass: create all half-edges and faces
        for face in faces {
            let v0 = face[0];
            let v1 = face[1];
            let v2 = face[2];

            let he0 = HalfEdgeId::<I>::new(mesh.halfedges.len());
            let he1 = HalfEdgeId::<I>::new(mesh.halfedges.len() + 1);
            let he2 = HalfEdgeId::<I>::new(mesh.halfedges.len() + 2);

            for _ in 0..3 {
                mesh.halfedges.push(DcelHalfEdge::new());
            }

            let face_id = FaceId::<I>::new(mesh.faces.len());
            mesh.faces
                .push(DcelFace::new(he0, I::from_usize(face_id.index())));

            // Half-edge connectivity within the face (counter-clockwise)
            {
                let he = mesh.halfedge_mut(he0);
                he.origin = vertex_ids[v0];
                he.next = he1;
                he.prev = he2;
                he.face = face_id;
            }
            {
                let he = mesh.halfedge_mut(he1);
                he.origin = vertex_ids[v1];
                he.next = he2;
                he.prev = he0;
                he.face = face_id;
            }
            {
                let he = mesh.halfedge_mut(he2);
                he.origin = vertex_ids[v2];
                he.next = he0;
                he.prev = he1;
                he.face = face_id;
            }

            // Set vertex half-edges (overwritten for shared vertices)
            mesh.vertex_mut(vertex_ids[v0]).halfedge = he0;
            mesh.vertex_mut(vertex_ids[v1]).halfedge = he1;
            mesh.vertex_mut(vertex_ids[v2]).halfedge = he2;

            // Record edges for twin linking
            edge_map.insert((v0, v1), he0);
            edge_map.insert((v1, v2), he1);
            edge_map.insert((v2, v0), he2);
        }

        // Second pass: link twins
        for (&(v0, v1), &he) in &edge_map {
            if let Some(&twin) = edge_map.get(&(v1, v0)) {
                mesh.halfedge_mut(he).twin = twin;
            } else {
                // Boundary edge - create boundary half-edge
                let boundary_he = HalfEdgeId::<I>::new(mesh.halfedges.len());
                mesh.halfedges.push(DcelHalfEdge::new());

                mesh.halfedge_mut(he).twin = boundary_he;
                {
                    let bhe = mesh.halfedge_mut(boundary_he);
                    bhe.origin = vertex_ids[v1];
                    bhe.twin = he;
                    // Face stays invalid (boundary)
                }
            }
        }

        // Third pass: link boundary half-edges into loops
        mesh.link_boundary_loops();

        // Fourth pass: ensure boundary vertices point to boundary half-edges
        mesh.fix_boundary_vertex_halfedges();

        tracing::debug!(
            vertices = mesh.num_vertices(),
            halfedges = mesh.num_halfedges(),
            faces = mesh.num_faces(),
            "built half-edge mesh"
        );
        Ok(mesh)
    }

    // Link boundary half-edges into proper loops.
    fn link_boundary_loops(&mut self) {
        let boundary_hes: Vec<HalfEdgeId<I>> = self
            .halfedge_ids()
            .filter(|&he| self.is_boundary_halfedge(he))
            .collect();

        // Group by origin vertex for quick lookup
        let mut outgoing: HashMap<usize, HalfEdgeId<I>> = HashMap::new();
        for he in &boundary_hes {
            outgoing.insert(self.origin(*he).index(), *he);
        }

        for &he in &boundary_hes {
            // The next boundary half-edge starts where this one ends
            let dest = self.dest(he).index();
            if let Some(&next_he) = outgoing.get(&dest) {
                self.halfedge_mut(he).next = next_he;
                self.halfedge_mut(next_he).prev = he;
            }
        }
    }

    // Ensure boundary vertices point to a boundary half-edge.
    fn fix_boundary_vertex_halfedges(&mut self) {
        for vid in self.vertex_ids().collect::<Vec<_>>() {
            let start_he = self.vertex(vid).halfedge;
            if !start_he.is_valid() {
                continue;
            }

            let mut he = start_he;
            loop {
                if self.is_boundary_halfedge(he) {
                    self.vertex_mut(vid).halfedge = he;
                    break;
                }
                he = self.next(self.twin(he));
                if he == start_he {
                    break;
                }
            }
        }
    }

    // ==================== Deletion and compaction ====================

    /// Tombstone a vertex. Physical removal happens at compaction.
    pub fn delete_vertex(&mut self, id: VertexId<I>) {
        let vertex = &mut self.vertices[id.index()];
        if !vertex.flags.is_deleted() {
            vertex.flags.set_deleted();
            self.num_deleted_vertices += 1;
        }
    }

    /// Tombstone a face. Physical removal happens at compaction.
    ///
    /// The face's half-edges keep their links until compaction, which turns
    /// them into boundary half-edges.
    pub fn delete_face(&mut self, id: FaceId<I>) {
        let face = &mut self.faces[id.index()];
        if !face.flags.is_deleted() {
            face.flags.set_deleted();
            self.num_deleted_faces += 1;
        }
    }

    /// Check if a vertex is tombstoned.
    #[inline]
    pub fn is_deleted_vertex(&self, id: VertexId<I>) -> bool {
        self.vertex(id).is_deleted()
    }

    /// Check if a face is tombstoned.
    #[inline]
    pub fn is_deleted_face(&self, id: FaceId<I>) -> bool {
        self.face(id).is_deleted()
    }

    /// Physically remove tombstoned vertices and faces.
    ///
    /// Half-edges are kept; every link is rewritten through the returned
    /// (vertex, face) tables, so a half-edge whose face was removed becomes
    /// a boundary half-edge and one whose origin was removed gets an
    /// invalid origin. Vertical attribute arrays are remapped in lock-step.
    pub fn compact(&mut self) -> (IndexMap<I>, IndexMap<I>) {
        let vmap = {
            let mut map = IndexMap::with_removed(self.vertices.len());
            let mut keep = Vec::with_capacity(self.num_vertices());
            for (i, v) in self.vertices.iter().enumerate() {
                if !v.is_deleted() {
                    map.set(i, keep.len());
                    keep.push(i);
                }
            }
            if self.num_deleted_vertices > 0 {
                crate::container::compact_in_place(&mut self.vertices, &keep);
                for (i, v) in self.vertices.iter_mut().enumerate() {
                    v.index = I::from_usize(i);
                }
                if let Some(arr) = &mut self.vertex_normals {
                    crate::container::compact_in_place(arr, &keep);
                }
                if let Some(arr) = &mut self.vertex_colors {
                    crate::container::compact_in_place(arr, &keep);
                }
                if let Some(arr) = &mut self.vertex_quality {
                    crate::container::compact_in_place(arr, &keep);
                }
                self.num_deleted_vertices = 0;
            }
            map
        };

        let fmap = {
            let mut map = IndexMap::with_removed(self.faces.len());
            let mut keep = Vec::with_capacity(self.num_faces());
            for (i, f) in self.faces.iter().enumerate() {
                if !f.is_deleted() {
                    map.set(i, keep.len());
                    keep.push(i);
                }
            }
            if self.num_deleted_faces > 0 {
                crate::container::compact_in_place(&mut self.faces, &keep);
                for (i, f) in self.faces.iter_mut().enumerate() {
                    f.index = I::from_usize(i);
                }
                if let Some(arr) = &mut self.face_normals {
                    crate::container::compact_in_place(arr, &keep);
                }
                if let Some(arr) = &mut self.face_colors {
                    crate::container::compact_in_place(arr, &keep);
                }
                if let Some(arr) = &mut self.face_quality {
                    crate::container::compact_in_place(arr, &keep);
                }
                self.num_deleted_faces = 0;
            }
            map
        };

        if !vmap.is_identity() || !fmap.is_identity() {
            for he in &mut self.halfedges {
                if he.origin.is_valid() {
                    he.origin = vmap.map(he.origin);
                }
                if he.face.is_valid() {
                    he.face = fmap.map(he.face);
                }
            }
            // A vertex whose outgoing half-edge survived keeps it; the
            // half-edge array itself never moves.
        }

        tracing::debug!(
            vertices_removed = vmap.num_removed(),
            faces_removed = fmap.num_removed(),
            "compacted half-edge mesh"
        );
        (vmap, fmap)
    }

    // ==================== Optional components ====================

    vertical_component!(
        vertex_normals, vertices, Vector3<f64>, Vector3::zeros(), "vertex normals", VertexId<I>,
        enable_vertex_normals, disable_vertex_normals, has_vertex_normals,
        get_vertex_normal, set_vertex_normal, vertex_normal_slice
    );

    vertical_component!(
        vertex_colors, vertices, Color, Color::WHITE, "vertex colors", VertexId<I>,
        enable_vertex_colors, disable_vertex_colors, has_vertex_colors,
        get_vertex_color, set_vertex_color, vertex_color_slice
    );

    vertical_component!(
        vertex_quality, vertices, f64, 0.0, "vertex quality", VertexId<I>,
        enable_vertex_quality, disable_vertex_quality, has_vertex_quality,
        get_vertex_quality, set_vertex_quality, vertex_quality_slice
    );

    vertical_component!(
        face_normals, faces, Vector3<f64>, Vector3::zeros(), "face normals", FaceId<I>,
        enable_face_normals, disable_face_normals, has_face_normals,
        get_face_normal, set_face_normal, face_normal_slice
    );

    vertical_component!(
        face_colors, faces, Color, Color::WHITE, "face colors", FaceId<I>,
        enable_face_colors, disable_face_colors, has_face_colors,
        get_face_color, set_face_color, face_color_slice
    );

    vertical_component!(
        face_quality, faces, f64, 0.0, "face quality", FaceId<I>,
        enable_face_quality, disable_face_quality, has_face_quality,
        get_face_quality, set_face_quality, face_quality_slice
    );

    /// Recompute the face normal slot for every live face.
    pub fn update_face_normals(&mut self) -> Result<()> {
        if !self.has_face_normals() {
            return Err(MeshError::ComponentNotEnabled {
                component: "face normals",
            });
        }
        let normals: Vec<(FaceId<I>, Vector3<f64>)> = self
            .face_ids()
            .map(|f| (f, self.face_normal(f)))
            .collect();
        for (f, n) in normals {
            self.set_face_normal(f, n)?;
        }
        Ok(())
    }

    /// Recompute the vertex normal slot for every live vertex.
    pub fn update_vertex_normals(&mut self) -> Result<()> {
        if !self.has_vertex_normals() {
            return Err(MeshError::ComponentNotEnabled {
                component: "vertex normals",
            });
        }
        let normals: Vec<(VertexId<I>, Vector3<f64>)> = self
            .vertex_ids()
            .map(|v| (v, self.vertex_normal(v)))
            .collect();
        for (v, n) in normals {
            self.set_vertex_normal(v, n)?;
        }
        Ok(())
    }

    // ==================== Capabilities ====================

    /// The capabilities this mesh type can hold.
    ///
    /// Adjacency and wedge slots are absent: this topology derives
    /// adjacency from half-edge links.
    pub fn supported_capabilities() -> MeshCapabilities {
        MeshCapabilities::VERTICES
            | MeshCapabilities::VERTEX_NORMALS
            | MeshCapabilities::VERTEX_COLORS
            | MeshCapabilities::VERTEX_QUALITY
            | MeshCapabilities::FACES
            | MeshCapabilities::FACE_NORMALS
            | MeshCapabilities::FACE_COLORS
            | MeshCapabilities::FACE_QUALITY
            | MeshCapabilities::HALF_EDGES
    }

    /// The capabilities currently enabled on this mesh instance.
    pub fn enabled_capabilities(&self) -> MeshCapabilities {
        let mut caps = MeshCapabilities::VERTICES
            | MeshCapabilities::FACES
            | MeshCapabilities::HALF_EDGES;
        if self.has_vertex_normals() {
            caps = caps.with(MeshCapabilities::VERTEX_NORMALS);
        }
        if self.has_vertex_colors() {
            caps = caps.with(MeshCapabilities::VERTEX_COLORS);
        }
        if self.has_vertex_quality() {
            caps = caps.with(MeshCapabilities::VERTEX_QUALITY);
        }
        if self.has_face_normals() {
            caps = caps.with(MeshCapabilities::FACE_NORMALS);
        }
        if self.has_face_colors() {
            caps = caps.with(MeshCapabilities::FACE_COLORS);
        }
        if self.has_face_quality() {
            caps = caps.with(MeshCapabilities::FACE_QUALITY);
        }
        caps
    }

    // ==================== Validation ====================

    /// Check if the mesh connectivity is consistent.
    ///
    /// Tombstoned elements are skipped; half-edges referencing them are
    /// only checked for mutual link consistency.
    pub fn is_valid(&self) -> bool {
        // Check vertices
        for (vid, v) in self.vertices() {
            if v.halfedge.is_valid() {
                let he = self.halfedge(v.halfedge);
                if he.origin != vid {
                    return false;
                }
            }
        }

        // Check half-edges
        for (heid, he) in self.halfedges() {
            // Twin consistency
            if he.twin.is_valid() {
                let twin = self.halfedge(he.twin);
                if twin.twin != heid {
                    return false;
                }
            }

            // Next/prev consistency
            if he.next.is_valid() && self.halfedge(he.next).prev != heid {
                return false;
            }
            if he.prev.is_valid() && self.halfedge(he.prev).next != heid {
                return false;
            }
        }

        // Check faces
        for (_fid, f) in self.faces() {
            if !f.halfedge.is_valid() {
                return false;
            }
        }

        true
    }
}

/// Iterator over half-edges around a vertex.
pub struct VertexHalfEdgeIter<'a, I: MeshIndex = u32> {
    mesh: &'a DcelMesh<I>,
    start: HalfEdgeId<I>,
    current: HalfEdgeId<I>,
    done: bool,
}

impl<'a, I: MeshIndex> VertexHalfEdgeIter<'a, I> {
    fn new(mesh: &'a DcelMesh<I>, v: VertexId<I>) -> Self {
        let start = mesh.vertex(v).halfedge;
        Self {
            mesh,
            start,
            current: start,
            done: !start.is_valid(),
        }
    }
}

impl<I: MeshIndex> Iterator for VertexHalfEdgeIter<'_, I> {
    type Item = HalfEdgeId<I>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let result = self.current;

        // Move to next outgoing half-edge: twin -> next.
        // If he goes v -> w, then twin(he) goes w -> v, and
        // next(twin(he)) originates at v again.
        self.current = self.mesh.next(self.mesh.twin(self.current));

        if self.current == self.start || !self.current.is_valid() {
            self.done = true;
        }

        Some(result)
    }
}

/// Iterator over half-edges around a face.
pub struct FaceHalfEdgeIter<'a, I: MeshIndex = u32> {
    mesh: &'a DcelMesh<I>,
    start: HalfEdgeId<I>,
    current: HalfEdgeId<I>,
    done: bool,
}

impl<'a, I: MeshIndex> FaceHalfEdgeIter<'a, I> {
    fn new(mesh: &'a DcelMesh<I>, f: FaceId<I>) -> Self {
        let start = mesh.face(f).halfedge;
        Self {
            mesh,
            start,
            current: start,
            done: !start.is_valid(),
        }
    }
}

impl<I: MeshIndex> Iterator for FaceHalfEdgeIter<'_, I> {
    type Item = HalfEdgeId<I>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let result = self.current;
        self.current = self.mesh.next(self.current);

        if self.current == self.start || !self.current.is_valid() {
            self.done = true;
        }

        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tetrahedron() -> DcelMesh<u32> {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
            Point3::new(0.5, 0.5, 1.0),
        ];
        let faces = vec![
            [0, 2, 1], // bottom
            [0, 1, 3], // front
            [1, 2, 3], // right
            [2, 0, 3], // left
        ];
        DcelMesh::from_triangles(&vertices, &faces).unwrap()
    }

    fn single_triangle() -> DcelMesh<u32> {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
        ];
        DcelMesh::from_triangles(&vertices, &[[0, 1, 2]]).unwrap()
    }

    #[test]
    fn test_tetrahedron_is_closed() {
        let mesh = tetrahedron();
        assert_eq!(mesh.num_vertices(), 4);
        assert_eq!(mesh.num_faces(), 4);
        // 4 faces * 3 half-edges, no boundary
        assert_eq!(mesh.num_halfedges(), 12);
        assert!(mesh.is_valid());

        for v in mesh.vertex_ids() {
            assert!(!mesh.is_boundary_vertex(v));
        }
    }

    #[test]
    fn test_single_triangle_boundary() {
        let mesh = single_triangle();
        assert_eq!(mesh.num_vertices(), 3);
        assert_eq!(mesh.num_faces(), 1);
        // 3 interior + 3 boundary half-edges
        assert_eq!(mesh.num_halfedges(), 6);
        assert!(mesh.is_valid());

        for v in mesh.vertex_ids() {
            assert!(mesh.is_boundary_vertex(v));
            // Boundary vertices point at boundary half-edges.
            assert!(mesh.is_boundary_halfedge(mesh.vertex(v).halfedge));
        }
    }

    #[test]
    fn test_vertex_neighbors() {
        let mesh = tetrahedron();
        // Every tetrahedron vertex neighbors the other three.
        for v in mesh.vertex_ids() {
            let mut neighbors: Vec<usize> =
                mesh.vertex_neighbors(v).map(|n| n.index()).collect();
            neighbors.sort_unstable();
            neighbors.dedup();
            assert_eq!(neighbors.len(), 3);
            assert!(!neighbors.contains(&v.index()));
        }
    }

    #[test]
    fn test_face_triangle_and_geometry() {
        let mesh = single_triangle();
        let f = FaceId::new(0);

        let [v0, v1, v2] = mesh.face_triangle(f);
        assert_eq!([v0.index(), v1.index(), v2.index()], [0, 1, 2]);

        assert!((mesh.face_area(f) - 0.5).abs() < 1e-10);
        let n = mesh.face_normal(f);
        assert!(n.z.abs() > 0.99);

        let c = mesh.face_centroid(f);
        assert!((c.x - 0.5).abs() < 1e-10);
    }

    #[test]
    fn test_valence() {
        let mesh = tetrahedron();
        for v in mesh.vertex_ids() {
            assert_eq!(mesh.valence(v), 3);
        }
    }

    #[test]
    fn test_vertex_attributes() {
        let mut mesh = single_triangle();
        mesh.enable_vertex_colors();
        mesh.set_vertex_color(VertexId::new(1), Color::RED).unwrap();
        assert_eq!(mesh.get_vertex_color(VertexId::new(1)).unwrap(), Color::RED);
        assert_eq!(
            mesh.get_vertex_color(VertexId::new(0)).unwrap(),
            Color::WHITE
        );

        // Attribute arrays follow vertex insertion.
        mesh.add_vertex(Point3::new(2.0, 2.0, 2.0));
        assert_eq!(mesh.vertex_color_slice().unwrap().len(), 4);

        mesh.disable_vertex_colors();
        assert!(mesh.get_vertex_color(VertexId::new(1)).is_err());
    }

    #[test]
    fn test_update_normals() {
        let mut mesh = single_triangle();
        assert!(mesh.update_face_normals().is_err());

        mesh.enable_face_normals();
        mesh.enable_vertex_normals();
        mesh.update_face_normals().unwrap();
        mesh.update_vertex_normals().unwrap();

        let n = mesh.get_face_normal(FaceId::new(0)).unwrap();
        assert!((n.norm() - 1.0).abs() < 1e-10);
        let vn = mesh.get_vertex_normal(VertexId::new(0)).unwrap();
        assert!((vn.z.abs() - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_delete_face_and_compact() {
        let mut mesh = tetrahedron();
        mesh.enable_face_colors();
        mesh.set_face_color(FaceId::new(3), Color::BLUE).unwrap();

        mesh.delete_face(FaceId::new(0));
        assert_eq!(mesh.num_faces(), 3);

        let (vmap, fmap) = mesh.compact();
        assert!(vmap.is_identity());
        assert_eq!(fmap.num_removed(), 1);
        assert_eq!(mesh.num_faces(), 3);
        assert_eq!(mesh.face_slot_count(), 3);

        // The old face 3 moved to slot 2, color along with it.
        assert_eq!(fmap.get(3), Some(2));
        assert_eq!(mesh.get_face_color(FaceId::new(2)).unwrap(), Color::BLUE);

        // Half-edges of the removed face became boundary half-edges.
        let boundary = mesh
            .halfedge_ids()
            .filter(|&he| mesh.is_boundary_halfedge(he))
            .count();
        assert_eq!(boundary, 3);

        // Surviving faces still walk as triangles over live vertices.
        for f in mesh.face_ids() {
            let tri = mesh.face_triangle(f);
            assert!(tri.iter().all(|v| v.is_valid()));
            assert_eq!(mesh.face(f).index(), f.index());
        }
    }

    #[test]
    fn test_delete_vertex_nulls_origins() {
        let mut mesh = tetrahedron();
        // Remove vertex 3 and its incident faces first.
        let incident: Vec<FaceId<u32>> = mesh.vertex_faces(VertexId::new(3)).collect();
        for f in incident {
            mesh.delete_face(f);
        }
        mesh.delete_vertex(VertexId::new(3));

        let (vmap, _fmap) = mesh.compact();
        assert_eq!(mesh.num_vertices(), 3);
        assert_eq!(mesh.num_faces(), 1);
        assert_eq!(vmap.get(3), None);

        // The surviving face references only surviving vertices.
        let f = mesh.face_ids().next().unwrap();
        for v in mesh.face_triangle(f) {
            assert!(v.is_valid());
            assert!(v.index() < 3);
        }
    }

    #[test]
    fn test_compact_noop() {
        let mut mesh = tetrahedron();
        let (vmap, fmap) = mesh.compact();
        assert!(vmap.is_identity());
        assert!(fmap.is_identity());
        assert!(mesh.is_valid());
    }

    #[test]
    fn test_capabilities_have_no_adjacency() {
        let caps = DcelMesh::<u32>::supported_capabilities();
        assert!(caps.has(MeshCapabilities::HALF_EDGES));
        assert!(!caps.has(MeshCapabilities::VERTEX_ADJACENT_FACES));
        assert!(!caps.has(MeshCapabilities::WEDGE_TEX_COORDS));
    }
}
