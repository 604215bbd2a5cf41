//! Half-edge mesh data structure.
//!
//! This module provides a half-edge (doubly-connected edge list) representation
//! for triangle meshes. This structure enables O(1) adjacency queries and is
//! the foundation for the flip operator and the analysis passes.
//!
//! # Structure
//!
//! - Each triangle owns three **half-edges** linked into a `next`/`prev` cycle
//! - Each half-edge knows its **opposite** (the reversed half-edge owned by the
//!   neighbouring triangle), its **origin vertex** and its **face**
//! - Each vertex stores one outgoing half-edge
//! - Each face stores one half-edge of its cycle
//!
//! # Boundary Handling
//!
//! There are no boundary half-edges. A half-edge on the mesh boundary simply
//! has an invalid `opposite`. Walking the fan around a boundary vertex stops
//! at the first such half-edge, so [`VertexFan`] reports whether it completed
//! the ring or was cut short.
//!
//! # Storage
//!
//! Entities live in [`Arena`]s, so handles stay stable across removals of other
//! elements and iteration follows allocation order.

use nalgebra::{Point3, Vector3};

use super::arena::Arena;
use super::index::{FaceId, HalfEdgeId, MeshIndex, VertexId};
use crate::error::{MeshError, Result};

/// A vertex in the half-edge mesh.
#[derive(Debug, Clone)]
pub struct Vertex<I: MeshIndex = u32> {
    /// The 3D position of this vertex.
    pub position: Point3<f64>,

    /// Unit normal averaged from the incident faces.
    pub normal: Vector3<f64>,

    /// Unit normal averaged from the neighbouring vertex normals.
    pub average_normal: Vector3<f64>,

    /// Spread of the 2-ring projected onto `average_normal`.
    ///
    /// `f64::INFINITY` until computed and `f64::MAX` for vertices whose
    /// neighbourhood touches the boundary.
    pub relative_height: f64,

    /// Whether `relative_height` holds a real value.
    pub has_relative_height: bool,

    /// Angle defect `|2π - Σθ|` of the corners at this vertex.
    ///
    /// `None` until analysed and for vertices on the boundary.
    pub angle_defect: Option<f64>,

    /// Number of outgoing half-edges.
    pub halfedge_count: usize,

    /// Insertion order among the vertices of this mesh.
    pub index: usize,

    /// Index of this vertex in the input position array.
    pub source_index: usize,

    /// One outgoing half-edge from this vertex.
    pub halfedge: HalfEdgeId<I>,
}

impl<I: MeshIndex> Vertex<I> {
    /// Create a new isolated vertex.
    pub fn new(position: Point3<f64>, index: usize, source_index: usize) -> Self {
        Self {
            position,
            normal: Vector3::zeros(),
            average_normal: Vector3::zeros(),
            relative_height: f64::INFINITY,
            has_relative_height: false,
            angle_defect: None,
            halfedge_count: 0,
            index,
            source_index,
            halfedge: HalfEdgeId::invalid(),
        }
    }
}

/// A half-edge in the mesh.
#[derive(Debug, Clone, Copy)]
pub struct HalfEdge<I: MeshIndex = u32> {
    /// The vertex this half-edge originates from.
    pub origin: VertexId<I>,

    /// The reversed half-edge of the neighbouring face.
    /// Invalid on the boundary.
    pub opposite: HalfEdgeId<I>,

    /// The next half-edge around the face.
    pub next: HalfEdgeId<I>,

    /// The previous half-edge around the face.
    pub prev: HalfEdgeId<I>,

    /// The face this half-edge belongs to.
    /// Cleared when the half-edge is removed with deferral.
    pub face: FaceId<I>,

    /// Creation order among the half-edges of this mesh.
    pub index: usize,
}

impl<I: MeshIndex> HalfEdge<I> {
    /// Create a new unlinked half-edge.
    pub fn new(index: usize) -> Self {
        Self {
            origin: VertexId::invalid(),
            opposite: HalfEdgeId::invalid(),
            next: HalfEdgeId::invalid(),
            prev: HalfEdgeId::invalid(),
            face: FaceId::invalid(),
            index,
        }
    }

    /// Check if this half-edge is on the boundary.
    #[inline]
    pub fn is_boundary(&self) -> bool {
        !self.opposite.is_valid()
    }
}

/// A face in the half-edge mesh.
#[derive(Debug, Clone, Copy)]
pub struct Face<I: MeshIndex = u32> {
    /// One half-edge of this face's cycle.
    pub halfedge: HalfEdgeId<I>,

    /// Unit normal of the triangle.
    pub normal: Vector3<f64>,
}

impl<I: MeshIndex> Face<I> {
    /// Create a new face with the given half-edge.
    pub fn new(halfedge: HalfEdgeId<I>) -> Self {
        Self {
            halfedge,
            normal: Vector3::zeros(),
        }
    }
}

impl<I: MeshIndex> Default for Face<I> {
    fn default() -> Self {
        Self::new(HalfEdgeId::invalid())
    }
}

/// A half-edge mesh data structure for triangle meshes.
///
/// The mesh exclusively owns its vertices, half-edges and faces. All
/// references between them are handles resolved through the mesh.
#[derive(Debug, Clone)]
pub struct HalfEdgeMesh<I: MeshIndex = u32> {
    pub(crate) vertices: Arena<Vertex<I>>,
    pub(crate) halfedges: Arena<HalfEdge<I>>,
    pub(crate) faces: Arena<Face<I>>,

    /// Next vertex insertion index.
    pub(crate) vertex_serial: usize,
    /// Next half-edge creation index.
    pub(crate) halfedge_serial: usize,

    pub(crate) repeated_halfedges: usize,
    pub(crate) alone_halfedges: usize,
    pub(crate) degenerate_triangles: usize,

    /// Bumped by every mutation made through mesh operations.
    pub(crate) revision: u64,
    pub(crate) flatness_order: Vec<VertexId<I>>,
    pub(crate) flatness_revision: Option<u64>,
}

impl<I: MeshIndex> Default for HalfEdgeMesh<I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: MeshIndex> HalfEdgeMesh<I> {
    /// Create a new empty mesh.
    pub fn new() -> Self {
        Self::with_capacity(0, 0)
    }

    /// Create a mesh with pre-allocated capacity.
    pub fn with_capacity(num_vertices: usize, num_faces: usize) -> Self {
        Self {
            vertices: Arena::with_capacity(num_vertices),
            halfedges: Arena::with_capacity(num_faces * 3),
            faces: Arena::with_capacity(num_faces),
            vertex_serial: 0,
            halfedge_serial: 0,
            repeated_halfedges: 0,
            alone_halfedges: 0,
            degenerate_triangles: 0,
            revision: 0,
            flatness_order: Vec::new(),
            flatness_revision: None,
        }
    }

    // ==================== Accessors ====================

    /// Get the number of live vertices.
    #[inline]
    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    /// Get the number of live half-edges.
    #[inline]
    pub fn num_halfedges(&self) -> usize {
        self.halfedges.len()
    }

    /// Get the number of live faces.
    #[inline]
    pub fn num_faces(&self) -> usize {
        self.faces.len()
    }

    /// Get a vertex by ID.
    ///
    /// # Panics
    /// Panics if the handle refers to a vacant slot.
    #[inline]
    pub fn vertex(&self, id: VertexId<I>) -> &Vertex<I> {
        &self.vertices[id.index()]
    }

    /// Get a mutable vertex by ID.
    #[inline]
    pub fn vertex_mut(&mut self, id: VertexId<I>) -> &mut Vertex<I> {
        &mut self.vertices[id.index()]
    }

    /// Get a half-edge by ID.
    ///
    /// # Panics
    /// Panics if the handle refers to a vacant slot.
    #[inline]
    pub fn halfedge(&self, id: HalfEdgeId<I>) -> &HalfEdge<I> {
        &self.halfedges[id.index()]
    }

    /// Get a mutable half-edge by ID.
    #[inline]
    pub fn halfedge_mut(&mut self, id: HalfEdgeId<I>) -> &mut HalfEdge<I> {
        &mut self.halfedges[id.index()]
    }

    /// Get a face by ID.
    ///
    /// # Panics
    /// Panics if the handle refers to a vacant slot.
    #[inline]
    pub fn face(&self, id: FaceId<I>) -> &Face<I> {
        &self.faces[id.index()]
    }

    /// Get a mutable face by ID.
    #[inline]
    pub fn face_mut(&mut self, id: FaceId<I>) -> &mut Face<I> {
        &mut self.faces[id.index()]
    }

    /// Whether the vertex handle refers to a live vertex.
    #[inline]
    pub fn contains_vertex(&self, id: VertexId<I>) -> bool {
        id.is_valid() && self.vertices.contains(id.index())
    }

    /// Whether the half-edge handle refers to a live half-edge.
    #[inline]
    pub fn contains_halfedge(&self, id: HalfEdgeId<I>) -> bool {
        id.is_valid() && self.halfedges.contains(id.index())
    }

    /// Whether the face handle refers to a live face.
    #[inline]
    pub fn contains_face(&self, id: FaceId<I>) -> bool {
        id.is_valid() && self.faces.contains(id.index())
    }

    /// Get the position of a vertex.
    #[inline]
    pub fn position(&self, v: VertexId<I>) -> &Point3<f64> {
        &self.vertex(v).position
    }

    /// The current mutation revision.
    ///
    /// Incremented by flips, removals and analysis passes. Direct edits through
    /// the `*_mut` accessors are not tracked.
    #[inline]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    #[inline]
    pub(crate) fn touch(&mut self) {
        self.revision += 1;
    }

    // ==================== Defect Counters ====================

    /// Directed half-edges that collided with one already in the mesh while
    /// building.
    #[inline]
    pub fn repeated_halfedges(&self) -> usize {
        self.repeated_halfedges
    }

    /// Half-edges that found no reversed partner while building.
    #[inline]
    pub fn alone_halfedges(&self) -> usize {
        self.alone_halfedges
    }

    /// Input triangles dropped because they repeat a vertex index.
    #[inline]
    pub fn degenerate_triangles(&self) -> usize {
        self.degenerate_triangles
    }

    /// Whether the mesh is a closed surface without detected defects.
    ///
    /// True iff there are at least four faces and both the repeated and the
    /// alone half-edge counters are zero.
    pub fn is_watertight(&self) -> bool {
        self.num_faces() >= 4 && self.repeated_halfedges == 0 && self.alone_halfedges == 0
    }

    // ==================== Topology Queries ====================

    /// Get the opposite half-edge, or `None` on the boundary.
    #[inline]
    pub fn opposite(&self, he: HalfEdgeId<I>) -> Option<HalfEdgeId<I>> {
        self.halfedge(he).opposite.valid()
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
        self.origin(self.next(he))
    }

    /// Get the face of a half-edge, or `None` once it was removed with deferral.
    #[inline]
    pub fn face_of(&self, he: HalfEdgeId<I>) -> Option<FaceId<I>> {
        self.halfedge(he).face.valid()
    }

    /// Check if a half-edge is on the boundary.
    #[inline]
    pub fn is_boundary_halfedge(&self, he: HalfEdgeId<I>) -> bool {
        self.halfedge(he).is_boundary()
    }

    /// Check if a vertex is on the boundary.
    ///
    /// Isolated vertices count as boundary vertices.
    pub fn is_boundary_vertex(&self, v: VertexId<I>) -> bool {
        let mut fan = self.vertex_fan(v);
        if fan.by_ref().count() == 0 {
            return true;
        }
        fan.reached_boundary()
    }

    /// Find the half-edge going from `from` to `to`, if any.
    ///
    /// Only the part of the fan reachable from the vertex's stored half-edge is
    /// searched, so a match can be missed around boundary vertices.
    pub fn find_halfedge(&self, from: VertexId<I>, to: VertexId<I>) -> Option<HalfEdgeId<I>> {
        self.vertex_fan(from).find(|&he| self.dest(he) == to)
    }

    // ==================== Iteration ====================

    /// First live vertex in insertion order.
    #[inline]
    pub fn first_vertex(&self) -> Option<VertexId<I>> {
        self.vertices.first().map(VertexId::new)
    }

    /// The live vertex after `v` in insertion order.
    #[inline]
    pub fn next_vertex(&self, v: VertexId<I>) -> Option<VertexId<I>> {
        self.vertices.next_of(v.index()).map(VertexId::new)
    }

    /// First live half-edge in creation order.
    #[inline]
    pub fn first_halfedge(&self) -> Option<HalfEdgeId<I>> {
        self.halfedges.first().map(HalfEdgeId::new)
    }

    /// The live half-edge after `he` in creation order.
    #[inline]
    pub fn next_halfedge(&self, he: HalfEdgeId<I>) -> Option<HalfEdgeId<I>> {
        self.halfedges.next_of(he.index()).map(HalfEdgeId::new)
    }

    /// First live face in creation order.
    #[inline]
    pub fn first_face(&self) -> Option<FaceId<I>> {
        self.faces.first().map(FaceId::new)
    }

    /// The live face after `f` in creation order.
    #[inline]
    pub fn next_face(&self, f: FaceId<I>) -> Option<FaceId<I>> {
        self.faces.next_of(f.index()).map(FaceId::new)
    }

    /// Iterate over all live vertex IDs.
    pub fn vertex_ids(&self) -> impl Iterator<Item = VertexId<I>> + '_ {
        self.vertices.indices().map(VertexId::new)
    }

    /// Iterate over all live vertices with their IDs.
    pub fn vertices(&self) -> impl Iterator<Item = (VertexId<I>, &Vertex<I>)> + '_ {
        self.vertices.iter().map(|(i, v)| (VertexId::new(i), v))
    }

    /// Iterate over all live half-edge IDs.
    pub fn halfedge_ids(&self) -> impl Iterator<Item = HalfEdgeId<I>> + '_ {
        self.halfedges.indices().map(HalfEdgeId::new)
    }

    /// Iterate over all live half-edges with their IDs.
    pub fn halfedges(&self) -> impl Iterator<Item = (HalfEdgeId<I>, &HalfEdge<I>)> + '_ {
        self.halfedges.iter().map(|(i, he)| (HalfEdgeId::new(i), he))
    }

    /// Iterate over all live face IDs.
    pub fn face_ids(&self) -> impl Iterator<Item = FaceId<I>> + '_ {
        self.faces.indices().map(FaceId::new)
    }

    /// Iterate over all live faces with their IDs.
    pub fn faces(&self) -> impl Iterator<Item = (FaceId<I>, &Face<I>)> + '_ {
        self.faces.iter().map(|(i, f)| (FaceId::new(i), f))
    }

    /// Iterate over the outgoing half-edges around a vertex.
    ///
    /// See [`VertexFan`] for how boundaries end the walk.
    pub fn vertex_fan(&self, v: VertexId<I>) -> VertexFan<'_, I> {
        VertexFan::new(self, v)
    }

    /// Iterate over vertices adjacent to a vertex.
    pub fn vertex_neighbors(&self, v: VertexId<I>) -> impl Iterator<Item = VertexId<I>> + '_ {
        self.vertex_fan(v).map(|he| self.dest(he))
    }

    /// Iterate over faces adjacent to a vertex.
    pub fn vertex_faces(&self, v: VertexId<I>) -> impl Iterator<Item = FaceId<I>> + '_ {
        self.vertex_fan(v).filter_map(|he| self.face_of(he))
    }

    /// Iterate over half-edges around a face.
    pub fn face_halfedges(&self, f: FaceId<I>) -> FaceHalfEdgeIter<'_, I> {
        FaceHalfEdgeIter::new(self, f)
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

    /// Compute the edge vector (from origin to destination).
    pub fn edge_vector(&self, he: HalfEdgeId<I>) -> Vector3<f64> {
        self.position(self.dest(he)) - self.position(self.origin(he))
    }

    /// Compute the squared length of an edge.
    pub fn edge_length_squared(&self, he: HalfEdgeId<I>) -> f64 {
        self.edge_vector(he).norm_squared()
    }

    // ==================== Construction ====================

    /// Add a new isolated vertex and return its ID.
    pub fn add_vertex(&mut self, position: Point3<f64>, source_index: usize) -> VertexId<I> {
        let vertex = Vertex::new(position, self.vertex_serial, source_index);
        self.vertex_serial += 1;
        VertexId::new(self.vertices.alloc(vertex))
    }

    /// Add a new unlinked half-edge and return its ID.
    pub(crate) fn add_halfedge(&mut self) -> HalfEdgeId<I> {
        let halfedge = HalfEdge::new(self.halfedge_serial);
        self.halfedge_serial += 1;
        HalfEdgeId::new(self.halfedges.alloc(halfedge))
    }

    /// Add a new face with no half-edge and return its ID.
    pub(crate) fn add_face(&mut self) -> FaceId<I> {
        FaceId::new(self.faces.alloc(Face::default()))
    }

    // ==================== Removal ====================
    //
    // Removal never patches references held by other elements. Callers either
    // rewire the neighbourhood first or use the deferred variants and reclaim
    // once nothing refers to the removed elements anymore.

    /// Remove a vertex immediately.
    pub fn remove_vertex(&mut self, v: VertexId<I>) -> Result<Vertex<I>> {
        let vertex = self
            .vertices
            .free(v.index())
            .ok_or_else(|| MeshError::stale("vertex", v.index()))?;
        self.touch();
        Ok(vertex)
    }

    /// Remove a half-edge immediately.
    pub fn remove_halfedge(&mut self, he: HalfEdgeId<I>) -> Result<HalfEdge<I>> {
        let halfedge = self
            .halfedges
            .free(he.index())
            .ok_or_else(|| MeshError::stale("half-edge", he.index()))?;
        self.touch();
        Ok(halfedge)
    }

    /// Remove a face immediately.
    pub fn remove_face(&mut self, f: FaceId<I>) -> Result<Face<I>> {
        let face = self
            .faces
            .free(f.index())
            .ok_or_else(|| MeshError::stale("face", f.index()))?;
        self.touch();
        Ok(face)
    }

    /// Remove a vertex, keeping it readable until [`Self::reclaim_removed`].
    pub fn defer_remove_vertex(&mut self, v: VertexId<I>) -> Result<()> {
        if !self.vertices.defer_free(v.index()) {
            return Err(MeshError::stale("vertex", v.index()));
        }
        self.touch();
        Ok(())
    }

    /// Remove a half-edge, keeping it readable until [`Self::reclaim_removed`].
    ///
    /// The half-edge's face is cleared right away so traversals still holding
    /// the handle can tell it is gone.
    pub fn defer_remove_halfedge(&mut self, he: HalfEdgeId<I>) -> Result<()> {
        if !self.halfedges.defer_free(he.index()) {
            return Err(MeshError::stale("half-edge", he.index()));
        }
        self.halfedges[he.index()].face = FaceId::invalid();
        self.touch();
        Ok(())
    }

    /// Remove a face, keeping it readable until [`Self::reclaim_removed`].
    pub fn defer_remove_face(&mut self, f: FaceId<I>) -> Result<()> {
        if !self.faces.defer_free(f.index()) {
            return Err(MeshError::stale("face", f.index()));
        }
        self.touch();
        Ok(())
    }

    /// Number of elements removed with deferral and not yet reclaimed.
    pub fn num_pending_removals(&self) -> usize {
        self.vertices.pending_len() + self.halfedges.pending_len() + self.faces.pending_len()
    }

    /// Release every element removed with deferral. Returns how many were released.
    pub fn reclaim_removed(&mut self) -> usize {
        self.vertices.reclaim() + self.halfedges.reclaim() + self.faces.reclaim()
    }

    // ==================== Validation ====================

    /// Check if the mesh is valid (all connectivity is consistent).
    pub fn is_valid(&self) -> bool {
        for (vid, v) in self.vertices() {
            if v.halfedge.is_valid() {
                if !self.contains_halfedge(v.halfedge) || self.origin(v.halfedge) != vid {
                    return false;
                }
            }
        }

        for (heid, he) in self.halfedges() {
            if !self.contains_vertex(he.origin) {
                return false;
            }

            if he.opposite.is_valid() {
                if !self.contains_halfedge(he.opposite) || self.halfedge(he.opposite).opposite != heid {
                    return false;
                }
            }

            if !self.contains_halfedge(he.next) || !self.contains_halfedge(he.prev) {
                return false;
            }
            if self.prev(he.next) != heid || self.next(he.prev) != heid {
                return false;
            }
        }

        for (fid, f) in self.faces() {
            if !self.contains_halfedge(f.halfedge) {
                return false;
            }
            let cycle: Vec<_> = self.face_halfedges(fid).take(4).collect();
            if cycle.len() != 3 || cycle.iter().any(|&he| self.face_of(he) != Some(fid)) {
                return false;
            }
        }

        true
    }
}

/// Iterator over the outgoing half-edges around a vertex.
///
/// Starts at the vertex's stored half-edge and steps with `opposite` then
/// `next`. The walk ends when it returns to the start (a full ring) or right
/// after yielding a half-edge without an opposite (a boundary-truncated ring).
/// [`VertexFan::reached_boundary`] tells the two apart once the iterator is
/// exhausted.
pub struct VertexFan<'a, I: MeshIndex = u32> {
    mesh: &'a HalfEdgeMesh<I>,
    start: HalfEdgeId<I>,
    current: Option<HalfEdgeId<I>>,
    reached_boundary: bool,
}

impl<'a, I: MeshIndex> VertexFan<'a, I> {
    fn new(mesh: &'a HalfEdgeMesh<I>, v: VertexId<I>) -> Self {
        let start = mesh.vertex(v).halfedge;
        Self {
            mesh,
            start,
            current: start.valid(),
            reached_boundary: false,
        }
    }

    /// Whether the walk so far was stopped by a boundary half-edge.
    #[inline]
    pub fn reached_boundary(&self) -> bool {
        self.reached_boundary
    }
}

impl<'a, I: MeshIndex> Iterator for VertexFan<'a, I> {
    type Item = HalfEdgeId<I>;

    fn next(&mut self) -> Option<Self::Item> {
        let result = self.current?;

        // If he goes v -> w, opposite(he) goes w -> v and its next half-edge
        // leaves v again.
        self.current = match self.mesh.opposite(result) {
            Some(opposite) => {
                let next = self.mesh.next(opposite);
                (next != self.start).then_some(next)
            }
            None => {
                self.reached_boundary = true;
                None
            }
        };

        Some(result)
    }
}

/// Iterator over half-edges around a face.
pub struct FaceHalfEdgeIter<'a, I: MeshIndex = u32> {
    mesh: &'a HalfEdgeMesh<I>,
    start: HalfEdgeId<I>,
    current: HalfEdgeId<I>,
    done: bool,
}

impl<'a, I: MeshIndex> FaceHalfEdgeIter<'a, I> {
    fn new(mesh: &'a HalfEdgeMesh<I>, f: FaceId<I>) -> Self {
        let start = mesh.face(f).halfedge;
        Self {
            mesh,
            start,
            current: start,
            done: !start.is_valid(),
        }
    }
}

impl<'a, I: MeshIndex> Iterator for FaceHalfEdgeIter<'a, I> {
    type Item = HalfEdgeId<I>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let result = self.current;
        self.current = self.mesh.next(self.current);

        if self.current == self.start {
            self.done = true;
        }

        Some(result)
    }
}
