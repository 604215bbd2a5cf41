//! Edge flip.
//!
//! Two triangles sharing an edge form a quadrilateral. Flipping the edge
//! replaces the shared diagonal with the other one:
//!
//! ```text
//!        c                 c
//!       / \               /|\
//!      /   \             / | \
//!     a --- b    ==>    a  |  b
//!      \   /             \ | /
//!       \ /               \|/
//!        d                 d
//! ```
//!
//! No element is created or destroyed. The six half-edges of the quad keep
//! their opposite pairing; only their origins, faces and `next`/`prev` links
//! change.

use super::halfedge::HalfEdgeMesh;
use super::index::{HalfEdgeId, MeshIndex};
use crate::error::{MeshError, Result};

impl<I: MeshIndex> HalfEdgeMesh<I> {
    /// Flip the interior edge carried by `h`.
    ///
    /// With `hx = opposite(h)`, face A on the side of `h` and face B on the side
    /// of `hx`, the two triangles are rebuilt as `next(h) -> hx -> prev(hx)`
    /// (face A) and `h -> prev(h) -> next(hx)` (face B). The endpoint vertices
    /// of the old diagonal each lose an outgoing half-edge and the two opposite
    /// corners each gain one.
    ///
    /// The flip does not check that the new diagonal is absent from the rest of
    /// the mesh; flipping such an edge produces a non-manifold duplicate edge.
    /// Use [`HalfEdgeMesh::can_flip`] first when that matters.
    ///
    /// Flipping the same half-edge twice restores the two triangles, but `h`
    /// and its opposite trade places; the exact `next`/`prev` wiring and face
    /// assignment come back after four flips.
    ///
    /// # Errors
    /// [`MeshError::StaleHandle`] if `h` is not live and
    /// [`MeshError::BoundaryHalfEdge`] if it has no opposite.
    ///
    /// # Example
    /// ```
    /// use sliver::prelude::*;
    /// use nalgebra::Point3;
    ///
    /// let vertices = vec![
    ///     Point3::new(0.0, 0.0, 0.0),
    ///     Point3::new(1.0, 0.0, 0.0),
    ///     Point3::new(1.0, 1.0, 0.0),
    ///     Point3::new(0.0, 1.0, 0.0),
    /// ];
    /// let mut mesh: HalfEdgeMesh = build_from_triangles(&vertices, &[[0, 1, 2], [0, 2, 3]]).unwrap();
    ///
    /// let diagonal = mesh.halfedge_ids().find(|&he| mesh.opposite(he).is_some()).unwrap();
    /// mesh.flip(diagonal).unwrap();
    /// assert!(mesh.is_valid());
    /// ```
    pub fn flip(&mut self, h: HalfEdgeId<I>) -> Result<()> {
        if !self.contains_halfedge(h) {
            return Err(MeshError::stale("half-edge", h.index()));
        }
        let hx = self
            .opposite(h)
            .ok_or(MeshError::BoundaryHalfEdge { halfedge: h.index() })?;

        let ha = self.prev(h);
        let hb = self.prev(hx);
        let hc = self.next(h);
        let hd = self.next(hx);

        let face_a = self.halfedge(h).face;
        let face_b = self.halfedge(hx).face;

        let h_start = self.origin(h);
        let hx_start = self.origin(hx);
        let a_corner = self.origin(ha);
        let b_corner = self.origin(hb);

        // Entry points that stay inside each rebuilt cycle
        if face_a.is_valid() {
            self.face_mut(face_a).halfedge = hx;
        }
        if face_b.is_valid() {
            self.face_mut(face_b).halfedge = h;
        }

        self.halfedge_mut(ha).face = face_b;
        self.halfedge_mut(hb).face = face_a;

        {
            let v = self.vertex_mut(h_start);
            v.halfedge_count -= 1;
            if v.halfedge == h {
                v.halfedge = hd;
            }
        }
        {
            let v = self.vertex_mut(hx_start);
            v.halfedge_count -= 1;
            if v.halfedge == hx {
                v.halfedge = hc;
            }
        }
        self.vertex_mut(b_corner).halfedge_count += 1;
        self.vertex_mut(a_corner).halfedge_count += 1;

        self.halfedge_mut(h).origin = b_corner;
        self.halfedge_mut(hx).origin = a_corner;

        self.halfedge_mut(h).face = face_b;
        self.halfedge_mut(hx).face = face_a;

        self.link(hc, hx);
        self.link(hx, hb);
        self.link(hb, hc);

        self.link(h, ha);
        self.link(ha, hd);
        self.link(hd, h);

        self.touch();
        Ok(())
    }

    /// Whether flipping `h` keeps the mesh a manifold triangle mesh.
    ///
    /// Requires a live interior half-edge whose two faces are present and whose
    /// new diagonal joins two distinct vertices that are not already adjacent.
    pub fn can_flip(&self, h: HalfEdgeId<I>) -> bool {
        if !self.contains_halfedge(h) {
            return false;
        }
        let Some(hx) = self.opposite(h) else {
            return false;
        };
        if self.face_of(h).is_none() || self.face_of(hx).is_none() {
            return false;
        }

        let a = self.origin(self.prev(h));
        let b = self.origin(self.prev(hx));
        if a == b {
            return false;
        }
        // Search both fans; either one may be cut short by a boundary.
        !(self.vertex_neighbors(a).any(|n| n == b) || self.vertex_neighbors(b).any(|n| n == a))
    }

    #[inline]
    fn link(&mut self, from: HalfEdgeId<I>, to: HalfEdgeId<I>) {
        self.halfedge_mut(from).next = to;
        self.halfedge_mut(to).prev = from;
    }
}
