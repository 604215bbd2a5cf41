//! Vertex ordering by relative height.
//!
//! The order is cached on the mesh together with the revision it was computed
//! at. Any tracked mutation (a flip, a removal, an analysis pass) makes the
//! cached order unreadable until it is recomputed.

use super::halfedge::HalfEdgeMesh;
use super::index::{MeshIndex, VertexId};

impl<I: MeshIndex> HalfEdgeMesh<I> {
    /// Order the live vertices from flattest to bulgiest and return the order.
    ///
    /// The sort is stable on ascending `relative_height`, so vertices without a
    /// height (`f64::MAX` or the `f64::INFINITY` default) come last and ties
    /// keep insertion order.
    pub fn order_vertices_by_flatness(&mut self) -> &[VertexId<I>] {
        let mut order: Vec<VertexId<I>> = self.vertex_ids().collect();
        order.sort_by(|&a, &b| {
            self.vertex(a)
                .relative_height
                .total_cmp(&self.vertex(b).relative_height)
        });

        self.flatness_order = order;
        self.flatness_revision = Some(self.revision);
        &self.flatness_order
    }

    /// The order computed by [`Self::order_vertices_by_flatness`].
    ///
    /// Returns `None` if it was never computed or the mesh changed since.
    pub fn vertices_ordered_by_flatness(&self) -> Option<&[VertexId<I>]> {
        (self.flatness_revision == Some(self.revision)).then_some(self.flatness_order.as_slice())
    }
}
