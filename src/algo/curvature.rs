//! Discrete curvature helpers around a single vertex.
//!
//! - [`angle_defect`]: `|2π - Σθ|` over the corners at a vertex, the usual
//!   discrete Gaussian curvature without area weighting
//! - [`shortest_outgoing_halfedge`]: the shortest edge leaving a vertex
//! - [`collect_cones_excluding`]: the corner pairs around a vertex
//! - [`vertex_removal_cost`]: how much curvature removing a vertex would
//!   move onto its 1-ring
//!
//! All of them walk the vertex fan and give up on boundary vertices.
//!
//! # Example
//!
//! ```
//! use sliver::prelude::*;
//! use sliver::algo::curvature::angle_defect;
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.5, 1.0, 0.0),
//!     Point3::new(0.5, 0.5, 1.0),
//! ];
//! let faces = vec![[0, 2, 1], [0, 1, 3], [1, 2, 3], [2, 0, 3]];
//! let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &faces).unwrap();
//!
//! // Total angle defect of a closed genus-0 surface is 4π.
//! let total: f64 = mesh.vertex_ids().filter_map(|v| angle_defect(&mesh, v)).sum();
//! assert!((total - 4.0 * std::f64::consts::PI).abs() < 1e-9);
//! ```

use std::collections::HashMap;
use std::f64::consts::PI;

use nalgebra::{Matrix3, Vector2, Vector3};

use super::repair::corner_angle;
use crate::math::{angle_between, normalize_or_zero, triangle_normal};
use crate::mesh::{HalfEdgeId, HalfEdgeMesh, MeshIndex, VertexId};

/// Angle defect `|2π - Σθ|` at an interior vertex.
///
/// Returns `None` for isolated vertices and for vertices whose fan reaches
/// the boundary.
pub fn angle_defect<I: MeshIndex>(mesh: &HalfEdgeMesh<I>, v: VertexId<I>) -> Option<f64> {
    let mut fan = mesh.vertex_fan(v);
    let mut corners = 0;
    let mut angle_sum = 0.0;
    for he in fan.by_ref() {
        angle_sum += corner_angle(mesh, he);
        corners += 1;
    }
    if corners == 0 || fan.reached_boundary() {
        return None;
    }
    Some((2.0 * PI - angle_sum).abs())
}

/// The shortest edge leaving `v`, or `None` for an isolated vertex.
///
/// Ties go to the half-edge met first in the fan.
pub fn shortest_outgoing_halfedge<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    v: VertexId<I>,
) -> Option<HalfEdgeId<I>> {
    let mut best: Option<(HalfEdgeId<I>, f64)> = None;
    for he in mesh.vertex_fan(v) {
        let length2 = mesh.edge_length_squared(he);
        if best.map_or(true, |(_, shortest)| length2 < shortest) {
            best = Some((he, length2));
        }
    }
    best.map(|(he, _)| he)
}

/// Corner pairs `(next, prev)` around `v` that do not touch `exclude`.
///
/// For every outgoing half-edge the pair holds the destination and the origin
/// of the previous half-edge, i.e. the other two corners of its triangle.
pub fn collect_cones_excluding<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    v: VertexId<I>,
    exclude: VertexId<I>,
) -> Vec<(VertexId<I>, VertexId<I>)> {
    mesh.vertex_fan(v)
        .map(|he| (mesh.dest(he), mesh.origin(mesh.prev(he))))
        .filter(|&(next, prev)| next != exclude && prev != exclude)
        .collect()
}

/// Curvature cost of removing `v` and re-triangulating the hole.
///
/// The 1-ring is projected onto the plane through `v` and fanned from the far
/// end of the shortest outgoing edge, flipping each new triangle towards
/// Delaunay as the fan advances. The cost is the defect at `v` plus, for every
/// ring vertex, how much its defect grows once the new triangles replace the
/// ones around `v`.
///
/// Defects stored by analysis are used where present. Returns `None` when `v`
/// or any ring vertex lies on the boundary.
pub fn vertex_removal_cost<I: MeshIndex>(mesh: &HalfEdgeMesh<I>, v: VertexId<I>) -> Option<f64> {
    let own = stored_defect(mesh, v)?;
    let shortest = shortest_outgoing_halfedge(mesh, v)?;

    let mut walk = mesh.vertex_fan(v);
    let fan: Vec<HalfEdgeId<I>> = walk.by_ref().collect();
    if walk.reached_boundary() || fan.len() < 3 {
        return None;
    }
    let start = fan.iter().position(|&he| he == shortest)?;
    let neighbors: Vec<VertexId<I>> = fan[start..]
        .iter()
        .chain(&fan[..start])
        .map(|&he| mesh.dest(he))
        .collect();

    let center = mesh.position(v);
    let normal = normalize_or_zero(&fan.iter().fold(Vector3::zeros(), |acc, &he| {
        let next = mesh.position(mesh.dest(he));
        let prev = mesh.position(mesh.origin(mesh.prev(he)));
        acc + triangle_normal(center, next, prev)
    }));
    let toward = mesh.position(neighbors[0]) - center;
    let axis = normalize_or_zero(&(toward - normal * toward.dot(&normal)));
    let perp = normal.cross(&axis);

    let mut ring = neighbors.clone();
    let mut points: Vec<Vector2<f64>> = ring
        .iter()
        .map(|&n| {
            let d = mesh.position(n) - center;
            Vector2::new(d.dot(&axis), d.dot(&perp))
        })
        .collect();

    let mut triangles = Vec::with_capacity(ring.len() - 2);
    let mut i = 1;
    while i + 2 < ring.len() {
        if in_circumcircle(&points[0], &points[i], &points[i + 1], &points[i + 2]) {
            triangles.push([ring[i], ring[i + 1], ring[i + 2]]);
            points.swap(i, i + 1);
            ring.swap(i, i + 1);
        } else {
            triangles.push([ring[0], ring[i], ring[i + 1]]);
        }
        i += 1;
    }
    if i + 1 < ring.len() {
        triangles.push([ring[0], ring[i], ring[i + 1]]);
    }

    let mut cones: HashMap<VertexId<I>, Vec<(VertexId<I>, VertexId<I>)>> = neighbors
        .iter()
        .map(|&n| (n, collect_cones_excluding(mesh, n, v)))
        .collect();
    for t in &triangles {
        for k in 0..3 {
            cones
                .entry(t[(k + 1) % 3])
                .or_default()
                .push((t[k], t[(k + 2) % 3]));
        }
    }

    let mut one_ring = 0.0;
    for &n in &neighbors {
        let p = mesh.position(n);
        let angle_sum: f64 = cones
            .get(&n)
            .into_iter()
            .flatten()
            .map(|&(a, b)| angle_between(&(mesh.position(a) - p), &(mesh.position(b) - p)))
            .sum();
        one_ring += (2.0 * PI - angle_sum).abs() - stored_defect(mesh, n)?;
    }

    Some(own + one_ring)
}

fn stored_defect<I: MeshIndex>(mesh: &HalfEdgeMesh<I>, v: VertexId<I>) -> Option<f64> {
    mesh.vertex(v).angle_defect.or_else(|| angle_defect(mesh, v))
}

/// Whether `d` lies strictly inside the circle through `a`, `b` and `c`.
///
/// Works for either winding of `a`, `b`, `c`.
fn in_circumcircle(a: &Vector2<f64>, b: &Vector2<f64>, c: &Vector2<f64>, d: &Vector2<f64>) -> bool {
    let rows = [a - d, b - d, c - d];
    let det = Matrix3::from_fn(|r, col| match col {
        0 => rows[r].x,
        1 => rows[r].y,
        _ => rows[r].norm_squared(),
    })
    .determinant();
    let orientation = (b - a).perp(&(c - a));
    det * orientation > 0.0
}
