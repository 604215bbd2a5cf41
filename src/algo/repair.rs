//! Zero-angle triangle repair.
//!
//! A triangle with a corner of almost 180° is a sliver: its three vertices are
//! nearly collinear and its normal is numerically meaningless. Flipping the
//! edge opposite that corner replaces the sliver and its neighbour with two
//! better-shaped triangles.
//!
//! The pass only makes sense on a closed mesh; the builder runs it when the
//! built mesh is watertight.

use crate::math::angle_between;
use crate::mesh::{HalfEdgeId, HalfEdgeMesh, MeshIndex};

/// Default corner angle, in degrees, above which a triangle is a sliver.
pub const DEFAULT_ZERO_ANGLE_DEGREES: f64 = 179.9;

/// Interior angle of the triangle at the origin of `he`, in radians.
pub fn corner_angle<I: MeshIndex>(mesh: &HalfEdgeMesh<I>, he: HalfEdgeId<I>) -> f64 {
    let corner = mesh.position(mesh.origin(he));
    let to_next = mesh.position(mesh.dest(he)) - corner;
    let to_prev = mesh.position(mesh.origin(mesh.prev(he))) - corner;
    angle_between(&to_next, &to_prev)
}

/// Flip the edge opposite every corner wider than `threshold_degrees`.
///
/// Candidates are collected up front, then each one is checked again before
/// flipping because an earlier flip may already have fixed or reshaped its
/// triangle. Candidates whose flip would create an edge that already exists
/// are skipped.
///
/// Returns the number of flips performed.
///
/// # Example
///
/// ```
/// use sliver::prelude::*;
/// use sliver::algo::repair::{remove_zero_angle_triangles, DEFAULT_ZERO_ANGLE_DEGREES};
/// use sliver::mesh::build_topology;
/// use nalgebra::Point3;
///
/// let vertices = vec![
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(0.5, 1.0, 0.0),
///     Point3::new(0.5, 0.5, 1.0),
/// ];
/// let faces = vec![[0, 2, 1], [0, 1, 3], [1, 2, 3], [2, 0, 3]];
/// let mut mesh: HalfEdgeMesh = build_topology(&vertices, &faces);
///
/// // A regular-looking tetrahedron has no slivers.
/// assert_eq!(remove_zero_angle_triangles(&mut mesh, DEFAULT_ZERO_ANGLE_DEGREES), 0);
/// ```
pub fn remove_zero_angle_triangles<I: MeshIndex>(
    mesh: &mut HalfEdgeMesh<I>,
    threshold_degrees: f64,
) -> usize {
    let threshold = threshold_degrees.to_radians();

    let candidates: Vec<HalfEdgeId<I>> = {
        let mesh = &*mesh;
        mesh.halfedge_ids()
            .filter(|&he| corner_angle(mesh, he) > threshold)
            .collect()
    };

    let mut flipped = 0;
    for he in candidates {
        if !mesh.contains_halfedge(he) || mesh.face_of(he).is_none() {
            continue;
        }
        if corner_angle(mesh, he) <= threshold {
            continue;
        }

        let edge = mesh.next(he);
        if !mesh.can_flip(edge) {
            log::debug!(
                "skipping sliver at {:?}: flipping {:?} would duplicate an edge",
                mesh.origin(he),
                edge
            );
            continue;
        }
        match mesh.flip(edge) {
            Ok(()) => flipped += 1,
            Err(err) => log::warn!("could not flip {:?}: {}", edge, err),
        }
    }

    flipped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{build_from_triangles, build_topology, HalfEdgeMesh};
    use nalgebra::Point3;

    /// Triangular bipyramid whose top apex sits almost on the edge A-B.
    fn sliver_bipyramid() -> (Vec<Point3<f64>>, Vec<[usize; 3]>) {
        let vertices = vec![
            Point3::new(-1.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, 1e-4, 1e-4),
            Point3::new(0.0, -0.5, -1.0),
        ];
        let faces = vec![[0, 1, 3], [1, 2, 3], [2, 0, 3], [1, 0, 4], [2, 1, 4], [0, 2, 4]];
        (vertices, faces)
    }

    /// Tetrahedron with a sliver face; every flip would duplicate an edge.
    fn sliver_tetrahedron() -> (Vec<Point3<f64>>, Vec<[usize; 3]>) {
        let vertices = vec![
            Point3::new(-1.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1e-4, 0.0),
            Point3::new(0.0, 0.0, 1.0),
        ];
        let faces = vec![[0, 1, 2], [0, 3, 1], [1, 3, 2], [2, 3, 0]];
        (vertices, faces)
    }

    fn widest_corner(mesh: &HalfEdgeMesh<u32>) -> f64 {
        mesh.halfedge_ids()
            .map(|he| corner_angle(mesh, he))
            .fold(0.0, f64::max)
    }

    #[test]
    fn test_corner_angle_of_right_triangle() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let mesh: HalfEdgeMesh<u32> = build_topology(&vertices, &[[0, 1, 2]]);
        let he = mesh
            .halfedge_ids()
            .find(|&he| mesh.vertex(mesh.origin(he)).source_index == 0)
            .unwrap();
        assert!((corner_angle(&mesh, he) - std::f64::consts::FRAC_PI_2).abs() < 1e-12);

        let total: f64 = mesh.halfedge_ids().map(|he| corner_angle(&mesh, he)).sum();
        assert!((total - std::f64::consts::PI).abs() < 1e-12);
    }

    #[test]
    fn test_sliver_is_flipped() {
        let (vertices, faces) = sliver_bipyramid();
        let mut mesh: HalfEdgeMesh<u32> = build_topology(&vertices, &faces);
        assert!(mesh.is_watertight());
        assert!(widest_corner(&mesh).to_degrees() > DEFAULT_ZERO_ANGLE_DEGREES);

        let flipped = remove_zero_angle_triangles(&mut mesh, DEFAULT_ZERO_ANGLE_DEGREES);
        assert_eq!(flipped, 1);
        assert!(mesh.is_valid());
        assert_eq!(mesh.num_faces(), 6);
        assert!(widest_corner(&mesh).to_degrees() < DEFAULT_ZERO_ANGLE_DEGREES);

        // The apexes are now joined and A-B is gone.
        let by_source = |s: usize| {
            mesh.vertex_ids()
                .find(|&v| mesh.vertex(v).source_index == s)
                .unwrap()
        };
        assert!(mesh.vertex_neighbors(by_source(3)).any(|n| n == by_source(4)));
        assert!(!mesh.vertex_neighbors(by_source(0)).any(|n| n == by_source(1)));

        assert_eq!(remove_zero_angle_triangles(&mut mesh, DEFAULT_ZERO_ANGLE_DEGREES), 0);
    }

    #[test]
    fn test_sliver_with_existing_diagonal_is_skipped() {
        let (vertices, faces) = sliver_tetrahedron();
        let mut mesh: HalfEdgeMesh<u32> = build_topology(&vertices, &faces);
        assert!(mesh.is_watertight());
        let before = mesh.revision();

        assert_eq!(remove_zero_angle_triangles(&mut mesh, DEFAULT_ZERO_ANGLE_DEGREES), 0);
        assert_eq!(mesh.revision(), before);
        assert!(mesh.is_valid());
    }

    #[test]
    fn test_builder_repairs_watertight_input() {
        let (vertices, faces) = sliver_bipyramid();
        let mesh: HalfEdgeMesh<u32> = build_from_triangles(&vertices, &faces).unwrap();
        assert!(widest_corner(&mesh).to_degrees() < DEFAULT_ZERO_ANGLE_DEGREES);
        assert!(mesh.is_valid());
    }

    #[test]
    fn test_lower_threshold_catches_more() {
        let (vertices, faces) = sliver_bipyramid();
        let mut mesh: HalfEdgeMesh<u32> = build_topology(&vertices, &faces);
        // Nothing on this mesh besides the sliver corner is wider than 170°.
        assert_eq!(remove_zero_angle_triangles(&mut mesh, 170.0), 1);
    }
}
