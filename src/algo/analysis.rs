//! Geometric analysis of a built mesh.
//!
//! Six passes run in order, each reading what the previous one wrote:
//!
//! 1. [`compute_face_normals`]: unit normal of every triangle
//! 2. [`compute_vertex_normals`]: sum of the face normals around each vertex
//! 3. [`compute_average_normals`]: sum of the neighbouring vertex normals,
//!    falling back to the vertex's own normal when the sum vanishes
//! 4. [`compute_relative_heights`]: spread of the 2-ring projected onto the
//!    average normal
//! 5. [`normalize_relative_heights`]: scale the heights into `[0, 1]`
//! 6. [`compute_angle_defects`]: `|2π - Σθ|` at every interior vertex
//!
//! [`analyze`] runs all of them. The builder calls it once construction and
//! repair are done.
//!
//! # Example
//!
//! ```
//! use sliver::prelude::*;
//! use sliver::algo::analysis::{analyze, AnalysisOptions};
//! use sliver::mesh::build_topology;
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.5, 1.0, 0.0),
//!     Point3::new(0.5, 0.5, 1.0),
//! ];
//! let faces = vec![[0, 2, 1], [0, 1, 3], [1, 2, 3], [2, 0, 3]];
//! let mut mesh: HalfEdgeMesh = build_topology(&vertices, &faces);
//!
//! analyze(&mut mesh, &AnalysisOptions::default().sequential());
//! assert!(mesh.vertices().all(|(_, v)| v.has_relative_height));
//! ```

use nalgebra::Vector3;
use rayon::prelude::*;

use super::curvature::angle_defect;
use crate::math::{is_zero, is_zero_vector, normalize_or_zero, triangle_normal};
use crate::mesh::{FaceId, HalfEdgeMesh, MeshIndex, VertexId};

/// Options for the analysis passes.
#[derive(Debug, Clone)]
pub struct AnalysisOptions {
    /// Whether to use parallel execution (default: true).
    pub parallel: bool,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self { parallel: true }
    }
}

impl AnalysisOptions {
    /// Set whether to use parallel execution.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Create options for single-threaded execution.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }
}

/// Run every analysis pass in order.
pub fn analyze<I: MeshIndex>(mesh: &mut HalfEdgeMesh<I>, options: &AnalysisOptions) {
    compute_face_normals(mesh, options);
    compute_vertex_normals(mesh, options);
    compute_average_normals(mesh, options);
    compute_relative_heights(mesh, options);
    if let Some(max) = normalize_relative_heights(mesh) {
        log::debug!("normalized relative heights by {:.6}", max);
    }
    compute_angle_defects(mesh, options);
}

/// Evaluate `f` for every id, on the rayon pool when `parallel` is set.
fn map_ids<T, R, F>(ids: &[T], parallel: bool, f: F) -> Vec<R>
where
    T: Copy + Send + Sync,
    R: Send,
    F: Fn(T) -> R + Send + Sync,
{
    if parallel {
        ids.par_iter().map(|&id| f(id)).collect()
    } else {
        ids.iter().map(|&id| f(id)).collect()
    }
}

/// Compute the unit normal of every face.
///
/// Collinear triangles get the zero vector.
pub fn compute_face_normals<I: MeshIndex>(mesh: &mut HalfEdgeMesh<I>, options: &AnalysisOptions) {
    let ids: Vec<FaceId<I>> = mesh.face_ids().collect();
    let normals = {
        let mesh = &*mesh;
        map_ids(&ids, options.parallel, |f| {
            let [a, b, c] = mesh.face_positions(f);
            triangle_normal(&a, &b, &c)
        })
    };

    for (f, normal) in ids.into_iter().zip(normals) {
        mesh.face_mut(f).normal = normal;
    }
    mesh.touch();
}

/// Compute each vertex normal from the normals of the faces around it.
///
/// Only the faces reachable by the fan walk contribute, so a boundary vertex
/// may see part of its neighbourhood. Isolated vertices keep a zero normal.
pub fn compute_vertex_normals<I: MeshIndex>(mesh: &mut HalfEdgeMesh<I>, options: &AnalysisOptions) {
    let ids: Vec<VertexId<I>> = mesh.vertex_ids().collect();
    let normals = {
        let mesh = &*mesh;
        map_ids(&ids, options.parallel, |v| {
            let sum = mesh
                .vertex_faces(v)
                .fold(Vector3::zeros(), |acc, f| acc + mesh.face(f).normal);
            normalize_or_zero(&sum)
        })
    };

    for (v, normal) in ids.into_iter().zip(normals) {
        mesh.vertex_mut(v).normal = normal;
    }
    mesh.touch();
}

/// Compute each vertex's average normal from its neighbours' normals.
///
/// When the neighbour normals cancel out (or there are none) the vertex's own
/// normal is used instead.
pub fn compute_average_normals<I: MeshIndex>(mesh: &mut HalfEdgeMesh<I>, options: &AnalysisOptions) {
    let ids: Vec<VertexId<I>> = mesh.vertex_ids().collect();
    let normals = {
        let mesh = &*mesh;
        map_ids(&ids, options.parallel, |v| {
            let sum = mesh
                .vertex_neighbors(v)
                .fold(Vector3::zeros(), |acc, n| acc + mesh.vertex(n).normal);
            let average = normalize_or_zero(&sum);
            if is_zero_vector(&average) {
                mesh.vertex(v).normal
            } else {
                average
            }
        })
    };

    for (v, normal) in ids.into_iter().zip(normals) {
        mesh.vertex_mut(v).average_normal = normal;
    }
    mesh.touch();
}

/// Spread of the 2-ring around `v` along its average normal.
///
/// Returns `None` when the walk meets the boundary anywhere.
fn relative_height<I: MeshIndex>(mesh: &HalfEdgeMesh<I>, v: VertexId<I>) -> Option<f64> {
    let center = mesh.position(v);
    let axis = mesh.vertex(v).average_normal;

    let mut min = f64::MAX;
    let mut max = f64::MIN;

    let mut fan = mesh.vertex_fan(v);
    for he in fan.by_ref() {
        let neighbor = mesh.dest(he);

        let mut ring = mesh.vertex_fan(neighbor);
        for outer in ring.by_ref() {
            let other = mesh.dest(outer);
            if other == v {
                continue;
            }
            let height = normalize_or_zero(&(mesh.position(other) - center)).dot(&axis);
            min = min.min(height);
            max = max.max(height);
        }
        if ring.reached_boundary() {
            return None;
        }
    }
    if fan.reached_boundary() || min > max {
        return None;
    }

    Some(max - min)
}

/// Compute the relative height of every vertex that has a half-edge.
///
/// Vertices whose 2-ring touches the boundary get `f64::MAX` and
/// `has_relative_height = false`. Isolated vertices are left untouched.
pub fn compute_relative_heights<I: MeshIndex>(mesh: &mut HalfEdgeMesh<I>, options: &AnalysisOptions) {
    let ids: Vec<VertexId<I>> = mesh
        .vertices()
        .filter(|(_, v)| v.halfedge.is_valid())
        .map(|(id, _)| id)
        .collect();
    let heights = {
        let mesh = &*mesh;
        map_ids(&ids, options.parallel, |v| relative_height(mesh, v))
    };

    let mut boundary = 0;
    for (v, height) in ids.into_iter().zip(heights) {
        let vertex = mesh.vertex_mut(v);
        match height {
            Some(height) => {
                vertex.relative_height = height;
                vertex.has_relative_height = true;
            }
            None => {
                vertex.relative_height = f64::MAX;
                vertex.has_relative_height = false;
                boundary += 1;
            }
        }
    }
    if boundary > 0 {
        log::debug!("{} vertices have no relative height (boundary)", boundary);
    }
    mesh.touch();
}

/// Divide every relative height by the largest one.
///
/// Returns the maximum used as divisor, or `None` if no vertex has a height or
/// the maximum is zero. In that case nothing changes.
pub fn normalize_relative_heights<I: MeshIndex>(mesh: &mut HalfEdgeMesh<I>) -> Option<f64> {
    let max = mesh
        .vertices()
        .filter(|(_, v)| v.has_relative_height)
        .map(|(_, v)| v.relative_height)
        .max_by(f64::total_cmp)?;
    if is_zero(max) {
        return None;
    }

    let ids: Vec<VertexId<I>> = mesh.vertex_ids().collect();
    for v in ids {
        let vertex = mesh.vertex_mut(v);
        if vertex.has_relative_height {
            vertex.relative_height /= max;
        }
    }
    mesh.touch();
    Some(max)
}

/// Store the angle defect of every vertex.
///
/// Boundary and isolated vertices get `None`.
pub fn compute_angle_defects<I: MeshIndex>(mesh: &mut HalfEdgeMesh<I>, options: &AnalysisOptions) {
    let ids: Vec<VertexId<I>> = mesh.vertex_ids().collect();
    let defects = {
        let mesh = &*mesh;
        map_ids(&ids, options.parallel, |v| angle_defect(mesh, v))
    };

    for (v, defect) in ids.into_iter().zip(defects) {
        mesh.vertex_mut(v).angle_defect = defect;
    }
    mesh.touch();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::build_topology;
    use nalgebra::Point3;
    use std::f64::consts::FRAC_1_SQRT_2;

    fn octahedron() -> HalfEdgeMesh<u32> {
        let vertices = vec![
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(-1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, -1.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
            Point3::new(0.0, 0.0, -1.0),
        ];
        let faces = [
            [0, 2, 4],
            [2, 1, 4],
            [1, 3, 4],
            [3, 0, 4],
            [2, 0, 5],
            [1, 2, 5],
            [3, 1, 5],
            [0, 3, 5],
        ];
        build_topology(&vertices, &faces)
    }

    fn bumpy() -> HalfEdgeMesh<u32> {
        let vertices = vec![
            Point3::new(-1.0, -1.0, 0.0),
            Point3::new(1.0, -1.0, 0.2),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(-1.0, 1.0, -0.3),
            Point3::new(0.0, 0.0, 1.5),
            Point3::new(0.0, 0.0, -1.0),
        ];
        let faces = [
            [0, 1, 4],
            [1, 2, 4],
            [2, 3, 4],
            [3, 0, 4],
            [1, 0, 5],
            [2, 1, 5],
            [3, 2, 5],
            [0, 3, 5],
        ];
        build_topology(&vertices, &faces)
    }

    fn sequential() -> AnalysisOptions {
        AnalysisOptions::default().sequential()
    }

    #[test]
    fn test_octahedron_normals() {
        let mut mesh = octahedron();
        compute_face_normals(&mut mesh, &sequential());
        compute_vertex_normals(&mut mesh, &sequential());
        compute_average_normals(&mut mesh, &sequential());

        for (_, f) in mesh.faces() {
            assert!((f.normal.norm() - 1.0).abs() < 1e-10);
            assert!((f.normal.abs() - Vector3::repeat(1.0 / 3f64.sqrt())).norm() < 1e-10);
        }
        for (_, v) in mesh.vertices() {
            // Outward normal of a unit octahedron vertex is its own position.
            let expected = v.position.coords;
            assert!((v.normal - expected).norm() < 1e-10);
            // Opposite neighbours cancel, so the own normal is used.
            assert!((v.average_normal - v.normal).norm() < 1e-10);
        }
    }

    #[test]
    fn test_octahedron_relative_heights() {
        let mut mesh = octahedron();
        compute_face_normals(&mut mesh, &sequential());
        compute_vertex_normals(&mut mesh, &sequential());
        compute_average_normals(&mut mesh, &sequential());
        compute_relative_heights(&mut mesh, &sequential());

        for (_, v) in mesh.vertices() {
            assert!(v.has_relative_height);
            assert!((v.relative_height - (1.0 - FRAC_1_SQRT_2)).abs() < 1e-10);
        }

        let max = normalize_relative_heights(&mut mesh).unwrap();
        assert!((max - (1.0 - FRAC_1_SQRT_2)).abs() < 1e-10);
        for (_, v) in mesh.vertices() {
            assert!((v.relative_height - 1.0).abs() < 1e-10);
        }
    }

    #[test]
    fn test_single_triangle_has_no_heights() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
        ];
        let mut mesh: HalfEdgeMesh<u32> = build_topology(&vertices, &[[0, 1, 2]]);
        analyze(&mut mesh, &sequential());

        let f = mesh.first_face().unwrap();
        assert!((mesh.face(f).normal - Vector3::z()).norm() < 1e-10);
        for (_, v) in mesh.vertices() {
            assert!(!v.has_relative_height);
            assert_eq!(v.relative_height, f64::MAX);
            assert!((v.normal - Vector3::z()).norm() < 1e-10);
        }
        assert_eq!(normalize_relative_heights(&mut mesh), None);
    }

    #[test]
    fn test_all_flat_heights_are_left_untouched() {
        let mut mesh = octahedron();
        analyze(&mut mesh, &sequential());

        let tiny = [0.0, 1e-9, 5e-7, 0.0, 2e-8, 1e-7];
        let ids: Vec<_> = mesh.vertex_ids().collect();
        for (&v, &h) in ids.iter().zip(tiny.iter()) {
            mesh.vertex_mut(v).relative_height = h;
        }
        let before: Vec<u64> = mesh.vertices().map(|(_, v)| v.relative_height.to_bits()).collect();
        let revision = mesh.revision();

        assert_eq!(normalize_relative_heights(&mut mesh), None);
        let after: Vec<u64> = mesh.vertices().map(|(_, v)| v.relative_height.to_bits()).collect();
        assert_eq!(before, after);
        assert!(mesh.vertices().all(|(_, v)| v.has_relative_height));
        assert_eq!(mesh.revision(), revision);
    }

    #[test]
    fn test_flat_quad() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let mut mesh: HalfEdgeMesh<u32> = build_topology(&vertices, &[[0, 1, 2], [0, 2, 3]]);
        analyze(&mut mesh, &sequential());

        let normals: Vec<_> = mesh.faces().map(|(_, f)| f.normal).collect();
        assert!((normals[0] - normals[1]).norm() < 1e-12);
        for (_, v) in mesh.vertices() {
            assert!((v.average_normal - Vector3::z()).norm() < 1e-10);
            assert!(!v.has_relative_height);
        }
    }

    #[test]
    fn test_heights_lie_in_unit_interval() {
        let mut mesh = bumpy();
        analyze(&mut mesh, &sequential());

        let mut saw_top = false;
        for (_, v) in mesh.vertices() {
            assert!(v.has_relative_height);
            assert!((0.0..=1.0 + 1e-12).contains(&v.relative_height));
            assert!((v.normal.norm() - 1.0).abs() < 1e-10);
            assert!((v.average_normal.norm() - 1.0).abs() < 1e-10);
            saw_top |= (v.relative_height - 1.0).abs() < 1e-12;
        }
        assert!(saw_top);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let mut a = bumpy();
        let mut b = bumpy();
        analyze(&mut a, &sequential());
        analyze(&mut b, &AnalysisOptions::default());

        for ((_, va), (_, vb)) in a.vertices().zip(b.vertices()) {
            assert_eq!(va.normal, vb.normal);
            assert_eq!(va.average_normal, vb.average_normal);
            assert_eq!(va.relative_height, vb.relative_height);
            assert_eq!(va.angle_defect, vb.angle_defect);
        }
    }

    #[test]
    fn test_isolated_vertex_is_left_alone() {
        let mut mesh = HalfEdgeMesh::<u32>::new();
        let v = mesh.add_vertex(Point3::new(1.0, 2.0, 3.0), 0);
        analyze(&mut mesh, &sequential());

        let vertex = mesh.vertex(v);
        assert_eq!(vertex.normal, Vector3::zeros());
        assert_eq!(vertex.average_normal, Vector3::zeros());
        assert_eq!(vertex.relative_height, f64::INFINITY);
        assert!(!vertex.has_relative_height);
    }

    #[test]
    fn test_angle_defects_are_stored() {
        let mut mesh = octahedron();
        analyze(&mut mesh, &sequential());
        for (_, v) in mesh.vertices() {
            let defect = v.angle_defect.unwrap();
            assert!((defect - 2.0 * std::f64::consts::PI / 3.0).abs() < 1e-10);
        }

        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
        ];
        let mut open: HalfEdgeMesh<u32> = build_topology(&vertices, &[[0, 1, 2]]);
        analyze(&mut open, &AnalysisOptions::default());
        assert!(open.vertices().all(|(_, v)| v.angle_defect.is_none()));
    }

    #[test]
    fn test_analysis_bumps_revision() {
        let mut mesh = octahedron();
        let before = mesh.revision();
        analyze(&mut mesh, &sequential());
        assert!(mesh.revision() > before);
    }
}
