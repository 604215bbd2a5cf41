//! Mesh construction from indexed triangle lists.
//!
//! The builder is deliberately forgiving. Triangles that would break the
//! half-edge structure are dropped and counted instead of failing the whole
//! build, so broken input still yields a mesh that can be inspected. The
//! counters end up on the mesh ([`HalfEdgeMesh::repeated_halfedges`],
//! [`HalfEdgeMesh::alone_halfedges`], [`HalfEdgeMesh::degenerate_triangles`])
//! and feed [`HalfEdgeMesh::is_watertight`].

use std::collections::HashMap;

use nalgebra::Point3;

use super::halfedge::HalfEdgeMesh;
use super::index::{HalfEdgeId, MeshIndex, VertexId};
use crate::algo::analysis::{analyze, AnalysisOptions};
use crate::algo::repair::{remove_zero_angle_triangles, DEFAULT_ZERO_ANGLE_DEGREES};
use crate::error::{MeshError, Result};

/// Options controlling [`build_from_triangles_with`].
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Flip away near-180° corners after building a watertight mesh.
    pub repair_zero_angle: bool,

    /// Corner angle, in degrees, above which a triangle counts as degenerate.
    pub zero_angle_threshold_degrees: f64,

    /// Options for the analysis passes that run after construction.
    pub analysis: AnalysisOptions,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            repair_zero_angle: true,
            zero_angle_threshold_degrees: DEFAULT_ZERO_ANGLE_DEGREES,
            analysis: AnalysisOptions::default(),
        }
    }
}

impl BuildOptions {
    /// Set whether near-180° corners are repaired.
    pub fn with_zero_angle_repair(mut self, repair: bool) -> Self {
        self.repair_zero_angle = repair;
        self
    }

    /// Set the degenerate corner threshold in degrees.
    pub fn with_zero_angle_threshold(mut self, degrees: f64) -> Self {
        self.zero_angle_threshold_degrees = degrees;
        self
    }

    /// Set the analysis options.
    pub fn with_analysis(mut self, analysis: AnalysisOptions) -> Self {
        self.analysis = analysis;
        self
    }

    /// Create options for single-threaded execution.
    pub fn sequential(mut self) -> Self {
        self.analysis.parallel = false;
        self
    }

    /// Check that the option values are usable.
    pub fn validate(&self) -> Result<()> {
        let degrees = self.zero_angle_threshold_degrees;
        if !(degrees > 0.0 && degrees < 180.0) {
            return Err(MeshError::invalid_param(
                "zero_angle_threshold_degrees",
                degrees,
                "must lie strictly between 0 and 180",
            ));
        }
        Ok(())
    }
}

/// Build a half-edge mesh from vertices and triangle faces with default options.
///
/// # Arguments
/// * `vertices` - List of vertex positions
/// * `faces` - List of triangle faces, each as [v0, v1, v2] indices
///
/// # Returns
/// A fully analysed half-edge mesh, or an error if a face index is out of range.
///
/// # Example
/// ```
/// use sliver::mesh::{build_from_triangles, HalfEdgeMesh};
/// use nalgebra::Point3;
///
/// let vertices = vec![
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(0.5, 1.0, 0.0),
/// ];
/// let faces = vec![[0, 1, 2]];
///
/// let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &faces).unwrap();
/// assert_eq!(mesh.num_vertices(), 3);
/// assert_eq!(mesh.num_faces(), 1);
/// assert_eq!(mesh.alone_halfedges(), 3);
/// ```
pub fn build_from_triangles<I: MeshIndex>(
    vertices: &[Point3<f64>],
    faces: &[[usize; 3]],
) -> Result<HalfEdgeMesh<I>> {
    build_from_triangles_with(vertices, faces, &BuildOptions::default())
}

/// Build a half-edge mesh from vertices and triangle faces.
///
/// Construction runs in three steps:
/// 1. the topology is assembled (see [`build_topology`]),
/// 2. if the result is watertight, near-180° corners are flipped away,
/// 3. the analysis passes compute normals, relative heights and angle defects.
pub fn build_from_triangles_with<I: MeshIndex>(
    vertices: &[Point3<f64>],
    faces: &[[usize; 3]],
    options: &BuildOptions,
) -> Result<HalfEdgeMesh<I>> {
    options.validate()?;

    let capacity = I::capacity();
    if vertices.len() > capacity {
        return Err(MeshError::invalid_param(
            "vertices",
            vertices.len(),
            "more vertices than the index type can address",
        ));
    }
    if faces.len().saturating_mul(3) > capacity {
        return Err(MeshError::invalid_param(
            "faces",
            faces.len(),
            "more half-edges than the index type can address",
        ));
    }

    for (fi, face) in faces.iter().enumerate() {
        if let Some(&vi) = face.iter().find(|&&vi| vi >= vertices.len()) {
            return Err(MeshError::InvalidVertexIndex { face: fi, vertex: vi });
        }
    }

    let mut mesh = build_topology(vertices, faces);

    if options.repair_zero_angle && mesh.is_watertight() {
        let flipped = remove_zero_angle_triangles(&mut mesh, options.zero_angle_threshold_degrees);
        if flipped > 0 {
            log::debug!("flipped {} edges opposite near-180° corners", flipped);
        }
    }

    analyze(&mut mesh, &options.analysis);
    Ok(mesh)
}

/// Assemble the half-edge topology without running any analysis.
///
/// Vertices are created lazily, the first time an accepted triangle uses them,
/// and numbered in that order. Positions never referenced by an accepted
/// triangle do not appear in the mesh.
///
/// A triangle is dropped when
/// - two of its indices are equal (counted as a degenerate triangle), or
/// - one of its directed edges already exists in the mesh (each colliding edge
///   is counted as a repeated half-edge).
///
/// After all triangles are in, every half-edge is paired with its reversed
/// twin. Half-edges without one stay on the boundary and are counted as alone.
///
/// # Panics
/// Panics if a face index is out of range or the element counts do not fit
/// the index type; [`build_from_triangles_with`] checks both up front.
pub fn build_topology<I: MeshIndex>(
    vertices: &[Point3<f64>],
    faces: &[[usize; 3]],
) -> HalfEdgeMesh<I> {
    let mut mesh = HalfEdgeMesh::with_capacity(vertices.len(), faces.len());

    // Input index -> vertex, filled lazily
    let mut vertex_ids: Vec<VertexId<I>> = vec![VertexId::invalid(); vertices.len()];

    // Map from directed edge (v0, v1) to half-edge ID
    let mut edge_map: HashMap<(usize, usize), HalfEdgeId<I>> = HashMap::with_capacity(faces.len() * 3);

    for (fi, face) in faces.iter().enumerate() {
        if face[0] == face[1] || face[1] == face[2] || face[0] == face[2] {
            log::warn!("dropping triangle {} {:?}: repeated vertex index", fi, face);
            mesh.degenerate_triangles += 1;
            continue;
        }

        let collisions = (0..3)
            .filter(|&j| edge_map.contains_key(&(face[j], face[(j + 1) % 3])))
            .count();
        if collisions > 0 {
            log::warn!(
                "dropping triangle {} {:?}: {} directed edge(s) already present",
                fi,
                face,
                collisions
            );
            mesh.repeated_halfedges += collisions;
            continue;
        }

        let face_id = mesh.add_face();
        let hes = [mesh.add_halfedge(), mesh.add_halfedge(), mesh.add_halfedge()];
        mesh.face_mut(face_id).halfedge = hes[0];

        for j in 0..3 {
            let k = (j + 1) % 3;
            let h = (k + 1) % 3;

            let source = face[j];
            if !vertex_ids[source].is_valid() {
                vertex_ids[source] = mesh.add_vertex(vertices[source], source);
            }
            let vertex = vertex_ids[source];

            {
                let he = mesh.halfedge_mut(hes[j]);
                he.origin = vertex;
                he.next = hes[k];
                he.prev = hes[h];
                he.face = face_id;
            }
            {
                let v = mesh.vertex_mut(vertex);
                v.halfedge = hes[j];
                v.halfedge_count += 1;
            }

            if edge_map.insert((source, face[k]), hes[j]).is_some() {
                mesh.repeated_halfedges += 1;
            }
        }
    }

    // Pair half-edges with their reversed twins
    for (&(v0, v1), &he) in &edge_map {
        match edge_map.get(&(v1, v0)) {
            Some(&opposite) => mesh.halfedge_mut(he).opposite = opposite,
            None => mesh.alone_halfedges += 1,
        }
    }

    log::debug!(
        "built mesh: {} vertices, {} faces, {} repeated / {} alone half-edges, {} degenerate triangles",
        mesh.num_vertices(),
        mesh.num_faces(),
        mesh.repeated_halfedges,
        mesh.alone_halfedges,
        mesh.degenerate_triangles
    );

    mesh
}

/// Convert a half-edge mesh back to a face-vertex representation.
///
/// Vertices are emitted in insertion order and faces are re-indexed into that
/// compacted list. Faces that still refer to a removed vertex are skipped.
/// Returns (vertices, faces) tuple.
pub fn to_face_vertex<I: MeshIndex>(mesh: &HalfEdgeMesh<I>) -> (Vec<Point3<f64>>, Vec<[usize; 3]>) {
    let mut compact: HashMap<VertexId<I>, usize> = HashMap::with_capacity(mesh.num_vertices());
    let vertices: Vec<Point3<f64>> = mesh
        .vertices()
        .enumerate()
        .map(|(i, (vid, v))| {
            compact.insert(vid, i);
            v.position
        })
        .collect();

    let faces: Vec<[usize; 3]> = mesh
        .face_ids()
        .filter_map(|f| {
            let [v0, v1, v2] = mesh.face_triangle(f);
            match (compact.get(&v0), compact.get(&v1), compact.get(&v2)) {
                (Some(&i0), Some(&i1), Some(&i2)) => Some([i0, i1, i2]),
                _ => {
                    log::warn!("skipping face {:?}: it refers to a removed vertex", f);
                    None
                }
            }
        })
        .collect();

    (vertices, faces)
}
