//! # Sliver
//!
//! A half-edge triangle mesh kernel with the analysis needed to drive a
//! quad remesher.
//!
//! Sliver builds a half-edge mesh from an indexed triangle list, reports what
//! was wrong with the input instead of failing on it, flips away sliver
//! triangles on closed meshes and computes per-vertex normals and a
//! "relative height" field that ranks vertices from flat to bulgy.
//!
//! ## Features
//!
//! - **Half-edge data structure**: O(1) adjacency queries with type-safe indices
//! - **Flexible indexing**: Support for 16-bit, 32-bit, and 64-bit indices
//! - **Stable storage**: arena slots with deferred removal, so traversals
//!   never observe recycled elements
//! - **Defect reporting**: repeated and unpaired half-edges, degenerate triangles
//! - **Analysis**: face normals, vertex normals, average normals, relative heights
//!
//! ## Quick Start
//!
//! ```
//! use sliver::prelude::*;
//! use nalgebra::Point3;
//!
//! // Define vertices and faces
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.5, 1.0, 0.0),
//!     Point3::new(0.5, 0.5, 1.0),
//! ];
//!
//! let faces = vec![
//!     [0, 2, 1],  // bottom
//!     [0, 1, 3],  // front
//!     [1, 2, 3],  // right
//!     [2, 0, 3],  // left
//! ];
//!
//! // Build the mesh; normals and relative heights are computed on the way
//! let mut mesh: HalfEdgeMesh = build_from_triangles(&vertices, &faces).unwrap();
//! assert!(mesh.is_watertight());
//!
//! // Flattest vertices first
//! let order = mesh.order_vertices_by_flatness().to_vec();
//! assert_eq!(order.len(), 4);
//! ```
//!
//! ## Mesh Traversal
//!
//! The half-edge structure enables efficient traversal of mesh elements:
//!
//! ```
//! use sliver::prelude::*;
//! use nalgebra::Point3;
//!
//! # let vertices = vec![
//! #     Point3::new(0.0, 0.0, 0.0),
//! #     Point3::new(1.0, 0.0, 0.0),
//! #     Point3::new(0.5, 1.0, 0.0),
//! # ];
//! # let faces = vec![[0, 1, 2]];
//! # let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &faces).unwrap();
//! // Iterate over neighbors of a vertex
//! let v = mesh.first_vertex().unwrap();
//! for neighbor in mesh.vertex_neighbors(v) {
//!     println!("Neighbor: {:?}", neighbor);
//! }
//!
//! // Iterate over faces around a vertex
//! for face in mesh.vertex_faces(v) {
//!     println!("Adjacent face: {:?}", face);
//! }
//!
//! // Get vertices of a face
//! let f = mesh.first_face().unwrap();
//! let [v0, v1, v2] = mesh.face_triangle(f);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod algo;
pub mod error;
pub mod io;
pub mod math;
pub mod mesh;

/// Prelude module for convenient imports.
///
/// This module re-exports the most commonly used types and functions:
///
/// ```
/// use sliver::prelude::*;
/// ```
pub mod prelude {
    pub use crate::algo::AnalysisOptions;
    pub use crate::error::{MeshError, Result};
    pub use crate::mesh::{
        build_from_triangles, build_from_triangles_with, to_face_vertex, BuildOptions, Face,
        FaceId, HalfEdge, HalfEdgeId, HalfEdgeMesh, MeshIndex, Vertex, VertexId,
    };
}

// Re-export nalgebra types for convenience
pub use nalgebra;
