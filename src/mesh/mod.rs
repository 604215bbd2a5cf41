//! Core mesh data structures.
//!
//! This module provides the half-edge mesh representation and the operations
//! that build and edit it.
//!
//! # Overview
//!
//! The primary type is [`HalfEdgeMesh`], which represents a triangle mesh using
//! a half-edge (doubly-connected edge list) data structure. Vertices,
//! half-edges and faces live in [`Arena`]s: handles stay valid while other
//! elements are removed, and removal can be deferred so that a traversal in
//! progress never sees a recycled slot.
//!
//! # Index Types
//!
//! Mesh elements are identified by type-safe index wrappers:
//! - [`VertexId`] - Identifies a vertex
//! - [`HalfEdgeId`] - Identifies a half-edge
//! - [`FaceId`] - Identifies a face
//!
//! These indices are generic over the underlying integer type ([`MeshIndex`] trait),
//! allowing you to choose `u16`, `u32`, or `u64` based on mesh size.
//!
//! # Construction
//!
//! Meshes are constructed from indexed triangle lists. The builder tolerates
//! broken input and reports what it dropped through the defect counters:
//!
//! ```
//! use sliver::mesh::{HalfEdgeMesh, build_from_triangles};
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.5, 1.0, 0.0),
//! ];
//! let faces = vec![[0, 1, 2]];
//!
//! let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &faces).unwrap();
//! assert_eq!(mesh.alone_halfedges(), 3);
//! assert!(!mesh.is_watertight());
//! ```

mod arena;
mod builder;
mod flatness;
mod flip;
mod halfedge;
mod index;

pub use arena::{Arena, Indices};
pub use builder::{
    build_from_triangles, build_from_triangles_with, build_topology, to_face_vertex, BuildOptions,
};
pub use halfedge::{Face, FaceHalfEdgeIter, HalfEdge, HalfEdgeMesh, Vertex, VertexFan};
pub use index::{FaceId, HalfEdgeId, MeshIndex, VertexId};
