//! Mesh file output.
//!
//! Only a debug dump is provided: an ASCII PLY file whose vertex colours show
//! the relative height field. Loading meshes from files is left to the caller,
//! who hands positions and triangles to
//! [`build_from_triangles`](crate::mesh::build_from_triangles).

pub mod ply;

pub use ply::{save_debug, write_debug};
