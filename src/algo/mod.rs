//! Mesh processing algorithms.
//!
//! - **Analysis**: face and vertex normals, average normals, relative heights
//! - **Repair**: flipping away near-180° sliver triangles
//! - **Curvature**: angle defect and fan helpers around a vertex

pub mod analysis;
pub mod curvature;
pub mod repair;

pub use analysis::{analyze, AnalysisOptions};
pub use repair::{remove_zero_angle_triangles, DEFAULT_ZERO_ANGLE_DEGREES};
