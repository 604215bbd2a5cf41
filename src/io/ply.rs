//! PLY (Stanford polygon) debug output.
//!
//! Vertices are written in insertion order with a greyscale colour: a
//! normalized relative height of 0 is black and 1 is white. Vertices without
//! a relative height are black as well.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::{MeshError, Result};
use crate::mesh::{to_face_vertex, HalfEdgeMesh, MeshIndex};

/// Write the mesh as ASCII PLY to any writer.
pub fn write_debug<W: Write, I: MeshIndex>(mesh: &HalfEdgeMesh<I>, mut writer: W) -> Result<()> {
    let (vertices, faces) = to_face_vertex(mesh);

    // Write header
    writeln!(writer, "ply")?;
    writeln!(writer, "format ascii 1.0")?;
    writeln!(writer, "comment Generated by sliver")?;
    writeln!(writer, "element vertex {}", vertices.len())?;
    writeln!(writer, "property float x")?;
    writeln!(writer, "property float y")?;
    writeln!(writer, "property float z")?;
    writeln!(writer, "property uchar red")?;
    writeln!(writer, "property uchar green")?;
    writeln!(writer, "property uchar blue")?;
    writeln!(writer, "element face {}", faces.len())?;
    writeln!(writer, "property list uchar int vertex_indices")?;
    writeln!(writer, "end_header")?;

    // to_face_vertex emits vertices in the same order as mesh.vertices()
    for (p, (_, vertex)) in vertices.iter().zip(mesh.vertices()) {
        let grey = if vertex.has_relative_height {
            (vertex.relative_height.clamp(0.0, 1.0) * 255.0).round() as u8
        } else {
            0
        };
        writeln!(writer, "{} {} {} {} {} {}", p.x, p.y, p.z, grey, grey, grey)?;
    }

    for f in &faces {
        writeln!(writer, "3 {} {} {}", f[0], f[1], f[2])?;
    }

    writer.flush()?;
    Ok(())
}

/// Save the mesh as ASCII PLY to a file.
///
/// # Example
///
/// ```no_run
/// use sliver::prelude::*;
/// use sliver::io::save_debug;
/// use nalgebra::Point3;
///
/// let vertices = vec![
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(0.5, 1.0, 0.0),
/// ];
/// let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &[[0, 1, 2]]).unwrap();
/// save_debug(&mesh, "debug.ply").unwrap();
/// ```
pub fn save_debug<P: AsRef<Path>, I: MeshIndex>(mesh: &HalfEdgeMesh<I>, path: P) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|e| MeshError::SaveError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    write_debug(mesh, BufWriter::new(file))
}
