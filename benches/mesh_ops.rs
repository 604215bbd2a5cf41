//! Benchmarks for mesh operations.

use criterion::{criterion_group, criterion_main, Criterion};
use nalgebra::Point3;
use sliver::algo::analysis::{analyze, AnalysisOptions};
use sliver::mesh::build_topology;
use sliver::prelude::*;

/// Closed UV sphere with `rings` latitude bands and `segments` longitude slices.
fn sphere(rings: usize, segments: usize) -> (Vec<Point3<f64>>, Vec<[usize; 3]>) {
    use std::f64::consts::PI;

    let mut vertices = vec![Point3::new(0.0, 0.0, 1.0)];
    for r in 1..rings {
        let theta = PI * r as f64 / rings as f64;
        for s in 0..segments {
            let phi = 2.0 * PI * s as f64 / segments as f64;
            vertices.push(Point3::new(
                theta.sin() * phi.cos(),
                theta.sin() * phi.sin(),
                theta.cos(),
            ));
        }
    }
    let south = vertices.len();
    vertices.push(Point3::new(0.0, 0.0, -1.0));

    let ring = |r: usize, s: usize| 1 + (r - 1) * segments + s % segments;
    let mut faces = Vec::with_capacity(2 * rings * segments);
    for s in 0..segments {
        faces.push([0, ring(1, s), ring(1, s + 1)]);
    }
    for r in 1..rings - 1 {
        for s in 0..segments {
            let (a, b) = (ring(r, s), ring(r, s + 1));
            let (c, d) = (ring(r + 1, s), ring(r + 1, s + 1));
            faces.push([a, c, d]);
            faces.push([a, d, b]);
        }
    }
    for s in 0..segments {
        faces.push([south, ring(rings - 1, s + 1), ring(rings - 1, s)]);
    }

    (vertices, faces)
}

fn bench_mesh_construction(c: &mut Criterion) {
    let (vertices, faces) = sphere(32, 64);

    c.bench_function("build_topology_sphere_32x64", |b| {
        b.iter(|| {
            let mesh: HalfEdgeMesh = build_topology(&vertices, &faces);
            mesh
        });
    });

    c.bench_function("build_from_triangles_sphere_32x64", |b| {
        b.iter(|| {
            let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &faces).unwrap();
            mesh
        });
    });
}

fn bench_analysis(c: &mut Criterion) {
    let (vertices, faces) = sphere(64, 128);
    let mesh: HalfEdgeMesh = build_topology(&vertices, &faces);

    c.bench_function("analyze_parallel", |b| {
        b.iter_batched(
            || mesh.clone(),
            |mut mesh| analyze(&mut mesh, &AnalysisOptions::default()),
            criterion::BatchSize::LargeInput,
        );
    });

    c.bench_function("analyze_sequential", |b| {
        b.iter_batched(
            || mesh.clone(),
            |mut mesh| analyze(&mut mesh, &AnalysisOptions::default().sequential()),
            criterion::BatchSize::LargeInput,
        );
    });
}

fn bench_mesh_traversal(c: &mut Criterion) {
    let (vertices, faces) = sphere(64, 128);
    let mut mesh: HalfEdgeMesh = build_from_triangles(&vertices, &faces).unwrap();

    c.bench_function("vertex_neighbors_all", |b| {
        b.iter(|| {
            let mut count = 0;
            for v in mesh.vertex_ids() {
                count += mesh.vertex_neighbors(v).count();
            }
            count
        });
    });

    c.bench_function("order_vertices_by_flatness", |b| {
        b.iter(|| mesh.order_vertices_by_flatness().len());
    });
}

criterion_group!(benches, bench_mesh_construction, bench_analysis, bench_mesh_traversal);
criterion_main!(benches);
