//! Benchmarks for mesh operations.

use criterion::{criterion_group, criterion_main, Criterion};
use nalgebra::Point3;
use trellis::prelude::*;

fn grid_input(n: usize) -> (Vec<Point3<f64>>, Vec<[usize; 3]>) {
    let mut vertices = Vec::with_capacity((n + 1) * (n + 1));
    let mut faces = Vec::with_capacity(n * n * 2);

    for j in 0..=n {
        for i in 0..=n {
            vertices.push(Point3::new(i as f64, j as f64, 0.0));
        }
    }

    for j in 0..n {
        for i in 0..n {
            let v00 = j * (n + 1) + i;
            let v10 = v00 + 1;
            let v01 = v00 + (n + 1);
            let v11 = v01 + 1;

            faces.push([v00, v10, v11]);
            faces.push([v00, v11, v01]);
        }
    }

    (vertices, faces)
}

fn bench_mesh_construction(c: &mut Criterion) {
    let (vertices, faces) = grid_input(50);
    c.bench_function("build_grid_50x50", |b| {
        b.iter(|| {
            let mesh: TriMesh = build_from_triangles(&vertices, &faces).unwrap();
            mesh
        })
    });
}

fn bench_compaction(c: &mut Criterion) {
    let (vertices, faces) = grid_input(50);
    let base: TriMesh = build_from_triangles(&vertices, &faces).unwrap();

    c.bench_function("garbage_collect_half_deleted", |b| {
        b.iter_batched(
            || {
                let mut mesh = base.clone();
                for id in mesh.face_ids().collect::<Vec<_>>() {
                    if id.index() % 2 == 0 {
                        mesh.delete_face(id);
                    }
                }
                mesh
            },
            |mut mesh| mesh.garbage_collect(),
            criterion::BatchSize::SmallInput,
        )
    });
}

fn bench_normals(c: &mut Criterion) {
    let (vertices, faces) = grid_input(50);
    let mut mesh: TriMesh = build_from_triangles(&vertices, &faces).unwrap();
    mesh.faces_mut().enable_normals();
    mesh.vertices_mut().enable_normals();

    c.bench_function("face_normals_parallel", |b| {
        b.iter(|| compute_face_normals(&mut mesh, &NormalsOptions::default()).unwrap())
    });

    c.bench_function("vertex_normals_sequential", |b| {
        b.iter(|| {
            compute_vertex_normals(&mut mesh, &NormalsOptions::default().sequential()).unwrap()
        })
    });
}

fn bench_buffer_extraction(c: &mut Criterion) {
    let (vertices, faces) = grid_input(50);
    let mesh: TriMesh = build_from_triangles(&vertices, &faces).unwrap();

    c.bench_function("triangle_indices", |b| b.iter(|| mesh.triangle_indices()));
}

criterion_group!(
    benches,
    bench_mesh_construction,
    bench_compaction,
    bench_normals,
    bench_buffer_extraction
);
criterion_main!(benches);
