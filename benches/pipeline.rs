use criterion::{black_box, criterion_group, criterion_main, Criterion};

use chunkdag::graph::{topo_sort, EdgeDescriptor, GraphDescriptor, NodeDescriptor, SinkDescriptor};
use chunkdag::streamchunk::{build_chunk_dags, CHUNK_SIZE};
use chunkdag::streamchunk::voxel_grid::VoxelGrid;
use chunkdag::material::MaterialTable;

fn sphere_grid(size: usize, radius: f32) -> VoxelGrid {
    let mut grid = VoxelGrid::new(size);
    let center = size as f32 / 2.0;
    for z in 0..size {
        for y in 0..size {
            for x in 0..size {
                let dx = x as f32 - center;
                let dy = y as f32 - center;
                let dz = z as f32 - center;
                let material = if (dx * dx + dy * dy + dz * dz).sqrt() <= radius { 1 } else { 0 };
                grid.set(x, y, z, material);
            }
        }
    }
    grid
}

fn checkerboard_grid(size: usize) -> VoxelGrid {
    let mut grid = VoxelGrid::new(size);
    for z in 0..size {
        for y in 0..size {
            for x in 0..size {
                let material = if (x + y + z) % 2 == 0 { 1 } else { 0 };
                grid.set(x, y, z, material);
            }
        }
    }
    grid
}

fn bench_svdag_build_sphere(c: &mut Criterion) {
    let grid = sphere_grid(CHUNK_SIZE, 14.0);
    let materials = MaterialTable::default();

    c.bench_function("svdag_build_sphere_32", |b| {
        b.iter(|| build_chunk_dags(black_box(&grid), black_box(&materials)));
    });
}

fn bench_svdag_build_checkerboard(c: &mut Criterion) {
    // Worst case for structural dedup: no two adjacent leaves match, so the
    // builder can't collapse anything below the 2x2x2 level.
    let grid = checkerboard_grid(CHUNK_SIZE);
    let materials = MaterialTable::default();

    c.bench_function("svdag_build_checkerboard_32", |b| {
        b.iter(|| build_chunk_dags(black_box(&grid), black_box(&materials)));
    });
}

fn bench_svdag_build_uniform(c: &mut Criterion) {
    // Best case: every voxel is solid, collapsing to a single leaf node.
    let mut grid = VoxelGrid::new(CHUNK_SIZE);
    for z in 0..CHUNK_SIZE {
        for y in 0..CHUNK_SIZE {
            for x in 0..CHUNK_SIZE {
                grid.set(x, y, z, 1);
            }
        }
    }
    let materials = MaterialTable::default();

    c.bench_function("svdag_build_uniform_32", |b| {
        b.iter(|| build_chunk_dags(black_box(&grid), black_box(&materials)));
    });
}

fn linear_chain_graph(node_count: usize) -> GraphDescriptor {
    let nodes = (0..node_count)
        .map(|i| NodeDescriptor { id: format!("n{i}"), kind: "normalize".into(), params: serde_json::json!({}) })
        .collect();
    let edges = (1..node_count)
        .map(|i| EdgeDescriptor {
            from_node: format!("n{}", i - 1),
            from_port: "out".into(),
            to_node: format!("n{i}"),
            to_port: "in".into(),
        })
        .collect();
    let sinks = vec![SinkDescriptor { name: "heightMap".into(), node: format!("n{}", node_count - 1), port: "out".into() }];
    GraphDescriptor { nodes, edges, sinks }
}

fn bench_topo_sort_chain_64(c: &mut Criterion) {
    let graph = linear_chain_graph(64);

    c.bench_function("topo_sort_linear_chain_64", |b| {
        b.iter(|| topo_sort(black_box(&graph)));
    });
}

fn bench_topo_sort_chain_512(c: &mut Criterion) {
    let graph = linear_chain_graph(512);

    c.bench_function("topo_sort_linear_chain_512", |b| {
        b.iter(|| topo_sort(black_box(&graph)));
    });
}

criterion_group!(
    benches,
    bench_svdag_build_sphere,
    bench_svdag_build_checkerboard,
    bench_svdag_build_uniform,
    bench_topo_sort_chain_64,
    bench_topo_sort_chain_512,
);
criterion_main!(benches);
