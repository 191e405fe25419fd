//! Benchmark for lazy chunk generation and snapshot export.
//!
//! Run with: cargo bench --package tessera_terrain --bench chunk_benchmark

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion, Throughput};
use tessera_terrain::{ChunkedTerrain, ExportOptions, TerrainExporter, TileEncoding};

fn benchmark_first_touch(c: &mut Criterion) {
    c.bench_function("first_touch_generates_chunk", |b| {
        b.iter_batched(
            || ChunkedTerrain::with_seed(1, 1, 16, 42).unwrap(),
            |mut terrain| black_box(terrain.get_tile(7, 7).copied()),
            BatchSize::SmallInput,
        );
    });
}

fn benchmark_generate_all(c: &mut Criterion) {
    let mut group = c.benchmark_group("generate_all");
    // 16x16 chunks of 8x8 tiles
    group.throughput(Throughput::Elements(16 * 16 * 64));
    group.sample_size(20);
    group.bench_function("16x16_chunks", |b| {
        b.iter_batched(
            || ChunkedTerrain::with_seed(16, 16, 8, 42).unwrap(),
            |mut terrain| {
                terrain.generate_all();
                black_box(terrain.generated_chunk_count())
            },
            BatchSize::SmallInput,
        );
    });
    group.finish();
}

fn benchmark_export(c: &mut Criterion) {
    let mut terrain = ChunkedTerrain::with_seed(8, 8, 8, 42).unwrap();
    terrain.generate_all();

    let mut group = c.benchmark_group("export");
    for encoding in [TileEncoding::Flat, TileEncoding::Objects, TileEncoding::RunLength] {
        let options = ExportOptions::with_encoding(encoding);
        group.bench_function(format!("{encoding:?}"), |b| {
            b.iter(|| {
                let snapshot = TerrainExporter::export_chunked(&mut terrain, &options);
                black_box(snapshot.to_json().unwrap().len())
            });
        });
    }
    group.finish();
}

criterion_group!(benches, benchmark_first_touch, benchmark_generate_all, benchmark_export);
criterion_main!(benches);
