//! Benchmark for noise sampling and per-tile classification.
//!
//! Run with: cargo bench --package tessera_terrain --bench noise_benchmark

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use tessera_terrain::generator::TerrainGenerator;
use tessera_terrain::noise::{SimplexNoise, WorldSeed};

fn benchmark_single_sample(c: &mut Criterion) {
    let noise = SimplexNoise::new(WorldSeed::new(42));

    c.bench_function("single_noise_sample", |b| {
        let mut x = 0.0f64;
        b.iter(|| {
            x += 0.1;
            black_box(noise.sample(black_box(x), black_box(x * 0.7)))
        });
    });
}

fn benchmark_fbm(c: &mut Criterion) {
    let noise = SimplexNoise::new(WorldSeed::new(42));

    c.bench_function("fbm01_3_octaves", |b| {
        let mut x = 0.0f64;
        b.iter(|| {
            x += 0.1;
            black_box(noise.fbm01(black_box(x), black_box(x * 0.7), 3))
        });
    });
}

fn benchmark_classification(c: &mut Criterion) {
    let generator = TerrainGenerator::new(WorldSeed::new(42));

    let mut group = c.benchmark_group("classification");
    group.throughput(Throughput::Elements(64 * 64));
    group.bench_function("64x64_tiles", |b| {
        b.iter(|| {
            for y in 0..64 {
                for x in 0..64 {
                    black_box(generator.classify_material(x, y));
                }
            }
        });
    });
    group.finish();
}

criterion_group!(benches, benchmark_single_sample, benchmark_fbm, benchmark_classification);
criterion_main!(benches);
