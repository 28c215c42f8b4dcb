//! Benchmark for chunk generation and cache lookups.
//!
//! Run with: cargo bench --package quarry_procedural --bench chunk_benchmark

// criterion_group! expands to an undocumented pub fn
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use quarry_procedural::{ChunkKey, ChunkStore, TerrainComposer, World};
use quarry_shared::{FeaturePlacement, WorldConfig};

fn seeded_config() -> WorldConfig {
    WorldConfig {
        feature_placement: FeaturePlacement::Seeded,
        ..WorldConfig::default()
    }
}

fn benchmark_single_chunk(c: &mut Criterion) {
    let composer = TerrainComposer::new(&seeded_config()).unwrap();

    c.bench_function("single_chunk_generation", |b| {
        let mut coord = 0i32;
        b.iter(|| {
            coord = coord.wrapping_add(1);
            black_box(composer.compose(ChunkKey::new(coord, coord / 2)))
        });
    });
}

fn benchmark_entropy_placement(c: &mut Criterion) {
    let composer = TerrainComposer::new(&WorldConfig::default()).unwrap();

    c.bench_function("single_chunk_entropy_placement", |b| {
        let mut coord = 0i32;
        b.iter(|| {
            coord = coord.wrapping_add(1);
            black_box(composer.compose(ChunkKey::new(coord, -coord)))
        });
    });
}

fn benchmark_spawn_neighborhood(c: &mut Criterion) {
    let config = seeded_config();

    let mut group = c.benchmark_group("spawn_neighborhood");
    group.throughput(Throughput::Elements(9));
    group.sample_size(20);

    group.bench_function("cold_world_prewarm_and_spawn", |b| {
        b.iter(|| {
            let world = World::new(&config).unwrap();
            black_box(world.prewarm_spawn());
            black_box(world.find_safe_starting_position())
        });
    });

    group.finish();
}

fn benchmark_cached_lookup(c: &mut Criterion) {
    let store = ChunkStore::new(TerrainComposer::new(&seeded_config()).unwrap());
    for key in ChunkKey::new(0, 0).neighborhood(2) {
        let _ = store.get_chunk(key);
    }

    c.bench_function("cached_chunk_lookup", |b| {
        let mut i = 0i32;
        b.iter(|| {
            i = i.wrapping_add(1);
            black_box(store.get_chunk(ChunkKey::new(i.rem_euclid(5) - 2, (i / 5).rem_euclid(5) - 2)))
        });
    });
}

criterion_group! {
    name = benches;
    config = Criterion::default();
    targets = benchmark_single_chunk,
              benchmark_entropy_placement,
              benchmark_spawn_neighborhood,
              benchmark_cached_lookup
}

criterion_main!(benches);
