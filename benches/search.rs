use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use voice_rag::index::VectorMatrix;
use voice_rag::search::search;

const DIMENSION: usize = 1536;

/// Deterministic pseudo-random rows so runs are comparable.
fn rows(count: usize, seed: u32) -> Vec<Vec<f32>> {
    let mut state = seed;
    (0..count)
        .map(|_| {
            (0..DIMENSION)
                .map(|_| {
                    state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
                    (state >> 8) as f32 / (1 << 24) as f32 - 0.5
                })
                .collect()
        })
        .collect()
}

pub fn criterion_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("search");
    let query = rows(1, 7).remove(0);

    for count in [100, 1_000, 10_000] {
        let vectors = VectorMatrix::new(rows(count, 42)).expect("rows share a dimension");
        let chunks: Vec<String> = (0..count).map(|i| format!("chunk {}", i)).collect();

        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, _| {
            b.iter(|| search(black_box(&query), black_box(&vectors), black_box(&chunks), 2));
        });
    }

    group.finish();
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
