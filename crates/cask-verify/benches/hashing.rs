use cask_verify::{Algorithm, HashState, Hasher, Sha256Hasher};
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;

fn bench_hashing(c: &mut Criterion) {
    let mut group = c.benchmark_group("hashing");
    for size in [4 * 1024, 1024 * 1024] {
        let data = vec![0xa5u8; size];
        group.throughput(Throughput::Bytes(size as u64));

        group.bench_with_input(BenchmarkId::new("sha2", size), &data, |b, data| {
            b.iter(|| {
                let mut hasher = Sha256Hasher::new();
                hasher.update(black_box(data));
                hasher.finalize()
            })
        });

        group.bench_with_input(BenchmarkId::new("hash_state", size), &data, |b, data| {
            b.iter(|| {
                let mut state = HashState::new(Algorithm::Sha256);
                for chunk in data.chunks(32 * 1024) {
                    state.update(black_box(chunk));
                }
                state.finalize()
            })
        });
    }
    group.finish();
}

fn bench_snapshot(c: &mut Criterion) {
    let mut state = HashState::new(Algorithm::Sha256);
    state.update(&[1u8; 1000]);
    c.bench_function("snapshot_restore", |b| {
        b.iter(|| HashState::restore(Algorithm::Sha256, black_box(&state.snapshot())))
    });
}

criterion_group!(benches, bench_hashing, bench_snapshot);
criterion_main!(benches);
