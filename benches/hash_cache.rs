//! Benchmarks for hash cache operations.
//!
//! Benchmark targets:
//! - Hit lookup on a full 10,000-entry cache: <1us
//! - Insert with eviction on a full cache: <2us

// Criterion macros generate items without docs - this is expected for benchmarks
// Benchmarks use expect/unwrap for simplicity - panics are acceptable in benchmarks
#![allow(missing_docs)]
#![allow(clippy::expect_used, clippy::unwrap_used)]

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use futures::FutureExt;
use import_dedup::{CacheKey, HashCache, HashResult};
use std::hint::black_box;

fn ready(hash: String) -> HashResult {
    futures::future::ready(Ok(hash)).boxed().shared()
}

fn key(n: usize) -> CacheKey {
    CacheKey::new(&format!("{n}_1024"), &format!("file:///card/DCIM/IMG_{n:05}.JPG"))
}

fn filled_cache(entries: usize) -> HashCache {
    let cache = HashCache::default();
    for n in 0..entries {
        cache.put(key(n), ready(format!("{n:064x}")));
    }
    cache
}

fn bench_get_hit(c: &mut Criterion) {
    let mut group = c.benchmark_group("hash_cache_get");

    for size in [100usize, 1_000, 10_000] {
        let cache = filled_cache(size);
        let keys: Vec<CacheKey> = (0..size).map(key).collect();
        let mut i = 0usize;

        group.bench_with_input(BenchmarkId::new("hit", size), &size, |b, _| {
            b.iter(|| {
                i = (i + 1) % keys.len();
                black_box(cache.get(&keys[i]))
            });
        });
    }

    group.finish();
}

fn bench_get_or_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("hash_cache_get_or_insert");

    let cache = filled_cache(10_000);
    let mut n = 10_000usize;
    group.bench_function("evicting_insert", |b| {
        b.iter(|| {
            n += 1;
            black_box(cache.get_or_insert_with(key(n), |_| ready(String::new())))
        });
    });

    let cache = filled_cache(10_000);
    let resident = key(42);
    group.bench_function("resident", |b| {
        b.iter(|| black_box(cache.get_or_insert_with(resident.clone(), |_| ready(String::new()))));
    });

    group.finish();
}

criterion_group!(benches, bench_get_hit, bench_get_or_insert);
criterion_main!(benches);
