use core::hint::black_box;
use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use datgen::{BinnedStore, DuplicatePolicy, DynamismBins};
use std::{
    sync::{Arc, Barrier},
    thread::scope,
    time::Instant,
};

// Number of values inserted per benchmark iteration (split across threads
// for multi-threaded runs).
const TOTAL_VALUES: usize = 4096;

const CENTERS: [f64; 4] = [0.2, 0.4, 0.6, 0.8];

fn key_for(i: usize) -> (f64, i64, f64) {
    (CENTERS[i % CENTERS.len()], (i / CENTERS.len() % 8) as i64, 1.0)
}

/// Single-threaded inserts spread over 32 bins.
fn bench_put_sequential(c: &mut Criterion) {
    let mut group = c.benchmark_group("store/put/sequential");
    group.throughput(Throughput::Elements(TOTAL_VALUES as u64));

    for policy in [DuplicatePolicy::Allow, DuplicatePolicy::RejectGlobal] {
        group.bench_function(format!("elems/{TOTAL_VALUES}/{policy:?}"), |b| {
            b.iter_custom(|iters| {
                let start = Instant::now();
                for _ in 0..iters {
                    let store = BinnedStore::natural_order().with_duplicate_policy(policy);
                    for i in 0..TOTAL_VALUES {
                        let (dynamism, urgency, scale) = key_for(i);
                        black_box(store.put(dynamism, urgency, scale, i as u64).unwrap());
                    }
                }
                start.elapsed()
            });
        });
    }

    group.finish();
}

/// Shared store with every thread hammering the same bin.
fn bench_put_contended(c: &mut Criterion) {
    let mut group = c.benchmark_group("store/put/contended");

    for thread_count in [1, 2, 4, 8, 16] {
        let values_per_thread = TOTAL_VALUES / thread_count;

        group.throughput(Throughput::Elements(TOTAL_VALUES as u64));
        group.bench_function(
            format!("elems/{TOTAL_VALUES}/threads/{thread_count}"),
            |b| {
                b.iter_custom(|iters| {
                    let start = Instant::now();

                    for _ in 0..iters {
                        let store = Arc::new(BinnedStore::natural_order());
                        let barrier = Arc::new(Barrier::new(thread_count + 1));
                        scope(|s| {
                            for t in 0..thread_count {
                                let store = Arc::clone(&store);
                                let barrier = Arc::clone(&barrier);
                                s.spawn(move || {
                                    barrier.wait();
                                    for i in 0..values_per_thread {
                                        let value = (t * values_per_thread + i) as u64;
                                        black_box(store.put(0.5, 5, 1.0, value).unwrap());
                                    }
                                });
                            }
                            barrier.wait();
                        });
                    }

                    start.elapsed()
                });
            },
        );
    }

    group.finish();
}

/// Ordered reads of a populated bin.
fn bench_get(c: &mut Criterion) {
    let store = BinnedStore::natural_order();
    for i in 0..TOTAL_VALUES {
        let (dynamism, urgency, scale) = key_for(i);
        store.put(dynamism, urgency, scale, i as u64).unwrap();
    }

    let mut group = c.benchmark_group("store/get");
    group.throughput(Throughput::Elements(store.bin_len(0.2, 0, 1.0) as u64));
    group.bench_function("bin", |b| {
        b.iter(|| black_box(store.get(black_box(0.2), 0, 1.0)));
    });
    group.bench_function("keys", |b| b.iter(|| black_box(store.keys())));
    group.finish();
}

/// Resolving raw scores against tolerance ranges.
fn bench_resolve(c: &mut Criterion) {
    let bins = DynamismBins::builder()
        .centered((1..20).map(|i| f64::from(i) * 0.05), 0.02)
        .build()
        .unwrap();
    let scores: Vec<f64> = (0..TOTAL_VALUES)
        .map(|i| i as f64 / TOTAL_VALUES as f64)
        .collect();

    let mut group = c.benchmark_group("bins/resolve");
    group.throughput(Throughput::Elements(TOTAL_VALUES as u64));
    group.bench_function(format!("elems/{TOTAL_VALUES}"), |b| {
        b.iter(|| {
            for &score in &scores {
                black_box(bins.resolve(score));
            }
        });
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_put_sequential,
    bench_put_contended,
    bench_get,
    bench_resolve
);
criterion_main!(benches);
