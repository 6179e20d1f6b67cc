use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use std::sync::Arc;
use weak_observe::{ObservableSet, ObservableWeakMap, ObserverBuilder};

/// Benchmark: Collection pass with varying orphan counts
///
/// Automatic collection is disabled; every watched object is dropped right
/// away, so one explicit pass releases all of them.
fn bench_collect_orphans(c: &mut Criterion) {
    let mut group = c.benchmark_group("collect_orphans");

    for orphan_count in [10, 100, 1000, 5000].iter() {
        group.bench_with_input(
            BenchmarkId::new("set", orphan_count),
            orphan_count,
            |b, &orphan_count| {
                b.iter(|| {
                    let set: ObservableSet<u64> =
                        ObserverBuilder::new().auto_collect_interval(None).set();

                    for i in 0..orphan_count {
                        drop(set.watch(Arc::new(i), |_| {}));
                    }

                    black_box(set.collect());
                });
            },
        );

        group.bench_with_input(
            BenchmarkId::new("weak_map", orphan_count),
            orphan_count,
            |b, &orphan_count| {
                b.iter(|| {
                    let map: ObservableWeakMap<u64, u64> =
                        ObserverBuilder::new().auto_collect_interval(None).weak_map();

                    for i in 0..orphan_count {
                        drop(map.watch(Arc::new(i), Arc::new(i), |_| {}));
                    }

                    black_box(map.collect());
                });
            },
        );
    }

    group.finish();
}

/// Benchmark: Collection pass over live objects
///
/// Nothing is released; this measures the cost of scanning entries that are
/// still reachable.
fn bench_collect_live(c: &mut Criterion) {
    let mut group = c.benchmark_group("collect_live");

    for live_count in [100, 1000, 10000].iter() {
        let set: ObservableSet<usize> = ObserverBuilder::new().auto_collect_interval(None).set();
        let objects: Vec<_> = (0..*live_count)
            .map(|i| set.watch(Arc::new(i), |_| {}))
            .collect();

        group.bench_with_input(BenchmarkId::new("set", live_count), live_count, |b, _| {
            b.iter(|| black_box(set.collect()));
        });

        drop(objects);
    }

    group.finish();
}

/// Benchmark: Compare automatic vs manual collection
fn bench_auto_vs_manual(c: &mut Criterion) {
    let mut group = c.benchmark_group("auto_vs_manual");

    group.bench_function("auto_collection_default_interval", |b| {
        b.iter(|| {
            let set = ObservableSet::new();

            for i in 0..1000u64 {
                drop(set.watch(Arc::new(i), |_| {}));
            }

            black_box(set.count());
        });
    });

    group.bench_function("manual_collection_1000_objects", |b| {
        b.iter(|| {
            let set = ObserverBuilder::new().auto_collect_interval(None).set();

            for i in 0..1000u64 {
                drop(set.watch(Arc::new(i), |_| {}));
            }

            black_box(set.collect());
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_collect_orphans,
    bench_collect_live,
    bench_auto_vs_manual
);
criterion_main!(benches);
