use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use pledge_store::VersionedStore;
use pledge_types::Epoch;

fn store_with_versions(n: u64) -> VersionedStore<u64> {
    let mut store = VersionedStore::new();
    for i in 0..n {
        store.append("bench-index", Epoch::new(i * 10), i).unwrap();
    }
    store
}

fn store_with_indices(n: u64) -> VersionedStore<u64> {
    let mut store = VersionedStore::new();
    for i in 0..n {
        let index = format!("plg_provider{} plg_delegator{} chain", i % 16, i);
        store.append(&index, Epoch::new(1), i).unwrap();
    }
    store
}

fn bench_find(c: &mut Criterion) {
    let mut group = c.benchmark_group("versioned_find");

    for version_count in [1u64, 10, 100, 1000] {
        let store = store_with_versions(version_count);
        let epoch = Epoch::new(version_count * 10 / 2 + 5);

        group.bench_with_input(
            BenchmarkId::new("find", version_count),
            &version_count,
            |b, _| {
                b.iter(|| black_box(store.find(black_box("bench-index"), black_box(epoch))));
            },
        );
    }

    group.finish();
}

fn bench_scan_prefix(c: &mut Criterion) {
    let mut group = c.benchmark_group("versioned_scan_prefix");

    for index_count in [10u64, 100, 1000] {
        let store = store_with_indices(index_count);

        group.bench_with_input(
            BenchmarkId::new("scan_prefix", index_count),
            &index_count,
            |b, _| {
                b.iter(|| black_box(store.scan_prefix(black_box("plg_provider7 "))));
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_find, bench_scan_prefix);
criterion_main!(benches);
