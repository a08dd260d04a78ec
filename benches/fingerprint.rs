//! Benchmarks for identity fingerprinting
//!
//! Covers the hash itself over realistic vendor id lengths and the full
//! bootstrap-time assignment with collision checking.

use camserver::IdentityHasher;
use camserver::registry::assign_fingerprints;
use camserver::types::CameraIdentity;
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;

fn identities(count: usize) -> Vec<CameraIdentity> {
    (0..count)
        .map(|i| CameraIdentity::new(format!("DEV_1AB22C{:05X}", 0x41B + i), "", "", ""))
        .collect()
}

fn bench_hash(c: &mut Criterion) {
    let hasher = IdentityHasher::with_seed(7);
    let mut group = c.benchmark_group("identity_hash");

    let ids = [
        "DEV_1AB22C0041B",
        "DEV_000F315C1A2B4C6D8E0F",
        "usb://vendor/1800-U-240m/serial/0041B/interface/0",
    ];
    for id in ids {
        group.throughput(Throughput::Bytes(id.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(id.len()), id, |b, id| {
            b.iter(|| black_box(hasher.hash(black_box(id))))
        });
    }

    group.finish();
}

fn bench_assignment(c: &mut Criterion) {
    let mut group = c.benchmark_group("assign_fingerprints");

    for count in [1usize, 8, 64] {
        let fleet = identities(count);
        group.bench_with_input(BenchmarkId::from_parameter(count), &fleet, |b, fleet| {
            b.iter(|| black_box(assign_fingerprints(black_box(fleet), Some(0x5EED))))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_hash, bench_assignment);
criterion_main!(benches);
