use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use gf128_lib::{has_hardware_clmul, mul, mul_portable, Gf128};
use pir_aggregate_lib::{gcm_fold, gcm_fold_parallel, Database};
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use std::time::Duration;

fn bench_field_mul(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(10);
    let a: u128 = rng.random();
    let b: u128 = rng.random();

    let mut group = c.benchmark_group("GF(2^128) multiply");
    group.bench_function("dispatch", |bench| bench.iter(|| mul(black_box(a), black_box(b))));
    group.bench_function("portable", |bench| bench.iter(|| mul_portable(black_box(a), black_box(b))));
    if has_hardware_clmul() {
        #[cfg(target_arch = "x86_64")]
        group.bench_function("pclmulqdq", |bench| {
            bench.iter(|| unsafe { gf128_lib::clmul::mul_clmul(black_box(a), black_box(b)) })
        });
    }
    group.finish();
}

fn bench_gcm_fold(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(11);
    let (rows, row_len) = (1024usize, 1usize << 12);
    let mut data = vec![0u8; rows * row_len];
    rng.fill_bytes(&mut data);
    let db = Database::new(&data, row_len).unwrap();
    let weights: Vec<Gf128> = (0..rows).map(|_| Gf128(rng.random())).collect();

    let mut group = c.benchmark_group("GCM fold");
    group.measurement_time(Duration::from_secs(10));
    group.throughput(Throughput::Bytes(data.len() as u64));
    group.bench_function("sequential", |b| {
        let mut out = vec![0u8; row_len];
        b.iter(|| gcm_fold(&weights, &db, black_box(&mut out)))
    });
    for threads in [2usize, 4, 8] {
        group.bench_with_input(BenchmarkId::new("parallel", threads), &threads, |b, &threads| {
            let mut out = vec![0u8; row_len];
            b.iter(|| gcm_fold_parallel(&weights, &db, black_box(&mut out), threads).unwrap())
        });
    }
    group.finish();
}

criterion_group! {
    name = benches;
    config = Criterion::default();
    targets = bench_field_mul, bench_gcm_fold
}
criterion_main!(benches);
