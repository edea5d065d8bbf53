use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use dpf_half_tree_bit_lib::{dpf_bit_eval_full, dpf_bit_gen, PrgContext};
use dpf_pir::{PirClient, PirParams, PirServer};
use pir_aggregate_lib::{xor_fold, xor_fold_parallel, Database};
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use std::time::Duration;

const ROW_LEN: usize = 1 << 14;

fn random_bytes(len: usize, rng: &mut StdRng) -> Vec<u8> {
    let mut data = vec![0u8; len];
    rng.fill_bytes(&mut data);
    data
}

fn bench_dpf(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(1);
    let prg = PrgContext::random(&mut rng);

    let mut group = c.benchmark_group("DPF");
    for logn in [10usize, 14, 18, 20] {
        let alpha = rng.random_range(0..(1u32 << logn));
        group.bench_with_input(BenchmarkId::new("gen", logn), &logn, |b, &logn| {
            b.iter(|| black_box(dpf_bit_gen(alpha, logn, &prg, &mut rng)))
        });

        let (k0, _) = dpf_bit_gen(alpha, logn, &prg, &mut rng);
        group.throughput(Throughput::Elements(1 << logn));
        group.bench_with_input(BenchmarkId::new("eval_full", logn), &logn, |b, &logn| {
            b.iter(|| black_box(dpf_bit_eval_full(&k0, logn, &prg)))
        });
    }
    group.finish();
}

fn bench_xor_fold(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(2);
    let logn = 10;
    let data = random_bytes((1 << logn) * ROW_LEN, &mut rng);
    let db = Database::new(&data, ROW_LEN).unwrap();
    let selection = random_bytes((1 << logn) / 8, &mut rng);

    let mut group = c.benchmark_group("XOR fold");
    group.measurement_time(Duration::from_secs(10));
    group.throughput(Throughput::Bytes(data.len() as u64));
    group.bench_function("sequential", |b| {
        let mut out = vec![0u8; ROW_LEN];
        b.iter(|| xor_fold(&selection, &db, black_box(&mut out)))
    });
    for threads in [2usize, 4, 8] {
        group.bench_with_input(BenchmarkId::new("parallel", threads), &threads, |b, &threads| {
            let mut out = vec![0u8; ROW_LEN];
            b.iter(|| xor_fold_parallel(&selection, &db, black_box(&mut out), threads).unwrap())
        });
    }
    group.finish();
}

fn bench_answer(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(3);
    let params = PirParams::new(10, ROW_LEN, 1).unwrap();
    let data = random_bytes(params.domain_size() * ROW_LEN, &mut rng);
    let client = PirClient::random(params, &mut rng).unwrap();
    let server = PirServer::new(&data, client.prg().clone(), params).unwrap();
    let (k0, _) = client.query_with_rng(rng.random_range(0..1024), &mut rng).unwrap();

    let mut group = c.benchmark_group("Server answer");
    group.measurement_time(Duration::from_secs(10));
    group.throughput(Throughput::Bytes(data.len() as u64));
    group.bench_function("xor", |b| b.iter(|| black_box(server.answer(&k0).unwrap())));
    group.finish();
}

criterion_group! {
    name = benches;
    config = Criterion::default();
    targets = bench_dpf, bench_xor_fold, bench_answer
}
criterion_main!(benches);
