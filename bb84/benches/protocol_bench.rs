// benches/protocol_bench.rs

use bb84::prelude::*;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn benchmark_protocol(c: &mut Criterion) {
    c.bench_function("simulate_1000_qubits", |b| {
        let mut rng = StdRng::seed_from_u64(1);
        let params = RunParameters::new(1000, 0.05, 0.2);

        b.iter(|| simulate(black_box(&params), &mut rng));
    });

    c.bench_function("collect_metrics_10x25", |b| {
        let mut rng = StdRng::seed_from_u64(2);

        b.iter(|| collect_metrics(black_box(10), black_box(25), &mut rng));
    });
}

criterion_group!(benches, benchmark_protocol);
criterion_main!(benches);
