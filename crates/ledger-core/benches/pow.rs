use criterion::{criterion_group, criterion_main, Criterion};
use ledger_core::pow::{mine_proof, mine_proof_parallel, CancelFlag};
use rand::{rngs::StdRng, Rng, SeedableRng};

fn bench_pow(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(42);
    let previous: Vec<u64> = (0..16).map(|_| rng.gen_range(1..1_000_000)).collect();
    let cancel = CancelFlag::new();

    c.bench_function("mine_proof_difficulty_4", |b| {
        let mut i = 0;
        b.iter(|| {
            let _proof = mine_proof(previous[i % previous.len()], 4, None, &cancel);
            i += 1;
        });
    });

    c.bench_function("mine_proof_parallel_difficulty_4", |b| {
        let mut i = 0;
        b.iter(|| {
            let _proof = mine_proof_parallel(previous[i % previous.len()], 4, None, &cancel);
            i += 1;
        });
    });
}

criterion_group!(benches, bench_pow);
criterion_main!(benches);
