use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use lightgcn::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn synthetic_graph(n_users: usize, n_items: usize, per_user: usize) -> InteractionGraph {
    let mut rng = StdRng::seed_from_u64(42);
    let interactions: Vec<(usize, usize)> = (0..n_users)
        .flat_map(|u| (0..per_user).map(move |_| u))
        .map(|u| (u, rng.gen_range(0..n_items)))
        .collect();
    InteractionGraph::new(n_users, n_items, &interactions).expect("indices in range")
}

fn bench_propagation(c: &mut Criterion) {
    let mut group = c.benchmark_group("propagation");

    for &n_users in &[100usize, 1_000, 5_000] {
        let graph = synthetic_graph(n_users, n_users / 2, 10);
        let config = GcnConfig::default()
            .with_latent_dim(32)
            .expect("valid")
            .with_seed(1);
        let mut model = LightGcn::new(config, &graph).expect("valid model");
        model.eval();

        group.bench_with_input(BenchmarkId::new("eval", n_users), &n_users, |b, _| {
            let mut rng = StdRng::seed_from_u64(0);
            b.iter(|| black_box(model.computer(false, &mut rng).expect("valid")));
        });

        group.bench_with_input(BenchmarkId::new("perturbed", n_users), &n_users, |b, _| {
            let mut rng = StdRng::seed_from_u64(0);
            b.iter(|| black_box(model.computer(true, &mut rng).expect("valid")));
        });
    }

    group.finish();
}

fn bench_bpr_step(c: &mut Criterion) {
    let graph = synthetic_graph(1_000, 500, 10);
    let config = GcnConfig::default()
        .with_latent_dim(32)
        .and_then(|c| c.with_edge_dropout(0.6))
        .expect("valid")
        .with_seed(1);
    let model = LightGcn::new(config, &graph).expect("valid model");
    let users: Vec<usize> = (0..256).collect();
    let pos: Vec<usize> = (0..256).map(|i| i % 500).collect();
    let neg: Vec<usize> = (0..256).map(|i| (i * 7 + 3) % 500).collect();

    c.bench_function("bpr_loss_train_256", |b| {
        let mut rng = StdRng::seed_from_u64(0);
        b.iter(|| black_box(model.bpr_loss(&users, &pos, &neg, &mut rng).expect("valid")));
    });
}

criterion_group!(benches, bench_propagation, bench_bpr_step);
criterion_main!(benches);
