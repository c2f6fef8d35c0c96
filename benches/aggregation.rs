use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::SeedableRng;

use aegis_fl::{dnc, fedavg, median, multi_krum, trimmed_mean};

fn make_updates(n_clients: usize, n_params: usize) -> Vec<Vec<f32>> {
    (0..n_clients)
        .map(|i| {
            (0..n_params)
                .map(|j| ((i * n_params + j) as f32).sin())
                .collect()
        })
        .collect()
}

fn bench_aggregation(c: &mut Criterion) {
    let mut group = c.benchmark_group("aggregation");

    for &n_clients in &[10, 50] {
        for &n_params in &[1_000usize, 100_000] {
            let updates = make_updates(n_clients, n_params);
            let weights = vec![1.0f32; n_clients];
            let id = format!("{}c_{}p", n_clients, n_params);

            group.bench_with_input(
                BenchmarkId::new("trimmed_mean", &id),
                &updates,
                |b, updates| b.iter(|| trimmed_mean(updates, 0.2).unwrap()),
            );

            group.bench_with_input(BenchmarkId::new("median", &id), &updates, |b, updates| {
                b.iter(|| median(updates).unwrap())
            });

            group.bench_with_input(BenchmarkId::new("fedavg", &id), &updates, |b, updates| {
                b.iter(|| fedavg(updates, Some(&weights)).unwrap())
            });

            group.bench_with_input(
                BenchmarkId::new("multi_krum", &id),
                &updates,
                |b, updates| b.iter(|| multi_krum(updates, &weights, 2, n_clients - 2).unwrap()),
            );

            group.bench_with_input(BenchmarkId::new("dnc", &id), &updates, |b, updates| {
                b.iter(|| {
                    let mut rng = StdRng::seed_from_u64(42);
                    dnc(updates, &weights, 1.0, 1_000, 3, 2, &mut rng).unwrap()
                })
            });
        }
    }
    group.finish();
}

criterion_group!(benches, bench_aggregation);
criterion_main!(benches);
