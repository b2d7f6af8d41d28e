use std::time::Duration;

use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use metrics_views_util::{BucketBoundaries, Distribution, SlidingWindow};
use quanta::Clock;
use rand::{rngs::SmallRng, Rng, SeedableRng};

fn distribution_benchmark(c: &mut Criterion) {
    let bounds = BucketBoundaries::exponential(20, 1.0, 2.0).expect("valid boundaries");
    let mut rng = SmallRng::seed_from_u64(0x5eed);
    let samples = (0..1024).map(|_| rng.random_range(0.0..1_000_000.0)).collect::<Vec<f64>>();

    let mut group = c.benchmark_group("distribution");
    group.bench_function("record", |b| {
        let mut distribution = Distribution::new(&bounds);
        let mut i = 0;
        b.iter(|| {
            distribution.record(samples[i & 1023]);
            i += 1;
        })
    });
    group.bench_function("merge", |b| {
        let mut other = Distribution::new(&bounds);
        other.record_many(&samples);
        b.iter_batched_ref(
            || Distribution::new(&bounds),
            |distribution| distribution.merge(&other),
            BatchSize::SmallInput,
        )
    });
    group.bench_function("sliding window record", |b| {
        let clock = Clock::new();
        let mut window =
            SlidingWindow::new(Duration::from_secs(60), 4, Distribution::new(&bounds), clock.now());
        let mut i = 0;
        b.iter(|| {
            window.record(samples[i & 1023], clock.now());
            i += 1;
        })
    });
    group.finish();
}

criterion_group!(benches, distribution_benchmark);
criterion_main!(benches);
