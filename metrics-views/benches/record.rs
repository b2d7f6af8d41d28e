use std::time::Duration;

use criterion::{criterion_group, criterion_main, Criterion};
use metrics_views::{
    Aggregation, BucketBoundaries, MeasureDouble, Registry, Tag, ViewDescriptor,
    ViewDescriptorBuilder,
};

static TAGS: [Tag; 2] =
    [Tag::from_static_parts("region", "us"), Tag::from_static_parts("method", "GET")];

fn by_region(measure: MeasureDouble) -> ViewDescriptorBuilder {
    ViewDescriptor::builder().measure(measure).column("region")
}

fn sum(measure: MeasureDouble) -> ViewDescriptor {
    by_region(measure).aggregation(Aggregation::Sum).build().unwrap()
}

fn count(measure: MeasureDouble) -> ViewDescriptor {
    by_region(measure).aggregation(Aggregation::Count).build().unwrap()
}

fn distribution(measure: MeasureDouble) -> ViewDescriptor {
    let bounds = BucketBoundaries::exponential(16, 1.0, 2.0).unwrap();
    by_region(measure).aggregation(Aggregation::Distribution(bounds)).build().unwrap()
}

fn interval(measure: MeasureDouble) -> ViewDescriptor {
    by_region(measure)
        .aggregation(Aggregation::Sum)
        .interval(Duration::from_secs(60))
        .build()
        .unwrap()
}

fn setup(views: &[fn(MeasureDouble) -> ViewDescriptor]) -> (Registry, MeasureDouble) {
    let registry = Registry::new();
    let latency: MeasureDouble = registry.register_measure("latency", "", "ms").unwrap();
    for view in views {
        let _ = registry.add_consumer(&view(latency));
    }
    (registry, latency)
}

fn record_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("record");
    group.bench_function("unknown measure", |b| {
        let (_, latency) = setup(&[]);
        let registry = Registry::new();
        b.iter(|| registry.record_now(&[latency.measurement(42.0)], &TAGS))
    });

    let cases: [(&str, &[fn(MeasureDouble) -> ViewDescriptor]); 5] = [
        ("no views", &[]),
        ("sum", &[sum]),
        ("distribution", &[distribution]),
        ("interval", &[interval]),
        ("four views", &[sum, count, distribution, interval]),
    ];
    for (name, views) in cases {
        group.bench_function(name, |b| {
            let (registry, latency) = setup(views);
            b.iter(|| registry.record_now(&[latency.measurement(42.0)], &TAGS))
        });
    }
    group.finish();

    let mut group = c.benchmark_group("consumers");
    group.bench_function("attach and detach", |b| {
        let (registry, latency) = setup(&[]);
        let view = sum(latency);
        b.iter(|| {
            let handle = registry.add_consumer(&view);
            handle.and_then(|handle| registry.remove_consumer(handle))
        })
    });
    group.bench_function("snapshot", |b| {
        let (registry, latency) = setup(&[]);
        let handle = registry.add_consumer(&distribution(latency)).unwrap();
        for region in ["us", "eu", "ap", "sa"] {
            registry.record_now(&[latency.measurement(1.0)], &[("region", region)]);
        }
        b.iter(|| registry.view_data(handle))
    });
    group.finish();
}

criterion_group!(benches, record_benchmark);
criterion_main!(benches);
