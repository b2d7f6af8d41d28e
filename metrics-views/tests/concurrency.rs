use std::thread;

use metrics_views::{Aggregation, MeasureDouble, Registry, ViewDescriptor};

const THREADS: usize = 8;
const ITERATIONS: usize = 500;

fn descriptor(measure: MeasureDouble, name: String) -> ViewDescriptor {
    ViewDescriptor::builder()
        .name(name)
        .measure(measure)
        .aggregation(Aggregation::Count)
        .column("thread")
        .build()
        .unwrap()
}

#[test]
fn test_attach_record_detach() {
    let registry = Registry::new();
    let latency: MeasureDouble = registry.register_measure("latency", "", "ms").unwrap();

    thread::scope(|s| {
        for idx in 0..THREADS {
            let registry = &registry;
            s.spawn(move || {
                let thread = idx.to_string();
                let descriptor = descriptor(latency, format!("view-{}", idx));
                for _ in 0..ITERATIONS {
                    let handle = registry.add_consumer(&descriptor).unwrap();
                    registry.record_now(&[latency.measurement(1.0)], &[("thread", &thread)]);
                    assert!(registry.num_consumers(handle).unwrap() >= 1);
                    assert_eq!(registry.num_views(latency), 1);
                    assert!(registry.remove_consumer(handle).is_some());
                }
            });
        }
    });

    assert_eq!(registry.num_views(latency), 0);
}

#[test]
fn test_long_lived_consumer_sees_every_recording() {
    let registry = Registry::new();
    let latency: MeasureDouble = registry.register_measure("latency", "", "ms").unwrap();

    let anchor = registry.add_consumer(&descriptor(latency, "anchor".to_owned())).unwrap();

    thread::scope(|s| {
        for idx in 0..THREADS {
            let registry = &registry;
            s.spawn(move || {
                let descriptor = descriptor(latency, format!("view-{}", idx));
                let thread = idx.to_string();
                for _ in 0..ITERATIONS {
                    let handle = registry.add_consumer(&descriptor).unwrap();
                    assert_eq!(handle, anchor);
                    registry.record_now(&[latency.measurement(1.0)], &[("thread", &thread)]);
                    assert_eq!(registry.remove_consumer(handle).map(|n| n >= 1), Some(true));
                }
            });
        }
    });

    assert_eq!(registry.num_consumers(anchor), Some(1));

    let data = registry.view_data(anchor).unwrap();
    let counts = data.values().as_uint64().unwrap();
    assert_eq!(counts.len(), THREADS);
    for idx in 0..THREADS {
        assert_eq!(counts[&vec![idx.to_string()]], ITERATIONS as u64);
    }
}
