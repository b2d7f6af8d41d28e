//! Aggregation of tagged measurements into shared, reference-counted views.
//!
//! # Overview
//! Instrumented code records *measurements*: a value observed for a *measure*, such as the
//! latency of a request, together with a set of *tags* describing the context it was observed
//! in, such as the region serving the request.  On their own, measurements go nowhere.
//!
//! A *view* describes one aggregation over a measure: how values are combined (a count, a sum,
//! the last value, or a bucketed distribution), over which span of time (since the view was
//! created, or a trailing interval), and which tag keys, or *columns*, the values are grouped by.
//! Every measurement recorded against a measure is folded into each of its views, into the row
//! selected by projecting the measurement's tags onto the view's columns.  Tags that a view does
//! not group by are ignored, and columns without a matching tag take the empty string.
//!
//! ## Sharing views
//! Views are consumed through a [`Registry`].  Attaching a consumer returns a [`ViewHandle`];
//! views whose descriptors only differ in name or description are the same view, and all of
//! their consumers share one set of aggregated data.  A view exists for as long as it has
//! consumers: detaching the last one destroys it, and a later consumer starts from scratch.
//!
//! ## Recording
//! Recording never fails: measurements against measures the registry does not know about, or
//! measures without any views, are dropped.  All registry state is guarded by a single lock, so
//! recordings are applied to views in the order they arrive.
//!
//! # Example
//! ```
//! use metrics_views::{Aggregation, MeasureDouble, Registry, ViewDescriptor};
//!
//! let registry = Registry::new();
//! let latency: MeasureDouble =
//!     registry.register_measure("request_latency", "Latency of requests", "ms").unwrap();
//!
//! let descriptor = ViewDescriptor::builder()
//!     .name("request_latency_sum")
//!     .measure(latency)
//!     .aggregation(Aggregation::Sum)
//!     .column("region")
//!     .build()
//!     .unwrap();
//! let handle = registry.add_consumer(&descriptor).unwrap();
//!
//! let tags = [("region", "us"), ("method", "GET")];
//! registry.record_now(&[latency.measurement(5.0)], &tags);
//! registry.record_now(&[latency.measurement(3.0)], &tags);
//!
//! let data = registry.view_data(handle).unwrap();
//! let sums = data.values().as_double().unwrap();
//! assert_eq!(sums[&vec!["us".to_owned()]], 8.0);
//!
//! assert_eq!(registry.remove_consumer(handle), Some(0));
//! assert!(registry.view_data(handle).is_none());
//! ```
#![deny(missing_docs)]

mod aggregation;
pub use self::aggregation::{Aggregation, AggregationWindow, DataType};

mod common;
pub use self::common::{BuildError, RegisterError};

mod data;
pub use self::data::{DataMap, ViewData, ViewValues};

mod descriptor;
pub use self::descriptor::{ViewDescriptor, ViewDescriptorBuilder};

mod measure;
pub use self::measure::{
    Measure, MeasureDescriptor, MeasureDouble, MeasureId, MeasureInt, MeasureKind,
    MeasureRegistry, MeasureValue, Measurement,
};

mod registry;
pub use self::registry::{Registry, RegistryBuilder, ViewHandle, ViewId};

mod tag;
pub use self::tag::{AsTag, SharedString, Tag, TagKey};

mod view;
pub use self::view::View;

pub use metrics_views_util::{
    BoundariesError, BucketBoundaries, Distribution, MAX_WINDOW_BUCKETS,
};
