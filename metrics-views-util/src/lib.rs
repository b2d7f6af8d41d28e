//! Aggregation primitives used by `metrics-views`.
//!
//! These are the kind-specific data stores that views fold recorded values into: bucketed
//! [`Distribution`]s over a set of [`BucketBoundaries`], and [`SlidingWindow`]s that keep any
//! [`Aggregate`] over a trailing span of time.
#![deny(missing_docs)]

mod boundaries;
pub use boundaries::{BoundariesError, BucketBoundaries};

mod distribution;
pub use distribution::Distribution;

mod window;
pub use window::{Aggregate, SlidingWindow, MAX_WINDOW_BUCKETS};
