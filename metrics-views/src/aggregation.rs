use std::time::Duration;

use metrics_views_util::{Aggregate, BucketBoundaries, Distribution};

use crate::ViewDescriptor;

/// How a view aggregates the values recorded against its measure.
#[derive(Clone, Debug, PartialEq)]
pub enum Aggregation {
    /// Counts the number of recordings, ignoring their values.
    Count,
    /// Sums the recorded values.
    Sum,
    /// Keeps the most recently recorded value.
    LastValue,
    /// Buckets the recorded values into a distribution over the given boundaries.
    Distribution(BucketBoundaries),
}

/// The span of time a view aggregates over.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum AggregationWindow {
    /// Everything recorded since the view was created.
    Cumulative,
    /// Everything recorded within the trailing window of the given length.
    Interval(Duration),
}

/// Storage kind of a view's aggregated data.
///
/// Every combination of [`Aggregation`] and [`AggregationWindow`] maps to exactly one kind:
/// - interval windows are stored as [`DataType::Interval`], regardless of aggregation
/// - cumulative counts are stored as [`DataType::Uint64`]
/// - cumulative sums and last values are stored as [`DataType::Double`]
/// - cumulative distributions are stored as [`DataType::Distribution`]
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub enum DataType {
    /// A single floating-point value per row.
    Double,
    /// A single unsigned integer per row.
    Uint64,
    /// A distribution per row.
    Distribution,
    /// A sliding window of partial aggregates per row.
    Interval,
}

impl DataType {
    /// Classifies an aggregation over a window.
    pub fn classify(aggregation: &Aggregation, window: &AggregationWindow) -> DataType {
        match window {
            AggregationWindow::Interval(_) => DataType::Interval,
            AggregationWindow::Cumulative => match aggregation {
                Aggregation::Count => DataType::Uint64,
                Aggregation::Sum | Aggregation::LastValue => DataType::Double,
                Aggregation::Distribution(_) => DataType::Distribution,
            },
        }
    }

    /// Classifies the aggregation described by `descriptor`.
    pub fn for_descriptor(descriptor: &ViewDescriptor) -> DataType {
        DataType::classify(descriptor.aggregation(), &descriptor.window())
    }
}

/// A partial aggregate for a single row of an interval view.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Accumulator {
    Count(u64),
    Sum(f64),
    LastValue(Option<f64>),
    Distribution(Distribution),
}

impl Accumulator {
    pub fn new(aggregation: &Aggregation) -> Accumulator {
        match aggregation {
            Aggregation::Count => Accumulator::Count(0),
            Aggregation::Sum => Accumulator::Sum(0.0),
            Aggregation::LastValue => Accumulator::LastValue(None),
            Aggregation::Distribution(bounds) => {
                Accumulator::Distribution(Distribution::new(bounds))
            }
        }
    }
}

impl Aggregate for Accumulator {
    fn record(&mut self, value: f64) {
        match self {
            Accumulator::Count(count) => *count += 1,
            Accumulator::Sum(sum) => *sum += value,
            Accumulator::LastValue(last) => *last = Some(value),
            Accumulator::Distribution(distribution) => distribution.record(value),
        }
    }

    fn merge(&mut self, other: &Self) {
        match (self, other) {
            (Accumulator::Count(ours), Accumulator::Count(theirs)) => *ours += *theirs,
            (Accumulator::Sum(ours), Accumulator::Sum(theirs)) => *ours += *theirs,
            (Accumulator::LastValue(ours), Accumulator::LastValue(theirs)) => {
                if theirs.is_some() {
                    *ours = *theirs;
                }
            }
            (Accumulator::Distribution(ours), Accumulator::Distribution(theirs)) => {
                ours.merge(theirs)
            }
            (ours, theirs) => {
                debug_assert!(false, "cannot merge {:?} into {:?}", theirs, ours);
            }
        }
    }
}
