use std::collections::HashMap as StdHashMap;
use std::time::Duration;

use hashbrown::HashMap;
use metrics_views_util::{Distribution, SlidingWindow};
use quanta::Instant;

use crate::aggregation::{Accumulator, Aggregation, AggregationWindow, DataType};
use crate::descriptor::ViewDescriptor;

/// Aggregated values keyed by row.
///
/// A row is the list of tag values a recording was projected to, in the order of the view's
/// columns.  Views without columns have a single row, keyed by the empty list.
pub type DataMap<T> = StdHashMap<Vec<String>, T>;

/// Aggregated values of a view, one per row.
#[derive(Clone, Debug, PartialEq)]
pub enum ViewValues {
    /// Sums and last values.
    Double(DataMap<f64>),
    /// Counts.
    Uint64(DataMap<u64>),
    /// Distributions.
    Distribution(DataMap<Distribution>),
}

impl ViewValues {
    fn for_aggregation(aggregation: &Aggregation) -> ViewValues {
        match aggregation {
            Aggregation::Count => ViewValues::Uint64(DataMap::new()),
            Aggregation::Sum | Aggregation::LastValue => ViewValues::Double(DataMap::new()),
            Aggregation::Distribution(_) => ViewValues::Distribution(DataMap::new()),
        }
    }

    /// Gets the values as floating-point values, if they are.
    pub fn as_double(&self) -> Option<&DataMap<f64>> {
        match self {
            ViewValues::Double(values) => Some(values),
            _ => None,
        }
    }

    /// Gets the values as counts, if they are.
    pub fn as_uint64(&self) -> Option<&DataMap<u64>> {
        match self {
            ViewValues::Uint64(values) => Some(values),
            _ => None,
        }
    }

    /// Gets the values as distributions, if they are.
    pub fn as_distribution(&self) -> Option<&DataMap<Distribution>> {
        match self {
            ViewValues::Distribution(values) => Some(values),
            _ => None,
        }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        match self {
            ViewValues::Double(values) => values.len(),
            ViewValues::Uint64(values) => values.len(),
            ViewValues::Distribution(values) => values.len(),
        }
    }

    /// Whether or not there are no rows.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn insert_accumulated(&mut self, row: Vec<String>, accumulated: Accumulator) {
        match (self, accumulated) {
            (ViewValues::Uint64(values), Accumulator::Count(count)) => {
                let _ = values.insert(row, count);
            }
            (ViewValues::Double(values), Accumulator::Sum(sum)) => {
                let _ = values.insert(row, sum);
            }
            (ViewValues::Double(values), Accumulator::LastValue(Some(last))) => {
                let _ = values.insert(row, last);
            }
            (ViewValues::Distribution(values), Accumulator::Distribution(distribution)) => {
                let _ = values.insert(row, distribution);
            }
            // Nothing recorded inside the window.
            (_, Accumulator::LastValue(None)) => {}
            (values, accumulated) => {
                debug_assert!(false, "cannot store {:?} in {:?}", accumulated, values);
            }
        }
    }
}

/// A point-in-time snapshot of a view.
///
/// Snapshots are owned copies: they stay valid, and unchanged, after the view they were taken
/// from records more values or is destroyed.
#[derive(Clone, Debug)]
pub struct ViewData {
    descriptor: ViewDescriptor,
    start_time: Instant,
    end_time: Instant,
    values: ViewValues,
}

impl ViewData {
    pub(crate) fn new(
        descriptor: ViewDescriptor,
        start_time: Instant,
        end_time: Instant,
        values: ViewValues,
    ) -> ViewData {
        ViewData { descriptor, start_time, end_time, values }
    }

    /// The descriptor of the view this snapshot was taken from.
    ///
    /// When several consumers share a view, this is the descriptor of the consumer that first
    /// created it.
    pub fn descriptor(&self) -> &ViewDescriptor {
        &self.descriptor
    }

    pub(crate) fn set_descriptor(&mut self, descriptor: ViewDescriptor) {
        self.descriptor = descriptor;
    }

    /// When the view started aggregating.
    pub fn start_time(&self) -> Instant {
        self.start_time
    }

    /// When this snapshot was taken.
    pub fn end_time(&self) -> Instant {
        self.end_time
    }

    /// The aggregated values.
    pub fn values(&self) -> &ViewValues {
        &self.values
    }

    /// Consumes this snapshot, returning the aggregated values.
    pub fn into_values(self) -> ViewValues {
        self.values
    }
}

type Rows<T> = HashMap<Vec<String>, T>;

/// Aggregated state of a single view.
#[derive(Debug)]
pub(crate) enum DataStore {
    Double { rows: Rows<f64>, overwrite: bool },
    Uint64(Rows<u64>),
    Distribution { rows: Rows<Distribution>, empty: Distribution },
    Interval {
        rows: Rows<SlidingWindow<Accumulator>>,
        empty: SlidingWindow<Accumulator>,
        aggregation: Aggregation,
    },
}

impl DataStore {
    /// Creates an empty store for `descriptor`.
    ///
    /// Interval windows are split into `window_buckets` sub-buckets, anchored at `start`.
    pub fn new(descriptor: &ViewDescriptor, window_buckets: usize, start: Instant) -> DataStore {
        let aggregation = descriptor.aggregation();

        match descriptor.window() {
            AggregationWindow::Interval(window) => {
                DataStore::interval(aggregation, window, window_buckets, start)
            }
            AggregationWindow::Cumulative => match aggregation {
                Aggregation::Count => DataStore::Uint64(Rows::new()),
                Aggregation::Sum => DataStore::Double { rows: Rows::new(), overwrite: false },
                Aggregation::LastValue => DataStore::Double { rows: Rows::new(), overwrite: true },
                Aggregation::Distribution(bounds) => {
                    DataStore::Distribution { rows: Rows::new(), empty: Distribution::new(bounds) }
                }
            },
        }
    }

    fn interval(
        aggregation: &Aggregation,
        window: Duration,
        window_buckets: usize,
        start: Instant,
    ) -> DataStore {
        let empty =
            SlidingWindow::new(window, window_buckets, Accumulator::new(aggregation), start);
        DataStore::Interval { rows: Rows::new(), empty, aggregation: aggregation.clone() }
    }

    pub fn data_type(&self) -> DataType {
        match self {
            DataStore::Double { .. } => DataType::Double,
            DataStore::Uint64(_) => DataType::Uint64,
            DataStore::Distribution { .. } => DataType::Distribution,
            DataStore::Interval { .. } => DataType::Interval,
        }
    }

    /// Folds `value` into `row`.
    pub fn add(&mut self, value: f64, row: Vec<String>, now: Instant) {
        match self {
            DataStore::Double { rows, overwrite } => {
                let slot = rows.entry(row).or_insert(0.0);
                if *overwrite {
                    *slot = value;
                } else {
                    *slot += value;
                }
            }
            DataStore::Uint64(rows) => *rows.entry(row).or_insert(0) += 1,
            DataStore::Distribution { rows, empty } => {
                rows.entry(row).or_insert_with(|| empty.clone()).record(value)
            }
            DataStore::Interval { rows, empty, .. } => {
                if !rows.contains_key(&row) {
                    rows.retain(|_, window| !window.is_expired(now));
                }
                rows.entry(row).or_insert_with(|| empty.clone()).record(value, now)
            }
        }
    }

    /// Drops interval rows with no values left inside their window as of `now`.
    pub fn prune(&mut self, now: Instant) {
        if let DataStore::Interval { rows, .. } = self {
            rows.retain(|_, window| !window.is_expired(now));
        }
    }

    /// Copies out the aggregated values as of `now`.
    pub fn snapshot(&self, now: Instant) -> ViewValues {
        match self {
            DataStore::Double { rows, .. } => ViewValues::Double(copy_rows(rows)),
            DataStore::Uint64(rows) => ViewValues::Uint64(copy_rows(rows)),
            DataStore::Distribution { rows, .. } => ViewValues::Distribution(copy_rows(rows)),
            DataStore::Interval { rows, aggregation, .. } => {
                let mut values = ViewValues::for_aggregation(aggregation);
                for (row, window) in rows.iter().filter(|(_, window)| !window.is_empty(now)) {
                    values.insert_accumulated(row.clone(), window.snapshot(now));
                }
                values
            }
        }
    }
}

fn copy_rows<T: Clone>(rows: &Rows<T>) -> DataMap<T> {
    rows.iter().map(|(row, value)| (row.clone(), value.clone())).collect()
}
