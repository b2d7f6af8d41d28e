//! Sliding time windows.
//!
//! A [`SlidingWindow`] keeps the values recorded over the most recent span of time, dropping
//! values as they age out.  The window is split into a fixed number of sub-buckets; each
//! recording is folded into the sub-bucket covering its timestamp, and whole sub-buckets are
//! discarded once they fall behind the window.  The resolution of the window is therefore the
//! width of a single sub-bucket.
use std::collections::VecDeque;
use std::time::Duration;

use quanta::Instant;

use crate::Distribution;

/// Upper bound on the number of sub-buckets a [`SlidingWindow`] is split into.
pub const MAX_WINDOW_BUCKETS: usize = 1024;

/// A partial aggregate that can be folded and combined.
pub trait Aggregate: Clone {
    /// Folds a single value into this aggregate.
    fn record(&mut self, value: f64);

    /// Combines `other` into this aggregate.
    ///
    /// `other` always covers a later (or the same) span of time than `self`.
    fn merge(&mut self, other: &Self);
}

impl Aggregate for Distribution {
    fn record(&mut self, value: f64) {
        Distribution::record(self, value)
    }

    fn merge(&mut self, other: &Self) {
        Distribution::merge(self, other)
    }
}

/// An aggregate over a sliding window of time.
#[derive(Debug, Clone)]
pub struct SlidingWindow<A> {
    empty: A,
    origin: Instant,
    window: Duration,
    bucket_width_ns: u128,
    num_buckets: u64,
    // Ordered by bucket index, oldest first.
    buckets: VecDeque<(u64, A)>,
}

impl<A> SlidingWindow<A>
where
    A: Aggregate,
{
    /// Creates a new `SlidingWindow`.
    ///
    /// `window` is the span of time covered, split into `num_buckets` sub-buckets.  The count is
    /// clamped to between one and [`MAX_WINDOW_BUCKETS`], and to no more than one sub-bucket per
    /// nanosecond of `window`.  `empty` is the aggregate every sub-bucket starts from, and `origin`
    /// anchors the sub-bucket grid in time.
    pub fn new(
        window: Duration,
        num_buckets: usize,
        empty: A,
        origin: Instant,
    ) -> SlidingWindow<A> {
        let window_ns = u64::try_from(window.as_nanos()).unwrap_or(u64::MAX);
        let num_buckets = (num_buckets.min(MAX_WINDOW_BUCKETS) as u64).min(window_ns).max(1);
        let bucket_width_ns = (window.as_nanos() / u128::from(num_buckets)).max(1);

        SlidingWindow {
            empty,
            origin,
            window,
            bucket_width_ns,
            num_buckets,
            buckets: VecDeque::new(),
        }
    }

    /// Gets the span of time covered by this window.
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Records `value` at time `now`.
    ///
    /// Values older than the window, relative to the newest value seen so far, are dropped.
    pub fn record(&mut self, value: f64, now: Instant) {
        let idx = self.bucket_index(now);

        if let Some((newest, _)) = self.buckets.back() {
            if idx.saturating_add(self.num_buckets) <= *newest {
                return;
            }
        }

        self.expire(idx);

        match self.buckets.iter().position(|(i, _)| *i >= idx) {
            Some(pos) if self.buckets[pos].0 == idx => self.buckets[pos].1.record(value),
            Some(pos) => {
                let mut bucket = self.empty.clone();
                bucket.record(value);
                self.buckets.insert(pos, (idx, bucket));
            }
            None => {
                let mut bucket = self.empty.clone();
                bucket.record(value);
                self.buckets.push_back((idx, bucket));
            }
        }
    }

    /// Gets the aggregate of every value inside the window ending at `now`.
    pub fn snapshot(&self, now: Instant) -> A {
        let idx = self.bucket_index(now);

        let mut result = self.empty.clone();
        for (bucket_idx, bucket) in self.buckets.iter() {
            if *bucket_idx <= idx && bucket_idx.saturating_add(self.num_buckets) > idx {
                result.merge(bucket);
            }
        }
        result
    }

    /// Returns `true` if no recorded value falls inside the window ending at `now`.
    pub fn is_empty(&self, now: Instant) -> bool {
        let idx = self.bucket_index(now);
        !self.buckets.iter().any(|(bucket_idx, _)| {
            *bucket_idx <= idx && bucket_idx.saturating_add(self.num_buckets) > idx
        })
    }

    /// Returns `true` if every recorded value has aged out of the window ending at `now`.
    ///
    /// Unlike [`is_empty`](SlidingWindow::is_empty), values recorded after `now` keep the window
    /// alive.
    pub fn is_expired(&self, now: Instant) -> bool {
        let idx = self.bucket_index(now);
        self.buckets
            .iter()
            .all(|(bucket_idx, _)| bucket_idx.saturating_add(self.num_buckets) <= idx)
    }

    fn bucket_index(&self, at: Instant) -> u64 {
        let elapsed = at.saturating_duration_since(self.origin).as_nanos();
        u64::try_from(elapsed / self.bucket_width_ns).unwrap_or(u64::MAX)
    }

    fn expire(&mut self, idx: u64) {
        while let Some((oldest, _)) = self.buckets.front() {
            if oldest.saturating_add(self.num_buckets) > idx {
                break;
            }
            let _ = self.buckets.pop_front();
        }
    }
}
