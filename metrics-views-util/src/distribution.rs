//! Helper functions and types related to distribution data.
use crate::BucketBoundaries;

/// A bucketed distribution.
///
/// Tracks the count, mean, sum of squared deviation, minimum and maximum of all recorded samples,
/// along with the number of samples that fell into each bucket described by a set of
/// [`BucketBoundaries`].  Unlike a cumulative histogram, bucket counts are not accumulated into
/// the buckets above them: every sample is counted in exactly one bucket.
#[derive(Debug, Clone, PartialEq)]
pub struct Distribution {
    count: u64,
    mean: f64,
    sum_of_squared_deviation: f64,
    min: f64,
    max: f64,
    bounds: BucketBoundaries,
    buckets: Vec<u64>,
}

impl Distribution {
    /// Creates an empty `Distribution` over the given boundaries.
    pub fn new(bounds: &BucketBoundaries) -> Distribution {
        Distribution {
            count: 0,
            mean: 0.0,
            sum_of_squared_deviation: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
            bounds: bounds.clone(),
            buckets: vec![0; bounds.num_buckets()],
        }
    }

    /// Gets the sample count.
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Gets the mean of all samples, or `0.0` if there are none.
    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Gets the sum of all samples.
    pub fn sum(&self) -> f64 {
        self.mean * self.count as f64
    }

    /// Gets the sum of squared deviations from the mean.
    pub fn sum_of_squared_deviation(&self) -> f64 {
        self.sum_of_squared_deviation
    }

    /// Gets the smallest sample, or positive infinity if there are none.
    pub fn min(&self) -> f64 {
        self.min
    }

    /// Gets the largest sample, or negative infinity if there are none.
    pub fn max(&self) -> f64 {
        self.max
    }

    /// Gets the boundaries this distribution buckets by.
    pub fn bounds(&self) -> &BucketBoundaries {
        &self.bounds
    }

    /// Gets the per-bucket sample counts.
    ///
    /// There is always one more bucket than there are boundaries.
    pub fn bucket_counts(&self) -> &[u64] {
        &self.buckets
    }

    /// Records a single sample.
    ///
    /// Non-finite samples are ignored.
    pub fn record(&mut self, sample: f64) {
        if !sample.is_finite() {
            return;
        }

        self.count += 1;
        let delta = sample - self.mean;
        self.mean += delta / self.count as f64;
        self.sum_of_squared_deviation += delta * (sample - self.mean);

        if sample < self.min {
            self.min = sample;
        }
        if sample > self.max {
            self.max = sample;
        }

        let idx = self.bounds.bucket_for_value(sample);
        self.buckets[idx] += 1;
    }

    /// Records multiple samples.
    pub fn record_many<'a, S>(&mut self, samples: S)
    where
        S: IntoIterator<Item = &'a f64> + 'a,
    {
        for sample in samples.into_iter() {
            self.record(*sample);
        }
    }

    /// Merges the samples of `other` into this distribution.
    ///
    /// Both distributions must have been created over the same boundaries.
    pub fn merge(&mut self, other: &Distribution) {
        debug_assert_eq!(self.bounds, other.bounds, "merging distributions with different bounds");

        if other.count == 0 {
            return;
        }
        if self.count == 0 {
            *self = other.clone();
            return;
        }

        let n1 = self.count as f64;
        let n2 = other.count as f64;
        let total = n1 + n2;
        let delta = other.mean - self.mean;

        self.sum_of_squared_deviation +=
            other.sum_of_squared_deviation + delta * delta * n1 * n2 / total;
        self.mean += delta * n2 / total;
        self.count += other.count;
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);

        for (ours, theirs) in self.buckets.iter_mut().zip(other.buckets.iter()) {
            *ours += *theirs;
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    use super::Distribution;
    use crate::BucketBoundaries;

    #[test]
    fn test_distribution() {
        let bounds = BucketBoundaries::explicit(vec![10.0, 25.0, 100.0]).unwrap();
        let values = vec![3.0, 2.0, 6.0, 12.0, 56.0, 82.0, 202.0, 100.0, 29.0];

        let mut distribution = Distribution::new(&bounds);
        assert_eq!(distribution.count(), 0);
        assert_eq!(distribution.min(), f64::INFINITY);
        assert_eq!(distribution.max(), f64::NEG_INFINITY);

        distribution.record_many(&values);
        distribution.record(89.0);

        assert_eq!(distribution.bucket_counts(), &[3, 1, 4, 2]);
        assert_eq!(distribution.count(), values.len() as u64 + 1);
        assert_relative_eq!(distribution.sum(), 581.0, epsilon = 1e-9);
        assert_relative_eq!(distribution.mean(), 58.1, epsilon = 1e-9);
        assert_eq!(distribution.min(), 2.0);
        assert_eq!(distribution.max(), 202.0);
    }

    #[test]
    fn test_sum_of_squared_deviation() {
        let bounds = BucketBoundaries::default();
        let mut distribution = Distribution::new(&bounds);
        distribution.record_many(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);

        // Population variance of this set is exactly 4.
        assert_relative_eq!(distribution.mean(), 5.0, epsilon = 1e-12);
        assert_relative_eq!(distribution.sum_of_squared_deviation(), 32.0, epsilon = 1e-9);
        assert_eq!(distribution.bucket_counts(), &[8]);
    }

    #[test]
    fn test_non_finite_samples_are_ignored() {
        let bounds = BucketBoundaries::explicit(vec![1.0]).unwrap();
        let mut distribution = Distribution::new(&bounds);
        distribution.record_many(&[f64::NAN, 0.5, f64::INFINITY, 3.0, f64::NEG_INFINITY]);

        assert_eq!(distribution.count(), 2);
        assert_eq!(distribution.bucket_counts(), &[1, 1]);
        assert_relative_eq!(distribution.mean(), 1.75);
        assert_relative_eq!(distribution.sum_of_squared_deviation(), 3.125);
        assert_eq!(distribution.max(), 3.0);
    }

    #[test]
    fn test_merge_into_empty() {
        let bounds = BucketBoundaries::explicit(vec![1.0]).unwrap();
        let mut left = Distribution::new(&bounds);
        let mut right = Distribution::new(&bounds);
        right.record(0.5);
        right.record(3.0);

        left.merge(&right);
        assert_eq!(left, right);

        let empty = Distribution::new(&bounds);
        left.merge(&empty);
        assert_eq!(left, right);
    }

    proptest! {
        #[test]
        fn test_merge_matches_sequential_recording(
            first in prop::collection::vec(-1000.0f64..1000.0, 0..64),
            second in prop::collection::vec(-1000.0f64..1000.0, 0..64),
        ) {
            let bounds = BucketBoundaries::explicit(vec![-100.0, 0.0, 100.0]).unwrap();

            let mut sequential = Distribution::new(&bounds);
            sequential.record_many(first.iter().chain(second.iter()));

            let mut left = Distribution::new(&bounds);
            left.record_many(&first);
            let mut right = Distribution::new(&bounds);
            right.record_many(&second);
            left.merge(&right);

            prop_assert_eq!(left.count(), sequential.count());
            prop_assert_eq!(left.bucket_counts(), sequential.bucket_counts());
            prop_assert_eq!(left.min(), sequential.min());
            prop_assert_eq!(left.max(), sequential.max());
            prop_assert!((left.mean() - sequential.mean()).abs() < 1e-6);
            prop_assert!(
                (left.sum_of_squared_deviation() - sequential.sum_of_squared_deviation()).abs()
                    < 1e-3 * (1.0 + sequential.sum_of_squared_deviation())
            );
        }
    }
}
