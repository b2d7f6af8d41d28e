//! Bucket boundaries for distributions.
use thiserror::Error as ThisError;

/// Errors that can occur when constructing [`BucketBoundaries`].
#[derive(Debug, Clone, PartialEq, ThisError)]
pub enum BoundariesError {
    /// A boundary was NaN or infinite.
    #[error("bucket boundary at index {0} is not a finite number")]
    NonFinite(usize),

    /// Boundaries were not strictly increasing.
    #[error("bucket boundaries must be strictly increasing (violated at index {0})")]
    Unsorted(usize),

    /// A linear or exponential generator was given an unusable parameter.
    #[error("invalid bucket generator parameter: {0}")]
    InvalidParameter(&'static str),
}

/// The boundaries between the buckets of a distribution.
///
/// `n` boundaries describe `n + 1` buckets: the first bucket holds values below the first
/// boundary, bucket `i` holds values in `[bounds[i - 1], bounds[i])`, and the last bucket holds
/// every value greater than or equal to the last boundary.  An empty set of boundaries is valid
/// and yields a single bucket.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BucketBoundaries {
    bounds: Vec<f64>,
}

impl BucketBoundaries {
    /// Creates boundaries from an explicit list.
    ///
    /// The values must be finite and strictly increasing.
    pub fn explicit(bounds: Vec<f64>) -> Result<BucketBoundaries, BoundariesError> {
        for (idx, bound) in bounds.iter().enumerate() {
            if !bound.is_finite() {
                return Err(BoundariesError::NonFinite(idx));
            }
            if idx > 0 && bounds[idx - 1] >= *bound {
                return Err(BoundariesError::Unsorted(idx));
            }
        }

        Ok(BucketBoundaries { bounds })
    }

    /// Creates `num_finite_buckets` buckets of equal `width`, starting at `offset`.
    ///
    /// The resulting boundaries are `offset, offset + width, ...,
    /// offset + num_finite_buckets * width`.
    pub fn linear(
        num_finite_buckets: usize,
        offset: f64,
        width: f64,
    ) -> Result<BucketBoundaries, BoundariesError> {
        if width <= 0.0 || !width.is_finite() {
            return Err(BoundariesError::InvalidParameter("width must be positive and finite"));
        }

        let bounds =
            (0..=num_finite_buckets).map(|i| offset + (i as f64) * width).collect::<Vec<_>>();
        Self::explicit(bounds)
    }

    /// Creates `num_finite_buckets` buckets whose widths grow by `growth_factor`.
    ///
    /// The resulting boundaries are `0, scale, scale * growth_factor, ...,
    /// scale * growth_factor^(num_finite_buckets - 1)`.
    pub fn exponential(
        num_finite_buckets: usize,
        scale: f64,
        growth_factor: f64,
    ) -> Result<BucketBoundaries, BoundariesError> {
        if scale <= 0.0 || !scale.is_finite() {
            return Err(BoundariesError::InvalidParameter("scale must be positive and finite"));
        }
        if growth_factor <= 1.0 || !growth_factor.is_finite() {
            return Err(BoundariesError::InvalidParameter("growth factor must be greater than 1"));
        }

        let mut bounds = Vec::with_capacity(num_finite_buckets + 1);
        bounds.push(0.0);
        let mut upper = scale;
        for _ in 0..num_finite_buckets {
            bounds.push(upper);
            upper *= growth_factor;
        }
        Self::explicit(bounds)
    }

    /// Gets the number of buckets, which is always one more than the number of boundaries.
    pub fn num_buckets(&self) -> usize {
        self.bounds.len() + 1
    }

    /// Gets the boundaries.
    pub fn lower_boundaries(&self) -> &[f64] {
        &self.bounds
    }

    /// Gets the index of the bucket that `value` falls into.
    pub fn bucket_for_value(&self, value: f64) -> usize {
        self.bounds.partition_point(|bound| *bound <= value)
    }
}
