//! Running moments for one metric channel
//!
//! Welford's single-pass update keeps mean and the sum of squared deviations
//! (M2) numerically stable for long streams of joint angles, moments and
//! velocities. Chan's parallel formula combines two accumulators.

use crate::traits::{MergeError, Sketch};

/// Running mean / variance / extrema over finite values
///
/// Non-finite inputs (NaN, ±infinity) are dropped: a single corrupt frame in a
/// recording must not poison the statistics of an entire feature.
///
/// # Example
///
/// ```
/// use flowranges::statistics::RunningStats;
///
/// let mut stats = RunningStats::new();
/// for value in [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0] {
///     stats.add(value);
/// }
///
/// assert!((stats.mean() - 5.0).abs() < 1e-12);
/// assert!((stats.std_dev() - 2.0).abs() < 1e-12);
/// assert_eq!(stats.min(), Some(2.0));
/// assert_eq!(stats.max(), Some(9.0));
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    /// Sum of squared deviations from the running mean
    m2: f64,
    min: f64,
    max: f64,
}

impl Default for RunningStats {
    fn default() -> Self {
        Self::new()
    }
}

impl RunningStats {
    /// Create an empty accumulator
    pub fn new() -> Self {
        Self {
            count: 0,
            mean: 0.0,
            m2: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }

    /// Fold one value in. Returns `false` if the value was rejected as non-finite.
    pub fn add(&mut self, value: f64) -> bool {
        if !value.is_finite() {
            return false;
        }

        self.count += 1;
        self.min = self.min.min(value);
        self.max = self.max.max(value);

        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);
        true
    }

    /// Number of accepted values
    pub fn len(&self) -> u64 {
        self.count
    }

    /// `true` before the first accepted value
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Running mean, `0.0` when empty
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Population variance (divides by `n`), clamped at zero
    pub fn variance(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            (self.m2 / self.count as f64).max(0.0)
        }
    }

    /// Unbiased sample variance (divides by `n - 1`), clamped at zero
    pub fn sample_variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            (self.m2 / (self.count - 1) as f64).max(0.0)
        }
    }

    /// Population standard deviation
    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    /// Sample standard deviation (`n - 1` denominator)
    pub fn sample_std_dev(&self) -> f64 {
        self.sample_variance().sqrt()
    }

    /// Smallest accepted value
    pub fn min(&self) -> Option<f64> {
        (self.count > 0).then_some(self.min)
    }

    /// Largest accepted value
    pub fn max(&self) -> Option<f64> {
        (self.count > 0).then_some(self.max)
    }

    /// Sum of accepted values, recovered from the mean
    pub fn sum(&self) -> f64 {
        self.mean * self.count as f64
    }

    /// Combine with another accumulator (Chan et al.)
    pub fn merge_stats(&mut self, other: &Self) {
        if other.count == 0 {
            return;
        }
        if self.count == 0 {
            *self = other.clone();
            return;
        }

        let n_a = self.count as f64;
        let n_b = other.count as f64;
        let total = n_a + n_b;
        let delta = other.mean - self.mean;

        self.mean += delta * (n_b / total);
        self.m2 += other.m2 + delta * delta * (n_a * n_b / total);
        self.count += other.count;
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
    }
}

impl Sketch for RunningStats {
    type Item = f64;

    fn update(&mut self, item: &Self::Item) {
        self.add(*item);
    }

    fn merge(&mut self, other: &Self) -> Result<(), MergeError> {
        self.merge_stats(other);
        Ok(())
    }

    fn clear(&mut self) {
        *self = Self::new();
    }

    fn size_bytes(&self) -> usize {
        core::mem::size_of::<Self>()
    }

    fn count(&self) -> u64 {
        self.count
    }
}
